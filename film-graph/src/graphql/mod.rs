//! The graph: Film and Director object types, the root query and mutation types, and the schema
//! that ties them to a [`Catalog`].

mod mutation;
mod query;
mod types;

use std::sync::Arc;

use async_graphql::extensions::Tracing;
use async_graphql::parser;
use async_graphql::parser::types::OperationType;
use async_graphql::EmptySubscription;
use async_graphql::ErrorExtensionValues;
use async_graphql::ErrorExtensions;
use async_graphql::Request;
use async_graphql::Response;
use async_graphql::Schema;
use async_graphql::ServerError;

pub use self::mutation::Mutation;
pub use self::query::Query;
use crate::catalog::Catalog;
use crate::catalog::CatalogError;
use crate::configuration::Configuration;

/// The assembled schema.
pub type FilmSchema = Schema<Query, Mutation, EmptySubscription>;

/// Build the schema over `catalog`, applying the limits and introspection settings.
pub fn build_schema(catalog: Arc<dyn Catalog>, configuration: &Configuration) -> FilmSchema {
    let mut builder = Schema::build(Query, Mutation, EmptySubscription)
        .data(catalog)
        .extension(Tracing);
    if let Some(depth) = configuration.limits.max_depth {
        builder = builder.limit_depth(depth);
    }
    if let Some(complexity) = configuration.limits.max_complexity {
        builder = builder.limit_complexity(complexity);
    }
    if !configuration.server.introspection {
        builder = builder.disable_introspection();
    }
    builder.finish()
}

pub(crate) fn catalog<'a>(
    ctx: &async_graphql::Context<'a>,
) -> async_graphql::Result<&'a Arc<dyn Catalog>> {
    ctx.data::<Arc<dyn Catalog>>()
}

impl ErrorExtensions for CatalogError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, extensions| {
            extensions.set("code", self.extension_code());
            if let CatalogError::UnknownDirector { id } = self {
                extensions.set("directorId", *id);
            }
        })
    }
}

/// Executes requests against the schema, rejecting mutations first when they are forbidden.
#[derive(Clone)]
pub struct GraphQlService {
    schema: FilmSchema,
    forbid_mutations: bool,
}

impl GraphQlService {
    pub fn new(catalog: Arc<dyn Catalog>, configuration: &Configuration) -> Self {
        Self {
            schema: build_schema(catalog, configuration),
            forbid_mutations: configuration.forbid_mutations,
        }
    }

    pub fn schema(&self) -> &FilmSchema {
        &self.schema
    }

    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let request = request.into();
        if self.forbid_mutations && selects_mutation(&request) {
            tracing::debug!(
                operation_name = request.operation_name.as_deref(),
                "rejected mutation"
            );
            return Response::from_errors(vec![mutation_forbidden()]);
        }
        self.schema.execute(request).await
    }
}

// Documents that do not parse are left for the schema to reject with its own error.
fn selects_mutation(request: &Request) -> bool {
    let Ok(document) = parser::parse_query(&request.query) else {
        return false;
    };
    let selected = request.operation_name.as_deref();
    document.operations.iter().any(|(name, operation)| {
        operation.node.ty == OperationType::Mutation
            && selected.map_or(true, |selected| {
                name.map(|name| name.as_str()) == Some(selected)
            })
    })
}

fn mutation_forbidden() -> ServerError {
    let mut extensions = ErrorExtensionValues::default();
    extensions.set("code", "MUTATION_FORBIDDEN");
    let mut error = ServerError::new("Mutations are forbidden", None);
    error.extensions = Some(extensions);
    error
}

#[cfg(test)]
mod tests {
    use insta::assert_json_snapshot;
    use serde_json::json;
    use serde_json::Value;

    use super::*;
    use crate::catalog::MemoryCatalog;

    fn service() -> GraphQlService {
        service_with(Configuration::default(), MemoryCatalog::default())
    }

    fn service_with(configuration: Configuration, catalog: MemoryCatalog) -> GraphQlService {
        GraphQlService::new(Arc::new(catalog), &configuration)
    }

    async fn data(service: &GraphQlService, query: &str) -> Value {
        let response = service.execute(query).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        response.data.into_json().unwrap()
    }

    #[tokio::test]
    async fn it_resolves_a_film_with_its_director() {
        let data = data(
            &service(),
            "{ film(id: 4) { id name directorId director { name } } }",
        )
        .await;
        assert_json_snapshot!(data, @r###"
        {
          "film": {
            "id": 4,
            "name": "You Were Never Really Here",
            "directorId": 3,
            "director": {
              "name": "Lynn Ramsay"
            }
          }
        }
        "###);
    }

    #[tokio::test]
    async fn missing_records_resolve_to_null() {
        let service = service();
        assert_eq!(
            data(&service, "{ film(id: 999) { id } director(id: 999) { id } }").await,
            json!({"film": null, "director": null})
        );
        assert_eq!(
            data(&service, "{ film { id } director(id: null) { id } }").await,
            json!({"film": null, "director": null})
        );
    }

    #[tokio::test]
    async fn duplicated_film_id_resolves_to_the_first_record() {
        assert_eq!(
            data(&service(), "{ film(id: 6) { name } }").await,
            json!({"film": {"name": "Hard Eight"}})
        );
    }

    #[tokio::test]
    async fn director_films_follow_storage_order() {
        let data = data(&service(), "{ directors { id films { name } } }").await;
        assert_json_snapshot!(data, @r###"
        {
          "directors": [
            {
              "id": 1,
              "films": [
                {
                  "name": "The White Ribbon"
                },
                {
                  "name": "The Piano Teacher"
                },
                {
                  "name": "Amour"
                }
              ]
            },
            {
              "id": 2,
              "films": [
                {
                  "name": "Hard Eight"
                },
                {
                  "name": "Punch Drunk Love"
                }
              ]
            },
            {
              "id": 3,
              "films": [
                {
                  "name": "You Were Never Really Here"
                },
                {
                  "name": "Morven Callar"
                }
              ]
            }
          ]
        }
        "###);
    }

    #[tokio::test]
    async fn every_film_resolves_its_director() {
        let service = service();
        let data = data(&service, "{ films { directorId director { id } } }").await;
        let films = data["films"].as_array().unwrap();
        assert_eq!(films.len(), 7);
        for film in films {
            assert_eq!(film["director"]["id"], film["directorId"]);
        }
    }

    #[tokio::test]
    async fn repeated_reads_are_identical() {
        let service = service();
        let query = "{ films { id name directorId } directors { id name } }";
        assert_eq!(data(&service, query).await, data(&service, query).await);
    }

    #[tokio::test]
    async fn mutations_append_to_the_catalog() {
        let service = service();
        let added = data(
            &service,
            r#"mutation { addDirector(name: "Céline Sciamma") { id name } }"#,
        )
        .await;
        assert_eq!(
            added,
            json!({"addDirector": {"id": 4, "name": "Céline Sciamma"}})
        );

        let added = data(
            &service,
            r#"mutation { addFilm(name: "Girlhood", directorId: 4) { id name directorId director { name } } }"#,
        )
        .await;
        assert_eq!(
            added,
            json!({"addFilm": {"id": 8, "name": "Girlhood", "directorId": 4, "director": {"name": "Céline Sciamma"}}})
        );

        let data = data(
            &service,
            "{ director(id: 4) { films { id name } } films { id } directors { id } }",
        )
        .await;
        assert_eq!(
            data["director"]["films"],
            json!([{"id": 8, "name": "Girlhood"}])
        );
        assert_eq!(data["films"].as_array().unwrap().len(), 8);
        assert_eq!(data["directors"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn films_with_an_unknown_director_resolve_it_to_null() {
        let service = service();
        let added = data(
            &service,
            r#"mutation { addFilm(name: "Orphan", directorId: 99) { id directorId director { id } } }"#,
        )
        .await;
        assert_eq!(
            added,
            json!({"addFilm": {"id": 8, "directorId": 99, "director": null}})
        );
        assert_eq!(
            data(&service, "{ film(id: 8) { name director { id } } }").await,
            json!({"film": {"name": "Orphan", "director": null}})
        );
    }

    #[tokio::test]
    async fn missing_arguments_are_rejected_before_resolving() {
        let service = service();
        let response = service.execute("mutation { addFilm(name: \"Untitled\") { id } }").await;
        assert_eq!(response.errors.len(), 1);
        assert_eq!(
            data(&service, "{ films { id } }").await["films"]
                .as_array()
                .unwrap()
                .len(),
            7
        );
    }

    #[tokio::test]
    async fn unknown_directors_are_reported_when_validating() {
        let service = service_with(
            Configuration::default(),
            MemoryCatalog::builder()
                .validate_director_references(true)
                .build(),
        );
        let response = service
            .execute(r#"mutation { addFilm(name: "Orphan", directorId: 42) { id } }"#)
            .await;
        let response = serde_json::to_value(&response).unwrap();
        assert_eq!(
            response["errors"][0]["message"],
            json!("no director with id 42")
        );
        assert_eq!(
            response["errors"][0]["extensions"],
            json!({"code": "UNKNOWN_DIRECTOR", "directorId": 42})
        );
    }

    #[tokio::test]
    async fn forbidden_mutations_are_rejected() {
        let configuration = Configuration::builder().forbid_mutations(true).build();
        let service = service_with(configuration, MemoryCatalog::default());

        let response = service
            .execute(r#"mutation { addDirector(name: "Céline Sciamma") { id } }"#)
            .await;
        assert_json_snapshot!(response, @r###"
        {
          "data": null,
          "errors": [
            {
              "message": "Mutations are forbidden",
              "extensions": {
                "code": "MUTATION_FORBIDDEN"
              }
            }
          ]
        }
        "###);
        assert_eq!(
            data(&service, "{ directors { id } }").await["directors"]
                .as_array()
                .unwrap()
                .len(),
            3
        );
    }

    #[tokio::test]
    async fn forbidding_mutations_honours_the_operation_name() {
        let configuration = Configuration::builder().forbid_mutations(true).build();
        let service = service_with(configuration, MemoryCatalog::default());
        let document = r#"
            query Read { directors { id } }
            mutation Write { addDirector(name: "Céline Sciamma") { id } }
        "#;

        let read = service
            .execute(Request::new(document).operation_name("Read"))
            .await;
        assert!(read.errors.is_empty());

        let write = service
            .execute(Request::new(document).operation_name("Write"))
            .await;
        assert_eq!(write.errors[0].message, "Mutations are forbidden");
    }

    #[tokio::test]
    async fn depth_limit_is_enforced() {
        let configuration: Configuration =
            serde_json::from_value(json!({"limits": {"max_depth": 2}})).unwrap();
        let service = service_with(configuration, MemoryCatalog::default());
        let response = service
            .execute("{ films { director { films { name } } } }")
            .await;
        assert!(!response.errors.is_empty());
        assert!(service.execute("{ films { name } }").await.errors.is_empty());
    }

    #[tokio::test]
    async fn introspection_can_be_disabled() {
        let configuration: Configuration =
            serde_json::from_value(json!({"server": {"introspection": false}})).unwrap();
        let service = service_with(configuration, MemoryCatalog::default());
        let response = service.execute("{ __schema { queryType { name } } }").await;
        let hidden = !response.errors.is_empty()
            || response.data.into_json().unwrap()["__schema"].is_null();
        assert!(hidden);

        let response = self::service().execute("{ __schema { queryType { name } } }").await;
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({"__schema": {"queryType": {"name": "Query"}}})
        );
    }

    #[test]
    fn sdl_exposes_both_roots() {
        let sdl = service().schema().sdl();
        assert!(sdl.contains("addFilm(name: String!, directorId: Int!): Film!"));
        assert!(sdl.contains("addDirector(name: String!): Director!"));
        assert!(sdl.contains("film(id: Int): Film"));
        assert!(sdl.contains("directors: [Director!]!"));
        assert!(sdl.contains("A single film"));
        assert!(sdl.contains("Root Query"));
        assert!(sdl.contains("Root mutation"));
    }

    #[tokio::test]
    async fn root_types_carry_their_descriptions() {
        let data = data(
            &service(),
            r#"{
                query: __type(name: "Query") { description }
                mutation: __type(name: "Mutation") { description }
                film: __type(name: "Film") { description }
                director: __type(name: "Director") { description }
            }"#,
        )
        .await;
        assert_json_snapshot!(data, @r###"
        {
          "query": {
            "description": "Root Query"
          },
          "mutation": {
            "description": "Root mutation"
          },
          "film": {
            "description": "This represents a film with a director"
          },
          "director": {
            "description": "This represents a director of a film"
          }
        }
        "###);
    }
}
