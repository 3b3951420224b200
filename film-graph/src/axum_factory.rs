//! Axum http server factory: the GraphQL endpoint, its GraphiQL page and the health check.

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::GraphQLRequest;
use async_graphql_axum::GraphQLResponse;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::configuration::Configuration;
use crate::graphql::GraphQlService;
use crate::router::FilmGraphError;

/// Build the axum router serving `service` as configured.
pub fn make_router(
    service: GraphQlService,
    configuration: &Configuration,
) -> Result<Router, FilmGraphError> {
    ensure_endpoints_consistency(configuration)?;
    let server = &configuration.server;

    let graphql = if server.landing_page {
        let page = Html(
            GraphiQLSource::build()
                .endpoint(&server.graphql_path)
                .finish(),
        );
        get(move || {
            let page = page.clone();
            async move { page }
        })
        .post(handle_graphql)
    } else {
        post(handle_graphql)
    };

    let cors = configuration
        .cors
        .clone()
        .into_layer()
        .map_err(|err| FilmGraphError::ServiceCreationError(err.into()))?;

    Ok(Router::new()
        .route(&server.graphql_path, graphql)
        .route(&server.health_check_path, get(health_check))
        .with_state(service)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

async fn handle_graphql(
    State(service): State<GraphQlService>,
    request: GraphQLRequest,
) -> GraphQLResponse {
    service.execute(request.into_inner()).await.into()
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "UP" }))
}

// axum panics on malformed or clashing routes, so they are reported before building the router.
fn ensure_endpoints_consistency(configuration: &Configuration) -> Result<(), FilmGraphError> {
    let server = &configuration.server;
    for path in [&server.graphql_path, &server.health_check_path] {
        if !path.starts_with('/') {
            return Err(FilmGraphError::InvalidRoute(path.clone()));
        }
    }
    if server.graphql_path == server.health_check_path {
        return Err(FilmGraphError::SameRouteUsedTwice(
            server.graphql_path.clone(),
        ));
    }
    Ok(())
}
