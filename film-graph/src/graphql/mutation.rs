use async_graphql::Context;
use async_graphql::ErrorExtensions;
use async_graphql::Object;
use async_graphql::Result;

use super::catalog;
use crate::catalog::Director;
use crate::catalog::Film;

/*
  type Mutation {
    addFilm(name: String!, directorId: Int!): Film!
    addDirector(name: String!): Director!
  }
*/

#[derive(Debug, Default)]
pub struct Mutation;

/// Root mutation
#[Object]
impl Mutation {
    /// Add a film
    async fn add_film(&self, ctx: &Context<'_>, name: String, director_id: i32) -> Result<Film> {
        catalog(ctx)?
            .add_film(name, director_id)
            .map_err(|err| err.extend())
    }

    /// Add a director
    async fn add_director(&self, ctx: &Context<'_>, name: String) -> Result<Director> {
        catalog(ctx)?.add_director(name).map_err(|err| err.extend())
    }
}
