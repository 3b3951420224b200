use async_graphql::Context;
use async_graphql::Object;
use async_graphql::Result;

use super::catalog;
use crate::catalog::Director;
use crate::catalog::Film;

/*
  type Query {
    film(id: Int): Film
    films: [Film!]!
    director(id: Int): Director
    directors: [Director!]!
  }
*/

#[derive(Debug, Default)]
pub struct Query;

/// Root Query
#[Object]
impl Query {
    /// A single film
    async fn film(&self, ctx: &Context<'_>, id: Option<i32>) -> Result<Option<Film>> {
        let catalog = catalog(ctx)?;
        Ok(id.and_then(|id| catalog.film(id)))
    }

    /// A list of all the films
    async fn films(&self, ctx: &Context<'_>) -> Result<Vec<Film>> {
        Ok(catalog(ctx)?.films())
    }

    /// A single director
    async fn director(&self, ctx: &Context<'_>, id: Option<i32>) -> Result<Option<Director>> {
        let catalog = catalog(ctx)?;
        Ok(id.and_then(|id| catalog.director(id)))
    }

    /// A list of all the directors
    async fn directors(&self, ctx: &Context<'_>) -> Result<Vec<Director>> {
        Ok(catalog(ctx)?.directors())
    }
}
