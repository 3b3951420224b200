use async_graphql::Context;
use async_graphql::Object;
use async_graphql::Result;

use super::catalog;
use crate::catalog::Director;
use crate::catalog::Film;

/// This represents a film with a director
#[Object]
impl Film {
    async fn id(&self) -> i32 {
        self.id
    }

    async fn name(&self) -> &str {
        &self.name
    }

    async fn director_id(&self) -> i32 {
        self.director_id
    }

    /// The director this film references, null when no director has that id
    async fn director(&self, ctx: &Context<'_>) -> Result<Option<Director>> {
        Ok(catalog(ctx)?.director_of(self))
    }
}

/// This represents a director of a film
#[Object]
impl Director {
    async fn id(&self) -> i32 {
        self.id
    }

    async fn name(&self) -> &str {
        &self.name
    }

    /// Every film referencing this director
    async fn films(&self, ctx: &Context<'_>) -> Result<Vec<Film>> {
        Ok(catalog(ctx)?.films_by_director(self.id))
    }
}
