//! The catalog of directors and films the graph is resolved against.
//!
//! Resolvers never touch the collections directly: they receive an `Arc<dyn Catalog>` through the
//! schema data and call into it, so the in-memory implementation can be swapped for a test double
//! without changing any resolver.

mod memory;
mod seed;

use displaydoc::Display;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

pub use self::memory::MemoryCatalog;
pub use self::seed::Seed;

/// A film director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Director {
    pub id: i32,
    pub name: String,
}

/// A film.
///
/// `director_id` is meant to reference a [`Director::id`], but nothing enforces it unless the
/// catalog was built with reference validation turned on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Film {
    pub id: i32,
    pub name: String,
    pub director_id: i32,
}

/// Catalog errors.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum CatalogError {
    /// no director with id {id}
    UnknownDirector { id: i32 },

    /// no identifiers left for new {collection}
    IdSpaceExhausted { collection: &'static str },

    /// could not read seed file: {0}
    SeedRead(std::io::Error),

    /// could not parse seed: {0}
    SeedParse(serde_yaml::Error),
}

impl CatalogError {
    /// The code reported in the `extensions` of a GraphQL error.
    pub fn extension_code(&self) -> &'static str {
        match self {
            CatalogError::UnknownDirector { .. } => "UNKNOWN_DIRECTOR",
            CatalogError::IdSpaceExhausted { .. } => "ID_SPACE_EXHAUSTED",
            CatalogError::SeedRead(_) | CatalogError::SeedParse(_) => "INVALID_SEED",
        }
    }
}

/// Read and append access to the directors and films collections.
///
/// Implementations share one state between every caller: an append is observed by every read
/// that starts after it returns.
pub trait Catalog: Send + Sync + 'static {
    /// Every director, in storage order.
    fn directors(&self) -> Vec<Director>;

    /// Every film, in storage order.
    fn films(&self) -> Vec<Film>;

    /// The first director with this id.
    fn director(&self, id: i32) -> Option<Director>;

    /// The first film with this id.
    fn film(&self, id: i32) -> Option<Film>;

    /// The films directed by `director_id`, in storage order.
    fn films_by_director(&self, director_id: i32) -> Vec<Film>;

    /// The director a film references, if it exists.
    fn director_of(&self, film: &Film) -> Option<Director> {
        self.director(film.director_id)
    }

    /// Append a director and return it with its assigned id.
    fn add_director(&self, name: String) -> Result<Director, CatalogError>;

    /// Append a film and return it with its assigned id.
    fn add_film(&self, name: String, director_id: i32) -> Result<Film, CatalogError>;
}

/// First director in `directors` whose id matches.
pub fn find_director(directors: &[Director], id: i32) -> Option<&Director> {
    directors.iter().find(|director| director.id == id)
}

/// First film in `films` whose id matches.
///
/// Ids are not unique in every seed (the tutorial data has two films with id 6): the earliest
/// entry wins.
pub fn find_film(films: &[Film], id: i32) -> Option<&Film> {
    films.iter().find(|film| film.id == id)
}

/// The films in `films` referencing `director_id`, keeping their order.
pub fn films_directed_by(films: &[Film], director_id: i32) -> impl Iterator<Item = &Film> {
    films
        .iter()
        .filter(move |film| film.director_id == director_id)
}
