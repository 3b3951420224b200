use parking_lot::RwLock;

use super::find_director;
use super::find_film;
use super::films_directed_by;
use super::Catalog;
use super::CatalogError;
use super::Director;
use super::Film;
use super::Seed;

#[derive(Debug)]
struct Collections {
    directors: Vec<Director>,
    films: Vec<Film>,
    // Last id handed out per collection. Only ever grows.
    last_director_id: i32,
    last_film_id: i32,
}

/// A [`Catalog`] held in process memory.
///
/// Both collections sit behind a single lock. An append assigns the id and pushes the record
/// while holding the write lock, so concurrent appends never observe the same counter value.
#[derive(Debug)]
pub struct MemoryCatalog {
    collections: RwLock<Collections>,
    validate_director_references: bool,
}

#[buildstructor::buildstructor]
impl MemoryCatalog {
    /// Build a catalog from `seed`, the tutorial data when omitted.
    ///
    /// The id counters start past both the collection length and the highest seeded id.
    #[builder]
    pub fn new(seed: Option<Seed>, validate_director_references: Option<bool>) -> Self {
        let Seed { directors, films } = seed.unwrap_or_else(Seed::tutorial);
        let last_director_id = last_id(directors.len(), directors.iter().map(|d| d.id));
        let last_film_id = last_id(films.len(), films.iter().map(|f| f.id));
        Self {
            collections: RwLock::new(Collections {
                directors,
                films,
                last_director_id,
                last_film_id,
            }),
            validate_director_references: validate_director_references.unwrap_or_default(),
        }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn last_id(len: usize, ids: impl Iterator<Item = i32>) -> i32 {
    let len = i32::try_from(len).unwrap_or(i32::MAX);
    ids.max().unwrap_or_default().max(len)
}

fn next_id(last: &mut i32, collection: &'static str) -> Result<i32, CatalogError> {
    let id = last
        .checked_add(1)
        .ok_or(CatalogError::IdSpaceExhausted { collection })?;
    *last = id;
    Ok(id)
}

impl Catalog for MemoryCatalog {
    fn directors(&self) -> Vec<Director> {
        self.collections.read().directors.clone()
    }

    fn films(&self) -> Vec<Film> {
        self.collections.read().films.clone()
    }

    fn director(&self, id: i32) -> Option<Director> {
        find_director(&self.collections.read().directors, id).cloned()
    }

    fn film(&self, id: i32) -> Option<Film> {
        find_film(&self.collections.read().films, id).cloned()
    }

    fn films_by_director(&self, director_id: i32) -> Vec<Film> {
        films_directed_by(&self.collections.read().films, director_id)
            .cloned()
            .collect()
    }

    fn add_director(&self, name: String) -> Result<Director, CatalogError> {
        let mut collections = self.collections.write();
        let id = next_id(&mut collections.last_director_id, "directors")?;
        let director = Director { id, name };
        collections.directors.push(director.clone());
        tracing::debug!(id, name = %director.name, "added director");
        Ok(director)
    }

    fn add_film(&self, name: String, director_id: i32) -> Result<Film, CatalogError> {
        let mut collections = self.collections.write();
        if self.validate_director_references
            && find_director(&collections.directors, director_id).is_none()
        {
            return Err(CatalogError::UnknownDirector { id: director_id });
        }
        let id = next_id(&mut collections.last_film_id, "films")?;
        let film = Film {
            id,
            name,
            director_id,
        };
        collections.films.push(film.clone());
        tracing::debug!(id, director_id, name = %film.name, "added film");
        Ok(film)
    }
}
