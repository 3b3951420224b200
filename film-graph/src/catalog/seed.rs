use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use super::CatalogError;
use super::Director;
use super::Film;

/// The records a catalog starts out with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Seed {
    pub directors: Vec<Director>,
    pub films: Vec<Film>,
}

impl Seed {
    /// Three directors and seven films. Two of the films share id 6.
    pub fn tutorial() -> Self {
        let directors = [
            (1, "Michael Haneke"),
            (2, "Paul Thomas Anderson"),
            (3, "Lynn Ramsay"),
        ]
        .into_iter()
        .map(|(id, name)| Director {
            id,
            name: name.to_string(),
        })
        .collect();

        let films = [
            (1, "The White Ribbon", 1),
            (2, "The Piano Teacher", 1),
            (3, "Amour", 1),
            (4, "You Were Never Really Here", 3),
            (5, "Morven Callar", 3),
            (6, "Hard Eight", 2),
            (6, "Punch Drunk Love", 2),
        ]
        .into_iter()
        .map(|(id, name, director_id)| Film {
            id,
            name: name.to_string(),
            director_id,
        })
        .collect();

        Self { directors, films }
    }

    /// Parse a seed from YAML. JSON is accepted as well, being a subset of YAML.
    pub fn from_yaml(source: &str) -> Result<Self, CatalogError> {
        serde_yaml::from_str(source).map_err(CatalogError::SeedParse)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let source = fs::read_to_string(path).map_err(CatalogError::SeedRead)?;
        Self::from_yaml(&source)
    }
}
