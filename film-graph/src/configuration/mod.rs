//! Logic for loading configuration in to an object model
mod cors;
mod expansion;
mod server;

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use displaydoc::Display;
use schemars::gen::SchemaSettings;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use self::cors::Cors;
pub(crate) use self::expansion::Expansion;
pub use self::server::Server;
use crate::catalog::CatalogError;
use crate::catalog::MemoryCatalog;
use crate::catalog::Seed;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not read configuration file '{path}': {error}
    CannotRead { path: String, error: std::io::Error },
    /// could not parse configuration: {0}
    InvalidYaml(serde_yaml::Error),
    /// could not deserialize configuration: {0}
    DeserializeConfigError(serde_json::Error),
    /// cannot expand '{key}': only env references are supported
    UnknownExpansionMode { key: String },
    /// could not expand variable: {key}, {cause}
    CannotExpandVariable { key: String, cause: String },
    /// FILM_GRAPH_CONFIG_ENV_PREFIX is not valid unicode
    InvalidEnvPrefix,
    /// {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
}

/// The configuration for the server.
///
/// Can be created through `serde::Deserialize` from various formats,
/// or inline in Rust code with `serde_json::json!` and `serde_json::from_value`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Configuration options pertaining to the http server component.
    pub server: Server,

    /// Limits applied to every operation before it executes.
    pub limits: Limits,

    /// Cross origin request headers.
    pub cors: Cors,

    /// Where the catalog gets its initial records and how appends are checked.
    pub catalog: CatalogConfig,

    /// Reject every mutation operation.
    /// This reduces the graph to its read-only query surface.
    pub forbid_mutations: bool,
}

#[buildstructor::buildstructor]
impl Configuration {
    #[builder]
    pub fn new(
        server: Option<Server>,
        limits: Option<Limits>,
        cors: Option<Cors>,
        catalog: Option<CatalogConfig>,
        forbid_mutations: Option<bool>,
    ) -> Self {
        Self {
            server: server.unwrap_or_default(),
            limits: limits.unwrap_or_default(),
            cors: cors.unwrap_or_default(),
            catalog: catalog.unwrap_or_default(),
            forbid_mutations: forbid_mutations.unwrap_or_default(),
        }
    }
}

impl Configuration {
    /// Read, expand and validate a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let source = fs::read_to_string(path).map_err(|error| ConfigurationError::CannotRead {
            path: path.display().to_string(),
            error,
        })?;
        tracing::debug!(path = %path.display(), "loading configuration");
        validate_yaml_configuration(&source, Expansion::from_env()?)
    }
}

/// Parse configuration from a string in YAML syntax, expanding `${env.NAME}` references.
impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_yaml_configuration(s, Expansion::from_env()?)
    }
}

pub(crate) fn validate_yaml_configuration(
    raw_yaml: &str,
    expansion: Expansion,
) -> Result<Configuration, ConfigurationError> {
    let yaml: Value = if raw_yaml.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(raw_yaml).map_err(ConfigurationError::InvalidYaml)?
    };
    // A file holding nothing but comments is a valid, empty configuration
    let yaml = match yaml {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    let expanded = expansion.expand(&yaml)?;
    let configuration: Configuration =
        serde_json::from_value(expanded).map_err(ConfigurationError::DeserializeConfigError)?;

    // Surface CORS mistakes now rather than when the server starts.
    configuration.cors.ensure_usable_cors_rules().map_err(|error| {
        ConfigurationError::InvalidConfiguration {
            message: "bad CORS configuration",
            error: error.to_string(),
        }
    })?;
    Ok(configuration)
}

/// Generate a JSON schema for the configuration.
pub fn generate_config_schema() -> RootSchema {
    let settings = SchemaSettings::draft07().with(|s| {
        s.option_nullable = true;
        s.option_add_null_type = false;
    });
    settings.into_generator().into_root_schema_for::<Configuration>()
}

/// Operation limits.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Limits {
    /// Maximum nesting depth of an operation. Unlimited when omitted.
    pub max_depth: Option<usize>,

    /// Maximum complexity (number of resolved fields) of an operation. Unlimited when omitted.
    pub max_complexity: Option<usize>,
}

/// Catalog configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct CatalogConfig {
    /// A YAML or JSON file holding the initial `directors` and `films`.
    /// The built-in tutorial records are used when omitted.
    pub seed_path: Option<PathBuf>,

    /// Reject `addFilm` when `directorId` does not match an existing director.
    /// Off by default: such films are stored and their `director` resolves to null.
    pub validate_director_references: bool,
}

impl CatalogConfig {
    pub(crate) fn build_catalog(&self) -> Result<MemoryCatalog, CatalogError> {
        let seed = self
            .seed_path
            .as_deref()
            .map(Seed::from_path)
            .transpose()?;
        Ok(MemoryCatalog::builder()
            .and_seed(seed)
            .validate_director_references(self.validate_director_references)
            .build())
    }
}
