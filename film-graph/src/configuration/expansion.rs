//! `${env.NAME}` expansion in configuration values

#[cfg(test)]
use std::collections::HashMap;
use std::env;
use std::env::VarError;

use serde_json::Value;

use super::ConfigurationError;

const ENV_MODE: &str = "env.";

/// Replaces `${env.NAME}` references in every string of a configuration document.
///
/// With a `prefix`, `${env.NAME}` reads `PREFIX_NAME` instead.
#[derive(buildstructor::Builder, Clone)]
pub(crate) struct Expansion {
    prefix: Option<String>,
    #[cfg(test)]
    mocked_env_vars: HashMap<String, String>,
}

impl Expansion {
    /// Reads the prefix from `FILM_GRAPH_CONFIG_ENV_PREFIX`.
    pub(crate) fn from_env() -> Result<Self, ConfigurationError> {
        let prefix = match env::var("FILM_GRAPH_CONFIG_ENV_PREFIX") {
            Ok(prefix) => Some(prefix),
            Err(VarError::NotPresent) => None,
            Err(VarError::NotUnicode(_)) => return Err(ConfigurationError::InvalidEnvPrefix),
        };
        Ok(Expansion::builder().and_prefix(prefix).build())
    }

    pub(crate) fn expand(&self, configuration: &Value) -> Result<Value, ConfigurationError> {
        let mut configuration = configuration.clone();
        self.expand_in_place(&mut configuration)?;
        Ok(configuration)
    }

    fn expand_in_place(&self, value: &mut Value) -> Result<(), ConfigurationError> {
        let replacement = match value {
            Value::Array(items) => {
                return items
                    .iter_mut()
                    .try_for_each(|item| self.expand_in_place(item))
            }
            Value::Object(fields) => {
                return fields
                    .values_mut()
                    .try_for_each(|field| self.expand_in_place(field))
            }
            Value::String(raw) => {
                let expanded = shellexpand::env_with_context(raw.as_str(), |key| self.lookup(key))
                    .map_err(|err| err.cause)?;
                // An expanded value may stand for a bool, a number or null
                (expanded != raw.as_str()).then(|| coerce(&expanded))
            }
            _ => None,
        };
        if let Some(replacement) = replacement {
            *value = replacement;
        }
        Ok(())
    }

    fn lookup(&self, key: &str) -> Result<Option<String>, ConfigurationError> {
        let name = key
            .strip_prefix(ENV_MODE)
            .ok_or_else(|| ConfigurationError::UnknownExpansionMode {
                key: key.to_string(),
            })?;
        let name = match &self.prefix {
            Some(prefix) => format!("{prefix}_{name}"),
            None => name.to_string(),
        };
        self.var(&name)
            .map(Some)
            .map_err(|cause| ConfigurationError::CannotExpandVariable {
                key: name,
                cause: cause.to_string(),
            })
    }

    fn var(&self, name: &str) -> Result<String, VarError> {
        #[cfg(test)]
        if let Some(value) = self.mocked_env_vars.get(name) {
            return Ok(value.clone());
        }
        env::var(name)
    }
}

pub(crate) fn coerce(expanded: &str) -> Value {
    match serde_yaml::from_str(expanded) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::Null)) => value,
        _ => Value::String(expanded.to_string()),
    }
}
