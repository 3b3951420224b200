//! Cross Origin Resource Sharing (CORS configuration)

use std::str::FromStr;

use http::header::CONTENT_TYPE;
use http::HeaderValue;
use http::Method;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;

/// Cross origin request configuration.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct Cors {
    /// Set to true to allow any origin.
    pub allow_any_origin: bool,

    /// The origin(s) to allow requests from.
    /// Defaults to none: browsers on other origins are refused.
    pub origins: Vec<String>,

    /// Allowed request methods. Defaults to GET, POST, OPTIONS.
    pub methods: Vec<String>,
}

impl Default for Cors {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_cors_methods() -> Vec<String> {
    vec!["GET".into(), "POST".into(), "OPTIONS".into()]
}

#[buildstructor::buildstructor]
impl Cors {
    #[builder]
    pub fn new(
        allow_any_origin: Option<bool>,
        origins: Option<Vec<String>>,
        methods: Option<Vec<String>>,
    ) -> Self {
        Self {
            allow_any_origin: allow_any_origin.unwrap_or_default(),
            origins: origins.unwrap_or_default(),
            methods: methods.unwrap_or_else(default_cors_methods),
        }
    }
}

impl Cors {
    pub(crate) fn into_layer(self) -> Result<CorsLayer, String> {
        self.ensure_usable_cors_rules()?;
        let methods = self
            .methods
            .iter()
            .map(|method| {
                Method::from_str(method).map_err(|_| format!("invalid method '{method}'"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let allow_origin = if self.allow_any_origin {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(
                self.origins
                    .iter()
                    .map(|origin| {
                        HeaderValue::from_str(origin)
                            .map_err(|_| format!("origin '{origin}' is not a valid header value"))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            )
        };
        Ok(CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(methods)
            .allow_headers([CONTENT_TYPE]))
    }

    // tower-http panics on a wildcard inside an origin list, report it instead.
    pub(crate) fn ensure_usable_cors_rules(&self) -> Result<(), &'static str> {
        if self.origins.iter().any(|origin| origin == "*") {
            return Err(
                "Invalid CORS configuration: use `allow_any_origin: true` to set `Access-Control-Allow-Origin: *`",
            );
        }
        if self.methods.iter().any(|method| method == "*") {
            return Err("Invalid CORS configuration: list the allowed methods explicitly");
        }
        Ok(())
    }
}
