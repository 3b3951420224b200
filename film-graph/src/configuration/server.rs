use std::net::SocketAddr;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 4000))
}

fn default_graphql_path() -> String {
    String::from("/graphql")
}

fn default_health_check_path() -> String {
    String::from("/health")
}

fn default_landing_page() -> bool {
    true
}

fn default_introspection() -> bool {
    true
}

/// Configuration options pertaining to the http server component.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Server {
    /// The socket address and port to listen on
    /// Defaults to 127.0.0.1:4000
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// The HTTP path on which GraphQL requests will be served.
    /// default: "/graphql"
    #[serde(default = "default_graphql_path")]
    pub graphql_path: String,

    /// healthCheck path
    /// default: "/health"
    #[serde(default = "default_health_check_path")]
    pub health_check_path: String,

    /// Serve GraphiQL on GET requests to the GraphQL path
    /// enabled by default
    #[serde(default = "default_landing_page")]
    pub landing_page: bool,

    /// introspection queries
    /// enabled by default
    #[serde(default = "default_introspection")]
    pub introspection: bool,
}

#[buildstructor::buildstructor]
impl Server {
    #[builder]
    pub fn new(
        listen: Option<SocketAddr>,
        graphql_path: Option<String>,
        health_check_path: Option<String>,
        landing_page: Option<bool>,
        introspection: Option<bool>,
    ) -> Self {
        Self {
            listen: listen.unwrap_or_else(default_listen),
            graphql_path: graphql_path.unwrap_or_else(default_graphql_path),
            health_check_path: health_check_path.unwrap_or_else(default_health_check_path),
            landing_page: landing_page.unwrap_or_else(default_landing_page),
            introspection: introspection.unwrap_or_else(default_introspection),
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::builder().build()
    }
}
