//! Server lifecycle: bind the listener, serve the graph, shut down gracefully.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use displaydoc::Display;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::BoxError;

use crate::axum_factory::make_router;
use crate::catalog::Catalog;
use crate::catalog::CatalogError;
use crate::configuration::Configuration;
use crate::graphql::GraphQlService;

/// Error types for the server.
#[derive(Error, Debug, Display)]
#[non_exhaustive]
pub enum FilmGraphError {
    /// could not create the catalog: {0}
    CatalogCreationError(CatalogError),

    /// could not create router: {0}
    ServiceCreationError(BoxError),

    /// could not create the HTTP server: {0}
    ServerCreationError(std::io::Error),

    /// failed to stop HTTP Server
    HttpServerLifecycleError,

    /// tried to register two endpoints on `{0}`
    SameRouteUsedTwice(String),

    /// route `{0}` must start with a `/`
    InvalidRoute(String),
}

type ShutdownFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// When the server should gracefully shut down.
#[non_exhaustive]
pub enum ShutdownSource {
    /// No graceful shutdown
    None,

    /// A custom shutdown future.
    Custom(ShutdownFuture),

    /// Watch for Ctl-C signal.
    CtrlC,
}

impl ShutdownSource {
    async fn wait(self) {
        match self {
            ShutdownSource::None => std::future::pending::<()>().await,
            ShutdownSource::Custom(future) => future.await,
            ShutdownSource::CtrlC => ctrl_c_or_terminate().await,
        }
    }
}

async fn ctrl_c_or_terminate() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::signal;
        use tokio::signal::unix::SignalKind;

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(err) => tracing::warn!("could not install SIGTERM signal handler: {err}"),
        }
    }

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("could not install CTRL+C signal handler: {err}");
        std::future::pending::<()>().await
    }
}

/// A running server.
///
/// Dropping the handle triggers a graceful shutdown.
pub struct FilmGraphServer {
    listen_address: SocketAddr,
    graphql_path: String,
    result: JoinHandle<std::io::Result<()>>,
    shutdown_sender: Option<oneshot::Sender<()>>,
}

#[buildstructor::buildstructor]
impl FilmGraphServer {
    /// Returns a builder that binds the listener and serves the graph in a separate Tokio task.
    ///
    /// Builder methods:
    ///
    /// * `.configuration(Configuration)`
    ///   Optional. Defaults to the configuration of an empty YAML file.
    ///
    /// * `.catalog(Arc<dyn Catalog>)`
    ///   Optional. Defaults to a [`MemoryCatalog`](crate::catalog::MemoryCatalog) built from
    ///   the `catalog` section of the configuration.
    ///
    /// * `.shutdown(ShutdownSource)`
    ///   Optional. Defaults to [`ShutdownSource::CtrlC`].
    ///
    /// * `.start()`
    ///   Binds `server.listen` and returns the handle once the server accepts connections.
    #[builder(visibility = "pub", entry = "builder", exit = "start")]
    async fn start(
        configuration: Option<Configuration>,
        catalog: Option<Arc<dyn Catalog>>,
        shutdown: Option<ShutdownSource>,
    ) -> Result<FilmGraphServer, FilmGraphError> {
        let configuration = configuration.unwrap_or_default();
        let catalog: Arc<dyn Catalog> = match catalog {
            Some(catalog) => catalog,
            None => Arc::new(
                configuration
                    .catalog
                    .build_catalog()
                    .map_err(FilmGraphError::CatalogCreationError)?,
            ),
        };
        let service = GraphQlService::new(catalog, &configuration);
        let app = make_router(service, &configuration)?;

        let listener = TcpListener::bind(configuration.server.listen)
            .await
            .map_err(FilmGraphError::ServerCreationError)?;
        let listen_address = listener
            .local_addr()
            .map_err(FilmGraphError::ServerCreationError)?;

        let (shutdown_sender, shutdown_receiver) = oneshot::channel::<()>();
        let shutdown = shutdown.unwrap_or(ShutdownSource::CtrlC);
        let result = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    tokio::select! {
                        _ = shutdown.wait() => {}
                        _ = shutdown_receiver => {}
                    }
                    tracing::info!("shutting down");
                })
                .await
        });

        let graphql_path = configuration.server.graphql_path;
        tracing::info!("GraphQL endpoint exposed at http://{listen_address}{graphql_path} 🚀");
        Ok(FilmGraphServer {
            listen_address,
            graphql_path,
            result,
            shutdown_sender: Some(shutdown_sender),
        })
    }

    /// The address the server is bound to. Useful when `server.listen` asks for port 0.
    pub fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// The full URL of the GraphQL endpoint.
    pub fn graphql_url(&self) -> String {
        format!("http://{}{}", self.listen_address, self.graphql_path)
    }

    /// Wait until the server stops, which happens once the shutdown source fires.
    pub async fn wait(&mut self) -> Result<(), FilmGraphError> {
        match (&mut self.result).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(FilmGraphError::ServerCreationError(err)),
            Err(err) => {
                tracing::error!("{}", err);
                Err(FilmGraphError::HttpServerLifecycleError)
            }
        }
    }

    /// Trigger and wait for graceful shutdown
    pub async fn shutdown(&mut self) -> Result<(), FilmGraphError> {
        if let Some(sender) = self.shutdown_sender.take() {
            let _ = sender.send(());
        }
        self.wait().await
    }
}

impl Drop for FilmGraphServer {
    fn drop(&mut self) {
        if let Some(sender) = self.shutdown_sender.take() {
            let _ = sender.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Server;

    fn ephemeral() -> Configuration {
        Configuration::builder()
            .server(
                Server::builder()
                    .listen(SocketAddr::from(([127, 0, 0, 1], 0)))
                    .build(),
            )
            .build()
    }

    #[tokio::test]
    async fn it_binds_an_ephemeral_port_and_shuts_down() {
        let mut server = FilmGraphServer::builder()
            .configuration(ephemeral())
            .shutdown(ShutdownSource::None)
            .start()
            .await
            .unwrap();
        assert_ne!(server.listen_address().port(), 0);
        assert!(server.graphql_url().ends_with("/graphql"));
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn a_custom_shutdown_future_stops_the_server() {
        let (sender, receiver) = oneshot::channel::<()>();
        let mut server = FilmGraphServer::builder()
            .configuration(ephemeral())
            .shutdown(ShutdownSource::Custom(Box::pin(async move {
                let _ = receiver.await;
            })))
            .start()
            .await
            .unwrap();
        sender.send(()).unwrap();
        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn a_missing_seed_file_fails_startup() {
        let mut configuration = ephemeral();
        configuration.catalog.seed_path = Some("/does/not/exist.yaml".into());
        let err = FilmGraphServer::builder()
            .configuration(configuration)
            .start()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, FilmGraphError::CatalogCreationError(_)));
    }
}
