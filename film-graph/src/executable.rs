//! Main entry point for CLI command to start server.

use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::catalog::Catalog;
use crate::configuration::generate_config_schema;
use crate::configuration::Configuration;
use crate::graphql::build_schema;
use crate::router::FilmGraphServer;
use crate::router::ShutdownSource;

/// Options for the server
#[derive(Parser, Debug)]
#[clap(name = "film-graph", about = "GraphQL server for a catalog of directors and films")]
pub(crate) struct Opt {
    /// Log level (off|error|warn|info|debug|trace).
    #[clap(
        long = "log",
        default_value = "info",
        alias = "log-level",
        env = "FILM_GRAPH_LOG"
    )]
    log_level: String,

    /// Configuration location relative to the current directory.
    #[clap(short, long = "config", env = "FILM_GRAPH_CONFIG_PATH")]
    config_path: Option<PathBuf>,

    /// Address to listen on, overriding `server.listen`.
    #[clap(long, env = "FILM_GRAPH_LISTEN_ADDRESS")]
    listen: Option<SocketAddr>,

    /// Prints the configuration schema.
    #[clap(long)]
    schema: bool,

    /// Prints the GraphQL schema definition.
    #[clap(long)]
    sdl: bool,

    /// Display version and exit.
    #[clap(long, short = 'V')]
    version: bool,
}

/// This is the main entrypoint.
pub fn main() -> Result<()> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(nb) = std::env::var("FILM_GRAPH_NUM_CORES")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
    {
        builder.worker_threads(nb);
    }
    let runtime = builder.build()?;
    runtime.block_on(Executable::start(Opt::parse()))
}

/// Entry point into creating a server executable.
pub(crate) struct Executable {}

impl Executable {
    pub(crate) async fn start(opt: Opt) -> Result<()> {
        if opt.version {
            println!("{}", std::env!("CARGO_PKG_VERSION"));
            return Ok(());
        }

        if opt.schema {
            let schema = generate_config_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            return Ok(());
        }

        let builder = tracing_subscriber::fmt::fmt().with_env_filter(
            EnvFilter::try_new(&opt.log_level).context("could not parse log configuration")?,
        );
        if std::io::stdout().is_terminal() {
            builder.init();
        } else {
            builder.json().init();
        }

        let configuration = load_configuration(&opt)?;

        if opt.sdl {
            let catalog: Arc<dyn Catalog> = Arc::new(configuration.catalog.build_catalog()?);
            println!("{}", build_schema(catalog, &configuration).sdl());
            return Ok(());
        }

        tracing::info!("film-graph v{}", std::env!("CARGO_PKG_VERSION"));
        let mut server = FilmGraphServer::builder()
            .configuration(configuration)
            .shutdown(ShutdownSource::CtrlC)
            .start()
            .await?;
        if let Err(err) = server.wait().await {
            tracing::error!("{}", err);
            return Err(err.into());
        }
        tracing::info!("stopped");
        Ok(())
    }
}

fn load_configuration(opt: &Opt) -> Result<Configuration> {
    let mut configuration = match &opt.config_path {
        Some(path) => {
            let path = if path.is_relative() {
                std::env::current_dir()?.join(path)
            } else {
                path.clone()
            };
            Configuration::from_path(&path)
                .with_context(|| format!("could not load configuration from {}", path.display()))?
        }
        None => Configuration::default(),
    };
    if let Some(listen) = opt.listen {
        configuration.server.listen = listen;
    }
    Ok(configuration)
}
