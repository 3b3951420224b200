//! Serves a small GraphQL graph of film directors and their films.

#![warn(unreachable_pub)]

mod axum_factory;
pub mod catalog;
pub mod configuration;
mod executable;
pub mod graphql;
mod router;

pub use axum_factory::make_router;
pub use configuration::Configuration;
pub use executable::main;
pub use graphql::GraphQlService;
pub use router::FilmGraphError;
pub use router::FilmGraphServer;
pub use router::ShutdownSource;
