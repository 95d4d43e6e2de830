pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod cqrs;
pub mod database;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod messaging;
pub mod middleware;
pub mod modules;
pub mod tenant;

pub use app::{build_app, AppState, Stores};
