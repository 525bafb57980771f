/// Blog Service Library
///
/// A small blogging backend: users publish posts (optionally filed under a
/// group), comment on posts and follow authors to get a personal feed. The
/// first page of the home listing is served from a short-lived cache.
///
/// # Modules
///
/// - `db`: entity store trait with PostgreSQL and in-process backends
/// - `services`: posts, comments, follows, users, groups
/// - `handlers` / `routes`: actix-web HTTP surface
/// - `cache`: home page cache
/// - `pagination`: page slicing for listings
/// - `media`: uploaded post images on disk
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
