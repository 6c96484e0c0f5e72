//! Book catalog and recommendation core
//!
//! The library behind a book-cataloging and review application: domain
//! entities, an identifier-ordered in-memory inventory, a storage-agnostic
//! repository interface with in-memory and SQLite backends, and the
//! recommendation engine that ranks catalog books against a user's reading
//! list. The web layer consuming this crate lives elsewhere.

pub mod config;
pub mod error;
pub mod inventory;
pub mod models;
pub mod repository;
pub mod services;

pub use config::{Config, RepositoryKind};
pub use error::{AppError, AppResult};
pub use inventory::BooksInventory;
pub use models::{Author, Book, Publisher, ReadingList, Review, User};
pub use repository::{BookRepository, MemoryRepository, SqliteRepository};
pub use services::{Ranking, Recommender};

/// Initializes the tracing pipeline
///
/// Filter via `RUST_LOG`, e.g. `RUST_LOG=librarium=debug`. Safe to call
/// only once per process.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
