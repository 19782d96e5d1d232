//! Core domain logic for the user store.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::user::{User, UserId, UserUniqueKey, UserValidationError};
pub use repo::memory_repo::InMemoryUserRepository;
pub use repo::sqlite_repo::SqliteUserRepository;
pub use repo::user_repo::{RepoError, RepoResult, UserRepository};
pub use service::user_service::{UserService, UserServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
