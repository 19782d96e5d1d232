//! User repository contract and shared error types.
//!
//! # Responsibility
//! - Define CRUD operations every storage backend must provide.
//! - Keep backend-specific failures behind one semantic error enum.
//!
//! # Invariants
//! - `create_user` assigns the id; callers never pick ids.
//! - Uniqueness is keyed on `UserUniqueKey`, enforced atomically on insert.

use crate::db::DbError;
use crate::model::user::{User, UserId, UserUniqueKey, UserValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for user persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(UserValidationError),
    Db(DbError),
    NotFound(UserId),
    DuplicateKey(UserUniqueKey),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::DuplicateKey(key) => {
                write!(f, "user with such unique key already exists: {key}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::DuplicateKey(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for user CRUD operations.
///
/// Backends may differ in role ordering: the SQLite implementation returns
/// roles sorted by name and deduplicated, the in-memory one preserves caller
/// order.
pub trait UserRepository {
    /// Creates a new user, assigning a fresh random id.
    ///
    /// Persists a copy of the input so later caller-side changes never reach
    /// the store. The duplicate check and the insert are a single atomic
    /// step; a taken unique key yields `RepoError::DuplicateKey`.
    fn create_user(&self, new_user: &User) -> RepoResult<User>;

    /// Gets one user by id. Returns `RepoError::NotFound` when absent.
    fn get_user(&self, id: UserId) -> RepoResult<User>;

    /// Lists all users as detached copies.
    fn list_users(&self) -> RepoResult<Vec<User>>;

    /// Replaces an existing user addressed by its persisted id.
    ///
    /// Returns `RepoError::InvalidData` when `user.id` is `None`,
    /// `RepoError::NotFound` for an unknown id and `RepoError::DuplicateKey`
    /// when the new unique key belongs to a different user.
    fn update_user(&self, user: &User) -> RepoResult<User>;

    /// Deletes a user by its unique key. Deleting an absent user is a no-op.
    fn delete_user(&self, user: &User) -> RepoResult<()>;

    /// Finds users by exact, case-sensitive name match.
    fn find_users_by_name(&self, name: &str) -> RepoResult<Vec<User>>;
}
