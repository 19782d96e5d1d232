//! User use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points over any repository implementation.
//! - Serialize delete/update read-modify-write sequences.
//! - Guard the uniqueness identity against in-place changes.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Unique-key fields cannot change through update; delete and recreate is
//!   the supported path.
//! - The stored id always wins over whatever id the update payload carries.

use crate::model::user::{User, UserUniqueKey, UserValidationError};
use crate::repo::user_repo::{RepoError, UserRepository};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Service error for user use-cases.
#[derive(Debug)]
pub enum UserServiceError {
    /// No user matches the requested id (including unparseable ids).
    UserNotFound(String),
    /// Update attempted to change unique-key fields in place.
    UniqueKeyChange(UserUniqueKey),
    /// Another user already owns the unique key.
    DuplicateUser(UserUniqueKey),
    /// Field constraints rejected the payload.
    Validation(UserValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::UniqueKeyChange(key) => write!(
                f,
                "unique key fields cannot change on update ({key}); delete the user first, then recreate it with the updated fields"
            ),
            Self::DuplicateUser(key) => {
                write!(f, "user with such unique key already exists: {key}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::UserNotFound(id.to_string()),
            RepoError::DuplicateKey(key) => Self::DuplicateUser(key),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Use-case service wrapper for user CRUD operations.
pub struct UserService<R: UserRepository> {
    repo: R,
    // Serializes lookup-then-mutate sequences in delete/update so two
    // writers cannot interleave between the read and the write.
    modify_lock: Mutex<()>,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            modify_lock: Mutex::new(()),
        }
    }

    /// Creates a new user through repository persistence.
    pub fn create_user(&self, new_user: &User) -> Result<User, UserServiceError> {
        Ok(self.repo.create_user(new_user)?)
    }

    /// Lists all users.
    pub fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repo.list_users()?)
    }

    /// Gets one user by its raw id string.
    ///
    /// An id that does not parse as a UUID can match nothing and is reported
    /// as not found, same as an unknown id.
    pub fn get_user(&self, id: &str) -> Result<User, UserServiceError> {
        let user_id = parse_user_id(id)?;
        Ok(self.repo.get_user(user_id)?)
    }

    /// Deletes a user by its raw id string.
    ///
    /// A missing user is tolerated: the outcome (user absent) already holds,
    /// so the method logs and returns `Ok`.
    pub fn delete_user(&self, id: &str) -> Result<(), UserServiceError> {
        let _guard = self
            .modify_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let user_id = match parse_user_id(id) {
            Ok(user_id) => user_id,
            Err(_) => {
                warn!("event=user_delete module=service status=skipped reason=not_found id={id}");
                return Ok(());
            }
        };

        match self.repo.get_user(user_id) {
            Ok(user) => Ok(self.repo.delete_user(&user)?),
            Err(RepoError::NotFound(_)) => {
                warn!("event=user_delete module=service status=skipped reason=not_found id={id}");
                Ok(())
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Updates an existing user addressed by its raw id string.
    ///
    /// The stored id is pinned onto the payload before delegation, so update
    /// can never re-home a record under a different id.
    pub fn update_user(&self, id: &str, updated_user: &User) -> Result<User, UserServiceError> {
        let _guard = self
            .modify_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let user_id = parse_user_id(id)?;
        let old_user = self.repo.get_user(user_id)?;

        if old_user.unique_key() != updated_user.unique_key() {
            return Err(UserServiceError::UniqueKeyChange(updated_user.unique_key()));
        }

        let mut to_store = updated_user.clone();
        to_store.id = old_user.id;
        Ok(self.repo.update_user(&to_store)?)
    }

    /// Finds users by exact name match.
    pub fn find_users_by_name(&self, name: &str) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repo.find_users_by_name(name)?)
    }
}

fn parse_user_id(id: &str) -> Result<Uuid, UserServiceError> {
    Uuid::parse_str(id).map_err(|_| UserServiceError::UserNotFound(id.to_string()))
}
