//! User domain model.
//!
//! # Responsibility
//! - Define the canonical user record and its uniqueness identity.
//! - Validate field constraints before records reach a repository.
//!
//! # Invariants
//! - `id` is assigned by the repository on create and never reused.
//! - `UserUniqueKey` excludes `id`: ids are generated, hence always unique.
//! - Validation limits: `name` <= 100 chars, 1..=100 roles, well-formed email.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a persisted user.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type UserId = Uuid;

pub const NAME_MAX_CHARS: usize = 100;
pub const ROLES_MIN: usize = 1;
pub const ROLES_MAX: usize = 100;

// Intentionally lax: one `@` with non-empty, whitespace-free sides. Stricter
// address policy belongs to the boundary that accepts the request.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

/// Canonical user record.
///
/// `id` is `None` until a repository persists the record and assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable global ID, generated on create.
    pub id: Option<UserId>,
    /// Display name, at most 100 characters.
    pub name: String,
    /// Contact address; the uniqueness identity of the user.
    pub email: String,
    /// Assigned role names, between 1 and 100 entries.
    pub roles: Vec<String>,
}

impl User {
    /// Creates an unpersisted user record (`id = None`).
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        roles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Checks field constraints.
    ///
    /// Repositories call this before every write; callers may use it earlier
    /// to fail fast.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        let name_chars = self.name.chars().count();
        if name_chars > NAME_MAX_CHARS {
            return Err(UserValidationError::NameTooLong {
                chars: name_chars,
                max: NAME_MAX_CHARS,
            });
        }

        if !EMAIL_RE.is_match(&self.email) {
            return Err(UserValidationError::InvalidEmail(self.email.clone()));
        }

        if self.roles.len() < ROLES_MIN || self.roles.len() > ROLES_MAX {
            return Err(UserValidationError::RoleCountOutOfRange {
                count: self.roles.len(),
                min: ROLES_MIN,
                max: ROLES_MAX,
            });
        }

        Ok(())
    }

    /// Returns the uniqueness identity of this record.
    pub fn unique_key(&self) -> UserUniqueKey {
        UserUniqueKey::from(self)
    }
}

/// Field-level constraint violation detected by [`User::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    NameTooLong { chars: usize, max: usize },
    InvalidEmail(String),
    RoleCountOutOfRange { count: usize, min: usize, max: usize },
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameTooLong { chars, max } => {
                write!(f, "name is {chars} characters long, maximum is {max}")
            }
            Self::InvalidEmail(email) => write!(f, "invalid email address: `{email}`"),
            Self::RoleCountOutOfRange { count, min, max } => {
                write!(f, "user has {count} roles, expected between {min} and {max}")
            }
        }
    }
}

impl Error for UserValidationError {}

/// Uniqueness identity for [`User`] records.
///
/// Duplicate detection keys on this value, not on `UserId`. Currently it
/// holds only the email address but can grow more fields without changing
/// repository contracts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserUniqueKey {
    email: String,
}

impl UserUniqueKey {
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl From<&User> for UserUniqueKey {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
        }
    }
}

impl Display for UserUniqueKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "email={}", self.email)
    }
}
