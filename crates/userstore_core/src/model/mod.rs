//! Domain model for the user directory.
//!
//! # Responsibility
//! - Define the canonical user record shared by every storage backend.
//! - Own field-level validation rules applied before any write.
//!
//! # Invariants
//! - A persisted user is identified by a stable, generated `UserId`.
//! - Uniqueness is defined by `UserUniqueKey`, never by `UserId`.

pub mod user;
