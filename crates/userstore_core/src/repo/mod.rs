//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage-agnostic user persistence contract.
//! - Isolate map and SQLite details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `User::validate()` before persistence.
//! - Duplicate-key rejection is atomic with the insert in every backend.
//! - Repository reads hand out copies, never references to stored state.

pub mod memory_repo;
pub mod sqlite_repo;
pub mod user_repo;
