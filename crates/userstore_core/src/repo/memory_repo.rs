//! In-memory user repository.
//!
//! # Responsibility
//! - Provide a process-local backend keyed by `UserUniqueKey`.
//! - Enforce the uniqueness constraint atomically under concurrent writes.
//!
//! # Invariants
//! - The store only ever holds copies; every read returns another copy.
//! - Insert-if-absent happens under the write lock, so duplicate rejection
//!   and insert are one atomic step.
//! - A poisoned lock is absorbed; the store stays usable after a panicking
//!   writer.

use crate::model::user::{User, UserId, UserUniqueKey};
use crate::repo::user_repo::{RepoError, RepoResult, UserRepository};
use log::{error, warn};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

/// Map-backed repository keyed by unique key.
///
/// Keying on `UserUniqueKey` makes duplicate detection a map operation at
/// the cost of O(n) id lookups; uniqueness enforcement is the more important
/// property here.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserUniqueKey, User>>,
}

impl InMemoryUserRepository {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn create_user(&self, new_user: &User) -> RepoResult<User> {
        new_user.validate()?;

        let mut stored = new_user.clone();
        stored.id = Some(Uuid::new_v4());
        let key = stored.unique_key();

        let mut users = self
            .users
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match users.entry(key) {
            Entry::Occupied(entry) => {
                error!(
                    "event=user_create module=repo status=error error_code=duplicate_key key={}",
                    entry.key()
                );
                Err(RepoError::DuplicateKey(entry.key().clone()))
            }
            Entry::Vacant(slot) => {
                let created = stored.clone();
                slot.insert(stored);
                Ok(created)
            }
        }
    }

    /// O(n) scan: the map is keyed by unique key, not by id.
    fn get_user(&self, id: UserId) -> RepoResult<User> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users
            .values()
            .find(|user| user.id == Some(id))
            .cloned()
            .ok_or(RepoError::NotFound(id))
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.values().cloned().collect())
    }

    fn update_user(&self, user: &User) -> RepoResult<User> {
        user.validate()?;
        let id = user.id.ok_or_else(|| {
            RepoError::InvalidData("update requires a persisted user id".to_string())
        })?;

        let mut users = self
            .users
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let old_key = users
            .iter()
            .find(|(_, stored)| stored.id == Some(id))
            .map(|(key, _)| key.clone())
            .ok_or(RepoError::NotFound(id))?;

        let new_key = user.unique_key();
        if new_key != old_key && users.contains_key(&new_key) {
            error!(
                "event=user_update module=repo status=error error_code=duplicate_key key={new_key}"
            );
            return Err(RepoError::DuplicateKey(new_key));
        }

        users.remove(&old_key);
        users.insert(new_key, user.clone());
        Ok(user.clone())
    }

    fn delete_user(&self, user: &User) -> RepoResult<()> {
        let mut users = self
            .users
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if users.remove(&user.unique_key()).is_none() {
            warn!(
                "event=user_delete module=repo status=skipped reason=not_found key={}",
                user.unique_key()
            );
        }
        Ok(())
    }

    fn find_users_by_name(&self, name: &str) -> RepoResult<Vec<User>> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users
            .values()
            .filter(|user| user.name == name)
            .cloned()
            .collect())
    }
}
