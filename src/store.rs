//! User persistence.
//!
//! Handlers talk to a [`UserStore`] trait object so the backing storage can be
//! swapped without touching the HTTP layer. [`MemoryUserStore`] is the only
//! implementation shipped; it keeps everything in a sharded concurrent map.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};

/// A user record as stored and as returned over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user `{0}` not found")]
    NotFound(String),

    #[error("user `{0}` already exists")]
    AlreadyExists(String),

    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage backend for [`User`] records.
///
/// Implementations must be thread-safe (Send + Sync); a single instance is
/// shared by every request through `Arc<dyn UserStore>`.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Cheap connectivity check used by the readiness probe.
    async fn ping(&self) -> Result<()>;

    async fn get(&self, id: &str) -> Result<User>;

    /// Fails with [`StoreError::AlreadyExists`] if `user.id` is taken.
    async fn insert(&self, user: User) -> Result<()>;

    /// Replaces the name of an existing user.
    async fn update(&self, user: User) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory [`UserStore`].
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<String, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<User> {
        self.users
            .get(id)
            .map(|u| u.value().clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn insert(&self, user: User) -> Result<()> {
        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(user.id)),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    async fn update(&self, user: User) -> Result<()> {
        match self.users.get_mut(&user.id) {
            Some(mut existing) => {
                existing.name = user.name;
                Ok(())
            }
            None => Err(StoreError::NotFound(user.id)),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.users
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
