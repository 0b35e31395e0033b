//! User store.
//!
//! The persistence layer is a collaborator of the pipeline, not part of it:
//! handlers only see the [`UserStore`] trait. [`MemoryStore`] is the
//! in-process implementation used by the binary and the tests.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    Invalid(String),

    #[error("store failure: {0}")]
    Internal(String),
}

/// A registered user. The password never leaves the process in a response.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
}

impl User {
    /// Field constraints enforced on creation.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.email.is_empty() || !self.email.contains('@') {
            return Err(StoreError::Invalid("email: must be a valid email address".into()));
        }
        let len = self.password.chars().count();
        if !(6..=100).contains(&len) {
            return Err(StoreError::Invalid("password: the length must be between 6 and 100".into()));
        }
        Ok(())
    }
}

/// Operations the handlers need from persistent storage.
///
/// Implementations must be safe to call from many requests at once.
pub trait UserStore: Send + Sync + 'static {
    /// Validates and stores `user`, assigning its id.
    fn create(&self, user: User) -> Result<User, StoreError>;

    fn find_by_email(&self, email: &str) -> Result<User, StoreError>;

    fn find_by_id(&self, id: &str) -> Result<User, StoreError>;

    /// Whether `password` matches the stored credential for `user`.
    fn compare_password(&self, user: &User, password: &str) -> bool;
}

/// Thread-safe in-memory store, keyed by id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryStore {
    fn create(&self, mut user: User) -> Result<User, StoreError> {
        user.validate()?;

        let mut users = self.users.write();
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Invalid("email: already registered".into()));
        }
        user.id = Uuid::new_v4().to_string();
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn find_by_id(&self, id: &str) -> Result<User, StoreError> {
        self.users.read().get(id).cloned().ok_or(StoreError::NotFound)
    }

    // Plain comparison: credential hashing belongs to a real store.
    fn compare_password(&self, user: &User, password: &str) -> bool {
        user.password == password
    }
}
