//! `UserRepository` and `ClientRepository` ports, plus in-memory adapters.
//!
//! These are the "persistent storage of users [and] clients... abstracted
//! behind repository contracts" the specification calls out as an external
//! collaborator. The in-memory adapters here exist for tests and the demo
//! binary; they are not a durability claim.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::deadline::Deadline;
use crate::error::StoreError;
use crate::model::{Client, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str, deadline: Deadline) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid, deadline: Deadline) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid, deadline: Deadline) -> Result<Option<Client>, StoreError>;
}

/// Reference `UserRepository` backed by an in-process map.
#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Administrative CRUD: register a user. Not protocol surface.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str, deadline: Deadline) -> Result<Option<User>, StoreError> {
        if deadline.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid, deadline: Deadline) -> Result<Option<User>, StoreError> {
        if deadline.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        Ok(self.users.read().await.get(&id).cloned())
    }
}

/// Reference `ClientRepository` backed by an in-process map.
#[derive(Default, Clone)]
pub struct InMemoryClientRepository {
    clients: Arc<RwLock<HashMap<Uuid, Client>>>,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Administrative CRUD: register a client. Not protocol surface.
    pub async fn insert(&self, client: Client) {
        self.clients.write().await.insert(client.id, client);
    }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn find_by_id(&self, id: Uuid, deadline: Deadline) -> Result<Option<Client>, StoreError> {
        if deadline.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        Ok(self.clients.read().await.get(&id).cloned())
    }
}
