use std::sync::Arc;

use crate::database::EntityStore;
use crate::error::{Error, Result};
use crate::models::user::{NewUser, User};
use crate::utils::crypto;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn EntityStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Duplicate usernames fail with `Conflict`.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        name: Option<String>,
        resume_text: Option<String>,
    ) -> Result<User> {
        let password_hash = crypto::hash_password(password)?;
        let user = self
            .store
            .create_user(NewUser {
                username: username.to_string(),
                password_hash,
                name,
                resume_text,
            })
            .await?;
        tracing::info!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {} not found", id)))
    }
}
