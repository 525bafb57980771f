/// User service - registration, credential checks and lookups
use crate::db::EntityStore;
use crate::error::{AppError, Result};
use crate::models::{NewUser, SignupForm, User};
use crate::security::{hash_password, verify_password};
use std::sync::Arc;
use tracing::{info, warn};

pub struct UserService {
    store: Arc<dyn EntityStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Register a new account. Fails with `Conflict` when the username is taken.
    pub async fn register(&self, form: &SignupForm) -> Result<User> {
        let form = form.clean()?;
        if self
            .store
            .find_user_by_username(&form.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "username '{}' is already taken",
                form.username
            )));
        }

        let password_hash = hash_password(&form.password)?;
        let user = self
            .store
            .create_user(NewUser {
                username: form.username,
                first_name: form.first_name,
                last_name: form.last_name,
                email: form.email,
                password_hash,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Unknown user and wrong password are indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let Some(user) = self.store.find_user_by_username(username).await? else {
            warn!(username, "login for unknown user");
            return Err(AppError::InvalidCredentials);
        };

        verify_password(password, &user.password_hash)?;
        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User> {
        self.store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{}'", username)))
    }
}
