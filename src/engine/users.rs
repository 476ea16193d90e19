// User directory - account creation and public profile lookup. Credential
// handling lives with the identity collaborator, not here.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::info;

use crate::core::types::UserId;
use crate::engine::{authz::Actor, load_active_user};
use crate::error::{AppError, AppResult};
use crate::models::{Lifecycle, PublicUser, Role, User};
use crate::store::{encode, EntityKind, EntityStore, Filter};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,32}$").expect("username pattern"));

#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn EntityStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        role: Option<Role>,
    ) -> AppResult<PublicUser> {
        if !USERNAME_RE.is_match(username) {
            return Err(AppError::Validation(
                "Username must be 3-32 letters, digits or underscores".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("A valid email is required".to_string()));
        }
        if self
            .store
            .exists(EntityKind::User, Filter::eq("username", username))
            .await?
        {
            return Err(AppError::Duplicate("Username already taken".to_string()));
        }

        let user = User {
            username: username.to_string(),
            email: email.to_string(),
            role: role.unwrap_or(Role::User),
            state: Lifecycle::Active,
        };
        let record = self.store.create(EntityKind::User, encode(&user)?).await?;
        info!(user = record.id, username, "user created");

        Ok(PublicUser {
            id: UserId::new(record.id),
            username: user.username,
            email: user.email,
        })
    }

    /// Public profile of an active user.
    pub async fn get_user(&self, id: UserId) -> AppResult<PublicUser> {
        let user = load_active_user(self.store.as_ref(), id).await?;
        Ok(PublicUser {
            id: UserId::new(user.id),
            username: user.node.username,
            email: user.node.email,
        })
    }

    /// Resolve a trusted identity into an [`Actor`]. Deactivated accounts
    /// do not resolve.
    pub async fn resolve_actor(&self, id: UserId) -> AppResult<Actor> {
        let user = load_active_user(self.store.as_ref(), id).await?;
        Ok(Actor {
            id: UserId::new(user.id),
            username: user.node.username,
            role: user.node.role,
        })
    }
}
