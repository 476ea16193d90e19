// Domain engines. Each engine is a thin, cloneable handle over the shared
// entity store; all state lives in the store.

pub mod authz;
pub mod content;
pub mod feed;
pub mod graph;
pub mod moderation;
pub mod users;

use crate::core::types::UserId;
use crate::error::{AppError, AppResult};
use crate::models::{PublicUser, User};
use crate::store::{EntityKind, EntityStore, Filter, Stored};

pub use authz::{Actor, ActionKind, Decision, DenyReason, ResourceRef};
pub use content::ContentService;
pub use feed::ActivityFeed;
pub use graph::RelationshipGraph;
pub use moderation::Moderation;
pub use users::UserDirectory;

/// Load a user record by id, deactivated or not.
pub(crate) async fn load_user(
    store: &dyn EntityStore,
    id: UserId,
) -> AppResult<Stored<User>> {
    store
        .find_one(EntityKind::User, Filter::by_id(id.value()))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
        .decode()
}

/// Load a user record, treating a deactivated account as absent.
pub(crate) async fn load_active_user(
    store: &dyn EntityStore,
    id: UserId,
) -> AppResult<Stored<User>> {
    let user = load_user(store, id).await?;
    if !user.node.state.is_active() {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(user)
}

/// Public display fields for a user id, `None` if the record is gone.
/// Deactivated users still resolve; historical joins keep their names.
pub(crate) async fn public_user(
    store: &dyn EntityStore,
    id: UserId,
) -> AppResult<Option<PublicUser>> {
    match store
        .find_one(EntityKind::User, Filter::by_id(id.value()))
        .await?
    {
        Some(record) => {
            let user: Stored<User> = record.decode()?;
            Ok(Some(PublicUser {
                id: UserId::new(user.id),
                username: user.node.username,
                email: user.node.email,
            }))
        }
        None => Ok(None),
    }
}
