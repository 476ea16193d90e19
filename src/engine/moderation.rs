// Moderation engine - role transitions, account deactivation, and forced
// content removal. Every mutation passes through the authorization engine
// before it touches the store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::types::{LikeId, PostId, UserId};
use crate::engine::{
    authz::{self, ActionKind, Actor, ResourceRef},
    feed::ActivityFeed,
    load_user,
};
use crate::error::{AppError, AppResult};
use crate::models::{ActivityKind, Lifecycle, Like, Post, Role, User, STATUS_ACTIVE};
use crate::store::{EntityKind, EntityStore, Filter, Stored};

/// Admin-facing view of a user account.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Stored<User>> for UserView {
    fn from(user: Stored<User>) -> Self {
        UserView {
            id: UserId::new(user.id),
            username: user.node.username,
            email: user.node.email,
            role: user.node.role,
            active: user.node.state.is_active(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub total_users: i64,
    pub active_users: i64,
    pub total_posts: i64,
    pub active_posts: i64,
    pub total_likes: i64,
    pub total_activities: i64,
}

#[derive(Clone)]
pub struct Moderation {
    store: Arc<dyn EntityStore>,
    feed: ActivityFeed,
}

impl Moderation {
    pub fn new(store: Arc<dyn EntityStore>, feed: ActivityFeed) -> Self {
        Self { store, feed }
    }

    /// All user accounts, newest first.
    pub async fn list_users(&self) -> AppResult<Vec<UserView>> {
        let records = self.store.find(EntityKind::User, Filter::All, None).await?;
        records
            .into_iter()
            .map(|r| Ok(UserView::from(r.decode::<User>()?)))
            .collect()
    }

    /// Promote a user-tier account to admin. Owner-only.
    pub async fn promote(&self, actor: &Actor, target: UserId) -> AppResult<()> {
        self.require_owner(actor)?;
        let user = load_user(self.store.as_ref(), target).await?;
        if user.node.role >= Role::Admin {
            return Err(AppError::Validation("User is already an admin".to_string()));
        }
        self.set_role(user, Role::Admin).await?;
        info!(target = %target, by = %actor.id, "user promoted to admin");
        Ok(())
    }

    /// Demote an admin back to user tier. Owner-only; self-demotion is
    /// rejected outright.
    pub async fn demote(&self, actor: &Actor, target: UserId) -> AppResult<()> {
        self.require_owner(actor)?;
        if target == actor.id {
            return Err(AppError::SelfReference(
                "Cannot remove your own admin privileges".to_string(),
            ));
        }
        let user = load_user(self.store.as_ref(), target).await?;
        if user.node.role != Role::Admin {
            return Err(AppError::Validation("User is not an admin".to_string()));
        }
        self.set_role(user, Role::User).await?;
        info!(target = %target, by = %actor.id, "admin privileges removed");
        Ok(())
    }

    /// Deactivate an account (soft delete; no reactivation path). The
    /// recorded activity stays visible and therefore shows up in the
    /// public feed, matching the long-standing behavior of this API.
    pub async fn deactivate(&self, actor: &Actor, target: UserId) -> AppResult<()> {
        if target == actor.id {
            return Err(AppError::SelfReference(
                "Cannot deactivate your own account".to_string(),
            ));
        }
        let mut user = load_user(self.store.as_ref(), target).await?;
        authz::ensure(
            actor,
            ResourceRef::User {
                id: UserId::new(user.id),
                role: user.node.role,
            },
            ActionKind::Delete,
            "deactivate",
        )?;

        let username = user.node.username.clone();
        user.node.state = Lifecycle::deleted_by(actor.id);
        self.store
            .update(&user.to_record(EntityKind::User)?)
            .await?;

        self.feed
            .record(
                actor.id,
                ActivityKind::UserDeleted,
                Some(target),
                None,
                json!({ "deleted_by": actor.username, "deleted_user": username }),
            )
            .await?;

        warn!(target = %target, by = %actor.id, role = %actor.role, "user deactivated");
        Ok(())
    }

    /// Soft-delete any post, with the moderator stamped on the record.
    pub async fn force_delete_post(&self, actor: &Actor, post_id: PostId) -> AppResult<()> {
        let record = self
            .store
            .find_one(EntityKind::Post, Filter::by_id(post_id.value()))
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        let mut post: Stored<Post> = record.decode()?;

        authz::ensure(
            actor,
            ResourceRef::Post {
                owner: post.node.author,
            },
            ActionKind::Moderate,
            "moderate posts",
        )?;

        let author = post.node.author;
        post.node.state = Lifecycle::deleted_by(actor.id);
        self.store
            .update(&post.to_record(EntityKind::Post)?)
            .await?;

        let owner_name = match load_user(self.store.as_ref(), author).await {
            Ok(owner) => Some(owner.node.username),
            Err(_) => None,
        };
        self.feed
            .record(
                actor.id,
                ActivityKind::PostDeleted,
                Some(author),
                Some(post_id),
                json!({ "deleted_by": actor.username, "post_owner": owner_name }),
            )
            .await?;

        warn!(post = %post_id, by = %actor.id, "post removed by moderation");
        Ok(())
    }

    /// Soft-delete any like. Unlike post removal this leaves no activity
    /// behind; the re-like path in the content service still works because
    /// the record is only toggled, never duplicated.
    pub async fn force_delete_like(&self, actor: &Actor, like_id: LikeId) -> AppResult<()> {
        let record = self
            .store
            .find_one(EntityKind::Like, Filter::by_id(like_id.value()))
            .await?
            .ok_or_else(|| AppError::NotFound("Like not found".to_string()))?;
        let mut like: Stored<Like> = record.decode()?;

        authz::ensure(
            actor,
            ResourceRef::Like {
                owner: like.node.user,
            },
            ActionKind::Moderate,
            "moderate likes",
        )?;

        like.node.state = Lifecycle::deleted_by(actor.id);
        self.store
            .update(&like.to_record(EntityKind::Like)?)
            .await?;

        warn!(like = %like_id, by = %actor.id, "like removed by moderation");
        Ok(())
    }

    /// System counters, gathered concurrently.
    pub async fn stats(&self) -> AppResult<Stats> {
        let active = || Filter::eq("status", STATUS_ACTIVE);
        let (total_users, active_users, total_posts, active_posts, total_likes, total_activities) =
            tokio::try_join!(
                self.store.count(EntityKind::User, Filter::All),
                self.store.count(EntityKind::User, active()),
                self.store.count(EntityKind::Post, Filter::All),
                self.store.count(EntityKind::Post, active()),
                self.store.count(EntityKind::Like, active()),
                self.store.count(EntityKind::Activity, Filter::eq("visible", true)),
            )?;
        Ok(Stats {
            total_users,
            active_users,
            total_posts,
            active_posts,
            total_likes,
            total_activities,
        })
    }

    fn require_owner(&self, actor: &Actor) -> AppResult<()> {
        if actor.role == Role::Owner {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Owner privileges required".to_string(),
            ))
        }
    }

    async fn set_role(&self, mut user: Stored<User>, role: Role) -> AppResult<()> {
        user.node.role = role;
        self.store.update(&user.to_record(EntityKind::User)?).await?;
        Ok(())
    }
}
