// Activity feed engine - records domain events and renders them into a
// human-readable, visibility-filtered feed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::core::types::{ActivityId, PostId, UserId};
use crate::engine::{graph, public_user};
use crate::error::AppResult;
use crate::models::{Activity, ActivityKind, Post, PublicUser};
use crate::store::{encode, EntityKind, EntityStore, Filter, Record, Stored};

/// Window of the global feed.
pub const FEED_LIMIT: usize = 100;
/// Window of the profile-scoped activity view.
pub const USER_ACTIVITY_LIMIT: usize = 50;

/// A rendered feed entry with display fields joined in.
#[derive(Debug, Serialize)]
pub struct FeedItem {
    pub id: ActivityId,
    pub kind: ActivityKind,
    pub message: String,
    pub actor: Option<PublicUser>,
    pub target_user: Option<PublicUser>,
    pub target_post: Option<PostPreview>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PostPreview {
    pub id: PostId,
    pub content: String,
}

#[derive(Clone)]
pub struct ActivityFeed {
    store: Arc<dyn EntityStore>,
}

impl ActivityFeed {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Append an activity. Pure append: activities are immutable once
    /// written, except for moderation toggling their visibility.
    pub async fn record(
        &self,
        actor: UserId,
        kind: ActivityKind,
        target_user: Option<UserId>,
        target_post: Option<PostId>,
        metadata: Value,
    ) -> AppResult<ActivityId> {
        let activity = Activity {
            actor,
            kind,
            target_user,
            target_post,
            metadata,
            visible: true,
        };
        let record = self
            .store
            .create(EntityKind::Activity, encode(&activity)?)
            .await?;
        Ok(ActivityId::new(record.id))
    }

    /// The global feed from `viewer`'s perspective: visible activities by
    /// actors the viewer has not blocked, newest first.
    pub async fn render_feed(
        &self,
        viewer: UserId,
        limit: Option<usize>,
    ) -> AppResult<Vec<FeedItem>> {
        let blocked = graph::blocked_ids(self.store.as_ref(), viewer).await?;
        let filter = Filter::and(vec![
            Filter::eq("visible", true),
            Filter::not_in("actor", blocked),
        ]);
        let records = self
            .store
            .find(EntityKind::Activity, filter, Some(limit.unwrap_or(FEED_LIMIT)))
            .await?;
        self.render(records).await
    }

    /// A single user's visible activity. Profile-scoped view: filtered by
    /// visibility only, with no blocked-set filter applied.
    pub async fn render_user_activity(
        &self,
        target: UserId,
        limit: Option<usize>,
    ) -> AppResult<Vec<FeedItem>> {
        let filter = Filter::and(vec![
            Filter::eq("actor", target),
            Filter::eq("visible", true),
        ]);
        let records = self
            .store
            .find(
                EntityKind::Activity,
                filter,
                Some(limit.unwrap_or(USER_ACTIVITY_LIMIT)),
            )
            .await?;
        self.render(records).await
    }

    async fn render(&self, records: Vec<Record>) -> AppResult<Vec<FeedItem>> {
        let mut items = Vec::with_capacity(records.len());
        for record in records {
            let activity: Stored<Activity> = record.decode()?;
            let actor = public_user(self.store.as_ref(), activity.node.actor).await?;
            let target_user = match activity.node.target_user {
                Some(id) => public_user(self.store.as_ref(), id).await?,
                None => None,
            };
            let target_post = match activity.node.target_post {
                Some(id) => self.post_preview(id).await?,
                None => None,
            };

            let actor_name = actor.as_ref().map(|u| u.username.as_str()).unwrap_or("someone");
            let target_name = target_user.as_ref().map(|u| u.username.as_str());
            let message = render_message(activity.node.kind, actor_name, target_name);

            items.push(FeedItem {
                id: ActivityId::new(activity.id),
                kind: activity.node.kind,
                message,
                actor,
                target_user,
                target_post,
                metadata: activity.node.metadata,
                created_at: activity.created_at,
            });
        }
        Ok(items)
    }

    async fn post_preview(&self, id: PostId) -> AppResult<Option<PostPreview>> {
        match self
            .store
            .find_one(EntityKind::Post, Filter::by_id(id.value()))
            .await?
        {
            Some(record) => {
                let post: Stored<Post> = record.decode()?;
                Ok(Some(PostPreview {
                    id,
                    content: post.node.content,
                }))
            }
            None => Ok(None),
        }
    }
}

/// Fixed message template table. Kinds without a template of their own
/// fall back to a generic line instead of failing.
fn render_message(kind: ActivityKind, actor: &str, target: Option<&str>) -> String {
    match kind {
        ActivityKind::PostCreated => format!("{actor} made a post"),
        ActivityKind::PostLiked => {
            format!("{actor} liked {}'s post", target.unwrap_or("someone"))
        }
        ActivityKind::UserFollowed => {
            format!("{actor} followed {}", target.unwrap_or("someone"))
        }
        _ => format!("{actor} performed an action"),
    }
}
