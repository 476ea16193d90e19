// Post and like operations. Likes are soft-delete toggles so a like that
// moderation removed can be re-applied without duplicating the edge.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::core::types::{PostId, UserId};
use crate::engine::{
    authz::{self, ActionKind, Actor, Decision, ResourceRef},
    feed::ActivityFeed,
    graph, public_user,
};
use crate::error::{AppError, AppResult};
use crate::models::{ActivityKind, Lifecycle, Like, Post, PublicUser, MAX_POST_LEN, STATUS_ACTIVE};
use crate::store::{encode, EntityKind, EntityStore, Filter, Stored};

/// Window of the post listing.
pub const POST_LIST_LIMIT: usize = 50;

/// Characters of post content kept in activity metadata.
const METADATA_PREVIEW_LEN: usize = 100;

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: PostId,
    pub author: Option<PublicUser>,
    pub content: String,
    pub like_count: i64,
    pub viewer_liked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn EntityStore>,
    feed: ActivityFeed,
}

fn active_post_filter(id: PostId) -> Filter {
    Filter::and(vec![
        Filter::by_id(id.value()),
        Filter::eq("status", STATUS_ACTIVE),
    ])
}

fn active_like_filter(user: UserId, post: PostId) -> Filter {
    Filter::and(vec![
        Filter::eq("user", user),
        Filter::eq("post", post),
        Filter::eq("status", STATUS_ACTIVE),
    ])
}

impl ContentService {
    pub fn new(store: Arc<dyn EntityStore>, feed: ActivityFeed) -> Self {
        Self { store, feed }
    }

    pub async fn create_post(&self, actor: &Actor, content: &str) -> AppResult<PostView> {
        if content.is_empty() {
            return Err(AppError::Validation("Post content is required".to_string()));
        }
        if content.chars().count() > MAX_POST_LEN {
            return Err(AppError::Validation(format!(
                "Post content exceeds {MAX_POST_LEN} characters"
            )));
        }

        let post = Post {
            author: actor.id,
            content: content.to_string(),
            state: Lifecycle::Active,
        };
        let record = self.store.create(EntityKind::Post, encode(&post)?).await?;

        let preview: String = content.chars().take(METADATA_PREVIEW_LEN).collect();
        self.feed
            .record(
                actor.id,
                ActivityKind::PostCreated,
                None,
                Some(PostId::new(record.id)),
                json!({ "post_id": record.id, "content": preview }),
            )
            .await?;

        info!(author = %actor.id, post = record.id, "post created");
        Ok(PostView {
            id: PostId::new(record.id),
            author: public_user(self.store.as_ref(), actor.id).await?,
            content: post.content,
            like_count: 0,
            viewer_liked: false,
            created_at: record.created_at,
        })
    }

    /// Active posts by authors the viewer has not blocked, newest first,
    /// each joined with its like count and the viewer's like status.
    pub async fn list_posts(&self, viewer: &Actor) -> AppResult<Vec<PostView>> {
        let blocked = graph::blocked_ids(self.store.as_ref(), viewer.id).await?;
        let filter = Filter::and(vec![
            Filter::eq("status", STATUS_ACTIVE),
            Filter::not_in("author", blocked),
        ]);
        let records = self
            .store
            .find(EntityKind::Post, filter, Some(POST_LIST_LIMIT))
            .await?;

        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let post: Stored<Post> = record.decode()?;
            let id = PostId::new(post.id);
            let like_count = self
                .store
                .count(
                    EntityKind::Like,
                    Filter::and(vec![
                        Filter::eq("post", id),
                        Filter::eq("status", STATUS_ACTIVE),
                    ]),
                )
                .await?;
            let viewer_liked = self
                .store
                .exists(EntityKind::Like, active_like_filter(viewer.id, id))
                .await?;
            views.push(PostView {
                id,
                author: public_user(self.store.as_ref(), post.node.author).await?,
                content: post.node.content,
                like_count,
                viewer_liked,
                created_at: post.created_at,
            });
        }
        Ok(views)
    }

    /// Like a post. If a soft-deleted like for this pair exists it is
    /// toggled back instead of creating a second edge.
    pub async fn like_post(&self, actor: &Actor, post_id: PostId) -> AppResult<()> {
        let post_record = self
            .store
            .find_one(EntityKind::Post, active_post_filter(post_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        let post: Stored<Post> = post_record.decode()?;

        let existing = self
            .store
            .find_one(
                EntityKind::Like,
                Filter::and(vec![
                    Filter::eq("user", actor.id),
                    Filter::eq("post", post_id),
                ]),
            )
            .await?;

        match existing {
            Some(record) => {
                let mut like: Stored<Like> = record.decode()?;
                if like.node.state.is_active() {
                    return Err(AppError::Duplicate("Already liked".to_string()));
                }
                like.node.state = Lifecycle::Active;
                self.store
                    .update(&record.with_data(encode(&like.node)?))
                    .await?;
            }
            None => {
                let like = Like {
                    user: actor.id,
                    post: post_id,
                    state: Lifecycle::Active,
                };
                self.store.create(EntityKind::Like, encode(&like)?).await?;
            }
        }

        self.feed
            .record(
                actor.id,
                ActivityKind::PostLiked,
                Some(post.node.author),
                Some(post_id),
                json!({ "post_id": post_id.value(), "liked_by": actor.username }),
            )
            .await?;
        Ok(())
    }

    /// Withdraw the actor's own active like. Not a feed event.
    pub async fn unlike_post(&self, actor: &Actor, post_id: PostId) -> AppResult<()> {
        let record = self
            .store
            .find_one(EntityKind::Like, active_like_filter(actor.id, post_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Like not found".to_string()))?;

        let mut like: Stored<Like> = record.decode()?;
        like.node.state = Lifecycle::deleted_by(actor.id);
        self.store
            .update(&record.with_data(encode(&like.node)?))
            .await?;
        Ok(())
    }

    /// Soft-delete a post. Allowed for its author and for moderators.
    pub async fn delete_post(&self, actor: &Actor, post_id: PostId) -> AppResult<()> {
        let record = self
            .store
            .find_one(EntityKind::Post, Filter::by_id(post_id.value()))
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        let mut post: Stored<Post> = record.decode()?;

        let resource = ResourceRef::Post {
            owner: post.node.author,
        };
        if let Decision::Deny(_) = authz::authorize(actor, resource, ActionKind::Delete) {
            return Err(AppError::Forbidden(
                "Not authorized to delete this post".to_string(),
            ));
        }

        post.node.state = Lifecycle::deleted_by(actor.id);
        self.store
            .update(&record.with_data(encode(&post.node)?))
            .await?;
        info!(post = %post_id, by = %actor.id, "post deleted");
        Ok(())
    }
}
