// Relationship graph manager - sole owner of the follow/block edge set.
// Other components read the edges through it; nobody else writes them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::core::types::UserId;
use crate::engine::{authz::Actor, feed::ActivityFeed, load_active_user, public_user};
use crate::error::{AppError, AppResult};
use crate::models::{ActivityKind, Block, Follow, PublicUser};
use crate::store::{encode, EntityKind, EntityStore, Filter};

/// A follow edge joined with the counterpart user's public fields.
#[derive(Debug, Serialize)]
pub struct FollowEdgeView {
    pub user: PublicUser,
    pub since: DateTime<Utc>,
}

#[derive(Clone)]
pub struct RelationshipGraph {
    store: Arc<dyn EntityStore>,
    feed: ActivityFeed,
}

fn edge_filter(follower: UserId, following: UserId) -> Filter {
    Filter::and(vec![
        Filter::eq("follower", follower),
        Filter::eq("following", following),
    ])
}

/// Both directions of a follow relationship between two users.
fn follow_pair_filter(a: UserId, b: UserId) -> Filter {
    Filter::or(vec![edge_filter(a, b), edge_filter(b, a)])
}

/// A block in either direction between two users.
fn block_pair_filter(a: UserId, b: UserId) -> Filter {
    Filter::or(vec![
        Filter::and(vec![Filter::eq("blocker", a), Filter::eq("blocked", b)]),
        Filter::and(vec![Filter::eq("blocker", b), Filter::eq("blocked", a)]),
    ])
}

/// Ids of everyone `viewer` has blocked, as raw filter values. Shared with
/// the feed and content read paths, which exclude these actors.
pub(crate) async fn blocked_ids(
    store: &dyn EntityStore,
    viewer: UserId,
) -> AppResult<Vec<Value>> {
    let records = store
        .find(EntityKind::Block, Filter::eq("blocker", viewer), None)
        .await?;
    let mut ids = Vec::with_capacity(records.len());
    for record in records {
        let block = record.decode::<Block>()?;
        ids.push(Value::from(block.node.blocked));
    }
    Ok(ids)
}

impl RelationshipGraph {
    pub fn new(store: Arc<dyn EntityStore>, feed: ActivityFeed) -> Self {
        Self { store, feed }
    }

    /// Create a follow edge from the actor to `target`.
    ///
    /// A block in either direction forbids the follow; before rejecting,
    /// any stale follow edges between the pair are purged, so the
    /// block-excludes-follow invariant heals itself on the next touch.
    pub async fn follow(&self, actor: &Actor, target: UserId) -> AppResult<()> {
        if target == actor.id {
            return Err(AppError::SelfReference("Cannot follow yourself".to_string()));
        }
        let followed = load_active_user(self.store.as_ref(), target).await?;

        if self
            .store
            .exists(EntityKind::Block, block_pair_filter(actor.id, target))
            .await?
        {
            self.store
                .delete_many(EntityKind::Follow, follow_pair_filter(actor.id, target))
                .await?;
            return Err(AppError::Forbidden(
                "Cannot follow a blocked user".to_string(),
            ));
        }

        if self
            .store
            .exists(EntityKind::Follow, edge_filter(actor.id, target))
            .await?
        {
            return Err(AppError::Duplicate("Already following".to_string()));
        }

        let edge = Follow {
            follower: actor.id,
            following: target,
        };
        self.store
            .create(EntityKind::Follow, encode(&edge)?)
            .await?;

        self.feed
            .record(
                actor.id,
                ActivityKind::UserFollowed,
                Some(target),
                None,
                json!({
                    "follower": actor.username,
                    "following": followed.node.username,
                }),
            )
            .await?;

        info!(follower = %actor.id, following = %target, "follow edge created");
        Ok(())
    }

    /// Remove the actor's follow edge to `target`. Not a feed event.
    pub async fn unfollow(&self, actor: &Actor, target: UserId) -> AppResult<()> {
        let filter = edge_filter(actor.id, target);
        if !self.store.exists(EntityKind::Follow, filter.clone()).await? {
            return Err(AppError::NotFound(
                "Follow relationship not found".to_string(),
            ));
        }
        self.store.delete_many(EntityKind::Follow, filter).await?;
        Ok(())
    }

    /// Create a block edge from the actor to `target` and purge follow
    /// edges in both directions.
    ///
    /// The store contract has no multi-write transaction, so the purge is
    /// a second write; the window in between is closed by the cleanup in
    /// [`RelationshipGraph::follow`].
    pub async fn block(&self, actor: &Actor, target: UserId) -> AppResult<()> {
        if target == actor.id {
            return Err(AppError::SelfReference("Cannot block yourself".to_string()));
        }
        load_active_user(self.store.as_ref(), target).await?;

        let existing = Filter::and(vec![
            Filter::eq("blocker", actor.id),
            Filter::eq("blocked", target),
        ]);
        if self.store.exists(EntityKind::Block, existing).await? {
            return Err(AppError::Duplicate("Already blocked".to_string()));
        }

        let edge = Block {
            blocker: actor.id,
            blocked: target,
        };
        self.store.create(EntityKind::Block, encode(&edge)?).await?;

        let purged = self
            .store
            .delete_many(EntityKind::Follow, follow_pair_filter(actor.id, target))
            .await?;

        info!(blocker = %actor.id, blocked = %target, purged_follows = purged, "block edge created");
        Ok(())
    }

    /// Remove the actor's block edge to `target`. Prior follow edges are
    /// not restored.
    pub async fn unblock(&self, actor: &Actor, target: UserId) -> AppResult<()> {
        let filter = Filter::and(vec![
            Filter::eq("blocker", actor.id),
            Filter::eq("blocked", target),
        ]);
        if self.store.exists(EntityKind::Block, filter.clone()).await? {
            self.store.delete_many(EntityKind::Block, filter).await?;
            Ok(())
        } else {
            Err(AppError::NotFound(
                "Block relationship not found".to_string(),
            ))
        }
    }

    /// Users following `user`, with public fields joined.
    pub async fn followers(&self, user: UserId) -> AppResult<Vec<FollowEdgeView>> {
        self.edge_views(Filter::eq("following", user), |edge| edge.follower)
            .await
    }

    /// Users that `user` follows, with public fields joined.
    pub async fn following(&self, user: UserId) -> AppResult<Vec<FollowEdgeView>> {
        self.edge_views(Filter::eq("follower", user), |edge| edge.following)
            .await
    }

    /// The set of user ids that `user` has blocked.
    pub async fn blocked_set_of(&self, user: UserId) -> AppResult<HashSet<UserId>> {
        let ids = blocked_ids(self.store.as_ref(), user).await?;
        Ok(ids
            .iter()
            .filter_map(|v| v.as_i64())
            .map(UserId::new)
            .collect())
    }

    async fn edge_views(
        &self,
        filter: Filter,
        counterpart: impl Fn(&Follow) -> UserId,
    ) -> AppResult<Vec<FollowEdgeView>> {
        let records = self.store.find(EntityKind::Follow, filter, None).await?;
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let edge = record.decode::<Follow>()?;
            if let Some(user) = public_user(self.store.as_ref(), counterpart(&edge.node)).await? {
                views.push(FollowEdgeView {
                    user,
                    since: edge.created_at,
                });
            }
        }
        Ok(views)
    }
}
