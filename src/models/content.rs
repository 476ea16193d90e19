use serde::{Deserialize, Serialize};

use crate::core::types::{PostId, UserId};
use crate::models::Lifecycle;

/// Longest post body accepted, in characters.
pub const MAX_POST_LEN: usize = 1000;

/// A post, owned by exactly one user. Removed posts are soft-deleted and
/// keep the `deleted by` stamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub author: UserId,
    pub content: String,
    #[serde(flatten)]
    pub state: Lifecycle,
}

/// A like edge between a user and a post. Soft-deletable so that a like
/// removed by moderation can be re-applied by toggling the same record,
/// keeping at most one logically-active like per (user, post) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub user: UserId,
    pub post: PostId,
    #[serde(flatten)]
    pub state: Lifecycle,
}
