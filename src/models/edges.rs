use serde::{Deserialize, Serialize};

use crate::core::types::UserId;

/// Directed follow edge. Hard-deleted on unfollow; it carries no audit
/// value of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub follower: UserId,
    pub following: UserId,
}

/// Directed block edge. Asymmetric: A blocking B hides B's activity from
/// A's feed, and nothing else. While the edge exists there must be no
/// follow edge between the pair in either direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub blocker: UserId,
    pub blocked: UserId,
}
