use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::types::{PostId, UserId};

/// What a recorded activity describes. Unknown strings deserialize to
/// `Other` so feed rendering keeps working across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PostCreated,
    PostLiked,
    UserFollowed,
    PostDeleted,
    UserDeleted,
    #[serde(other)]
    Other,
}

/// Append-only event recorded as a side effect of a domain action.
/// Only `visible` may change after creation; activities are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub actor: UserId,
    pub kind: ActivityKind,
    #[serde(default)]
    pub target_user: Option<UserId>,
    #[serde(default)]
    pub target_post: Option<PostId>,
    #[serde(default)]
    pub metadata: Value,
    pub visible: bool,
}
