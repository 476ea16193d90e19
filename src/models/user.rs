use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::UserId;
use crate::models::Lifecycle;

/// Privilege tier. The derived `Ord` gives the total order
/// `User < Admin < Owner` consumed by the authorization engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Owner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
            Role::Owner => write!(f, "owner"),
        }
    }
}

/// A member of the network. Deactivation flips the lifecycle to `Deleted`;
/// the record itself stays put.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(flatten)]
    pub state: Lifecycle,
}

/// The fields of a user that other users get to see.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}
