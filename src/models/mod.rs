// Entity documents persisted through the entity store.

pub mod activity;
pub mod content;
pub mod edges;
pub mod lifecycle;
pub mod user;

pub use activity::{Activity, ActivityKind};
pub use content::{Like, Post, MAX_POST_LEN};
pub use edges::{Block, Follow};
pub use lifecycle::{Lifecycle, STATUS_ACTIVE};
pub use user::{PublicUser, Role, User};
