// Core types and primitives

pub mod types;

pub use types::{ActivityId, LikeId, PostId, UserId};
