// sociograph - social-network backend core: authorization, the
// follow/block relationship graph, moderation, and the activity feed.

// Core types and primitives
pub mod core;

// Entity documents
pub mod models;

// Entity store contract and implementations
pub mod store;

// Domain engines
pub mod engine;

// HTTP transport collaborator
pub mod http;

// Common utilities
pub mod app_state;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
