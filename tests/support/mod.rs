#![allow(dead_code)]

use std::sync::Arc;

use sociograph::app_state::AppState;
use sociograph::config::Config;
use sociograph::engine::Actor;
use sociograph::models::Role;
use sociograph::store::{EntityStore, MemoryStore};

/// Engine set over an in-memory store, with the raw store kept around so
/// tests can inspect records or inject edge cases directly.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let shared: Arc<dyn EntityStore> = store.clone();
    let state = AppState::with_store(shared, Config::from_env().expect("default config"));
    TestApp { state, store }
}

/// Create an account and return it as an acting identity.
pub async fn signup(app: &TestApp, name: &str, role: Role) -> Actor {
    let profile = app
        .state
        .users
        .create_user(name, &format!("{name}@example.com"), Some(role))
        .await
        .expect("create user");
    Actor {
        id: profile.id,
        username: profile.username,
        role,
    }
}
