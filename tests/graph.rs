// Relationship graph: follow/block symmetry rules and the
// block-excludes-follow invariant.

mod support;

use serde_json::json;
use sociograph::core::types::UserId;
use sociograph::models::Role;
use sociograph::store::{EntityKind, EntityStore, Filter};
use sociograph::AppError;
use support::{signup, test_app};

#[tokio::test]
async fn follow_and_list_counterparts() {
    let app = test_app();
    let alice = signup(&app, "alice", Role::User).await;
    let bob = signup(&app, "bob", Role::User).await;

    app.state.graph.follow(&alice, bob.id).await.unwrap();

    let followers = app.state.graph.followers(bob.id).await.unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].user.username, "alice");

    let following = app.state.graph.following(alice.id).await.unwrap();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].user.username, "bob");
}

#[tokio::test]
async fn self_edges_are_rejected() {
    let app = test_app();
    let alice = signup(&app, "alice", Role::Owner).await;

    let err = app.state.graph.follow(&alice, alice.id).await.unwrap_err();
    assert!(matches!(err, AppError::SelfReference(_)));

    let err = app.state.graph.block(&alice, alice.id).await.unwrap_err();
    assert!(matches!(err, AppError::SelfReference(_)));
}

#[tokio::test]
async fn duplicate_edges_are_rejected_and_leave_graph_unchanged() {
    let app = test_app();
    let alice = signup(&app, "alice", Role::User).await;
    let bob = signup(&app, "bob", Role::User).await;

    app.state.graph.follow(&alice, bob.id).await.unwrap();
    let err = app.state.graph.follow(&alice, bob.id).await.unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));
    assert_eq!(
        app.store.count(EntityKind::Follow, Filter::All).await.unwrap(),
        1
    );

    app.state.graph.unfollow(&alice, bob.id).await.unwrap();
    app.state.graph.block(&alice, bob.id).await.unwrap();
    let err = app.state.graph.block(&alice, bob.id).await.unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));
    assert_eq!(
        app.store.count(EntityKind::Block, Filter::All).await.unwrap(),
        1
    );
    assert_eq!(app.state.graph.blocked_set_of(alice.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn follow_requires_an_active_target() {
    let app = test_app();
    let alice = signup(&app, "alice", Role::User).await;

    let err = app
        .state
        .graph
        .follow(&alice, UserId::new(9999))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Deactivated users are treated as absent.
    let owner = signup(&app, "root", Role::Owner).await;
    let ghost = signup(&app, "ghost", Role::User).await;
    app.state.moderation.deactivate(&owner, ghost.id).await.unwrap();
    let err = app.state.graph.follow(&alice, ghost.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn unfollow_and_unblock_require_an_existing_edge() {
    let app = test_app();
    let alice = signup(&app, "alice", Role::User).await;
    let bob = signup(&app, "bob", Role::User).await;

    let err = app.state.graph.unfollow(&alice, bob.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = app.state.graph.unblock(&alice, bob.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn blocking_purges_follow_edges_in_both_directions() {
    let app = test_app();
    let alice = signup(&app, "alice", Role::User).await;
    let bob = signup(&app, "bob", Role::User).await;

    app.state.graph.follow(&alice, bob.id).await.unwrap();
    app.state.graph.follow(&bob, alice.id).await.unwrap();

    app.state.graph.block(&bob, alice.id).await.unwrap();

    assert_eq!(
        app.store.count(EntityKind::Follow, Filter::All).await.unwrap(),
        0
    );
    let err = app.state.graph.unfollow(&alice, bob.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn unblock_does_not_restore_follows() {
    let app = test_app();
    let alice = signup(&app, "alice", Role::User).await;
    let bob = signup(&app, "bob", Role::User).await;

    app.state.graph.follow(&alice, bob.id).await.unwrap();
    app.state.graph.block(&bob, alice.id).await.unwrap();
    app.state.graph.unblock(&bob, alice.id).await.unwrap();

    assert_eq!(
        app.store.count(EntityKind::Follow, Filter::All).await.unwrap(),
        0
    );
    assert!(app.state.graph.blocked_set_of(bob.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn follow_under_a_block_is_forbidden_and_heals_stale_edges() {
    let app = test_app();
    let alice = signup(&app, "alice", Role::User).await;
    let bob = signup(&app, "bob", Role::User).await;

    app.state.graph.block(&bob, alice.id).await.unwrap();

    // A stale edge that slipped into the window between the block write
    // and the follow purge.
    app.store
        .create(
            EntityKind::Follow,
            json!({ "follower": alice.id.value(), "following": bob.id.value() }),
        )
        .await
        .unwrap();

    let err = app.state.graph.follow(&alice, bob.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(
        app.store.count(EntityKind::Follow, Filter::All).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn blocking_is_asymmetric() {
    let app = test_app();
    let alice = signup(&app, "alice", Role::User).await;
    let bob = signup(&app, "bob", Role::User).await;

    app.state.graph.block(&alice, bob.id).await.unwrap();

    let alices = app.state.graph.blocked_set_of(alice.id).await.unwrap();
    assert!(alices.contains(&bob.id));
    assert!(app.state.graph.blocked_set_of(bob.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unfollow_is_not_a_feed_event() {
    let app = test_app();
    let alice = signup(&app, "alice", Role::User).await;
    let bob = signup(&app, "bob", Role::User).await;

    app.state.graph.follow(&alice, bob.id).await.unwrap();
    app.state.graph.unfollow(&alice, bob.id).await.unwrap();

    let feed = app.state.feed.render_feed(bob.id, None).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].message, "alice followed bob");
}
