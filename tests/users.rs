// User directory: account creation rules and identity resolution.

mod support;

use sociograph::core::types::UserId;
use sociograph::models::Role;
use sociograph::AppError;
use support::{signup, test_app};

#[tokio::test]
async fn usernames_are_shape_checked() {
    let app = test_app();

    for bad in ["ab", "has space", "way_too_long_for_a_username_by_far_x", "nope!"] {
        let err = app
            .state
            .users
            .create_user(bad, "a@example.com", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "accepted {bad:?}");
    }

    app.state
        .users
        .create_user("good_name_42", "a@example.com", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn emails_need_an_at_sign() {
    let app = test_app();
    let err = app
        .state
        .users
        .create_user("alice", "not-an-email", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn usernames_are_unique_even_across_deactivated_accounts() {
    let app = test_app();
    let owner = signup(&app, "root", Role::Owner).await;
    let alice = signup(&app, "alice", Role::User).await;

    let err = app
        .state
        .users
        .create_user("alice", "other@example.com", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));

    // Deactivation does not release the name.
    app.state.moderation.deactivate(&owner, alice.id).await.unwrap();
    let err = app
        .state
        .users
        .create_user("alice", "other@example.com", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));
}

#[tokio::test]
async fn new_accounts_default_to_user_tier() {
    let app = test_app();
    let profile = app
        .state
        .users
        .create_user("alice", "alice@example.com", None)
        .await
        .unwrap();

    let actor = app.state.users.resolve_actor(profile.id).await.unwrap();
    assert_eq!(actor.role, Role::User);
    assert_eq!(actor.username, "alice");
}

#[tokio::test]
async fn deactivated_accounts_do_not_resolve() {
    let app = test_app();
    let owner = signup(&app, "root", Role::Owner).await;
    let alice = signup(&app, "alice", Role::User).await;

    app.state.moderation.deactivate(&owner, alice.id).await.unwrap();

    let err = app.state.users.resolve_actor(alice.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = app
        .state
        .users
        .resolve_actor(UserId::new(424242))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
