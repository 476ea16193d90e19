// Transport collaborator - axum routing, identity resolution, and the
// role guards in front of the admin surface. Handlers stay thin; all
// domain rules live in the engines.

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::{
    app_state::AppState,
    core::types::{LikeId, PostId, UserId},
    engine::{
        content::PostView,
        feed::FeedItem,
        graph::FollowEdgeView,
        moderation::{Stats, UserView},
        Actor,
    },
    error::{AppError, AppResult},
    models::{PublicUser, Role},
};

#[derive(Deserialize)]
struct CreateUserRequest {
    username: String,
    email: String,
    role: Option<Role>,
}

#[derive(Deserialize)]
struct CreatePostRequest {
    content: String,
}

/// Resolve the trusted identity supplied by the `x-actor-id` header into
/// an [`Actor`] and stash it in the request extensions.
async fn resolve_actor(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get("x-actor-id")
        .ok_or_else(|| AppError::Unauthorized("Missing x-actor-id header".to_string()))?;
    let id: i64 = header
        .to_str()
        .ok()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| AppError::Unauthorized("Invalid x-actor-id header".to_string()))?;
    let actor = state
        .users
        .resolve_actor(UserId::new(id))
        .await
        .map_err(|_| AppError::Unauthorized("Unknown or inactive actor".to_string()))?;
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<Actor>() {
        Some(actor) if actor.role >= Role::Admin => Ok(next.run(request).await),
        Some(_) => Err(AppError::Forbidden(
            "Access denied. Admin privileges required.".to_string(),
        )),
        None => Err(AppError::Unauthorized("Missing actor identity".to_string())),
    }
}

async fn require_owner(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<Actor>() {
        Some(actor) if actor.role == Role::Owner => Ok(next.run(request).await),
        Some(_) => Err(AppError::Forbidden(
            "Access denied. Owner privileges required.".to_string(),
        )),
        None => Err(AppError::Unauthorized("Missing actor identity".to_string())),
    }
}

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/users", get(admin_list_users))
        .route("/users/{id}", delete(admin_deactivate_user))
        .route("/posts/{id}", delete(admin_delete_post))
        .route("/likes/{id}", delete(admin_delete_like))
        .route("/stats", get(admin_stats))
        .route_layer(middleware::from_fn(require_admin));

    let owner = Router::new()
        .route("/users/{id}/make-admin", post(admin_promote))
        .route("/users/{id}/remove-admin", post(admin_demote))
        .route_layer(middleware::from_fn(require_owner));

    let authed = Router::new()
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/follow", post(follow_user).delete(unfollow_user))
        .route("/users/{id}/block", post(block_user).delete(unblock_user))
        .route("/users/{id}/followers", get(get_followers))
        .route("/users/{id}/following", get(get_following))
        .route("/posts", post(create_post).get(list_posts))
        .route("/posts/{id}", delete(delete_post))
        .route("/posts/{id}/like", post(like_post).delete(unlike_post))
        .route("/feed", get(get_feed))
        .route("/feed/user/{id}", get(get_user_activity))
        .nest("/admin", admin.merge(owner))
        .layer(middleware::from_fn_with_state(state.clone(), resolve_actor));

    let public = Router::new().route("/users", post(create_user));

    Router::new()
        .nest("/api", public.merge(authed))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let user = state
        .users
        .create_user(&request.username, &request.email, request.role)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PublicUser>> {
    Ok(Json(state.users.get_user(UserId::new(id)).await?))
}

async fn follow_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.graph.follow(&actor, UserId::new(id)).await?;
    Ok(Json(json!({ "message": "User followed successfully" })))
}

async fn unfollow_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.graph.unfollow(&actor, UserId::new(id)).await?;
    Ok(Json(json!({ "message": "User unfollowed successfully" })))
}

async fn block_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.graph.block(&actor, UserId::new(id)).await?;
    Ok(Json(json!({ "message": "User blocked successfully" })))
}

async fn unblock_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.graph.unblock(&actor, UserId::new(id)).await?;
    Ok(Json(json!({ "message": "User unblocked successfully" })))
}

async fn get_followers(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<FollowEdgeView>>> {
    Ok(Json(state.graph.followers(UserId::new(id)).await?))
}

async fn get_following(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<FollowEdgeView>>> {
    Ok(Json(state.graph.following(UserId::new(id)).await?))
}

async fn create_post(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<PostView>)> {
    let post = state.content.create_post(&actor, &request.content).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn list_posts(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<Vec<PostView>>> {
    Ok(Json(state.content.list_posts(&actor).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.content.delete_post(&actor, PostId::new(id)).await?;
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

async fn like_post(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.content.like_post(&actor, PostId::new(id)).await?;
    Ok(Json(json!({ "message": "Post liked successfully" })))
}

async fn unlike_post(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.content.unlike_post(&actor, PostId::new(id)).await?;
    Ok(Json(json!({ "message": "Post unliked successfully" })))
}

async fn get_feed(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<Vec<FeedItem>>> {
    Ok(Json(state.feed.render_feed(actor.id, None).await?))
}

async fn get_user_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<FeedItem>>> {
    Ok(Json(
        state.feed.render_user_activity(UserId::new(id), None).await?,
    ))
}

async fn admin_list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserView>>> {
    Ok(Json(state.moderation.list_users().await?))
}

async fn admin_deactivate_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.moderation.deactivate(&actor, UserId::new(id)).await?;
    Ok(Json(json!({
        "message": "User deleted successfully",
        "deleted_by": actor.role,
    })))
}

async fn admin_promote(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.moderation.promote(&actor, UserId::new(id)).await?;
    Ok(Json(json!({ "message": "User promoted to admin successfully" })))
}

async fn admin_demote(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.moderation.demote(&actor, UserId::new(id)).await?;
    Ok(Json(json!({ "message": "Admin privileges removed successfully" })))
}

async fn admin_delete_post(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state
        .moderation
        .force_delete_post(&actor, PostId::new(id))
        .await?;
    Ok(Json(json!({
        "message": "Post deleted by admin",
        "deleted_by": actor.role,
    })))
}

async fn admin_delete_like(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state
        .moderation
        .force_delete_like(&actor, LikeId::new(id))
        .await?;
    Ok(Json(json!({
        "message": "Like deleted by admin",
        "deleted_by": actor.role,
    })))
}

async fn admin_stats(State(state): State<AppState>) -> AppResult<Json<Stats>> {
    Ok(Json(state.moderation.stats().await?))
}
