//! Room API application state, routes, and handlers
//!
//! Request and response shapes mirror the wire contract: enum fields travel
//! as integers, join outcomes are successful responses carrying the outcome
//! value, and structural failures map to coarse status classes.

use crate::error::RoomServiceError;
use crate::metrics::MetricsCollector;
use crate::results::ResultAggregator;
use crate::room::RoomEngine;
use crate::service::auth::AuthUser;
use crate::types::{
    JoinRoomResult, LiveDifficulty, LiveId, ResultUser, RoomId, RoomInfo, RoomStatus, RoomUser,
    UserProfile,
};
use crate::user::UserDirectory;
use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct ApiContext {
    pub directory: Arc<UserDirectory>,
    pub engine: RoomEngine,
    pub results: Arc<ResultAggregator>,
    pub metrics: Arc<MetricsCollector>,
}

/// Result type for handlers; errors map to coarse status classes
type ApiResult<T> = std::result::Result<T, ApiError>;

/// Wrapper that turns service errors into HTTP responses
pub struct ApiError(anyhow::Error);

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<RoomServiceError>() {
            Some(
                RoomServiceError::UserNotFound { .. }
                | RoomServiceError::RoomNotFound { .. }
                | RoomServiceError::MemberNotFound { .. },
            ) => StatusCode::NOT_FOUND,
            Some(RoomServiceError::NotRoomOwner { .. }) => StatusCode::FORBIDDEN,
            Some(RoomServiceError::InvalidRoomStatus { .. }) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        debug!("Request failed ({}): {}", status, self.0);
        (status, self.0.to_string()).into_response()
    }
}

// Wire shapes

#[derive(Debug, Serialize)]
struct Empty {}

#[derive(Debug, Deserialize)]
struct UserCreateRequest {
    user_name: String,
    leader_card_id: i64,
}

#[derive(Debug, Serialize)]
struct UserCreateResponse {
    user_token: String,
}

#[derive(Debug, Deserialize)]
struct RoomCreateRequest {
    live_id: LiveId,
    select_difficulty: LiveDifficulty,
}

#[derive(Debug, Serialize)]
struct RoomCreateResponse {
    room_id: RoomId,
}

#[derive(Debug, Deserialize)]
struct RoomListRequest {
    live_id: LiveId,
}

#[derive(Debug, Serialize)]
struct RoomListResponse {
    room_info_list: Vec<RoomInfo>,
}

#[derive(Debug, Deserialize)]
struct RoomJoinRequest {
    room_id: RoomId,
    select_difficulty: LiveDifficulty,
}

#[derive(Debug, Serialize)]
struct RoomJoinResponse {
    join_room_result: JoinRoomResult,
}

#[derive(Debug, Deserialize)]
struct RoomWaitRequest {
    room_id: RoomId,
}

#[derive(Debug, Serialize)]
struct RoomWaitResponse {
    status: RoomStatus,
    room_user_list: Vec<RoomUser>,
}

#[derive(Debug, Deserialize)]
struct RoomStartRequest {
    room_id: RoomId,
}

#[derive(Debug, Deserialize)]
struct RoomEndRequest {
    room_id: RoomId,
    judge_count_list: Vec<i64>,
    score: i64,
}

#[derive(Debug, Deserialize)]
struct RoomResultRequest {
    room_id: RoomId,
}

#[derive(Debug, Serialize)]
struct RoomResultResponse {
    result_user_list: Vec<ResultUser>,
}

#[derive(Debug, Deserialize)]
struct RoomLeaveRequest {
    room_id: RoomId,
}

/// Build the room API router
pub fn router(context: ApiContext) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/user/create", post(user_create))
        .route("/user/me", get(user_me))
        .route("/user/update", post(user_update))
        .route("/room/create", post(room_create))
        .route("/room/list", post(room_list))
        .route("/room/join", post(room_join))
        .route("/room/wait", post(room_wait))
        .route("/room/start", post(room_start))
        .route("/room/end", post(room_end))
        .route("/room/result", post(room_result))
        .route("/room/leave", post(room_leave))
        .layer(middleware::from_fn_with_state(
            context.clone(),
            track_requests,
        ))
        .with_state(context)
}

/// Serve the router until the shutdown future resolves
pub async fn serve(
    context: ApiContext,
    addr: SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(context);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API server to {}", addr))?;

    info!("Room API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server failed")?;

    info!("Room API stopped");
    Ok(())
}

/// Record one counter tick per request, labeled by path and status class
async fn track_requests(State(context): State<ApiContext>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;
    context
        .metrics
        .record_http_request(&path, response.status().as_u16());
    response
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "service": "green-room",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn user_create(
    State(context): State<ApiContext>,
    Json(request): Json<UserCreateRequest>,
) -> ApiResult<Json<UserCreateResponse>> {
    let user_token = context
        .directory
        .create(&request.user_name, request.leader_card_id)?;
    context.metrics.record_user_created();
    Ok(Json(UserCreateResponse { user_token }))
}

async fn user_me(auth: AuthUser) -> Json<UserProfile> {
    Json(auth.user)
}

async fn user_update(
    State(context): State<ApiContext>,
    auth: AuthUser,
    Json(request): Json<UserCreateRequest>,
) -> ApiResult<Json<Empty>> {
    context
        .directory
        .update(&auth.token, &request.user_name, request.leader_card_id)?;
    Ok(Json(Empty {}))
}

async fn room_create(
    State(context): State<ApiContext>,
    auth: AuthUser,
    Json(request): Json<RoomCreateRequest>,
) -> ApiResult<Json<RoomCreateResponse>> {
    let room_id =
        context
            .engine
            .create_room(auth.user.id, request.live_id, request.select_difficulty)?;
    Ok(Json(RoomCreateResponse { room_id }))
}

async fn room_list(
    State(context): State<ApiContext>,
    Json(request): Json<RoomListRequest>,
) -> ApiResult<Json<RoomListResponse>> {
    let room_info_list = context.engine.list_rooms(request.live_id)?;
    Ok(Json(RoomListResponse { room_info_list }))
}

async fn room_join(
    State(context): State<ApiContext>,
    auth: AuthUser,
    Json(request): Json<RoomJoinRequest>,
) -> ApiResult<Json<RoomJoinResponse>> {
    let join_room_result =
        context
            .engine
            .join_room(request.room_id, auth.user.id, request.select_difficulty)?;
    Ok(Json(RoomJoinResponse { join_room_result }))
}

async fn room_wait(
    State(context): State<ApiContext>,
    auth: AuthUser,
    Json(request): Json<RoomWaitRequest>,
) -> ApiResult<Json<RoomWaitResponse>> {
    let snapshot = context.engine.room_status(request.room_id, auth.user.id)?;
    Ok(Json(RoomWaitResponse {
        status: snapshot.status,
        room_user_list: snapshot.members,
    }))
}

async fn room_start(
    State(context): State<ApiContext>,
    auth: AuthUser,
    Json(request): Json<RoomStartRequest>,
) -> ApiResult<Json<Empty>> {
    context.engine.start_room(auth.user.id, request.room_id)?;
    Ok(Json(Empty {}))
}

async fn room_end(
    State(context): State<ApiContext>,
    auth: AuthUser,
    Json(request): Json<RoomEndRequest>,
) -> ApiResult<Json<Empty>> {
    context.engine.finish_room(
        auth.user.id,
        request.room_id,
        &request.judge_count_list,
        request.score,
    )?;
    Ok(Json(Empty {}))
}

async fn room_result(
    State(context): State<ApiContext>,
    Json(request): Json<RoomResultRequest>,
) -> ApiResult<Json<RoomResultResponse>> {
    let result_user_list = context.results.results_for(request.room_id)?;
    Ok(Json(RoomResultResponse { result_user_list }))
}

async fn room_leave(
    State(context): State<ApiContext>,
    auth: AuthUser,
    Json(request): Json<RoomLeaveRequest>,
) -> ApiResult<Json<Empty>> {
    context.engine.leave_room(request.room_id, auth.user.id)?;
    Ok(Json(Empty {}))
}
