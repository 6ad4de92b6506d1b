//! Axum Handlers for the REST API
//!
//! Thin adapters from HTTP to the [`TrainingSessionManager`]. Identity comes
//! from headers set by an upstream authenticator; core errors are mapped onto
//! status codes by their [`ErrorKind`].
//!
//! [`TrainingSessionManager`]: cxse_core::TrainingSessionManager

use axum::{
    extract::{FromRequest, Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use cxse_core::{
    ErrorKind, TrainingError,
    content::upload_schema,
    session::TrainingSession,
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    models::{
        AnalyticsResponse, CompanyDataResponse, ElapsedResponse, EndSessionResponse,
        ErrorResponse, FeedbackOverviewResponse, FeedbackPayload, FeedbackResponse,
        HealthResponse, PostMessagePayload, PostMessageResponse, ScenarioListResponse,
        SessionResponse, StartSessionPayload, StartSessionResponse, UploadPayload,
        UploadResponse,
    },
    state::AppState,
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const ACCESS_TIER_HEADER: &str = "x-access-tier";
/// Access tier granting content upload and the feedback overview.
pub const OWNER_TIER: &str = "Owner";

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Forbidden(String),
    InternalServerError(anyhow::Error),
}

impl ApiError {
    fn session_not_found(id: Uuid) -> Self {
        ApiError::NotFound(TrainingError::SessionNotFound(id).to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, ErrorKind::ValidationError, message)
            }
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorKind::NotFound, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, ErrorKind::InvalidState, message),
            ApiError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, ErrorKind::PermissionDenied, message)
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorKind::Internal,
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        let body = ErrorResponse {
            kind: kind.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<TrainingError> for ApiError {
    fn from(err: TrainingError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => ApiError::NotFound(err.to_string()),
            ErrorKind::InvalidState => ApiError::Conflict(err.to_string()),
            ErrorKind::ValidationError => ApiError::BadRequest(err.to_string()),
            ErrorKind::PermissionDenied => ApiError::Forbidden(err.to_string()),
            ErrorKind::ConfigurationError | ErrorKind::Internal => {
                ApiError::InternalServerError(err.into())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `Json` body extractor that rejects with the API error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Caller identity as asserted by the upstream authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: String,
    pub is_owner: bool,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

async fn identity(state: &AppState, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let user_id = header(headers, USER_ID_HEADER)
        .ok_or_else(|| ApiError::BadRequest("x-user-id header is required".to_string()))?;
    let role = match header(headers, USER_ROLE_HEADER) {
        Some(role) => role.to_string(),
        None => state.manager.default_role().await,
    };
    Ok(Identity {
        user_id: user_id.to_string(),
        role,
        is_owner: header(headers, ACCESS_TIER_HEADER) == Some(OWNER_TIER),
    })
}

/// Loads a session and hides it from anyone but its owner.
async fn owned_session(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
) -> Result<TrainingSession, ApiError> {
    let session = state.manager.get_session(id).await?;
    if session.user_id != identity.user_id {
        return Err(ApiError::session_not_found(id));
    }
    Ok(session)
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Scenarios available to the caller's role. Roles without scenarios get the
/// default role's.
#[utoipa::path(
    get,
    path = "/api/training/scenarios",
    responses(
        (status = 200, description = "Scenarios for the caller", body = ScenarioListResponse),
        (status = 400, description = "Missing identity", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user"),
        ("x-user-role" = Option<String>, Header, description = "Trainee role, e.g. AE or SDR")
    )
)]
pub async fn list_scenarios(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ScenarioListResponse>, ApiError> {
    let identity = identity(&state, &headers).await?;
    let scenarios = state.manager.scenarios_for(&identity.role).await;
    Ok(Json(ScenarioListResponse {
        role: identity.role,
        scenarios,
    }))
}

/// Scenarios registered under exactly `role`. May be empty.
#[utoipa::path(
    get,
    path = "/api/training/scenarios/{role}",
    responses(
        (status = 200, description = "Scenarios registered for the role", body = ScenarioListResponse),
        (status = 400, description = "Missing identity", body = ErrorResponse)
    ),
    params(
        ("role" = String, Path, description = "Trainee role"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn list_role_scenarios(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(role): Path<String>,
) -> Result<Json<ScenarioListResponse>, ApiError> {
    identity(&state, &headers).await?;
    let scenarios = state.manager.registered_scenarios(&role).await;
    Ok(Json(ScenarioListResponse { role, scenarios }))
}

/// Start a training session for the caller's role.
#[utoipa::path(
    post,
    path = "/api/training/sessions",
    request_body = StartSessionPayload,
    responses(
        (status = 201, description = "Session started", body = StartSessionResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Scenario not available for the role", body = ErrorResponse),
        (status = 409, description = "Caller already has an active session", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user"),
        ("x-user-role" = Option<String>, Header, description = "Trainee role, e.g. AE or SDR")
    )
)]
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(payload): AppJson<StartSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = identity(&state, &headers).await?;
    let started = state
        .manager
        .start_session(
            &identity.user_id,
            &identity.role,
            payload.interaction_type,
            payload.scenario_id.as_deref(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse::from(started)),
    ))
}

/// Get a live or completed session.
#[utoipa::path(
    get,
    path = "/api/training/sessions/{id}",
    responses(
        (status = 200, description = "Session details", body = SessionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let identity = identity(&state, &headers).await?;
    let session = owned_session(&state, &identity, id).await?;
    Ok(Json(SessionResponse { session }))
}

/// Post a message. Trainee messages are answered by the simulated customer.
#[utoipa::path(
    post,
    path = "/api/training/sessions/{id}/messages",
    request_body = PostMessagePayload,
    responses(
        (status = 200, description = "Message accepted", body = PostMessageResponse),
        (status = 400, description = "Empty message", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Session is not active", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<PostMessagePayload>,
) -> Result<Json<PostMessageResponse>, ApiError> {
    let identity = identity(&state, &headers).await?;
    owned_session(&state, &identity, id).await?;
    let posted = state
        .manager
        .post_message(id, &payload.text, payload.sender)
        .await?;
    Ok(Json(PostMessageResponse::from(posted)))
}

/// End an active session and record it.
#[utoipa::path(
    post,
    path = "/api/training/sessions/{id}/end",
    responses(
        (status = 200, description = "Session completed", body = EndSessionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Session already ended", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<EndSessionResponse>, ApiError> {
    let identity = identity(&state, &headers).await?;
    owned_session(&state, &identity, id).await?;
    let summary = state.manager.end_session(id).await?;
    info!(
        user_id = %identity.user_id,
        session_id = %id,
        message_count = summary.message_count,
        "Session ended via API"
    );
    Ok(Json(EndSessionResponse { summary }))
}

/// Seconds on the session clock.
#[utoipa::path(
    get,
    path = "/api/training/sessions/{id}/elapsed",
    responses(
        (status = 200, description = "Elapsed seconds", body = ElapsedResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn get_elapsed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ElapsedResponse>, ApiError> {
    let identity = identity(&state, &headers).await?;
    owned_session(&state, &identity, id).await?;
    let elapsed_secs = state.manager.elapsed_secs(id).await?;
    Ok(Json(ElapsedResponse {
        session_id: id,
        elapsed_secs,
    }))
}

/// Aggregate statistics over the caller's completed sessions.
#[utoipa::path(
    get,
    path = "/api/analytics/sessions",
    responses(
        (status = 200, description = "Training statistics", body = AnalyticsResponse),
        (status = 400, description = "Missing identity", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let identity = identity(&state, &headers).await?;
    let stats = state.manager.analytics(&identity.user_id).await?;
    Ok(Json(AnalyticsResponse { stats }))
}

/// Rate the training experience.
#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body = FeedbackPayload,
    responses(
        (status = 201, description = "Feedback recorded", body = FeedbackResponse),
        (status = 400, description = "Missing or out-of-range rating", body = ErrorResponse),
        (status = 404, description = "Referenced session not found", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(payload): AppJson<FeedbackPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = identity(&state, &headers).await?;
    let feedback = state
        .manager
        .submit_feedback(
            &identity.user_id,
            payload.rating,
            &payload.comment,
            payload.session_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(FeedbackResponse { feedback })))
}

/// All feedback with its average rating.
#[utoipa::path(
    get,
    path = "/api/feedback",
    responses(
        (status = 200, description = "Feedback overview", body = FeedbackOverviewResponse),
        (status = 403, description = "Owner access required", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user"),
        ("x-access-tier" = Option<String>, Header, description = "Owner grants access")
    )
)]
pub async fn feedback_overview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<FeedbackOverviewResponse>, ApiError> {
    let identity = identity(&state, &headers).await?;
    let overview = state.manager.feedback_overview(identity.is_owner).await?;
    Ok(Json(FeedbackOverviewResponse { overview }))
}

/// Upload scenarios or company data.
#[utoipa::path(
    post,
    path = "/api/data/upload",
    request_body = UploadPayload,
    responses(
        (status = 201, description = "Content uploaded", body = UploadResponse),
        (status = 400, description = "Invalid upload", body = ErrorResponse),
        (status = 403, description = "Owner access required", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user"),
        ("x-access-tier" = Option<String>, Header, description = "Owner grants access")
    )
)]
pub async fn upload_content(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(UploadPayload(upload)): AppJson<UploadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = identity(&state, &headers).await?;
    let receipt = state
        .manager
        .upload_training_content(identity.is_owner, &identity.user_id, upload)
        .await?;
    Ok((StatusCode::CREATED, Json(UploadResponse { receipt })))
}

/// JSON Schema of the upload payload.
#[utoipa::path(
    get,
    path = "/api/data/upload/schema",
    responses(
        (status = 200, description = "JSON Schema document")
    )
)]
pub async fn get_upload_schema() -> Json<serde_json::Value> {
    Json(upload_schema())
}

/// Products, competitors and case studies used in training.
#[utoipa::path(
    get,
    path = "/api/data/company",
    responses(
        (status = 200, description = "Company data", body = CompanyDataResponse),
        (status = 400, description = "Missing identity", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn get_company_data(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<CompanyDataResponse>, ApiError> {
    identity(&state, &headers).await?;
    let company_data = state.manager.company_data().await;
    Ok(Json(CompanyDataResponse { company_data }))
}
