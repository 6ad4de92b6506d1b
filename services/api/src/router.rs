//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and the OpenAPI documentation.

use crate::{
    handlers,
    models::{
        AnalyticsResponse, CompanyDataResponse, ElapsedResponse, EndSessionResponse,
        ErrorResponse, FeedbackOverviewResponse, FeedbackPayload, FeedbackResponse,
        HealthResponse, PostMessagePayload, PostMessageResponse, ScenarioListResponse,
        SessionResponse, StartSessionPayload, StartSessionResponse, UploadPayload,
        UploadResponse,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_scenarios,
        handlers::list_role_scenarios,
        handlers::start_session,
        handlers::get_session,
        handlers::post_message,
        handlers::end_session,
        handlers::get_elapsed,
        handlers::get_analytics,
        handlers::submit_feedback,
        handlers::feedback_overview,
        handlers::upload_content,
        handlers::get_upload_schema,
        handlers::get_company_data,
    ),
    components(
        schemas(
            HealthResponse, ScenarioListResponse, StartSessionPayload, StartSessionResponse,
            SessionResponse, PostMessagePayload, PostMessageResponse, EndSessionResponse,
            ElapsedResponse, AnalyticsResponse, FeedbackPayload, FeedbackResponse,
            FeedbackOverviewResponse, UploadPayload, UploadResponse, CompanyDataResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "CxSE Training API", description = "Sales conversation training sessions")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/training/scenarios", get(handlers::list_scenarios))
        .route(
            "/api/training/scenarios/{role}",
            get(handlers::list_role_scenarios),
        )
        .route("/api/training/sessions", post(handlers::start_session))
        .route("/api/training/sessions/{id}", get(handlers::get_session))
        .route(
            "/api/training/sessions/{id}/messages",
            post(handlers::post_message),
        )
        .route(
            "/api/training/sessions/{id}/end",
            post(handlers::end_session),
        )
        .route(
            "/api/training/sessions/{id}/elapsed",
            get(handlers::get_elapsed),
        )
        .route("/api/analytics/sessions", get(handlers::get_analytics))
        .route(
            "/api/feedback",
            get(handlers::feedback_overview).post(handlers::submit_feedback),
        )
        .route("/api/data/upload", post(handlers::upload_content))
        .route("/api/data/upload/schema", get(handlers::get_upload_schema))
        .route("/api/data/company", get(handlers::get_company_data))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
