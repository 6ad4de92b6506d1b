//! API Models
//!
//! Request payloads and response bodies of the HTTP surface, annotated for
//! OpenAPI generation with `utoipa`. Domain records from `cxse-core` are
//! embedded as-is and documented as plain JSON objects.

use chrono::{DateTime, Utc};
use cxse_core::{
    analytics::{AggregateStats, FeedbackOverview},
    content::{CompanyData, ContentUpload, UploadReceipt},
    feedback::Feedback,
    manager::{PostedMessage, StartedSession},
    profile::Scenario,
    session::{ConversationMessage, InteractionType, Sender, SessionSummary, TrainingSession},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[schema(example = "0.1.0")]
    pub version: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ScenarioListResponse {
    #[schema(example = "AE")]
    pub role: String,
    #[schema(value_type = Vec<Object>)]
    pub scenarios: Vec<Scenario>,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct StartSessionPayload {
    #[schema(value_type = String, example = "message")]
    pub interaction_type: InteractionType,
    /// Pick a specific scenario of the caller's role instead of a random one.
    #[schema(example = "sdr_cold_outreach")]
    pub scenario_id: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct StartSessionResponse {
    #[schema(value_type = Object)]
    pub session: TrainingSession,
    #[schema(value_type = Object)]
    pub scenario: Scenario,
    #[schema(value_type = Object)]
    pub opening_message: ConversationMessage,
}

impl From<StartedSession> for StartSessionResponse {
    fn from(started: StartedSession) -> Self {
        Self {
            session: started.session,
            scenario: started.scenario,
            opening_message: started.opening_message,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct SessionResponse {
    #[schema(value_type = Object)]
    pub session: TrainingSession,
}

fn default_sender() -> Sender {
    Sender::User
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct PostMessagePayload {
    #[schema(example = "What does pricing look like for our team size?")]
    pub text: String,
    #[serde(default = "default_sender")]
    #[schema(value_type = String, example = "user")]
    pub sender: Sender,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct PostMessageResponse {
    #[schema(value_type = Object)]
    pub accepted: ConversationMessage,
    #[schema(value_type = Option<Object>)]
    pub ai_reply: Option<ConversationMessage>,
}

impl From<PostedMessage> for PostMessageResponse {
    fn from(posted: PostedMessage) -> Self {
        Self {
            accepted: posted.accepted,
            ai_reply: posted.ai_reply,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct EndSessionResponse {
    #[schema(value_type = Object)]
    pub summary: SessionSummary,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ElapsedResponse {
    #[schema(value_type = String, format = Uuid)]
    pub session_id: Uuid,
    pub elapsed_secs: u64,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct AnalyticsResponse {
    #[schema(value_type = Object)]
    pub stats: AggregateStats,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct FeedbackPayload {
    /// Required; an integer from 1 to 5.
    #[schema(example = 5)]
    pub rating: Option<i64>,
    #[serde(default)]
    #[schema(example = "The objection handling drills were great.")]
    pub comment: String,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub session_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct FeedbackResponse {
    #[schema(value_type = Object)]
    pub feedback: Feedback,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct FeedbackOverviewResponse {
    #[schema(value_type = Object)]
    pub overview: FeedbackOverview,
}

/// Owner upload: either a scenario batch or company data, tagged by `data_type`.
/// `GET /api/data/upload/schema` serves the full JSON Schema.
#[derive(Deserialize, ToSchema, Debug)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct UploadPayload(pub ContentUpload);

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct UploadResponse {
    #[schema(value_type = Object)]
    pub receipt: UploadReceipt,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct CompanyDataResponse {
    #[schema(value_type = Object)]
    pub company_data: CompanyData,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ErrorResponse {
    #[schema(example = "not_found")]
    pub kind: String,
    pub message: String,
}
