//! Training session records.
//!
//! A [`TrainingSession`] is created by the manager on start, appended to only
//! while `Active`, and frozen once completed. Everything here serializes with
//! serde so archived sessions round-trip through the store unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
    System,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Ai => write!(f, "ai"),
            Sender::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Message,
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// Lifecycle phase of a session inside the manager.
///
/// `Idle` is the absence of a session; the manager never stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Preparing,
    Active,
    Ended,
}

impl SessionPhase {
    /// Whether `self -> next` is a legal transition.
    pub fn can_advance_to(self, next: SessionPhase) -> bool {
        matches!(
            (self, next),
            (SessionPhase::Idle, SessionPhase::Preparing)
                | (SessionPhase::Preparing, SessionPhase::Active)
                | (SessionPhase::Active, SessionPhase::Ended)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            sender,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSession {
    pub id: Uuid,
    pub user_id: String,
    pub role: String,
    pub interaction_type: InteractionType,
    pub scenario_id: String,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
}

impl TrainingSession {
    pub fn new(
        user_id: impl Into<String>,
        role: impl Into<String>,
        interaction_type: InteractionType,
        scenario_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            role: role.into(),
            interaction_type,
            scenario_id: scenario_id.into(),
            status: SessionStatus::Active,
            start_time: Utc::now(),
            end_time: None,
            messages: Vec::new(),
        }
    }

    /// Whole seconds between start and end; `None` while active.
    pub fn duration_secs(&self) -> Option<u64> {
        self.end_time.map(|end| duration_secs(self.start_time, end))
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        Some(SessionSummary {
            session_id: self.id,
            duration_secs: self.duration_secs()?,
            message_count: self.messages.len(),
            scenario_id: self.scenario_id.clone(),
        })
    }
}

/// Floor of `end - start` in whole seconds, clamped at zero.
pub fn duration_secs(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_seconds().max(0) as u64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub duration_secs: u64,
    pub message_count: usize,
    pub scenario_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn session_with(n: usize) -> TrainingSession {
        let mut session = TrainingSession::new("u1", "SDR", InteractionType::Call, "sdr_cold_outreach");
        for i in 0..n {
            let sender = if i % 2 == 0 { Sender::Ai } else { Sender::User };
            session
                .messages
                .push(ConversationMessage::new(sender, format!("message {}", i)));
        }
        session
    }

    #[test]
    fn test_session_round_trip_with_0_1_and_n_messages() {
        for n in [0, 1, 9] {
            let mut session = session_with(n);
            let json = serde_json::to_string(&session).unwrap();
            let back: TrainingSession = serde_json::from_str(&json).unwrap();
            assert_eq!(back, session);

            session.status = SessionStatus::Completed;
            session.end_time = Some(session.start_time + Duration::seconds(30));
            let json = serde_json::to_string(&session).unwrap();
            let back: TrainingSession = serde_json::from_str(&json).unwrap();
            assert_eq!(back, session);
        }
    }

    #[test]
    fn test_wire_names_are_lowercase() {
        let session = session_with(2);
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["status"], "active");
        assert_eq!(json["interaction_type"], "call");
        assert_eq!(json["messages"][0]["sender"], "ai");
        assert!(json.get("end_time").is_none());
    }

    #[test]
    fn test_duration_is_floored_whole_seconds() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let end = start + Duration::milliseconds(61_999);
        assert_eq!(duration_secs(start, end), 61);
        assert_eq!(duration_secs(end, start), 0);
    }

    #[test]
    fn test_summary_only_for_completed() {
        let mut session = session_with(3);
        assert!(session.summary().is_none());
        session.end_time = Some(session.start_time + Duration::seconds(5));
        session.status = SessionStatus::Completed;
        let summary = session.summary().unwrap();
        assert_eq!(summary.message_count, 3);
        assert_eq!(summary.duration_secs, 5);
        assert_eq!(summary.scenario_id, "sdr_cold_outreach");
    }

    #[test]
    fn test_phase_transitions() {
        use SessionPhase::*;
        assert!(Idle.can_advance_to(Preparing));
        assert!(Preparing.can_advance_to(Active));
        assert!(Active.can_advance_to(Ended));
        assert!(!Ended.can_advance_to(Active));
        assert!(!Idle.can_advance_to(Active));
        assert!(!Ended.can_advance_to(Ended));
    }

    #[test]
    fn test_sender_display() {
        assert_eq!(Sender::User.to_string(), "user");
        assert_eq!(Sender::System.to_string(), "system");
    }
}
