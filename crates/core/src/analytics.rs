//! Per-user training statistics derived from the session store.
//!
//! Aggregation is a pure read: nothing is cached and calling it twice over the
//! same store contents yields the same result.

use crate::{
    error::TrainingError,
    feedback::Feedback,
    session::{SessionSummary, TrainingSession},
    store::SessionStore,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, sync::Arc};

const RECENT_SESSIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_sessions: usize,
    pub total_duration_secs: u64,
    pub average_duration_secs: u64,
    pub messages_sent: usize,
    pub scenarios_completed: usize,
    /// Newest first.
    pub recent_sessions: Vec<SessionSummary>,
    pub feedback_count: usize,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackOverview {
    pub feedback: Vec<Feedback>,
    pub total_count: usize,
    /// Mean rating rounded to one decimal.
    pub average_rating: Option<f64>,
}

fn average_rating(feedback: &[Feedback]) -> Option<f64> {
    if feedback.is_empty() {
        return None;
    }
    let sum: u64 = feedback.iter().map(|f| f.rating as u64).sum();
    let mean = sum as f64 / feedback.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

/// Folds completed sessions and feedback of one user into [`AggregateStats`].
pub fn aggregate(sessions: &[TrainingSession], feedback: &[Feedback]) -> AggregateStats {
    let total_sessions = sessions.len();
    let total_duration_secs: u64 = sessions.iter().filter_map(|s| s.duration_secs()).sum();
    let average_duration_secs = if total_sessions > 0 {
        total_duration_secs / total_sessions as u64
    } else {
        0
    };
    let messages_sent = sessions.iter().map(|s| s.messages.len()).sum();
    let scenarios_completed = sessions
        .iter()
        .map(|s| s.scenario_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let recent_sessions = sessions
        .iter()
        .rev()
        .take(RECENT_SESSIONS)
        .filter_map(TrainingSession::summary)
        .collect();

    AggregateStats {
        total_sessions,
        total_duration_secs,
        average_duration_secs,
        messages_sent,
        scenarios_completed,
        recent_sessions,
        feedback_count: feedback.len(),
        average_rating: average_rating(feedback),
    }
}

pub fn feedback_overview(feedback: Vec<Feedback>) -> FeedbackOverview {
    FeedbackOverview {
        total_count: feedback.len(),
        average_rating: average_rating(&feedback),
        feedback,
    }
}

pub struct AnalyticsAggregator {
    store: Arc<dyn SessionStore>,
}

impl AnalyticsAggregator {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<AggregateStats, TrainingError> {
        let sessions = self.store.sessions_for_user(user_id).await?;
        let feedback = self.store.feedback_for_user(user_id).await?;
        Ok(aggregate(&sessions, &feedback))
    }

    pub async fn feedback_overview(&self) -> Result<FeedbackOverview, TrainingError> {
        Ok(feedback_overview(self.store.all_feedback().await?))
    }
}
