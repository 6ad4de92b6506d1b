//! Rendering capabilities supplied by the runtime.
//!
//! The engine decides what the customer says and when a turn completes. How a
//! turn is paced (a typing delay) and how it is voiced (text-to-speech, a log
//! line, nothing at all) is left to implementations of these traits, so the
//! same manager serves chat, calls and tests.

use crate::session::SessionSummary;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Pauses before a generated reply is returned.
#[async_trait]
pub trait ResponseDelay: Send + Sync {
    async fn pause(&self);
}

/// Sleeps for a uniformly random duration in `[min, max]`.
#[derive(Debug, Clone)]
pub struct RandomDelay {
    min: Duration,
    max: Duration,
}

impl RandomDelay {
    /// `min` greater than `max` is treated as a fixed `min` delay.
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    fn sample(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

#[async_trait]
impl ResponseDelay for RandomDelay {
    async fn pause(&self) {
        let wait = self.sample();
        tokio::time::sleep(wait).await;
    }
}

/// Returns immediately. Used by tests and batch tooling.
pub struct NoDelay;

#[async_trait]
impl ResponseDelay for NoDelay {
    async fn pause(&self) {}
}

/// Something the runtime should voice or display for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// The customer speaks `text`.
    Speak { speaker: String, text: String },
    /// The session is over.
    SessionComplete(SessionSummary),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, session_id: Uuid, announcement: Announcement);
}

/// Writes announcements to the log.
pub struct TracingAnnouncer;

#[async_trait]
impl Announcer for TracingAnnouncer {
    async fn announce(&self, session_id: Uuid, announcement: Announcement) {
        match announcement {
            Announcement::Speak { speaker, text } => {
                info!(%session_id, %speaker, %text, "Customer speaks");
            }
            Announcement::SessionComplete(summary) => {
                info!(
                    %session_id,
                    duration_secs = summary.duration_secs,
                    message_count = summary.message_count,
                    "Session complete"
                );
            }
        }
    }
}

pub struct SilentAnnouncer;

#[async_trait]
impl Announcer for SilentAnnouncer {
    async fn announce(&self, _session_id: Uuid, _announcement: Announcement) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_delay_sample_in_range() {
        let delay = RandomDelay::new(Duration::from_millis(10), Duration::from_millis(20));
        for _ in 0..32 {
            let d = delay.sample();
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
        }
    }

    #[test]
    fn test_inverted_range_collapses_to_min() {
        let delay = RandomDelay::new(Duration::from_millis(50), Duration::from_millis(5));
        assert_eq!(delay.sample(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_random_delay_sleeps() {
        let delay = RandomDelay::new(Duration::from_millis(1500), Duration::from_millis(3500));
        let started = tokio::time::Instant::now();
        delay.pause().await;
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }
}
