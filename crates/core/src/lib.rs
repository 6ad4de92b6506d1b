//! Core of the sales-conversation training engine.
//!
//! A trainee picks a role, gets a scenario with a simulated customer, and
//! talks to that customer until the session is ended. The
//! [`manager::TrainingSessionManager`] drives the lifecycle; replies come from
//! the rule-based [`engine::ConversationEngine`]; completed sessions and
//! feedback land in a [`store::SessionStore`] and are summarized by
//! [`analytics`].
//!
//! Side effects that depend on the runtime (typing delay, voicing replies)
//! are injected through the traits in [`capabilities`].

pub mod analytics;
pub mod capabilities;
pub mod catalog;
pub mod content;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod manager;
pub mod profile;
pub mod random;
pub mod scenarios;
pub mod session;
pub mod store;

pub use error::{ErrorKind, TrainingError};
pub use manager::TrainingSessionManager;
