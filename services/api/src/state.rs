//! Shared Application State
//!
//! Holds the training session manager, created once at startup and shared by
//! every handler.

use cxse_core::TrainingSessionManager;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TrainingSessionManager>,
}
