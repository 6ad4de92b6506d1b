//! Training Session Manager
//!
//! Owns every live session and drives it through `Preparing → Active → Ended`.
//! Each live session sits behind its own async mutex, so turns on one session
//! are serialized while different sessions proceed in parallel. Completed
//! sessions leave the live map and are handed to the [`SessionStore`], which
//! remains the only state shared across sessions.

use crate::{
    analytics::{AggregateStats, AnalyticsAggregator, FeedbackOverview},
    capabilities::{Announcement, Announcer, NoDelay, ResponseDelay, SilentAnnouncer},
    catalog::ScenarioCatalog,
    content::{CompanyData, ContentUpload, UploadReceipt},
    engine::ConversationEngine,
    error::TrainingError,
    feedback::Feedback,
    profile::Scenario,
    random::{RandomSource, from_entropy},
    session::{
        ConversationMessage, InteractionType, Sender, SessionPhase, SessionStatus,
        SessionSummary, TrainingSession, duration_secs,
    },
    store::SessionStore,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex as StdMutex, MutexGuard},
    time::Duration,
};
use tokio::{
    sync::{Mutex, OwnedMutexGuard, RwLock, watch},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const TICK: Duration = Duration::from_secs(1);

/// Result of starting a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartedSession {
    pub session: TrainingSession,
    pub scenario: Scenario,
    pub opening_message: ConversationMessage,
}

/// Result of posting a message into a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    pub accepted: ConversationMessage,
    pub ai_reply: Option<ConversationMessage>,
}

/// Elapsed-time ticker of a call-mode session.
struct SessionTicker {
    handle: JoinHandle<()>,
    elapsed: watch::Receiver<u64>,
}

impl SessionTicker {
    fn spawn(session_id: Uuid) -> Self {
        let (tx, elapsed) = watch::channel(0u64);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                tx.send_modify(|secs| *secs += 1);
            }
        });
        debug!(%session_id, "Started session ticker");
        Self { handle, elapsed }
    }

    fn stop(self) -> u64 {
        self.handle.abort();
        *self.elapsed.borrow()
    }
}

struct LiveSession {
    phase: SessionPhase,
    session: TrainingSession,
    scenario: Scenario,
    ticker: Option<SessionTicker>,
}

impl LiveSession {
    fn advance(&mut self, next: SessionPhase) {
        debug_assert!(self.phase.can_advance_to(next));
        self.phase = next;
    }

    fn ensure_active(&self) -> Result<(), TrainingError> {
        if self.phase == SessionPhase::Active {
            Ok(())
        } else {
            Err(TrainingError::SessionNotActive(self.session.id))
        }
    }
}

struct LiveEntry {
    user_id: String,
    session: Arc<Mutex<LiveSession>>,
}

/// The part of a turn that runs after the trainee message is recorded.
struct Turn {
    engine: ConversationEngine,
    rng: Arc<StdMutex<Box<dyn RandomSource>>>,
    delay: Arc<dyn ResponseDelay>,
    announcer: Arc<dyn Announcer>,
}

impl Turn {
    async fn reply(
        self,
        mut live: OwnedMutexGuard<LiveSession>,
        utterance: &str,
    ) -> ConversationMessage {
        self.delay.pause().await;

        let reply_text = {
            let mut rng = lock(&self.rng);
            self.engine.reply(
                utterance,
                &live.scenario.customer_profile,
                &live.session.messages,
                rng.as_mut(),
            )
        };
        let reply = ConversationMessage::new(Sender::Ai, reply_text);
        live.session.messages.push(reply.clone());

        let session_id = live.session.id;
        if live.session.interaction_type == InteractionType::Call {
            self.announcer
                .announce(
                    session_id,
                    Announcement::Speak {
                        speaker: live.scenario.customer_profile.name.clone(),
                        text: reply.content.clone(),
                    },
                )
                .await;
        }

        debug!(%session_id, messages = live.session.messages.len(), "Turn completed");
        reply
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn ensure_text(text: &str) -> Result<(), TrainingError> {
    if text.trim().is_empty() {
        Err(TrainingError::EmptyMessage)
    } else {
        Ok(())
    }
}

pub struct TrainingSessionManager {
    catalog: RwLock<ScenarioCatalog>,
    company_data: RwLock<CompanyData>,
    engine: ConversationEngine,
    store: Arc<dyn SessionStore>,
    analytics: AnalyticsAggregator,
    rng: Arc<StdMutex<Box<dyn RandomSource>>>,
    delay: Arc<dyn ResponseDelay>,
    announcer: Arc<dyn Announcer>,
    live: StdMutex<HashMap<Uuid, LiveEntry>>,
}

impl TrainingSessionManager {
    /// Creates a manager with no typing delay, silent announcements and an
    /// OS-seeded random source. Use the `with_*` methods to replace them.
    pub fn new(catalog: ScenarioCatalog, store: Arc<dyn SessionStore>) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            company_data: RwLock::new(CompanyData::default()),
            engine: ConversationEngine::new(),
            analytics: AnalyticsAggregator::new(store.clone()),
            store,
            rng: Arc::new(StdMutex::new(Box::new(from_entropy()))),
            delay: Arc::new(NoDelay),
            announcer: Arc::new(SilentAnnouncer),
            live: StdMutex::new(HashMap::new()),
        }
    }

    pub fn with_random_source(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Arc::new(StdMutex::new(Box::new(rng)));
        self
    }

    pub fn with_delay(mut self, delay: Arc<dyn ResponseDelay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_announcer(mut self, announcer: Arc<dyn Announcer>) -> Self {
        self.announcer = announcer;
        self
    }

    fn live_session(&self, session_id: Uuid) -> Option<Arc<Mutex<LiveSession>>> {
        lock(&self.live)
            .get(&session_id)
            .map(|entry| entry.session.clone())
    }

    /// The error for an id that has no live session: archived sessions are
    /// no longer active, anything else is unknown.
    async fn not_live(&self, session_id: Uuid) -> TrainingError {
        match self.store.get_session(session_id).await {
            Ok(Some(_)) => TrainingError::SessionNotActive(session_id),
            Ok(None) => TrainingError::SessionNotFound(session_id),
            Err(e) => e,
        }
    }

    async fn require_live(&self, session_id: Uuid) -> Result<Arc<Mutex<LiveSession>>, TrainingError> {
        match self.live_session(session_id) {
            Some(live) => Ok(live),
            None => Err(self.not_live(session_id).await),
        }
    }

    // --- Catalog ---

    pub async fn default_role(&self) -> String {
        self.catalog.read().await.default_role().to_string()
    }

    /// Scenarios a trainee in `role` can be given, with default-role fallback.
    pub async fn scenarios_for(&self, role: &str) -> Vec<Scenario> {
        self.catalog.read().await.scenarios_for(role).to_vec()
    }

    /// Scenarios registered under exactly `role`.
    pub async fn registered_scenarios(&self, role: &str) -> Vec<Scenario> {
        self.catalog.read().await.registered_scenarios(role).to_vec()
    }

    // --- Session lifecycle ---

    /// Starts a session for `user_id`. Without a `scenario_id` one is picked
    /// at random from the role's scenarios.
    #[instrument(skip(self), fields(session_id))]
    pub async fn start_session(
        &self,
        user_id: &str,
        role: &str,
        interaction_type: InteractionType,
        scenario_id: Option<&str>,
    ) -> Result<StartedSession, TrainingError> {
        let scenario = {
            let catalog = self.catalog.read().await;
            if catalog.scenarios_for(role).is_empty() {
                return Err(TrainingError::InvalidRole(role.to_string()));
            }
            match scenario_id {
                Some(id) => catalog.find_for_role(role, id)?.clone(),
                None => catalog.pick_scenario(role, lock(&self.rng).as_mut())?.clone(),
            }
        };

        let phase = SessionPhase::Preparing;
        debug_assert!(SessionPhase::Idle.can_advance_to(phase));

        let mut session =
            TrainingSession::new(user_id, role, interaction_type, scenario.id.clone());
        tracing::Span::current().record("session_id", tracing::field::display(session.id));
        let opening = ConversationMessage::new(Sender::Ai, scenario.opening_message.clone());
        session.messages.push(opening.clone());

        let mut live = LiveSession {
            phase,
            session: session.clone(),
            scenario: scenario.clone(),
            ticker: None,
        };
        live.advance(SessionPhase::Active);

        {
            let mut sessions = lock(&self.live);
            if let Some((active_id, _)) = sessions.iter().find(|(_, e)| e.user_id == user_id) {
                return Err(TrainingError::SessionAlreadyActive {
                    user_id: user_id.to_string(),
                    session_id: *active_id,
                });
            }
            // The ticker is attached before the session becomes reachable, so
            // whoever ends it always finds the handle.
            if interaction_type == InteractionType::Call {
                live.ticker = Some(SessionTicker::spawn(session.id));
            }
            sessions.insert(
                session.id,
                LiveEntry {
                    user_id: user_id.to_string(),
                    session: Arc::new(Mutex::new(live)),
                },
            );
        }

        if interaction_type == InteractionType::Call {
            self.announcer
                .announce(
                    session.id,
                    Announcement::Speak {
                        speaker: scenario.customer_profile.name.clone(),
                        text: opening.content.clone(),
                    },
                )
                .await;
        }

        info!(scenario_id = %scenario.id, ?interaction_type, "Training session started");
        Ok(StartedSession {
            session,
            scenario,
            opening_message: opening,
        })
    }

    /// Runs one trainee turn and returns `(trainee message, customer reply)`.
    ///
    /// The trainee message is appended before the typing delay. The delay and
    /// the reply run in a spawned task that owns the session lock, so the turn
    /// completes even if the caller stops waiting, and concurrent turns on the
    /// same session queue up behind it.
    async fn exchange(
        &self,
        session_id: Uuid,
        text: &str,
    ) -> Result<(ConversationMessage, ConversationMessage), TrainingError> {
        let live = self.require_live(session_id).await?;
        let mut live = live.lock_owned().await;
        live.ensure_active()?;
        ensure_text(text)?;

        let trainee = ConversationMessage::new(Sender::User, text);
        live.session.messages.push(trainee.clone());

        let turn = Turn {
            engine: self.engine,
            rng: self.rng.clone(),
            delay: self.delay.clone(),
            announcer: self.announcer.clone(),
        };
        let utterance = text.to_string();
        let reply = tokio::spawn(async move { turn.reply(live, &utterance).await })
            .await
            .map_err(|e| TrainingError::TurnFailed(e.to_string()))?;
        Ok((trainee, reply))
    }

    /// Submits a trainee utterance and returns the customer's reply.
    #[instrument(skip(self, text))]
    pub async fn submit_message(
        &self,
        session_id: Uuid,
        text: &str,
    ) -> Result<ConversationMessage, TrainingError> {
        let (_, reply) = self.exchange(session_id, text).await?;
        Ok(reply)
    }

    /// Appends a message from any sender. Only trainee messages get a reply.
    #[instrument(skip(self, text))]
    pub async fn post_message(
        &self,
        session_id: Uuid,
        text: &str,
        sender: Sender,
    ) -> Result<PostedMessage, TrainingError> {
        if sender == Sender::User {
            let (accepted, reply) = self.exchange(session_id, text).await?;
            return Ok(PostedMessage {
                accepted,
                ai_reply: Some(reply),
            });
        }

        let live = self.require_live(session_id).await?;
        let mut live = live.lock().await;
        live.ensure_active()?;
        ensure_text(text)?;
        let accepted = ConversationMessage::new(sender, text);
        live.session.messages.push(accepted.clone());
        Ok(PostedMessage {
            accepted,
            ai_reply: None,
        })
    }

    /// Completes the session and archives it. A second call fails.
    #[instrument(skip(self))]
    pub async fn end_session(&self, session_id: Uuid) -> Result<SessionSummary, TrainingError> {
        let live = self.require_live(session_id).await?;
        let mut live = live.lock().await;
        live.ensure_active()?;

        let mut completed = live.session.clone();
        let end_time = Utc::now().max(completed.start_time);
        completed.end_time = Some(end_time);
        completed.status = SessionStatus::Completed;
        let summary = SessionSummary {
            session_id,
            duration_secs: duration_secs(completed.start_time, end_time),
            message_count: completed.messages.len(),
            scenario_id: completed.scenario_id.clone(),
        };

        // Record first: if the store rejects the session it stays active.
        self.store.append_session(completed.clone()).await?;

        live.session = completed;
        live.advance(SessionPhase::Ended);
        if let Some(ticker) = live.ticker.take() {
            let ticked = ticker.stop();
            debug!(%session_id, ticked, "Stopped session ticker");
        }
        drop(live);
        lock(&self.live).remove(&session_id);

        self.announcer
            .announce(session_id, Announcement::SessionComplete(summary.clone()))
            .await;
        info!(
            duration_secs = summary.duration_secs,
            message_count = summary.message_count,
            "Training session completed"
        );
        Ok(summary)
    }

    /// The live or archived session.
    pub async fn get_session(&self, session_id: Uuid) -> Result<TrainingSession, TrainingError> {
        if let Some(live) = self.live_session(session_id) {
            return Ok(live.lock().await.session.clone());
        }
        self.store
            .get_session(session_id)
            .await?
            .ok_or(TrainingError::SessionNotFound(session_id))
    }

    /// Seconds on the session clock. Call sessions report their ticker,
    /// message sessions the wall-clock time since start, completed sessions
    /// their recorded duration.
    pub async fn elapsed_secs(&self, session_id: Uuid) -> Result<u64, TrainingError> {
        if let Some(live) = self.live_session(session_id) {
            let live = live.lock().await;
            return Ok(match &live.ticker {
                Some(ticker) => *ticker.elapsed.borrow(),
                None => duration_secs(live.session.start_time, Utc::now()),
            });
        }
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or(TrainingError::SessionNotFound(session_id))?;
        Ok(session.duration_secs().unwrap_or_default())
    }

    /// Id of the caller's active session, if any.
    pub fn active_session_for(&self, user_id: &str) -> Option<Uuid> {
        lock(&self.live)
            .iter()
            .find(|(_, entry)| entry.user_id == user_id)
            .map(|(id, _)| *id)
    }

    // --- Feedback & analytics ---

    #[instrument(skip(self, comment))]
    pub async fn submit_feedback(
        &self,
        user_id: &str,
        rating: Option<i64>,
        comment: &str,
        session_id: Option<Uuid>,
    ) -> Result<Feedback, TrainingError> {
        let feedback = Feedback::new(user_id, rating, comment, session_id)?;
        if let Some(id) = session_id {
            if self.live_session(id).is_none() && self.store.get_session(id).await?.is_none() {
                return Err(TrainingError::SessionNotFound(id));
            }
        }
        self.store.append_feedback(feedback.clone()).await?;
        info!(feedback_id = %feedback.id, rating = feedback.rating, "Feedback recorded");
        Ok(feedback)
    }

    pub async fn analytics(&self, user_id: &str) -> Result<AggregateStats, TrainingError> {
        self.analytics.user_stats(user_id).await
    }

    /// All feedback with its average rating. Requires the owner capability.
    pub async fn feedback_overview(&self, is_owner: bool) -> Result<FeedbackOverview, TrainingError> {
        if !is_owner {
            return Err(TrainingError::PermissionDenied(
                "owner access required to read feedback".to_string(),
            ));
        }
        self.analytics.feedback_overview().await
    }

    // --- Training content ---

    pub async fn company_data(&self) -> CompanyData {
        self.company_data.read().await.clone()
    }

    /// Registers uploaded scenarios or replaces company data. A scenario batch
    /// is applied all-or-nothing.
    #[instrument(skip(self, upload), fields(data_type = upload.data_type()))]
    pub async fn upload_training_content(
        &self,
        can_upload: bool,
        uploaded_by: &str,
        upload: ContentUpload,
    ) -> Result<UploadReceipt, TrainingError> {
        if !can_upload {
            warn!("Rejected training content upload without owner capability");
            return Err(TrainingError::PermissionDenied(
                "owner access required to upload training content".to_string(),
            ));
        }

        let data_type = upload.data_type().to_string();
        let scenario_ids = match upload {
            ContentUpload::Scenarios(uploads) => {
                if uploads.is_empty() {
                    return Err(TrainingError::InvalidUpload(
                        "at least one scenario is required".to_string(),
                    ));
                }
                let mut catalog = self.catalog.write().await;
                let default_role = catalog.default_role().to_string();
                let resolved = uploads
                    .into_iter()
                    .map(|u| u.into_scenario(&default_role))
                    .collect::<Result<Vec<_>, _>>()?;

                let mut batch = HashSet::new();
                for (_, scenario) in &resolved {
                    if catalog.get(&scenario.id).is_some() || !batch.insert(scenario.id.as_str()) {
                        return Err(TrainingError::InvalidUpload(format!(
                            "scenario id '{}' already exists",
                            scenario.id
                        )));
                    }
                }

                let mut ids = Vec::with_capacity(resolved.len());
                for (role, scenario) in resolved {
                    ids.push(scenario.id.clone());
                    catalog.register(&role, scenario)?;
                }
                ids
            }
            ContentUpload::CompanyData(data) => {
                self.company_data.write().await.merge(data, uploaded_by);
                Vec::new()
            }
        };

        info!(count = scenario_ids.len(), "Training content uploaded");
        Ok(UploadReceipt {
            data_type,
            scenario_ids,
            timestamp: Utc::now(),
        })
    }
}
