//! Session Store
//!
//! Append-only record of completed sessions and feedback. Stored records are
//! never mutated; a session id can be recorded once. Two implementations:
//!
//! - [`InMemorySessionStore`]: process-lifetime storage.
//! - [`FileSessionStore`]: the same index backed by a JSON-lines file that is
//!   replayed on open.

use crate::{error::TrainingError, feedback::Feedback, session::TrainingSession};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Records a completed session. Fails with `AlreadyRecorded` if the id is
    /// already present.
    async fn append_session(&self, session: TrainingSession) -> Result<(), TrainingError>;

    async fn append_feedback(&self, feedback: Feedback) -> Result<(), TrainingError>;

    async fn get_session(&self, id: Uuid) -> Result<Option<TrainingSession>, TrainingError>;

    /// Completed sessions of `user_id` in recording order.
    async fn sessions_for_user(&self, user_id: &str) -> Result<Vec<TrainingSession>, TrainingError>;

    async fn feedback_for_user(&self, user_id: &str) -> Result<Vec<Feedback>, TrainingError>;

    async fn all_feedback(&self) -> Result<Vec<Feedback>, TrainingError>;
}

/// Process-lifetime store. Readers share the lock; appends take it exclusively.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<Vec<TrainingSession>>,
    feedback: RwLock<Vec<Feedback>>,
}

fn poisoned<T>(_: T) -> TrainingError {
    TrainingError::Storage("store lock poisoned".to_string())
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn contains_session(&self, id: Uuid) -> Result<bool, TrainingError> {
        Ok(self.sessions.read().map_err(poisoned)?.iter().any(|s| s.id == id))
    }

    fn push_session(&self, session: TrainingSession) -> Result<(), TrainingError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        if sessions.iter().any(|s| s.id == session.id) {
            return Err(TrainingError::AlreadyRecorded(session.id));
        }
        sessions.push(session);
        Ok(())
    }

    fn push_feedback(&self, feedback: Feedback) -> Result<(), TrainingError> {
        self.feedback.write().map_err(poisoned)?.push(feedback);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn append_session(&self, session: TrainingSession) -> Result<(), TrainingError> {
        debug!(session_id = %session.id, "Recording session");
        self.push_session(session)
    }

    async fn append_feedback(&self, feedback: Feedback) -> Result<(), TrainingError> {
        debug!(feedback_id = %feedback.id, "Recording feedback");
        self.push_feedback(feedback)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<TrainingSession>, TrainingError> {
        Ok(self
            .sessions
            .read()
            .map_err(poisoned)?
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn sessions_for_user(&self, user_id: &str) -> Result<Vec<TrainingSession>, TrainingError> {
        Ok(self
            .sessions
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn feedback_for_user(&self, user_id: &str) -> Result<Vec<Feedback>, TrainingError> {
        Ok(self
            .feedback
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn all_feedback(&self) -> Result<Vec<Feedback>, TrainingError> {
        Ok(self.feedback.read().map_err(poisoned)?.clone())
    }
}

/// One line of the store file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
enum StoredRecord {
    Session(TrainingSession),
    Feedback(Feedback),
}

/// JSON-lines store. Appends are serialized through the writer lock and hit
/// the file before the in-memory index, so a failed write records nothing.
pub struct FileSessionStore {
    path: PathBuf,
    writer: Mutex<tokio::fs::File>,
    index: InMemorySessionStore,
}

impl FileSessionStore {
    /// Opens (or creates) the store file and replays its records.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TrainingError> {
        let path = path.as_ref().to_path_buf();
        let index = InMemorySessionStore::new();

        if tokio::fs::try_exists(&path).await? {
            let raw = tokio::fs::read_to_string(&path).await?;
            let mut offset = 0usize;
            for (line_no, chunk) in raw.split_inclusive('\n').enumerate() {
                let line_start = offset;
                offset += chunk.len();
                let line = chunk.trim_end();
                if line.is_empty() {
                    continue;
                }
                let record: StoredRecord = match serde_json::from_str(line) {
                    Ok(record) => record,
                    // An unterminated last line is an interrupted append.
                    Err(e) if !chunk.ends_with('\n') => {
                        warn!(
                            path = %path.display(),
                            line = line_no + 1,
                            error = %e,
                            "Dropping partial record at end of store"
                        );
                        let file = OpenOptions::new().write(true).open(&path).await?;
                        file.set_len(line_start as u64).await?;
                        break;
                    }
                    Err(e) => {
                        return Err(TrainingError::Storage(format!(
                            "{}:{}: {}",
                            path.display(),
                            line_no + 1,
                            e
                        )));
                    }
                };
                match record {
                    StoredRecord::Session(session) => index.push_session(session)?,
                    StoredRecord::Feedback(feedback) => index.push_feedback(feedback)?,
                }
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        info!(path = %path.display(), "Opened session store");

        Ok(Self {
            path,
            writer: Mutex::new(file),
            index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line. A failed write is cut back off the file so the
    /// next record starts on a clean line.
    async fn write_record(
        file: &mut tokio::fs::File,
        record: &StoredRecord,
    ) -> Result<(), TrainingError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let len = file.metadata().await?.len();
        let written = async {
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            if let Err(truncate) = file.set_len(len).await {
                warn!(error = %truncate, "Failed to roll back partial store write");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn append_session(&self, session: TrainingSession) -> Result<(), TrainingError> {
        let mut file = self.writer.lock().await;
        if self.index.contains_session(session.id)? {
            return Err(TrainingError::AlreadyRecorded(session.id));
        }
        let record = StoredRecord::Session(session);
        Self::write_record(&mut file, &record).await?;
        if let StoredRecord::Session(session) = record {
            self.index.push_session(session)?;
        }
        Ok(())
    }

    async fn append_feedback(&self, feedback: Feedback) -> Result<(), TrainingError> {
        let mut file = self.writer.lock().await;
        let record = StoredRecord::Feedback(feedback);
        Self::write_record(&mut file, &record).await?;
        if let StoredRecord::Feedback(feedback) = record {
            self.index.push_feedback(feedback)?;
        }
        Ok(())
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<TrainingSession>, TrainingError> {
        self.index.get_session(id).await
    }

    async fn sessions_for_user(&self, user_id: &str) -> Result<Vec<TrainingSession>, TrainingError> {
        self.index.sessions_for_user(user_id).await
    }

    async fn feedback_for_user(&self, user_id: &str) -> Result<Vec<Feedback>, TrainingError> {
        self.index.feedback_for_user(user_id).await
    }

    async fn all_feedback(&self) -> Result<Vec<Feedback>, TrainingError> {
        self.index.all_feedback().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ConversationMessage, InteractionType, Sender, SessionStatus};
    use chrono::Duration;

    fn completed(user_id: &str, scenario_id: &str) -> TrainingSession {
        let mut session =
            TrainingSession::new(user_id, "AE", InteractionType::Message, scenario_id);
        session
            .messages
            .push(ConversationMessage::new(Sender::Ai, "Hello"));
        session.status = SessionStatus::Completed;
        session.end_time = Some(session.start_time + Duration::seconds(12));
        session
    }

    #[tokio::test]
    async fn test_in_memory_rejects_double_record() {
        let store = InMemorySessionStore::new();
        let session = completed("u1", "a");
        store.append_session(session.clone()).await.unwrap();
        let err = store.append_session(session.clone()).await.unwrap_err();
        assert!(matches!(err, TrainingError::AlreadyRecorded(id) if id == session.id));
        assert_eq!(store.sessions_for_user("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_queries_are_scoped_by_user() {
        let store = InMemorySessionStore::new();
        store.append_session(completed("u1", "a")).await.unwrap();
        store.append_session(completed("u2", "b")).await.unwrap();
        store
            .append_feedback(Feedback::new("u2", Some(4), "good", None).unwrap())
            .await
            .unwrap();

        assert_eq!(store.sessions_for_user("u1").await.unwrap()[0].scenario_id, "a");
        assert!(store.feedback_for_user("u1").await.unwrap().is_empty());
        assert_eq!(store.feedback_for_user("u2").await.unwrap().len(), 1);
        assert_eq!(store.all_feedback().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_replays_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        let session = completed("u1", "a");
        let feedback = Feedback::new("u1", Some(5), "great", Some(session.id)).unwrap();

        {
            let store = FileSessionStore::open(&path).await.unwrap();
            store.append_session(session.clone()).await.unwrap();
            store.append_feedback(feedback.clone()).await.unwrap();
        }

        let reopened = FileSessionStore::open(&path).await.unwrap();
        assert_eq!(reopened.get_session(session.id).await.unwrap(), Some(session.clone()));
        assert_eq!(reopened.feedback_for_user("u1").await.unwrap(), vec![feedback]);
        assert!(matches!(
            reopened.append_session(session).await,
            Err(TrainingError::AlreadyRecorded(_))
        ));
    }

    #[tokio::test]
    async fn test_file_store_drops_torn_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        let session = completed("u1", "a");
        {
            let store = FileSessionStore::open(&path).await.unwrap();
            store.append_session(session.clone()).await.unwrap();
        }
        let mut raw = std::fs::read_to_string(&path).unwrap();
        raw.push_str("{\"kind\":\"session\",\"rec");
        std::fs::write(&path, raw).unwrap();

        let store = FileSessionStore::open(&path).await.unwrap();
        assert_eq!(store.sessions_for_user("u1").await.unwrap(), vec![session]);

        // The next append lands on its own line and survives a reopen.
        let retried = completed("u1", "b");
        store.append_session(retried.clone()).await.unwrap();
        drop(store);
        let reopened = FileSessionStore::open(&path).await.unwrap();
        assert_eq!(reopened.sessions_for_user("u1").await.unwrap().len(), 2);
        assert!(reopened.get_session(retried.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_store_reports_corrupt_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        std::fs::write(&path, "not json\n").unwrap();
        let result = FileSessionStore::open(&path).await;
        assert!(matches!(result, Err(TrainingError::Storage(msg)) if msg.contains(":1:")));
    }
}
