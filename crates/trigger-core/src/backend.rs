//! Backend operations consumed by the explorer.
//!
//! Mutations return a job id as soon as the backend accepts them; their
//! outcome arrives later on the notification channel.

use crate::action::{ActionRecord, ReorderEntry};
use crate::setting::SettingRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Identifier of a backend deployment job. Denotes the job, not its completion.
pub type JobId = String;

/// A rejected backend call, carrying the platform's message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Whether a fetch may be served from a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Cached,
    /// Bypass every caching layer; used after a deployment completes.
    Fresh,
}

#[async_trait]
pub trait TriggerBackend: Send + Sync {
    async fn fetch_settings(&self, freshness: Freshness) -> BackendResult<Vec<SettingRecord>>;

    async fn fetch_actions(&self, freshness: Freshness) -> BackendResult<Vec<ActionRecord>>;

    async fn upsert_action(&self, payload: serde_json::Value) -> BackendResult<JobId>;

    async fn upsert_setting(&self, payload: serde_json::Value) -> BackendResult<JobId>;

    async fn reorder_actions(&self, payload: Vec<serde_json::Value>) -> BackendResult<JobId>;

    async fn current_user_id(&self) -> BackendResult<String>;
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

/// A configuration change handed to the deployment coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    UpsertAction(ActionRecord),
    UpsertSetting(SettingRecord),
    Reorder(Vec<ReorderEntry>),
}

impl Mutation {
    pub fn describe(&self) -> String {
        match self {
            Mutation::UpsertAction(a) if a.id.is_none() => {
                format!("create action {}", a.developer_name)
            }
            Mutation::UpsertAction(a) => format!("update action {}", a.developer_name),
            Mutation::UpsertSetting(s) if s.id.is_none() => {
                format!("create setting {}", s.developer_name)
            }
            Mutation::UpsertSetting(s) => format!("update setting {}", s.developer_name),
            Mutation::Reorder(entries) => format!("reorder {} actions", entries.len()),
        }
    }

    /// Serialize and send through the matching backend call.
    pub async fn send(&self, backend: &dyn TriggerBackend) -> BackendResult<JobId> {
        let encode = |e: serde_json::Error| BackendError::new(format!("could not encode payload: {e}"));
        match self {
            Mutation::UpsertAction(record) => {
                backend
                    .upsert_action(serde_json::to_value(record).map_err(encode)?)
                    .await
            }
            Mutation::UpsertSetting(record) => {
                backend
                    .upsert_setting(serde_json::to_value(record).map_err(encode)?)
                    .await
            }
            Mutation::Reorder(entries) => {
                let payload = entries
                    .iter()
                    .map(serde_json::to_value)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(encode)?;
                backend.reorder_actions(payload).await
            }
        }
    }
}
