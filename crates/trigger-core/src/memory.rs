//! An org held in process memory.
//!
//! Mutations are accepted immediately and applied by a background task after
//! a configurable latency, which then publishes the outcome on the org's
//! [`DeploymentEvents`] hub. Fetches distinguish a cache fill from the live
//! records so callers can observe stale reads.

use crate::action::{ActionRecord, ReorderEntry};
use crate::backend::{BackendError, BackendResult, Freshness, JobId, TriggerBackend};
use crate::error::Result;
use crate::notification::{DeploymentEvents, DeploymentNotification};
use crate::setting::SettingRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Serialized form of an org: the current user plus both record collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgSnapshot {
    pub user_id: String,
    #[serde(default)]
    pub settings: Vec<SettingRecord>,
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

impl OrgSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        crate::io::atomic_write(path, &data)
    }
}

#[derive(Debug)]
enum Deployment {
    UpsertAction(ActionRecord),
    UpsertSetting(SettingRecord),
    Reorder(Vec<ReorderEntry>),
}

#[derive(Debug, Default)]
struct OrgState {
    live: OrgSnapshot,
    cached_settings: Option<Vec<SettingRecord>>,
    cached_actions: Option<Vec<ActionRecord>>,
    reject_next: Option<String>,
    fail_next: Option<String>,
    fail_fetch: Option<String>,
    next_record: u64,
    deployed: usize,
}

impl OrgState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_record += 1;
        format!("{prefix}{:012}", self.next_record)
    }

    fn apply(&mut self, deployment: Deployment) -> std::result::Result<String, String> {
        match deployment {
            Deployment::UpsertAction(mut record) => match record.id.clone() {
                None => {
                    let taken = self
                        .live
                        .actions
                        .iter()
                        .any(|a| a.developer_name.eq_ignore_ascii_case(&record.developer_name));
                    if taken {
                        return Err(format!(
                            "Duplicate developer name: {}",
                            record.developer_name
                        ));
                    }
                    record.id = Some(self.next_id("a0T"));
                    let message = format!("Created trigger action {}", record.developer_name);
                    self.live.actions.push(record);
                    Ok(message)
                }
                Some(id) => {
                    let Some(existing) = self
                        .live
                        .actions
                        .iter_mut()
                        .find(|a| a.id.as_deref() == Some(id.as_str()))
                    else {
                        return Err(format!("Unknown trigger action: {id}"));
                    };
                    record.developer_name = existing.developer_name.clone();
                    let message = format!("Updated trigger action {}", record.developer_name);
                    *existing = record;
                    Ok(message)
                }
            },
            Deployment::UpsertSetting(mut record) => match record.id.clone() {
                None => {
                    let taken = self
                        .live
                        .settings
                        .iter()
                        .any(|s| s.developer_name.eq_ignore_ascii_case(&record.developer_name));
                    if taken {
                        return Err(format!(
                            "Duplicate developer name: {}",
                            record.developer_name
                        ));
                    }
                    record.id = Some(self.next_id("m0S"));
                    let message = format!("Created trigger setting {}", record.developer_name);
                    self.live.settings.push(record);
                    Ok(message)
                }
                Some(id) => {
                    let Some(existing) = self
                        .live
                        .settings
                        .iter_mut()
                        .find(|s| s.id.as_deref() == Some(id.as_str()))
                    else {
                        return Err(format!("Unknown trigger setting: {id}"));
                    };
                    record.developer_name = existing.developer_name.clone();
                    let message = format!("Updated trigger setting {}", record.developer_name);
                    *existing = record;
                    Ok(message)
                }
            },
            Deployment::Reorder(entries) => {
                if let Some(missing) = entries.iter().find(|e| {
                    !self
                        .live
                        .actions
                        .iter()
                        .any(|a| a.developer_name == e.developer_name)
                }) {
                    return Err(format!("Unknown trigger action: {}", missing.developer_name));
                }
                for entry in &entries {
                    if let Some(a) = self
                        .live
                        .actions
                        .iter_mut()
                        .find(|a| a.developer_name == entry.developer_name)
                    {
                        a.order = Some(entry.order);
                    }
                }
                Ok(format!("Reordered {} trigger actions", entries.len()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// InMemoryOrg
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct InMemoryOrg {
    state: Arc<Mutex<OrgState>>,
    events: DeploymentEvents,
    latency: Duration,
}

impl InMemoryOrg {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self::from_snapshot(OrgSnapshot {
            user_id: user_id.into(),
            ..Default::default()
        })
    }

    pub fn from_snapshot(snapshot: OrgSnapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(OrgState {
                live: snapshot,
                ..Default::default()
            })),
            events: DeploymentEvents::default(),
            latency: Duration::ZERO,
        }
    }

    /// Delay between accepting a mutation and publishing its outcome.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn events(&self) -> &DeploymentEvents {
        &self.events
    }

    /// The live records, including every deployment applied so far.
    pub fn snapshot(&self) -> OrgSnapshot {
        self.state().live.clone()
    }

    /// Number of deployments that have completed, successfully or not.
    pub fn deployed(&self) -> usize {
        self.state().deployed
    }

    /// Make the next mutation call fail locally with `message`.
    pub fn reject_next_submission(&self, message: impl Into<String>) {
        self.state().reject_next = Some(message.into());
    }

    /// Accept the next mutation but report its deployment as failed.
    pub fn fail_next_deployment(&self, message: impl Into<String>) {
        self.state().fail_next = Some(message.into());
    }

    /// Make the next settings fetch fail with `message`.
    pub fn fail_next_fetch(&self, message: impl Into<String>) {
        self.state().fail_fetch = Some(message.into());
    }

    fn state(&self) -> MutexGuard<'_, OrgState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enqueue(&self, deployment: Deployment) -> BackendResult<JobId> {
        let (user_id, forced_failure) = {
            let mut state = self.state();
            if let Some(message) = state.reject_next.take() {
                return Err(BackendError::new(message));
            }
            (state.live.user_id.clone(), state.fail_next.take())
        };

        let job_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(job = %job_id, ?deployment, "deployment queued");

        let state = self.state.clone();
        let events = self.events.clone();
        let latency = self.latency;
        let job = job_id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            let outcome = {
                let mut state = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                state.deployed += 1;
                match forced_failure {
                    Some(message) => Err(message),
                    None => state.apply(deployment),
                }
            };
            let notification = match outcome {
                Ok(message) => DeploymentNotification::succeeded(&user_id, Some(message)),
                Err(message) => {
                    tracing::info!(job = %job, error = %message, "deployment failed");
                    DeploymentNotification::failed(&user_id, Some(message))
                }
            };
            events.publish(notification.with_job(job));
        });
        Ok(job_id)
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> BackendResult<T> {
    serde_json::from_value(value).map_err(|e| BackendError::new(format!("malformed payload: {e}")))
}

#[async_trait]
impl TriggerBackend for InMemoryOrg {
    async fn fetch_settings(&self, freshness: Freshness) -> BackendResult<Vec<SettingRecord>> {
        let mut state = self.state();
        if let Some(message) = state.fail_fetch.take() {
            return Err(BackendError::new(message));
        }
        if freshness == Freshness::Fresh || state.cached_settings.is_none() {
            state.cached_settings = Some(state.live.settings.clone());
        }
        Ok(state.cached_settings.clone().unwrap_or_default())
    }

    async fn fetch_actions(&self, freshness: Freshness) -> BackendResult<Vec<ActionRecord>> {
        let mut state = self.state();
        if freshness == Freshness::Fresh || state.cached_actions.is_none() {
            state.cached_actions = Some(state.live.actions.clone());
        }
        Ok(state.cached_actions.clone().unwrap_or_default())
    }

    async fn upsert_action(&self, payload: serde_json::Value) -> BackendResult<JobId> {
        self.enqueue(Deployment::UpsertAction(decode(payload)?))
    }

    async fn upsert_setting(&self, payload: serde_json::Value) -> BackendResult<JobId> {
        self.enqueue(Deployment::UpsertSetting(decode(payload)?))
    }

    async fn reorder_actions(&self, payload: Vec<serde_json::Value>) -> BackendResult<JobId> {
        let entries = payload
            .into_iter()
            .map(decode)
            .collect::<BackendResult<Vec<ReorderEntry>>>()?;
        self.enqueue(Deployment::Reorder(entries))
    }

    async fn current_user_id(&self) -> BackendResult<String> {
        Ok(self.state().live.user_id.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{DeploymentStatus, NotificationChannel};
    use futures::StreamExt;
    use serde_json::json;
    use tempfile::TempDir;

    fn org() -> InMemoryOrg {
        let snapshot: OrgSnapshot = serde_json::from_value(json!({
            "userId": "005U",
            "settings": [{"Id": "S1", "DeveloperName": "Account", "Object_API_Name__c": "Account"}],
            "actions": [
                {"Id": "A1", "DeveloperName": "TA_One", "Label": "One", "Order__c": 1,
                 "Apex_Class_Name__c": "One", "Before_Insert__c": "S1"},
                {"Id": "A2", "DeveloperName": "TA_Two", "Label": "Two", "Order__c": 2,
                 "Apex_Class_Name__c": "Two", "Before_Insert__c": "S1"}
            ]
        }))
        .unwrap();
        InMemoryOrg::from_snapshot(snapshot)
    }

    #[tokio::test]
    async fn cached_fetch_is_stale_until_fresh_fetch() {
        let org = org();
        let mut events = org.events().subscribe();
        assert_eq!(org.fetch_actions(Freshness::Cached).await.unwrap()[0].order, Some(1.0));

        org.reorder_actions(vec![json!({"developerName": "TA_One", "label": "One", "order": 5})])
            .await
            .unwrap();
        events.next().await.unwrap().unwrap();

        assert_eq!(org.fetch_actions(Freshness::Cached).await.unwrap()[0].order, Some(1.0));
        assert_eq!(org.fetch_actions(Freshness::Fresh).await.unwrap()[0].order, Some(5.0));
    }

    #[tokio::test]
    async fn notifications_carry_job_id_and_user() {
        let org = org();
        let mut events = org.events().subscribe();
        let job = org
            .upsert_action(json!({"DeveloperName": "TA_New", "Label": "New", "Apex_Class_Name__c": "New"}))
            .await
            .unwrap();
        let n = events.next().await.unwrap().unwrap();
        assert_eq!(n.job_id.as_deref(), Some(job.as_str()));
        assert_eq!(n.originating_user_id, "005U");
        assert_eq!(n.status, DeploymentStatus::Succeeded);
        assert_eq!(org.snapshot().actions.len(), 3);
    }

    #[tokio::test]
    async fn duplicate_create_fails_deployment() {
        let org = org();
        let mut events = org.events().subscribe();
        org.upsert_action(json!({"DeveloperName": "ta_one", "Label": "Dup", "Apex_Class_Name__c": "X"}))
            .await
            .unwrap();
        let n = events.next().await.unwrap().unwrap();
        assert_eq!(n.status, DeploymentStatus::Failed);
        assert!(n.message.unwrap().contains("Duplicate developer name"));
        assert_eq!(org.snapshot().actions.len(), 2);
    }

    #[tokio::test]
    async fn unknown_reorder_name_fails_whole_deployment() {
        let org = org();
        let mut events = org.events().subscribe();
        org.reorder_actions(vec![
            json!({"developerName": "TA_One", "label": "One", "order": 9}),
            json!({"developerName": "TA_Ghost", "label": "Ghost", "order": 1}),
        ])
        .await
        .unwrap();
        let n = events.next().await.unwrap().unwrap();
        assert_eq!(n.status, DeploymentStatus::Failed);
        assert_eq!(org.snapshot().actions[0].order, Some(1.0));
    }

    #[tokio::test]
    async fn update_keeps_developer_name() {
        let org = org();
        let mut events = org.events().subscribe();
        org.upsert_setting(json!({"Id": "S1", "DeveloperName": "Renamed", "Object_API_Name__c": "Account", "Bypass_Execution__c": true}))
            .await
            .unwrap();
        events.next().await.unwrap().unwrap();
        let s = &org.snapshot().settings[0];
        assert_eq!(s.developer_name, "Account");
        assert!(s.bypass_execution);
    }

    #[tokio::test]
    async fn failure_hooks() {
        let org = org();
        let mut events = org.events().subscribe();

        org.reject_next_submission("nope");
        let err = org.reorder_actions(vec![]).await.unwrap_err();
        assert_eq!(err.message, "nope");

        org.fail_next_deployment("deploy broke");
        org.reorder_actions(vec![]).await.unwrap();
        let n = events.next().await.unwrap().unwrap();
        assert_eq!(n.message.as_deref(), Some("deploy broke"));
        assert_eq!(org.deployed(), 1);

        org.fail_next_fetch("timed out");
        let err = org.fetch_settings(Freshness::Fresh).await.unwrap_err();
        assert_eq!(err.message, "timed out");
        assert!(org.fetch_settings(Freshness::Fresh).await.is_ok());
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected_locally() {
        let org = org();
        let err = org.upsert_action(json!({"Order__c": "high"})).await.unwrap_err();
        assert!(err.message.starts_with("malformed payload"));
    }

    #[test]
    fn snapshot_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("org.json");
        let snapshot = org().snapshot();
        snapshot.save(&path).unwrap();
        assert_eq!(OrgSnapshot::load(&path).unwrap(), snapshot);
    }
}
