//! Bridges fire-and-forget mutations to their out-of-band completion.

use crate::action::TriggerAction;
use crate::backend::{JobId, Mutation, TriggerBackend};
use crate::config::ExplorerConfig;
use crate::error::{Result, TriggerError};
use crate::names::KnownNames;
use crate::notification::{DeploymentNotification, DeploymentStatus};
use crate::setting::TriggerSetting;
use crate::store::{PersistedSelection, SelectionStore};
use crate::types::Section;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// The UI surface that started an operation and shows its busy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    SettingModal,
    ActionModal,
    Section(Section),
}

#[derive(Debug, Clone)]
pub struct PendingOperation {
    pub job_id: Option<JobId>,
    pub description: String,
    pub surface: Surface,
    pub submitted_at: DateTime<Utc>,
    /// Set when the submission itself was rejected with a pre-deployment
    /// failure and a late notification may still arrive.
    pub late_wait: Option<LateWait>,
}

#[derive(Debug, Clone)]
pub struct LateWait {
    pub deadline: Instant,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Backend accepted the job; its outcome arrives as a notification.
    Pending { job_id: JobId },
    /// Submission was rejected with a pre-deployment failure; waiting up to
    /// the deadline for a notification before surfacing `error`.
    AwaitingLateNotification { error: String, deadline: Instant },
}

#[derive(Debug, Clone)]
pub enum Resolution {
    Succeeded {
        op: PendingOperation,
        message: Option<String>,
    },
    Failed {
        op: PendingOperation,
        message: String,
    },
    /// The late-notification wait elapsed without a notification.
    TimedOut {
        op: PendingOperation,
        message: String,
    },
}

impl Resolution {
    pub fn op(&self) -> &PendingOperation {
        match self {
            Resolution::Succeeded { op, .. }
            | Resolution::Failed { op, .. }
            | Resolution::TimedOut { op, .. } => op,
        }
    }
}

// ---------------------------------------------------------------------------
// DeploymentCoordinator
// ---------------------------------------------------------------------------

pub struct DeploymentCoordinator {
    backend: Arc<dyn TriggerBackend>,
    store: Arc<dyn SelectionStore>,
    user_id: Option<String>,
    pending: Option<PendingOperation>,
    known: KnownNames,
    late_wait: Duration,
    pre_deployment: Regex,
    generic_failure: String,
}

impl DeploymentCoordinator {
    pub fn new(
        backend: Arc<dyn TriggerBackend>,
        store: Arc<dyn SelectionStore>,
        config: &ExplorerConfig,
    ) -> Self {
        Self {
            backend,
            store,
            user_id: None,
            pending: None,
            known: KnownNames::default(),
            late_wait: config.late_notification_wait(),
            pre_deployment: config.pre_deployment_regex(),
            generic_failure: config.generic_failure_message.clone(),
        }
    }

    /// Look up and remember the current user's id.
    pub async fn identify(&mut self) -> Result<&str> {
        let id = self
            .backend
            .current_user_id()
            .await
            .map_err(|e| TriggerError::Backend(e.message))?;
        tracing::debug!(user = %id, "resolved current user");
        Ok(self.user_id.insert(id).as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn pending(&self) -> Option<&PendingOperation> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_busy(&self, surface: Surface) -> bool {
        self.pending.as_ref().is_some_and(|p| p.surface == surface)
    }

    pub fn late_deadline(&self) -> Option<Instant> {
        self.pending
            .as_ref()
            .and_then(|p| p.late_wait.as_ref())
            .map(|w| w.deadline)
    }

    pub fn known_names(&self) -> &KnownNames {
        &self.known
    }

    pub fn rebuild_known_names(&mut self, settings: &[TriggerSetting], actions: &[TriggerAction]) {
        self.known = KnownNames::rebuild(
            settings.iter().map(|s| s.developer_name.as_str()),
            actions.iter().map(|a| a.developer_name.as_str()),
        );
    }

    /// Read back the selection saved at submit time, clearing it.
    pub fn take_saved_selection(&self) -> Option<PersistedSelection> {
        match self.store.take() {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(error = %e, "could not read saved selection");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Persist `selection`, send `mutation`, and track it as pending.
    ///
    /// A local rejection matching the pre-deployment pattern keeps the
    /// operation pending behind a bounded wait; any other rejection is
    /// returned as [`TriggerError::Backend`] with nothing left pending.
    pub async fn submit(
        &mut self,
        mutation: Mutation,
        surface: Surface,
        selection: Option<PersistedSelection>,
    ) -> Result<SubmitOutcome> {
        if self.pending.is_some() {
            return Err(TriggerError::DeploymentPending);
        }
        if let Some(selection) = &selection {
            if let Err(e) = self.store.save(selection) {
                tracing::warn!(error = %e, "could not persist selection before submit");
            }
        }

        let description = mutation.describe();
        let submitted_at = Utc::now();
        match mutation.send(self.backend.as_ref()).await {
            Ok(job_id) => {
                tracing::info!(job = %job_id, op = %description, "deployment submitted");
                self.pending = Some(PendingOperation {
                    job_id: Some(job_id.clone()),
                    description,
                    surface,
                    submitted_at,
                    late_wait: None,
                });
                Ok(SubmitOutcome::Pending { job_id })
            }
            Err(e) if self.pre_deployment.is_match(&e.message) => {
                let deadline = Instant::now() + self.late_wait;
                tracing::info!(op = %description, error = %e, wait_ms = self.late_wait.as_millis() as u64, "pre-deployment failure, waiting for late notification");
                self.pending = Some(PendingOperation {
                    job_id: None,
                    description,
                    surface,
                    submitted_at,
                    late_wait: Some(LateWait {
                        deadline,
                        error: e.message.clone(),
                    }),
                });
                Ok(SubmitOutcome::AwaitingLateNotification {
                    error: e.message,
                    deadline,
                })
            }
            Err(e) => {
                tracing::info!(op = %description, error = %e, "submission rejected");
                if let Err(clear_err) = self.store.clear() {
                    tracing::warn!(error = %clear_err, "could not clear saved selection");
                }
                Err(TriggerError::Backend(e.message))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Match an inbound notification to the pending operation.
    ///
    /// Notifications from other users, or arriving with nothing pending,
    /// are ignored. When both sides carry a job id they must agree;
    /// otherwise the notification is taken to complete the most recent
    /// pending operation.
    pub fn handle_notification(&mut self, n: &DeploymentNotification) -> Option<Resolution> {
        if self.user_id.as_deref() != Some(n.originating_user_id.as_str()) {
            tracing::debug!(from = %n.originating_user_id, "ignoring notification for another user");
            return None;
        }
        let Some(pending) = self.pending.as_ref() else {
            tracing::debug!("ignoring notification with nothing pending");
            return None;
        };
        if let (Some(theirs), Some(ours)) = (n.job_id.as_deref(), pending.job_id.as_deref()) {
            if theirs != ours {
                tracing::debug!(job = %theirs, pending = %ours, "ignoring notification for another job");
                return None;
            }
        }

        let op = self.pending.take()?;
        let message = n.message.clone().filter(|m| !m.trim().is_empty());
        tracing::info!(op = %op.description, status = ?n.status, "deployment resolved");
        Some(match n.status {
            DeploymentStatus::Succeeded => Resolution::Succeeded { op, message },
            DeploymentStatus::Failed => {
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "could not clear saved selection");
                }
                Resolution::Failed {
                    op,
                    message: message.unwrap_or_else(|| self.generic_failure.clone()),
                }
            }
        })
    }

    /// Give up on a late notification once its deadline has passed.
    pub fn expire_late_wait(&mut self, now: Instant) -> Option<Resolution> {
        let deadline = self.late_deadline()?;
        if now < deadline {
            return None;
        }
        let op = self.pending.take()?;
        let message = op
            .late_wait
            .as_ref()
            .map(|w| w.error.clone())
            .unwrap_or_else(|| self.generic_failure.clone());
        tracing::warn!(op = %op.description, "no notification before deadline, surfacing submission error");
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "could not clear saved selection");
        }
        Some(Resolution::TimedOut { op, message })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
