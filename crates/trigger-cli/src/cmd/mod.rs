pub mod actions;
pub mod bypass;
pub mod config;
pub mod reorder;
pub mod settings;

use anyhow::{bail, Context as _};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use trigger_core::config::ExplorerConfig;
use trigger_core::explorer::{ExplorerController, ExplorerEvent};
use trigger_core::memory::{InMemoryOrg, OrgSnapshot};
use trigger_core::setting::TriggerSetting;
use trigger_core::store::FileSelectionStore;

/// Resolved global options shared by every command.
pub struct Context {
    pub root: PathBuf,
    pub org_path: PathBuf,
    pub json: bool,
}

/// Run an async command body on a single-threaded runtime.
pub fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(rt.block_on(fut))
}

/// A mounted explorer over the org snapshot file.
pub struct Session {
    pub explorer: ExplorerController,
    org: Arc<InMemoryOrg>,
    org_path: PathBuf,
}

impl Session {
    pub async fn open(ctx: &Context) -> anyhow::Result<Self> {
        let config = ExplorerConfig::load(&ctx.root).context("failed to load config")?;
        for w in config.validate() {
            tracing::warn!(field = %w.field, "{}", w.message);
        }
        let snapshot = OrgSnapshot::load(&ctx.org_path)
            .with_context(|| format!("failed to read org snapshot {}", ctx.org_path.display()))?;
        let org = Arc::new(InMemoryOrg::from_snapshot(snapshot));
        let mut explorer = ExplorerController::new(
            org.clone(),
            Arc::new(org.events().clone()),
            Arc::new(FileSelectionStore::new(&ctx.root)),
            &config,
        );
        explorer
            .mount()
            .await
            .context("failed to load trigger configuration")?;
        Ok(Self {
            explorer,
            org,
            org_path: ctx.org_path.clone(),
        })
    }

    /// Select the setting for `object` and return a copy of it.
    pub fn select_object(&mut self, object: &str) -> anyhow::Result<TriggerSetting> {
        let Some(setting) = self.explorer.find_setting_by_object(object).cloned() else {
            bail!("no trigger setting for object '{object}'");
        };
        self.explorer.select_setting(&setting.id)?;
        Ok(setting)
    }

    /// Wait for the pending deployment, then write the org back on success.
    pub async fn settle(&mut self) -> anyhow::Result<Option<String>> {
        let events = self.explorer.settle().await;
        for event in &events {
            tracing::debug!(?event, "explorer event");
        }
        match events.into_iter().last() {
            Some(ExplorerEvent::Deployed { message, .. }) => {
                self.org
                    .snapshot()
                    .save(&self.org_path)
                    .with_context(|| format!("failed to write {}", self.org_path.display()))?;
                Ok(message)
            }
            Some(ExplorerEvent::DeploymentFailed { message, .. })
            | Some(ExplorerEvent::LateWaitExpired { message, .. }) => {
                bail!("deployment failed: {message}")
            }
            _ => bail!("deployment did not complete"),
        }
    }
}
