//! The explorer view's state owner.
//!
//! `ExplorerController` holds the canonical settings and actions, the
//! current selection and the derived partition. It routes user intents to
//! order edit sessions and modals, and routes committed changes through the
//! [`DeploymentCoordinator`]. Notifications are consumed one at a time with
//! [`ExplorerController::process_next`].

use crate::action::{format_order, ActionDraft, ReorderEntry, TriggerAction};
use crate::backend::{Freshness, Mutation, TriggerBackend};
use crate::config::ExplorerConfig;
use crate::deployment::{
    DeploymentCoordinator, PendingOperation, Resolution, SubmitOutcome, Surface,
};
use crate::error::{Result, TriggerError};
use crate::modal::{Modal, ModalContent, ModalMode};
use crate::names::KnownNames;
use crate::notification::{
    ChannelError, DeploymentNotification, NotificationChannel, NotificationStream,
};
use crate::order::OrderEditSession;
use crate::partition::{partition, Partition};
use crate::selection::{SelectionContext, SelectionOptions};
use crate::setting::{SettingDraft, TriggerSetting};
use crate::store::SelectionStore;
use crate::toast::Toast;
use crate::types::{Category, Direction, OrderMode, Section, Timing};
use futures::StreamExt;
use std::sync::Arc;
use tokio::time::Instant;

/// What a single [`ExplorerController::process_next`] step did.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplorerEvent {
    /// A notification that did not concern this session's pending operation.
    Ignored,
    Deployed {
        surface: Surface,
        message: Option<String>,
    },
    DeploymentFailed {
        surface: Surface,
        message: String,
    },
    /// No notification arrived before the late-notification deadline.
    LateWaitExpired {
        surface: Surface,
        message: String,
    },
    ChannelLagged(u64),
    ChannelError(String),
    ChannelClosed,
}

/// A reorder waiting for the user to confirm the save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub section: Section,
    pub mode: OrderMode,
}

/// A submitted reorder, shown in place of the partition until it resolves.
#[derive(Debug, Clone)]
struct StagedOrder {
    mode: OrderMode,
    committed: Vec<TriggerAction>,
    snapshot: Vec<TriggerAction>,
}

#[derive(Debug, Default)]
struct SectionState {
    session: Option<OrderEditSession>,
    staged: Option<StagedOrder>,
}

#[derive(Debug, Clone, Default)]
struct Collections {
    settings: Vec<TriggerSetting>,
    actions: Vec<TriggerAction>,
}

enum Inbound {
    Item(Option<std::result::Result<DeploymentNotification, ChannelError>>),
    Deadline,
}

const DEPLOYED_TITLE: &str = "Deployment Succeeded";
const FAILED_TITLE: &str = "Deployment Failed";
const DEFAULT_SUCCESS_MESSAGE: &str = "Your changes have been deployed.";

// ---------------------------------------------------------------------------
// ExplorerController
// ---------------------------------------------------------------------------

pub struct ExplorerController {
    backend: Arc<dyn TriggerBackend>,
    channel: Arc<dyn NotificationChannel>,
    coordinator: DeploymentCoordinator,
    subscription: Option<NotificationStream>,
    collections: Collections,
    selection: SelectionContext,
    partition: Partition,
    before: SectionState,
    after: SectionState,
    modal: Option<Modal>,
    confirmation: Option<OrderConfirmation>,
    toasts: Vec<Toast>,
    mounted: bool,
    load_error: Option<String>,
}

impl ExplorerController {
    pub fn new(
        backend: Arc<dyn TriggerBackend>,
        channel: Arc<dyn NotificationChannel>,
        store: Arc<dyn SelectionStore>,
        config: &ExplorerConfig,
    ) -> Self {
        Self {
            coordinator: DeploymentCoordinator::new(backend.clone(), store, config),
            backend,
            channel,
            subscription: None,
            collections: Collections::default(),
            selection: SelectionContext::with_suffix(config.change_event_suffix.clone()),
            partition: Partition::default(),
            before: SectionState::default(),
            after: SectionState::default(),
            modal: None,
            confirmation: None,
            toasts: Vec::new(),
            mounted: false,
            load_error: None,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Identify the user, subscribe to notifications and load both collections.
    pub async fn mount(&mut self) -> Result<()> {
        if self.mounted {
            return Ok(());
        }
        self.coordinator.identify().await?;
        self.subscription = Some(self.channel.subscribe());
        self.mounted = true;
        tracing::debug!("explorer mounted");
        self.load(Freshness::Cached).await
    }

    /// Drop the notification subscription. A pending operation stays tracked.
    pub fn unmount(&mut self) {
        self.subscription = None;
        self.mounted = false;
        tracing::debug!("explorer unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    async fn load(&mut self, freshness: Freshness) -> Result<()> {
        let fetched = tokio::try_join!(
            self.backend.fetch_settings(freshness),
            self.backend.fetch_actions(freshness),
        );
        let (settings, actions) = match fetched {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load trigger configuration");
                self.load_error = Some(e.message.clone());
                return Err(TriggerError::Backend(e.message));
            }
        };

        let collections = Collections {
            settings: decode_all(settings, "setting"),
            actions: decode_all(actions, "action"),
        };
        tracing::info!(
            settings = collections.settings.len(),
            actions = collections.actions.len(),
            ?freshness,
            "trigger configuration loaded"
        );
        self.collections = collections;
        self.load_error = None;
        self.coordinator
            .rebuild_known_names(&self.collections.settings, &self.collections.actions);
        self.reconcile_selection();
        self.refresh_partition();
        Ok(())
    }

    /// Prefer a saved selection, then the current one, then the first setting.
    fn reconcile_selection(&mut self) {
        let settings = &self.collections.settings;
        if let Some(saved) = self.coordinator.take_saved_selection() {
            if self.selection.restore(&saved, settings) {
                tracing::debug!(setting = %saved.setting_id, "restored saved selection");
                return;
            }
        }
        if let Some(current) = self.selection.to_persisted() {
            if self.selection.restore(&current, settings) {
                return;
            }
        }
        match settings.first() {
            Some(first) => self.selection.select_setting(first),
            None => self.selection.clear(),
        }
    }

    fn refresh_partition(&mut self) {
        let setting = self.current_setting().cloned();
        self.partition = partition(
            &self.collections.actions,
            setting.as_ref(),
            self.selection.category(),
            self.selection.timing(),
        );
        tracing::debug!(
            before = self.partition.before.len(),
            after = self.partition.after.len(),
            "partition derived"
        );
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn settings(&self) -> &[TriggerSetting] {
        &self.collections.settings
    }

    pub fn actions(&self) -> &[TriggerAction] {
        &self.collections.actions
    }

    pub fn selection(&self) -> &SelectionContext {
        &self.selection
    }

    pub fn options(&self) -> SelectionOptions {
        self.selection.options()
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn current_setting(&self) -> Option<&TriggerSetting> {
        let id = self.selection.setting_id()?;
        self.collections.settings.iter().find(|s| s.id == id)
    }

    pub fn find_setting_by_object(&self, object_api_name: &str) -> Option<&TriggerSetting> {
        self.collections
            .settings
            .iter()
            .find(|s| s.object_api_name.eq_ignore_ascii_case(object_api_name))
    }

    /// The list a section displays: the open session's working copy, a
    /// submitted reorder, or the partition.
    pub fn section_actions(&self, section: Section) -> Vec<TriggerAction> {
        let state = self.section_state(section);
        if let Some(session) = &state.session {
            return session.items().iter().map(|i| i.action.clone()).collect();
        }
        if let Some(staged) = &state.staged {
            return staged.committed.clone();
        }
        self.partition.section(section).to_vec()
    }

    pub fn session(&self, section: Section) -> Option<&OrderEditSession> {
        self.section_state(section).session.as_ref()
    }

    pub fn editing_section(&self) -> Option<Section> {
        Section::all()
            .iter()
            .copied()
            .find(|s| self.section_state(*s).session.is_some())
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn modal_mut(&mut self) -> Option<&mut Modal> {
        self.modal.as_mut()
    }

    pub fn is_modal_busy(&self) -> bool {
        self.modal
            .as_ref()
            .is_some_and(|m| self.coordinator.is_busy(m.surface()))
    }

    pub fn confirmation(&self) -> Option<OrderConfirmation> {
        self.confirmation
    }

    pub fn is_busy(&self, surface: Surface) -> bool {
        self.coordinator.is_busy(surface)
    }

    pub fn pending(&self) -> Option<&PendingOperation> {
        self.coordinator.pending()
    }

    pub fn known_names(&self) -> &KnownNames {
        self.coordinator.known_names()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.coordinator.user_id()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn drain_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    fn section_state(&self, section: Section) -> &SectionState {
        match section {
            Section::Before => &self.before,
            Section::After => &self.after,
        }
    }

    fn section_state_mut(&mut self, section: Section) -> &mut SectionState {
        match section {
            Section::Before => &mut self.before,
            Section::After => &mut self.after,
        }
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn select_setting(&mut self, id: &str) -> Result<()> {
        let setting = self
            .collections
            .settings
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| TriggerError::SettingNotFound(id.to_string()))?;
        self.leave_selection();
        self.selection.select_setting(&setting);
        self.refresh_partition();
        Ok(())
    }

    pub fn select_category(&mut self, category: Category) -> Result<()> {
        if !self.options().categories.contains(&category) {
            return Err(TriggerError::InvalidCategory(format!(
                "{category} is not available for this object"
            )));
        }
        self.leave_selection();
        self.selection.select_category(category);
        self.refresh_partition();
        Ok(())
    }

    pub fn select_timing(&mut self, timing: Timing) -> Result<()> {
        if !self.options().timings.contains(&timing) {
            return Err(TriggerError::InvalidTiming(format!(
                "{timing} is not available for {}",
                self.selection.category()
            )));
        }
        self.leave_selection();
        self.selection.select_timing(timing);
        self.refresh_partition();
        Ok(())
    }

    /// Open sessions and staged lists belong to the partition being left.
    fn leave_selection(&mut self) {
        self.exit_edit_mode(None);
        self.before.staged = None;
        self.after.staged = None;
    }

    // -----------------------------------------------------------------------
    // Order editing
    // -----------------------------------------------------------------------

    /// Cancel every open session except `keep`. Returns the sections cancelled.
    fn exit_edit_mode(&mut self, keep: Option<Section>) -> Vec<Section> {
        let mut cancelled = Vec::new();
        for section in Section::all().iter().copied() {
            if Some(section) == keep {
                continue;
            }
            if let Some(session) = self.section_state_mut(section).session.take() {
                session.cancel();
                cancelled.push(section);
            }
        }
        if self.confirmation.is_some_and(|c| Some(c.section) != keep) {
            self.confirmation = None;
        }
        cancelled
    }

    /// Enter edit mode on `section`, cancelling any other section's session first.
    pub fn begin_reorder(&mut self, section: Section) -> Result<Vec<Section>> {
        if self.coordinator.is_busy(Surface::Section(section)) {
            return Err(TriggerError::DeploymentPending);
        }
        if self.section_state(section).session.is_some() {
            return Ok(Vec::new());
        }
        let cancelled = self.exit_edit_mode(Some(section));
        let list = self.partition.section(section).to_vec();
        let state = self.section_state_mut(section);
        state.staged = None;
        state.session = Some(OrderEditSession::begin(section, &list));
        tracing::debug!(%section, items = list.len(), ?cancelled, "order edit started");
        Ok(cancelled)
    }

    fn session_mut(&mut self, section: Section) -> Result<&mut OrderEditSession> {
        self.section_state_mut(section)
            .session
            .as_mut()
            .ok_or_else(|| TriggerError::NoActiveSession(section.to_string()))
    }

    pub fn move_action(&mut self, section: Section, id: &str, direction: Direction) -> Result<bool> {
        self.session_mut(section)?.move_action(id, direction)
    }

    pub fn set_order_mode(&mut self, section: Section, mode: OrderMode) -> Result<()> {
        self.session_mut(section)?.set_mode(mode);
        Ok(())
    }

    pub fn toggle_order_mode(&mut self, section: Section) -> Result<OrderMode> {
        let session = self.session_mut(section)?;
        session.toggle_mode();
        Ok(session.mode())
    }

    pub fn edit_manual_order(&mut self, section: Section, id: &str, raw: &str) -> Result<()> {
        self.session_mut(section)?.edit_manual(id, raw)
    }

    pub fn blur_manual_order(&mut self, section: Section, id: &str, raw: &str) -> Result<()> {
        self.session_mut(section)?.blur_manual(id, raw)
    }

    /// Discard the section's edits. Returns the restored list.
    pub fn cancel_reorder(&mut self, section: Section) -> Result<Vec<TriggerAction>> {
        let session = self
            .section_state_mut(section)
            .session
            .take()
            .ok_or_else(|| TriggerError::NoActiveSession(section.to_string()))?;
        if self.confirmation.is_some_and(|c| c.section == section) {
            self.confirmation = None;
        }
        Ok(session.cancel())
    }

    /// Ask for confirmation before saving the section's order.
    pub fn request_save_order(&mut self, section: Section) -> Result<OrderConfirmation> {
        if self.coordinator.is_pending() {
            return Err(TriggerError::DeploymentPending);
        }
        let session = self.session_mut(section)?;
        if session.has_errors() {
            return Err(TriggerError::Validation(
                "Fix the highlighted order values before saving.".into(),
            ));
        }
        let confirmation = OrderConfirmation {
            section,
            mode: session.mode(),
        };
        self.confirmation = Some(confirmation);
        Ok(confirmation)
    }

    /// Close the confirmation and keep editing.
    pub fn dismiss_save_order(&mut self) {
        self.confirmation = None;
    }

    /// Commit the confirmed session and submit the new ordering.
    ///
    /// The section shows the committed list while the deployment is pending.
    /// A local submission failure leaves the session open for retry.
    pub async fn confirm_save_order(&mut self) -> Result<SubmitOutcome> {
        let confirmation = self
            .confirmation
            .take()
            .ok_or_else(|| TriggerError::Validation("No order change is awaiting confirmation.".into()))?;
        let section = confirmation.section;
        let (committed, snapshot, mode) = {
            let session = self.session_mut(section)?;
            (session.commit()?, session.snapshot().to_vec(), session.mode())
        };
        let entries: Vec<ReorderEntry> = committed.iter().map(ReorderEntry::from).collect();

        let submitted = self
            .coordinator
            .submit(
                Mutation::Reorder(entries),
                Surface::Section(section),
                self.selection.to_persisted(),
            )
            .await;
        match submitted {
            Ok(outcome) => {
                let state = self.section_state_mut(section);
                state.session = None;
                state.staged = Some(StagedOrder {
                    mode,
                    committed,
                    snapshot,
                });
                Ok(outcome)
            }
            Err(e) => {
                self.toasts.push(Toast::error(FAILED_TITLE, e.user_message()));
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Modals
    // -----------------------------------------------------------------------

    fn open_modal(&mut self, modal: Modal) -> Result<()> {
        if self.is_modal_busy() {
            return Err(TriggerError::DeploymentPending);
        }
        tracing::debug!(title = modal.title(), mode = %modal.mode(), "modal opened");
        self.modal = Some(modal);
        Ok(())
    }

    fn setting_by_id(&self, id: &str) -> Result<&TriggerSetting> {
        self.collections
            .settings
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| TriggerError::SettingNotFound(id.to_string()))
    }

    fn action_by_id(&self, id: &str) -> Result<&TriggerAction> {
        self.collections
            .actions
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| TriggerError::ActionNotFound(id.to_string()))
    }

    pub fn open_setting(&mut self, id: &str, mode: ModalMode) -> Result<()> {
        let draft = SettingDraft::from_setting(self.setting_by_id(id)?);
        let mode = if mode == ModalMode::Create { ModalMode::Edit } else { mode };
        self.open_modal(Modal::new(mode, ModalContent::Setting(draft)))
    }

    pub fn new_setting(&mut self) -> Result<()> {
        self.open_modal(Modal::new(
            ModalMode::Create,
            ModalContent::Setting(SettingDraft::default()),
        ))
    }

    pub fn open_action(&mut self, id: &str, mode: ModalMode) -> Result<()> {
        let draft = ActionDraft::from_action(self.action_by_id(id)?);
        let mode = if mode == ModalMode::Create { ModalMode::Edit } else { mode };
        self.open_modal(Modal::new(mode, ModalContent::Action(draft)))
    }

    /// Open a create form bound to the current setting in `section`'s
    /// lifecycle field, ordered after the section's last action.
    pub fn add_action(&mut self, section: Section) -> Result<()> {
        let setting_id = self
            .selection
            .setting_id()
            .ok_or_else(|| TriggerError::Validation("Select an object first.".into()))?
            .to_string();
        let category = self.selection.category();
        let field = category.field(section).ok_or_else(|| {
            TriggerError::Validation(format!("{category} actions only run after the event."))
        })?;
        let next_order = self
            .partition
            .section(section)
            .iter()
            .map(|a| a.order)
            .fold(None, |max: Option<f64>, o| Some(max.map_or(o, |m| m.max(o))))
            .map_or(1.0, |max| max.floor() + 1.0);

        let mut draft = ActionDraft {
            order: format_order(next_order),
            ..Default::default()
        };
        draft.bindings.set(field, Some(setting_id));
        self.open_modal(Modal::new(ModalMode::Create, ModalContent::Action(draft)))
    }

    pub fn switch_modal_to_edit(&mut self) -> Result<()> {
        let modal = self
            .modal
            .as_mut()
            .ok_or_else(|| TriggerError::Validation("No modal is open.".into()))?;
        if modal.mode() == ModalMode::View {
            modal.set_mode(ModalMode::Edit);
        }
        Ok(())
    }

    /// Restore the original field values and close.
    pub fn cancel_modal(&mut self) {
        if let Some(mut modal) = self.modal.take() {
            modal.revert();
            tracing::debug!(title = modal.title(), "modal cancelled");
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    /// Validate the open modal and submit it, with the modal as busy surface.
    ///
    /// Validation and local submission errors are kept on `modal.error`.
    pub async fn save_modal(&mut self) -> Result<SubmitOutcome> {
        let Some(modal) = self.modal.as_mut() else {
            return Err(TriggerError::Validation("No modal is open.".into()));
        };
        if modal.mode().is_read_only() {
            return Err(TriggerError::Validation("This record is read-only.".into()));
        }
        if self.coordinator.is_pending() {
            return Err(TriggerError::DeploymentPending);
        }
        let mutation = match modal
            .validate(self.coordinator.known_names())
            .and_then(|_| modal.to_mutation())
        {
            Ok(mutation) => mutation,
            Err(e) => {
                modal.error = Some(e.user_message());
                return Err(e);
            }
        };
        modal.error = None;
        let surface = modal.surface();

        let submitted = self
            .coordinator
            .submit(mutation, surface, self.selection.to_persisted())
            .await;
        if let Err(e) = &submitted {
            if let Some(modal) = self.modal.as_mut() {
                modal.error = Some(e.user_message());
            }
            self.toasts.push(Toast::error(FAILED_TITLE, e.user_message()));
        }
        submitted
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    /// Wait for the next inbound notification or the late-notification
    /// deadline, and apply it.
    pub async fn process_next(&mut self) -> Option<ExplorerEvent> {
        if !self.mounted {
            return None;
        }
        let deadline = self.coordinator.late_deadline();
        let inbound = match self.subscription.as_mut() {
            Some(stream) => tokio::select! {
                biased;
                item = stream.next() => Inbound::Item(item),
                _ = wait_until(deadline) => Inbound::Deadline,
            },
            None => {
                tokio::time::sleep_until(deadline?).await;
                Inbound::Deadline
            }
        };

        match inbound {
            Inbound::Item(Some(Ok(notification))) => {
                match self.coordinator.handle_notification(&notification) {
                    Some(resolution) => Some(self.resolve(resolution).await),
                    None => Some(ExplorerEvent::Ignored),
                }
            }
            Inbound::Item(Some(Err(ChannelError::Lagged(n)))) => {
                tracing::warn!(dropped = n, "notification subscriber lagged");
                Some(ExplorerEvent::ChannelLagged(n))
            }
            Inbound::Item(Some(Err(ChannelError::Transport(message)))) => {
                tracing::warn!(error = %message, "notification channel error");
                Some(ExplorerEvent::ChannelError(message))
            }
            Inbound::Item(None) => {
                tracing::warn!("notification channel closed");
                self.subscription = None;
                Some(ExplorerEvent::ChannelClosed)
            }
            Inbound::Deadline => {
                let resolution = self.coordinator.expire_late_wait(Instant::now())?;
                Some(self.resolve(resolution).await)
            }
        }
    }

    /// Process events until no operation is pending.
    pub async fn settle(&mut self) -> Vec<ExplorerEvent> {
        let mut events = Vec::new();
        while self.coordinator.is_pending() {
            match self.process_next().await {
                Some(event) => events.push(event),
                None => break,
            }
        }
        events
    }

    async fn resolve(&mut self, resolution: Resolution) -> ExplorerEvent {
        let surface = resolution.op().surface;
        match resolution {
            Resolution::Succeeded { message, .. } => {
                // Sessions opened before the reload edit a stale partition.
                self.exit_edit_mode(None);
                self.before.staged = None;
                self.after.staged = None;
                if let Err(e) = self.load(Freshness::Fresh).await {
                    // The saved selection belongs to this reload only.
                    self.coordinator.take_saved_selection();
                    self.toasts
                        .push(Toast::error("Reload Failed", e.user_message()));
                }
                self.modal = None;
                self.toasts.push(Toast::success(
                    DEPLOYED_TITLE,
                    message.clone().unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
                ));
                ExplorerEvent::Deployed { surface, message }
            }
            Resolution::Failed { message, .. } => {
                self.keep_for_retry(surface, &message);
                self.toasts.push(Toast::error(FAILED_TITLE, message.clone()));
                ExplorerEvent::DeploymentFailed { surface, message }
            }
            Resolution::TimedOut { message, .. } => {
                self.keep_for_retry(surface, &message);
                self.toasts.push(Toast::error(FAILED_TITLE, message.clone()));
                ExplorerEvent::LateWaitExpired { surface, message }
            }
        }
    }

    /// Leave the failed operation's inputs in place: the modal keeps its
    /// edits, a reorder section reopens on the committed ordering.
    fn keep_for_retry(&mut self, surface: Surface, message: &str) {
        match surface {
            Surface::SettingModal | Surface::ActionModal => {
                if let Some(modal) = self.modal.as_mut().filter(|m| m.surface() == surface) {
                    modal.error = Some(message.to_string());
                }
            }
            Surface::Section(section) => {
                let Some(staged) = self.section_state_mut(section).staged.take() else {
                    return;
                };
                self.exit_edit_mode(Some(section));
                let state = self.section_state_mut(section);
                if state.session.is_none() {
                    state.session = Some(OrderEditSession::resume(
                        section,
                        staged.mode,
                        staged.committed,
                        staged.snapshot,
                    ));
                    tracing::debug!(%section, "order edit reopened after failed deployment");
                }
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn decode_all<R, T>(records: Vec<R>, kind: &str) -> Vec<T>
where
    T: TryFrom<R, Error = TriggerError>,
{
    records
        .into_iter()
        .filter_map(|record| match T::try_from(record) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(kind, error = %e, "skipping undecodable record");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
