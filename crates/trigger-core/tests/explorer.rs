use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use trigger_core::config::ExplorerConfig;
use trigger_core::deployment::{SubmitOutcome, Surface};
use trigger_core::explorer::{ExplorerController, ExplorerEvent};
use trigger_core::memory::{InMemoryOrg, OrgSnapshot};
use trigger_core::modal::ModalMode;
use trigger_core::notification::{DeploymentEvents, DeploymentNotification};
use trigger_core::store::{MemorySelectionStore, SelectionStore};
use trigger_core::toast::ToastVariant;
use trigger_core::types::{Category, Direction, OrderMode, Section, Timing};
use trigger_core::TriggerError;

fn snapshot() -> OrgSnapshot {
    serde_json::from_value(json!({
        "userId": "005U",
        "settings": [
            {"Id": "S1", "DeveloperName": "Account", "Label": "Account", "Object_API_Name__c": "Account"},
            {"Id": "S3", "DeveloperName": "AccountChangeEvent", "Label": "Account Change Event",
             "Object_API_Name__c": "AccountChangeEvent"}
        ],
        "actions": [
            {"Id": "A1", "DeveloperName": "TA_One", "Label": "One", "Order__c": 2,
             "Apex_Class_Name__c": "One", "Before_Insert__c": "S1"},
            {"Id": "A2", "DeveloperName": "TA_Two", "Label": "Two", "Order__c": 1,
             "Apex_Class_Name__c": "Two", "Before_Insert__c": "S1"},
            {"Id": "A3", "DeveloperName": "TA_Three", "Label": "Three", "Order__c": 1,
             "Flow_Name__c": "Three_Flow", "After_Insert__c": "S1"},
            {"Id": "A4", "DeveloperName": "TA_Four", "Label": "Four", "Order__c": 2,
             "Flow_Name__c": "Four_Flow", "After_Insert__c": "S1"}
        ]
    }))
    .unwrap()
}

struct Harness {
    explorer: ExplorerController,
    org: Arc<InMemoryOrg>,
    store: Arc<MemorySelectionStore>,
}

async fn harness(org: InMemoryOrg) -> Harness {
    let org = Arc::new(org);
    let store = Arc::new(MemorySelectionStore::new());
    let mut explorer = ExplorerController::new(
        org.clone(),
        Arc::new(org.events().clone()),
        store.clone(),
        &ExplorerConfig::default(),
    );
    explorer.mount().await.unwrap();
    Harness {
        explorer,
        org,
        store,
    }
}

async fn default_harness() -> Harness {
    harness(InMemoryOrg::from_snapshot(snapshot())).await
}

fn ids(actions: &[trigger_core::action::TriggerAction]) -> Vec<&str> {
    actions.iter().map(|a| a.id.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Selection and partitioning
// ---------------------------------------------------------------------------

#[tokio::test]
async fn created_before_partition_is_sorted_by_order() {
    let h = default_harness().await;
    assert_eq!(h.explorer.selection().category(), Category::Created);
    assert_eq!(h.explorer.selection().timing(), Timing::Before);
    assert_eq!(ids(&h.explorer.partition().before), ["A2", "A1"]);
    assert!(h.explorer.partition().after.is_empty());
}

#[tokio::test]
async fn both_timing_shows_both_sections() {
    let mut h = default_harness().await;
    h.explorer.select_timing(Timing::Both).unwrap();
    assert_eq!(ids(&h.explorer.partition().before), ["A2", "A1"]);
    assert_eq!(ids(&h.explorer.partition().after), ["A3", "A4"]);

    h.explorer.select_timing(Timing::After).unwrap();
    assert!(h.explorer.partition().before.is_empty());
}

#[tokio::test]
async fn change_event_setting_restricts_options() {
    let mut h = default_harness().await;
    h.explorer.select_category(Category::Updated).unwrap();
    h.explorer.select_timing(Timing::Both).unwrap();

    h.explorer.select_setting("S3").unwrap();
    let options = h.explorer.options();
    assert_eq!(options.categories, [Category::Created]);
    assert_eq!(options.timings, [Timing::After]);
    assert_eq!(h.explorer.selection().category(), Category::Created);
    assert_eq!(h.explorer.selection().timing(), Timing::After);
    assert!(h.explorer.select_category(Category::Deleted).is_err());
}

// ---------------------------------------------------------------------------
// Order editing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn entering_edit_mode_cancels_the_other_section() {
    let mut h = default_harness().await;
    h.explorer.select_timing(Timing::Both).unwrap();

    h.explorer.begin_reorder(Section::After).unwrap();
    h.explorer
        .move_action(Section::After, "A4", Direction::Up)
        .unwrap();

    let cancelled = h.explorer.begin_reorder(Section::Before).unwrap();
    assert_eq!(cancelled, [Section::After]);
    assert!(h.explorer.session(Section::After).is_none());
    assert!(h.explorer.session(Section::Before).is_some());
    assert_eq!(ids(&h.explorer.section_actions(Section::After)), ["A3", "A4"]);
}

#[tokio::test]
async fn manual_entry_rejects_excess_precision() {
    let mut h = default_harness().await;
    h.explorer.begin_reorder(Section::Before).unwrap();
    h.explorer
        .set_order_mode(Section::Before, OrderMode::Manual)
        .unwrap();
    h.explorer
        .edit_manual_order(Section::Before, "A1", "0.5")
        .unwrap();

    let err = h
        .explorer
        .blur_manual_order(Section::Before, "A1", "0.12345")
        .unwrap_err();
    assert!(matches!(err, TriggerError::ManualOrder(_)));
    let session = h.explorer.session(Section::Before).unwrap();
    assert_eq!(session.items()[1].manual_order.as_deref(), Some("0.5"));
    assert!(h.explorer.request_save_order(Section::Before).is_err());
}

#[tokio::test]
async fn positional_reorder_deploys_and_reloads() {
    let mut h = default_harness().await;
    h.explorer.begin_reorder(Section::Before).unwrap();
    assert!(h
        .explorer
        .move_action(Section::Before, "A1", Direction::Up)
        .unwrap());

    let confirmation = h.explorer.request_save_order(Section::Before).unwrap();
    assert_eq!(confirmation.mode, OrderMode::Positional);
    let outcome = h.explorer.confirm_save_order().await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Pending { .. }));
    assert!(h.explorer.is_busy(Surface::Section(Section::Before)));
    assert_eq!(ids(&h.explorer.section_actions(Section::Before)), ["A1", "A2"]);

    let events = h.explorer.settle().await;
    assert!(matches!(events.last(), Some(ExplorerEvent::Deployed { .. })));
    assert!(!h.explorer.is_busy(Surface::Section(Section::Before)));

    let before = &h.explorer.partition().before;
    assert_eq!(ids(before), ["A1", "A2"]);
    assert_eq!(before[0].order, 1.0);
    assert_eq!(before[1].order, 2.0);

    let toasts = h.explorer.drain_toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].variant, ToastVariant::Success);
    assert!(h.store.load().unwrap().is_none());
}

#[tokio::test]
async fn failed_reload_discards_saved_selection() {
    let mut h = default_harness().await;
    h.explorer.begin_reorder(Section::Before).unwrap();
    h.explorer.request_save_order(Section::Before).unwrap();
    h.explorer.confirm_save_order().await.unwrap();
    assert!(h.store.load().unwrap().is_some());

    h.org.fail_next_fetch("Request timed out");
    let events = h.explorer.settle().await;
    assert!(matches!(events.last(), Some(ExplorerEvent::Deployed { .. })));
    assert!(h.explorer.load_error().is_some());
    assert!(h.store.load().unwrap().is_none());

    let toasts = h.explorer.drain_toasts();
    assert_eq!(toasts[0].variant, ToastVariant::Error);
    assert_eq!(toasts[0].message, "Request timed out");
}

#[tokio::test]
async fn manual_reorder_keeps_untouched_orders() {
    let mut h = default_harness().await;
    h.explorer.begin_reorder(Section::Before).unwrap();
    h.explorer
        .set_order_mode(Section::Before, OrderMode::Manual)
        .unwrap();
    h.explorer
        .blur_manual_order(Section::Before, "A1", "0.25")
        .unwrap();
    assert_eq!(ids(&h.explorer.section_actions(Section::Before)), ["A1", "A2"]);

    h.explorer.request_save_order(Section::Before).unwrap();
    h.explorer.confirm_save_order().await.unwrap();
    h.explorer.settle().await;

    let orders: Vec<_> = h.explorer.partition().before.iter().map(|a| a.order).collect();
    assert_eq!(orders, [0.25, 1.0]);
}

#[tokio::test]
async fn dismissing_confirmation_keeps_editing() {
    let mut h = default_harness().await;
    h.explorer.begin_reorder(Section::Before).unwrap();
    h.explorer.request_save_order(Section::Before).unwrap();
    h.explorer.dismiss_save_order();
    assert!(h.explorer.confirmation().is_none());
    assert!(h.explorer.session(Section::Before).is_some());
    assert!(h.explorer.confirm_save_order().await.is_err());
    assert_eq!(h.org.deployed(), 0);
}

#[tokio::test]
async fn failed_reorder_reopens_session_with_committed_order() {
    let mut h = default_harness().await;
    h.org.fail_next_deployment("Order__c: value out of range");
    h.explorer.begin_reorder(Section::Before).unwrap();
    h.explorer
        .move_action(Section::Before, "A1", Direction::Up)
        .unwrap();
    h.explorer.request_save_order(Section::Before).unwrap();
    h.explorer.confirm_save_order().await.unwrap();

    let events = h.explorer.settle().await;
    assert!(matches!(events.last(), Some(ExplorerEvent::DeploymentFailed { .. })));

    let session = h.explorer.session(Section::Before).unwrap();
    assert_eq!(session.ids(), ["A1", "A2"]);
    assert_eq!(ids(session.snapshot()), ["A2", "A1"]);
    let toasts = h.explorer.drain_toasts();
    assert_eq!(toasts[0].variant, ToastVariant::Error);
    assert_eq!(toasts[0].message, "Order__c: value out of range");

    let restored = h.explorer.cancel_reorder(Section::Before).unwrap();
    assert_eq!(ids(&restored), ["A2", "A1"]);
}

#[tokio::test]
async fn hard_local_failure_surfaces_immediately() {
    let mut h = default_harness().await;
    h.org.reject_next_submission("Insufficient access rights");
    h.explorer.begin_reorder(Section::Before).unwrap();
    h.explorer.request_save_order(Section::Before).unwrap();

    let err = h.explorer.confirm_save_order().await.unwrap_err();
    assert!(matches!(err, TriggerError::Backend(_)));
    assert!(h.explorer.pending().is_none());
    assert!(h.explorer.session(Section::Before).is_some());
    assert_eq!(h.explorer.drain_toasts()[0].message, "Insufficient access rights");
}

// ---------------------------------------------------------------------------
// Notification handling
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn pre_deployment_failure_waits_before_surfacing() {
    let mut h = default_harness().await;
    h.org
        .reject_next_submission("Pre-deployment validation failed: Order__c");
    h.explorer.begin_reorder(Section::Before).unwrap();
    h.explorer.request_save_order(Section::Before).unwrap();

    let outcome = h.explorer.confirm_save_order().await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::AwaitingLateNotification { .. }));
    assert!(h.explorer.toasts().is_empty());
    assert!(h.explorer.is_busy(Surface::Section(Section::Before)));

    let started = tokio::time::Instant::now();
    let event = h.explorer.process_next().await.unwrap();
    assert!(matches!(event, ExplorerEvent::LateWaitExpired { .. }));
    assert!(started.elapsed() >= Duration::from_millis(15_000));

    let toasts = h.explorer.drain_toasts();
    assert_eq!(toasts.len(), 1);
    assert!(toasts[0].message.contains("Pre-deployment validation failed"));
    assert!(!h.explorer.is_busy(Surface::Section(Section::Before)));
}

#[tokio::test(start_paused = true)]
async fn late_notification_inside_the_wait_resolves_it() {
    let mut h = default_harness().await;
    h.org
        .reject_next_submission("Pre-deployment validation failed");
    h.explorer.open_setting("S1", ModalMode::Edit).unwrap();
    h.explorer
        .modal_mut()
        .unwrap()
        .setting_draft_mut()
        .unwrap()
        .bypass_execution = true;
    h.explorer.save_modal().await.unwrap();

    tokio::time::advance(Duration::from_secs(5)).await;
    h.org.events().publish(DeploymentNotification::failed(
        "005U",
        Some("Field Bypass_Execution__c is locked".into()),
    ));
    let event = h.explorer.process_next().await.unwrap();
    assert_eq!(
        event,
        ExplorerEvent::DeploymentFailed {
            surface: Surface::SettingModal,
            message: "Field Bypass_Execution__c is locked".into(),
        }
    );
    let modal = h.explorer.modal().unwrap();
    assert_eq!(modal.error.as_deref(), Some("Field Bypass_Execution__c is locked"));
    assert!(modal.setting_draft().unwrap().bypass_execution);
}

#[tokio::test(start_paused = true)]
async fn other_users_notification_changes_nothing() {
    let mut h = harness(InMemoryOrg::from_snapshot(snapshot()).with_latency(Duration::from_secs(2))).await;
    h.explorer.begin_reorder(Section::Before).unwrap();
    h.explorer
        .move_action(Section::Before, "A1", Direction::Up)
        .unwrap();
    h.explorer.request_save_order(Section::Before).unwrap();
    h.explorer.confirm_save_order().await.unwrap();

    h.org
        .events()
        .publish(DeploymentNotification::succeeded("005OTHER", Some("theirs".into())));
    assert_eq!(h.explorer.process_next().await, Some(ExplorerEvent::Ignored));
    assert!(h.explorer.toasts().is_empty());
    assert!(h.explorer.is_busy(Surface::Section(Section::Before)));
    assert_eq!(ids(&h.explorer.partition().before), ["A2", "A1"]);

    let events = h.explorer.settle().await;
    assert!(matches!(events.last(), Some(ExplorerEvent::Deployed { .. })));
    assert_eq!(ids(&h.explorer.partition().before), ["A1", "A2"]);
}

#[tokio::test(start_paused = true)]
async fn notification_for_another_job_is_ignored() {
    let mut h = harness(InMemoryOrg::from_snapshot(snapshot()).with_latency(Duration::from_secs(2))).await;
    h.explorer.begin_reorder(Section::Before).unwrap();
    h.explorer.request_save_order(Section::Before).unwrap();
    h.explorer.confirm_save_order().await.unwrap();

    h.org
        .events()
        .publish(DeploymentNotification::failed("005U", None).with_job("stale-job"));
    assert_eq!(h.explorer.process_next().await, Some(ExplorerEvent::Ignored));
    assert!(h.explorer.pending().is_some());
}

#[tokio::test]
async fn channel_lag_is_not_fatal() {
    let org = Arc::new(InMemoryOrg::from_snapshot(snapshot()));
    let channel = Arc::new(DeploymentEvents::new(1));
    let mut explorer = ExplorerController::new(
        org,
        channel.clone(),
        Arc::new(MemorySelectionStore::new()),
        &ExplorerConfig::default(),
    );
    explorer.mount().await.unwrap();

    channel.publish(DeploymentNotification::succeeded("005OTHER", None));
    channel.publish(DeploymentNotification::succeeded("005OTHER", None));
    assert_eq!(explorer.process_next().await, Some(ExplorerEvent::ChannelLagged(1)));
    assert_eq!(explorer.process_next().await, Some(ExplorerEvent::Ignored));
    assert!(explorer.toasts().is_empty());
}

// ---------------------------------------------------------------------------
// Modals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn setting_edit_restores_selection_after_reload() {
    let mut h = default_harness().await;
    h.explorer.select_category(Category::Updated).unwrap();
    h.explorer.select_timing(Timing::Both).unwrap();

    h.explorer.open_setting("S1", ModalMode::View).unwrap();
    h.explorer.switch_modal_to_edit().unwrap();
    h.explorer
        .modal_mut()
        .unwrap()
        .setting_draft_mut()
        .unwrap()
        .bypass_execution = true;
    h.explorer.save_modal().await.unwrap();
    assert!(h.explorer.is_modal_busy());
    assert!(h.store.load().unwrap().is_some());

    h.explorer.settle().await;
    assert!(h.explorer.modal().is_none());
    assert!(h.explorer.current_setting().unwrap().bypass_execution);
    assert_eq!(h.explorer.selection().category(), Category::Updated);
    assert_eq!(h.explorer.selection().timing(), Timing::Both);
    assert!(h.store.load().unwrap().is_none());
}

#[tokio::test]
async fn new_action_from_section_lands_in_partition() {
    let mut h = default_harness().await;
    h.explorer.add_action(Section::Before).unwrap();
    {
        let draft = h.explorer.modal_mut().unwrap().action_draft_mut().unwrap();
        draft.developer_name = "TA_Five".into();
        draft.label = "Five".into();
        draft.class_name = "FiveHandler".into();
    }
    h.explorer.save_modal().await.unwrap();
    h.explorer.settle().await;

    let before = &h.explorer.partition().before;
    assert_eq!(before.len(), 3);
    assert_eq!(before[2].developer_name, "TA_Five");
    assert_eq!(before[2].order, 3.0);
    assert!(h.explorer.known_names().has_action("TA_Five"));
}

#[tokio::test]
async fn duplicate_name_is_caught_before_submission() {
    let mut h = default_harness().await;
    h.explorer.add_action(Section::Before).unwrap();
    {
        let draft = h.explorer.modal_mut().unwrap().action_draft_mut().unwrap();
        draft.developer_name = "ta_one".into();
        draft.label = "Dup".into();
        draft.class_name = "Dup".into();
    }
    let err = h.explorer.save_modal().await.unwrap_err();
    assert!(matches!(err, TriggerError::DuplicateName(_)));
    assert!(h.explorer.modal().unwrap().error.is_some());
    assert!(h.explorer.pending().is_none());
    assert_eq!(h.org.deployed(), 0);
}

#[tokio::test]
async fn editing_a_record_cannot_rename_it() {
    let mut h = default_harness().await;
    h.explorer.open_action("A1", ModalMode::Edit).unwrap();
    h.explorer
        .modal_mut()
        .unwrap()
        .action_draft_mut()
        .unwrap()
        .developer_name = "TA_Renamed".into();

    let err = h.explorer.save_modal().await.unwrap_err();
    assert!(matches!(err, TriggerError::Validation(_)));
    let modal = h.explorer.modal().unwrap();
    assert!(modal.error.as_deref().unwrap().contains("cannot be changed"));
    assert!(h.explorer.pending().is_none());

    match modal.to_mutation().unwrap() {
        trigger_core::backend::Mutation::UpsertAction(record) => {
            assert_eq!(record.developer_name, "TA_One")
        }
        other => panic!("unexpected mutation: {other:?}"),
    }
}

#[tokio::test]
async fn second_submission_is_refused_while_pending() {
    let mut h = default_harness().await;
    h.explorer.begin_reorder(Section::Before).unwrap();
    h.explorer.request_save_order(Section::Before).unwrap();
    h.explorer.confirm_save_order().await.unwrap();

    h.explorer.open_setting("S1", ModalMode::Edit).unwrap();
    assert!(matches!(
        h.explorer.save_modal().await,
        Err(TriggerError::DeploymentPending)
    ));
    assert!(matches!(
        h.explorer.begin_reorder(Section::Before),
        Err(TriggerError::DeploymentPending)
    ));
    h.explorer.settle().await;
    assert!(h.explorer.modal().is_none());
}
