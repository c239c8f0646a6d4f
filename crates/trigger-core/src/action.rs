use crate::error::{Result, TriggerError};
use crate::names::{self, KnownNames};
use crate::order::parse_order_input;
use crate::setting::non_empty;
use crate::types::BindingField;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class-name sentinel stored alongside the flow name for change-event flows.
pub const FLOW_CHANGE_EVENT_CLASS: &str = "TriggerActionFlowChangeEvent";

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// What an action runs. Each variant carries only the fields it uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Apex {
        class_name: String,
    },
    Flow {
        flow_name: String,
        #[serde(default)]
        allow_recursion: bool,
    },
    FlowChangeEvent {
        flow_name: String,
    },
}

impl ActionKind {
    pub fn tag(&self) -> ActionTypeTag {
        match self {
            ActionKind::Apex { .. } => ActionTypeTag::Apex,
            ActionKind::Flow { .. } => ActionTypeTag::Flow,
            ActionKind::FlowChangeEvent { .. } => ActionTypeTag::FlowChangeEvent,
        }
    }

    /// `(Apex_Class_Name__c, Flow_Name__c, Allow_Flow_Recursion__c)` as stored.
    fn to_wire(&self) -> (Option<String>, Option<String>, bool) {
        match self {
            ActionKind::Apex { class_name } => (Some(class_name.clone()), None, false),
            ActionKind::Flow {
                flow_name,
                allow_recursion,
            } => (None, Some(flow_name.clone()), *allow_recursion),
            ActionKind::FlowChangeEvent { flow_name } => (
                Some(FLOW_CHANGE_EVENT_CLASS.to_string()),
                Some(flow_name.clone()),
                false,
            ),
        }
    }

    fn from_wire(
        class_name: Option<String>,
        flow_name: Option<String>,
        allow_recursion: bool,
    ) -> Option<Self> {
        match (non_empty(class_name), non_empty(flow_name)) {
            (Some(class), Some(flow_name)) if class == FLOW_CHANGE_EVENT_CLASS => {
                Some(ActionKind::FlowChangeEvent { flow_name })
            }
            (_, Some(flow_name)) => Some(ActionKind::Flow {
                flow_name,
                allow_recursion,
            }),
            (Some(class_name), None) => Some(ActionKind::Apex { class_name }),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTypeTag {
    Apex,
    Flow,
    FlowChangeEvent,
}

impl ActionTypeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionTypeTag::Apex => "apex",
            ActionTypeTag::Flow => "flow",
            ActionTypeTag::FlowChangeEvent => "flow_change_event",
        }
    }
}

impl fmt::Display for ActionTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// Lifecycle-binding fields; each holds the reference of at most one setting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    pub before_insert: Option<String>,
    pub after_insert: Option<String>,
    pub before_update: Option<String>,
    pub after_update: Option<String>,
    pub before_delete: Option<String>,
    pub after_delete: Option<String>,
    pub after_undelete: Option<String>,
}

impl Bindings {
    pub fn get(&self, field: BindingField) -> Option<&str> {
        let slot = match field {
            BindingField::BeforeInsert => &self.before_insert,
            BindingField::AfterInsert => &self.after_insert,
            BindingField::BeforeUpdate => &self.before_update,
            BindingField::AfterUpdate => &self.after_update,
            BindingField::BeforeDelete => &self.before_delete,
            BindingField::AfterDelete => &self.after_delete,
            BindingField::AfterUndelete => &self.after_undelete,
        };
        slot.as_deref()
    }

    pub fn set(&mut self, field: BindingField, value: Option<String>) {
        let slot = match field {
            BindingField::BeforeInsert => &mut self.before_insert,
            BindingField::AfterInsert => &mut self.after_insert,
            BindingField::BeforeUpdate => &mut self.before_update,
            BindingField::AfterUpdate => &mut self.after_update,
            BindingField::BeforeDelete => &mut self.before_delete,
            BindingField::AfterDelete => &mut self.after_delete,
            BindingField::AfterUndelete => &mut self.after_undelete,
        };
        *slot = non_empty(value);
    }

    pub fn is_bound(&self, field: BindingField, setting_ref: &str) -> bool {
        self.get(field) == Some(setting_ref)
    }
}

// ---------------------------------------------------------------------------
// TriggerAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerAction {
    pub id: String,
    pub developer_name: String,
    pub label: String,
    pub description: Option<String>,
    /// Execution order within one lifecycle-phase list. May be fractional.
    pub order: f64,
    pub kind: ActionKind,
    pub entry_criteria: Option<String>,
    pub bypass_execution: bool,
    pub bypass_permission: Option<String>,
    pub required_permission: Option<String>,
    pub bindings: Bindings,
}

impl TriggerAction {
    pub fn type_label(&self) -> &'static str {
        match self.kind {
            ActionKind::Apex { .. } => "Apex",
            ActionKind::Flow { .. } | ActionKind::FlowChangeEvent { .. } => "Flow",
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.bypass_execution {
            "Bypassed"
        } else {
            "Active"
        }
    }

    /// Class or flow name, whichever the action runs.
    pub fn implementation_name(&self) -> &str {
        match &self.kind {
            ActionKind::Apex { class_name } => class_name,
            ActionKind::Flow { flow_name, .. } | ActionKind::FlowChangeEvent { flow_name } => {
                flow_name
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ActionRecord (wire)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "DeveloperName", default)]
    pub developer_name: String,
    #[serde(rename = "Label", alias = "MasterLabel", default)]
    pub label: String,
    #[serde(rename = "Description__c", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Order__c", default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    #[serde(rename = "Apex_Class_Name__c", default, skip_serializing_if = "Option::is_none")]
    pub apex_class_name: Option<String>,
    #[serde(rename = "Flow_Name__c", default, skip_serializing_if = "Option::is_none")]
    pub flow_name: Option<String>,
    #[serde(rename = "Entry_Criteria__c", default, skip_serializing_if = "Option::is_none")]
    pub entry_criteria: Option<String>,
    #[serde(rename = "Allow_Flow_Recursion__c", default)]
    pub allow_flow_recursion: bool,
    #[serde(rename = "Bypass_Execution__c", default)]
    pub bypass_execution: bool,
    #[serde(rename = "Bypass_Permission__c", default, skip_serializing_if = "Option::is_none")]
    pub bypass_permission: Option<String>,
    #[serde(rename = "Required_Permission__c", default, skip_serializing_if = "Option::is_none")]
    pub required_permission: Option<String>,
    #[serde(rename = "Before_Insert__c", default, skip_serializing_if = "Option::is_none")]
    pub before_insert: Option<String>,
    #[serde(rename = "After_Insert__c", default, skip_serializing_if = "Option::is_none")]
    pub after_insert: Option<String>,
    #[serde(rename = "Before_Update__c", default, skip_serializing_if = "Option::is_none")]
    pub before_update: Option<String>,
    #[serde(rename = "After_Update__c", default, skip_serializing_if = "Option::is_none")]
    pub after_update: Option<String>,
    #[serde(rename = "Before_Delete__c", default, skip_serializing_if = "Option::is_none")]
    pub before_delete: Option<String>,
    #[serde(rename = "After_Delete__c", default, skip_serializing_if = "Option::is_none")]
    pub after_delete: Option<String>,
    #[serde(rename = "After_Undelete__c", default, skip_serializing_if = "Option::is_none")]
    pub after_undelete: Option<String>,
}

impl ActionRecord {
    fn bindings(&self) -> Bindings {
        let mut b = Bindings::default();
        b.set(BindingField::BeforeInsert, self.before_insert.clone());
        b.set(BindingField::AfterInsert, self.after_insert.clone());
        b.set(BindingField::BeforeUpdate, self.before_update.clone());
        b.set(BindingField::AfterUpdate, self.after_update.clone());
        b.set(BindingField::BeforeDelete, self.before_delete.clone());
        b.set(BindingField::AfterDelete, self.after_delete.clone());
        b.set(BindingField::AfterUndelete, self.after_undelete.clone());
        b
    }

    fn set_bindings(&mut self, b: &Bindings) {
        self.before_insert = b.before_insert.clone();
        self.after_insert = b.after_insert.clone();
        self.before_update = b.before_update.clone();
        self.after_update = b.after_update.clone();
        self.before_delete = b.before_delete.clone();
        self.after_delete = b.after_delete.clone();
        self.after_undelete = b.after_undelete.clone();
    }
}

impl TryFrom<ActionRecord> for TriggerAction {
    type Error = TriggerError;

    fn try_from(r: ActionRecord) -> Result<Self> {
        let invalid = |reason: &str| TriggerError::InvalidRecord {
            name: r.developer_name.clone(),
            reason: reason.to_string(),
        };
        let id = non_empty(r.id.clone()).ok_or_else(|| invalid("missing Id"))?;
        let kind = ActionKind::from_wire(
            r.apex_class_name.clone(),
            r.flow_name.clone(),
            r.allow_flow_recursion,
        )
        .ok_or_else(|| invalid("neither an Apex class nor a flow is set"))?;
        let order = r.order.unwrap_or(0.0);
        if !order.is_finite() {
            return Err(invalid("order is not a finite number"));
        }
        let bindings = r.bindings();
        Ok(Self {
            id,
            label: if r.label.is_empty() {
                r.developer_name.clone()
            } else {
                r.label
            },
            developer_name: r.developer_name,
            description: non_empty(r.description),
            order,
            kind,
            entry_criteria: non_empty(r.entry_criteria),
            bypass_execution: r.bypass_execution,
            bypass_permission: non_empty(r.bypass_permission),
            required_permission: non_empty(r.required_permission),
            bindings,
        })
    }
}

impl From<&TriggerAction> for ActionRecord {
    fn from(a: &TriggerAction) -> Self {
        let (apex_class_name, flow_name, allow_flow_recursion) = a.kind.to_wire();
        let mut record = Self {
            id: Some(a.id.clone()),
            developer_name: a.developer_name.clone(),
            label: a.label.clone(),
            description: a.description.clone(),
            order: Some(a.order),
            apex_class_name,
            flow_name,
            entry_criteria: a.entry_criteria.clone(),
            allow_flow_recursion,
            bypass_execution: a.bypass_execution,
            bypass_permission: a.bypass_permission.clone(),
            required_permission: a.required_permission.clone(),
            ..Default::default()
        };
        record.set_bindings(&a.bindings);
        record
    }
}

// ---------------------------------------------------------------------------
// ReorderEntry
// ---------------------------------------------------------------------------

/// One item of a mass-reorder request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderEntry {
    pub developer_name: String,
    pub label: String,
    pub order: f64,
}

impl From<&TriggerAction> for ReorderEntry {
    fn from(a: &TriggerAction) -> Self {
        Self {
            developer_name: a.developer_name.clone(),
            label: a.label.clone(),
            order: a.order,
        }
    }
}

// ---------------------------------------------------------------------------
// ActionDraft
// ---------------------------------------------------------------------------

/// Working copy edited in the action modal.
///
/// Both the class and flow fields are kept while the user flips the type
/// selector; only the ones relevant to `kind` reach the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDraft {
    pub id: Option<String>,
    pub developer_name: String,
    pub label: String,
    pub description: String,
    pub order: String,
    pub kind: ActionTypeTag,
    pub class_name: String,
    pub flow_name: String,
    pub allow_recursion: bool,
    pub entry_criteria: String,
    pub bypass_execution: bool,
    pub bypass_permission: String,
    pub required_permission: String,
    pub bindings: Bindings,
    /// Developer name of the stored record; fixed once the record exists.
    pub(crate) stored_name: Option<String>,
}

impl Default for ActionDraft {
    fn default() -> Self {
        Self {
            id: None,
            developer_name: String::new(),
            label: String::new(),
            description: String::new(),
            order: String::new(),
            kind: ActionTypeTag::Apex,
            class_name: String::new(),
            flow_name: String::new(),
            allow_recursion: false,
            entry_criteria: String::new(),
            bypass_execution: false,
            bypass_permission: String::new(),
            required_permission: String::new(),
            bindings: Bindings::default(),
            stored_name: None,
        }
    }
}

impl ActionDraft {
    pub fn from_action(a: &TriggerAction) -> Self {
        let (class_name, flow_name, allow_recursion) = match &a.kind {
            ActionKind::Apex { class_name } => (class_name.clone(), String::new(), false),
            ActionKind::Flow {
                flow_name,
                allow_recursion,
            } => (String::new(), flow_name.clone(), *allow_recursion),
            ActionKind::FlowChangeEvent { flow_name } => {
                (FLOW_CHANGE_EVENT_CLASS.to_string(), flow_name.clone(), false)
            }
        };
        Self {
            id: Some(a.id.clone()),
            developer_name: a.developer_name.clone(),
            label: a.label.clone(),
            description: a.description.clone().unwrap_or_default(),
            order: format_order(a.order),
            kind: a.kind.tag(),
            class_name,
            flow_name,
            allow_recursion,
            entry_criteria: a.entry_criteria.clone().unwrap_or_default(),
            bypass_execution: a.bypass_execution,
            bypass_permission: a.bypass_permission.clone().unwrap_or_default(),
            required_permission: a.required_permission.clone().unwrap_or_default(),
            bindings: a.bindings.clone(),
            stored_name: Some(a.developer_name.clone()),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn validate(&self, known: &KnownNames) -> Result<()> {
        if self.is_new() {
            if self.developer_name.trim().is_empty() || self.label.trim().is_empty() {
                return Err(TriggerError::Validation(
                    "Developer Name and Label are required fields.".into(),
                ));
            }
            names::validate_developer_name(self.developer_name.trim())?;
            if known.has_action(&self.developer_name) {
                return Err(TriggerError::DuplicateName(
                    self.developer_name.trim().to_string(),
                ));
            }
        } else {
            names::ensure_unchanged(self.stored_name.as_deref(), &self.developer_name)?;
        }
        self.kind()?;
        parse_order_input(&self.order)?;
        Ok(())
    }

    /// Resolve the type selector against whichever name fields are filled in.
    pub fn kind(&self) -> Result<ActionKind> {
        match self.kind {
            ActionTypeTag::Apex => match non_empty(Some(self.class_name.clone())) {
                Some(class_name) => Ok(ActionKind::Apex { class_name }),
                None => Err(TriggerError::Validation("Apex Class Name is required.".into())),
            },
            ActionTypeTag::Flow | ActionTypeTag::FlowChangeEvent => {
                let flow_name = non_empty(Some(self.flow_name.clone()))
                    .ok_or_else(|| TriggerError::Validation("Flow Name is required.".into()))?;
                Ok(if self.kind == ActionTypeTag::Flow {
                    ActionKind::Flow {
                        flow_name,
                        allow_recursion: self.allow_recursion,
                    }
                } else {
                    ActionKind::FlowChangeEvent { flow_name }
                })
            }
        }
    }

    /// Developer name sent with the payload. Existing records keep theirs.
    pub fn payload_name(&self) -> String {
        match (&self.id, &self.stored_name) {
            (Some(_), Some(stored)) => stored.clone(),
            _ => self.developer_name.trim().to_string(),
        }
    }

    /// Build the upsert payload with type-irrelevant fields stripped.
    pub fn to_record(&self) -> Result<ActionRecord> {
        let (apex_class_name, flow_name, allow_flow_recursion) = self.kind()?.to_wire();
        let mut record = ActionRecord {
            id: self.id.clone(),
            developer_name: self.payload_name(),
            label: self.label.trim().to_string(),
            description: non_empty(Some(self.description.clone())),
            order: parse_order_input(&self.order)?,
            apex_class_name,
            flow_name,
            entry_criteria: non_empty(Some(self.entry_criteria.clone())),
            allow_flow_recursion,
            bypass_execution: self.bypass_execution,
            bypass_permission: non_empty(Some(self.bypass_permission.clone())),
            required_permission: non_empty(Some(self.required_permission.clone())),
            ..Default::default()
        };
        record.set_bindings(&self.bindings);
        Ok(record)
    }
}

/// Render an order value without a trailing `.0` for whole numbers.
pub fn format_order(order: f64) -> String {
    if order.fract() == 0.0 && order.abs() < 1e15 {
        format!("{}", order as i64)
    } else {
        format!("{order}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> ActionRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn decodes_apex_action() {
        let a = TriggerAction::try_from(record(
            r#"{"Id":"a1","DeveloperName":"TA_Account_Default","MasterLabel":"Defaults",
                "Order__c":1.5,"Apex_Class_Name__c":"TA_Account_Default",
                "Before_Insert__c":"S1"}"#,
        ))
        .unwrap();
        assert_eq!(a.label, "Defaults");
        assert_eq!(a.order, 1.5);
        assert_eq!(a.type_label(), "Apex");
        assert_eq!(a.implementation_name(), "TA_Account_Default");
        assert!(a.bindings.is_bound(BindingField::BeforeInsert, "S1"));
        assert_eq!(a.bindings.get(BindingField::AfterInsert), None);
    }

    #[test]
    fn decodes_flow_variants() {
        let flow = TriggerAction::try_from(record(
            r#"{"Id":"a2","DeveloperName":"Flow_A","Flow_Name__c":"Account_Flow",
                "Allow_Flow_Recursion__c":true}"#,
        ))
        .unwrap();
        assert_eq!(
            flow.kind,
            ActionKind::Flow {
                flow_name: "Account_Flow".into(),
                allow_recursion: true
            }
        );
        assert_eq!(flow.order, 0.0);

        let cdc = TriggerAction::try_from(record(
            r#"{"Id":"a3","DeveloperName":"Flow_B","Flow_Name__c":"Cdc_Flow",
                "Apex_Class_Name__c":"TriggerActionFlowChangeEvent"}"#,
        ))
        .unwrap();
        assert_eq!(
            cdc.kind,
            ActionKind::FlowChangeEvent {
                flow_name: "Cdc_Flow".into()
            }
        );
        assert_eq!(cdc.type_label(), "Flow");
    }

    #[test]
    fn rejects_action_without_implementation() {
        let err = TriggerAction::try_from(record(r#"{"Id":"a4","DeveloperName":"Empty"}"#))
            .unwrap_err();
        assert!(err.to_string().contains("Empty"));
    }

    #[test]
    fn flow_payload_omits_class_name() {
        let draft = ActionDraft {
            developer_name: "TA_Flow".into(),
            label: "Flow".into(),
            kind: ActionTypeTag::Flow,
            class_name: "Leftover".into(),
            flow_name: "My_Flow".into(),
            order: "3".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(draft.to_record().unwrap()).unwrap();
        assert!(json.get("Apex_Class_Name__c").is_none());
        assert_eq!(json["Flow_Name__c"], "My_Flow");
        assert_eq!(json["Order__c"], 3.0);
    }

    #[test]
    fn change_event_payload_keeps_sentinel() {
        let draft = ActionDraft {
            developer_name: "TA_Cdc".into(),
            label: "Cdc".into(),
            kind: ActionTypeTag::FlowChangeEvent,
            flow_name: "Cdc_Flow".into(),
            allow_recursion: true,
            ..Default::default()
        };
        let record = draft.to_record().unwrap();
        assert_eq!(record.apex_class_name.as_deref(), Some(FLOW_CHANGE_EVENT_CLASS));
        assert!(!record.allow_flow_recursion);
        assert_eq!(record.order, None);
    }

    #[test]
    fn apex_payload_omits_flow_fields() {
        let draft = ActionDraft {
            developer_name: "TA_Apex".into(),
            label: "Apex".into(),
            class_name: "TA_Apex".into(),
            flow_name: "Stale_Flow".into(),
            allow_recursion: true,
            ..Default::default()
        };
        let record = draft.to_record().unwrap();
        assert_eq!(record.flow_name, None);
        assert!(!record.allow_flow_recursion);
    }

    #[test]
    fn draft_validation() {
        let known = KnownNames::rebuild([], ["TA_Existing"]);
        let mut draft = ActionDraft {
            developer_name: "TA_Existing".into(),
            label: "x".into(),
            class_name: "Foo".into(),
            ..Default::default()
        };
        assert!(matches!(
            draft.validate(&known),
            Err(TriggerError::DuplicateName(_))
        ));

        draft.developer_name = "TA_New".into();
        draft.order = "1.23456".into();
        assert!(matches!(
            draft.validate(&known),
            Err(TriggerError::ManualOrder(_))
        ));

        draft.order = "1.2345".into();
        draft.validate(&known).unwrap();

        draft.class_name.clear();
        assert!(draft.validate(&known).is_err());
    }

    #[test]
    fn draft_round_trips_existing_action() {
        let a = TriggerAction::try_from(record(
            r#"{"Id":"a5","DeveloperName":"TA_X","Label":"X","Order__c":2,
                "Apex_Class_Name__c":"TA_X","After_Update__c":"S9"}"#,
        ))
        .unwrap();
        let draft = ActionDraft::from_action(&a);
        assert_eq!(draft.order, "2");
        let back = TriggerAction::try_from(draft.to_record().unwrap()).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn reorder_entry_wire_names() {
        let entry = ReorderEntry {
            developer_name: "TA_X".into(),
            label: "X".into(),
            order: 1.0,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["developerName"], "TA_X");
        assert_eq!(json["order"], 1.0);
    }

    #[test]
    fn edit_keeps_stored_developer_name() {
        let a = TriggerAction::try_from(record(
            r#"{"Id":"a6","DeveloperName":"TA_Keep","Label":"Keep",
                "Apex_Class_Name__c":"TA_Keep","Before_Insert__c":"S1"}"#,
        ))
        .unwrap();
        let mut draft = ActionDraft::from_action(&a);
        draft.developer_name = "TA_Renamed".into();
        let err = draft.validate(&KnownNames::default()).unwrap_err();
        assert!(err.to_string().contains("cannot be changed"));

        let record = draft.to_record().unwrap();
        assert_eq!(record.developer_name, "TA_Keep");
        assert_eq!(record.id.as_deref(), Some("a6"));
    }
}
