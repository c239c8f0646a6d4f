use crate::error::{Result, TriggerError};
use crate::names::{self, KnownNames};
use serde::{Deserialize, Serialize};

/// Object API names ending in this denote a change-data-capture stream.
pub const CHANGE_EVENT_SUFFIX: &str = "ChangeEvent";

// ---------------------------------------------------------------------------
// TriggerSetting
// ---------------------------------------------------------------------------

/// A configured host object and its bypass controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSetting {
    pub id: String,
    pub developer_name: String,
    pub label: String,
    pub object_api_name: String,
    pub object_namespace: Option<String>,
    pub record_class_name: Option<String>,
    pub required_permission: Option<String>,
    pub bypass_permission: Option<String>,
    pub bypass_execution: bool,
}

impl TriggerSetting {
    pub fn is_change_event(&self) -> bool {
        self.is_change_event_with(CHANGE_EVENT_SUFFIX)
    }

    pub fn is_change_event_with(&self, suffix: &str) -> bool {
        !suffix.is_empty() && self.object_api_name.ends_with(suffix)
    }
}

// ---------------------------------------------------------------------------
// SettingRecord (wire)
// ---------------------------------------------------------------------------

/// Flat platform representation, used both for fetch results and upsert payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingRecord {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "DeveloperName", default)]
    pub developer_name: String,
    #[serde(rename = "Label", default)]
    pub label: String,
    #[serde(rename = "Object_API_Name__c", default)]
    pub object_api_name: String,
    #[serde(rename = "Object_Namespace__c", default, skip_serializing_if = "Option::is_none")]
    pub object_namespace: Option<String>,
    #[serde(rename = "TriggerRecord_Class_Name__c", default, skip_serializing_if = "Option::is_none")]
    pub record_class_name: Option<String>,
    #[serde(rename = "Required_Permission__c", default, skip_serializing_if = "Option::is_none")]
    pub required_permission: Option<String>,
    #[serde(rename = "Bypass_Permission__c", default, skip_serializing_if = "Option::is_none")]
    pub bypass_permission: Option<String>,
    #[serde(rename = "Bypass_Execution__c", default)]
    pub bypass_execution: bool,
}

impl TryFrom<SettingRecord> for TriggerSetting {
    type Error = TriggerError;

    fn try_from(r: SettingRecord) -> Result<Self> {
        let id = r
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| TriggerError::InvalidRecord {
                name: r.developer_name.clone(),
                reason: "missing Id".into(),
            })?;
        Ok(Self {
            id,
            label: if r.label.is_empty() {
                r.developer_name.clone()
            } else {
                r.label
            },
            developer_name: r.developer_name,
            object_api_name: r.object_api_name,
            object_namespace: non_empty(r.object_namespace),
            record_class_name: non_empty(r.record_class_name),
            required_permission: non_empty(r.required_permission),
            bypass_permission: non_empty(r.bypass_permission),
            bypass_execution: r.bypass_execution,
        })
    }
}

impl From<&TriggerSetting> for SettingRecord {
    fn from(s: &TriggerSetting) -> Self {
        Self {
            id: Some(s.id.clone()),
            developer_name: s.developer_name.clone(),
            label: s.label.clone(),
            object_api_name: s.object_api_name.clone(),
            object_namespace: s.object_namespace.clone(),
            record_class_name: s.record_class_name.clone(),
            required_permission: s.required_permission.clone(),
            bypass_permission: s.bypass_permission.clone(),
            bypass_execution: s.bypass_execution,
        }
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let t = v.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

// ---------------------------------------------------------------------------
// SettingDraft
// ---------------------------------------------------------------------------

/// Working copy edited in the setting modal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingDraft {
    pub id: Option<String>,
    pub developer_name: String,
    pub label: String,
    pub object_api_name: String,
    pub object_namespace: String,
    pub record_class_name: String,
    pub required_permission: String,
    pub bypass_permission: String,
    pub bypass_execution: bool,
    /// Developer name of the stored record; fixed once the record exists.
    pub(crate) stored_name: Option<String>,
}

impl SettingDraft {
    pub fn from_setting(s: &TriggerSetting) -> Self {
        Self {
            id: Some(s.id.clone()),
            developer_name: s.developer_name.clone(),
            label: s.label.clone(),
            object_api_name: s.object_api_name.clone(),
            object_namespace: s.object_namespace.clone().unwrap_or_default(),
            record_class_name: s.record_class_name.clone().unwrap_or_default(),
            required_permission: s.required_permission.clone().unwrap_or_default(),
            bypass_permission: s.bypass_permission.clone().unwrap_or_default(),
            bypass_execution: s.bypass_execution,
            stored_name: Some(s.developer_name.clone()),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Client-side checks run before submission.
    pub fn validate(&self, known: &KnownNames) -> Result<()> {
        if self.is_new() {
            if self.developer_name.trim().is_empty()
                || self.label.trim().is_empty()
                || self.object_api_name.trim().is_empty()
            {
                return Err(TriggerError::Validation(
                    "Developer Name, Label, and Object API Name are required fields.".into(),
                ));
            }
            names::validate_developer_name(self.developer_name.trim())?;
            if known.has_setting(&self.developer_name) {
                return Err(TriggerError::DuplicateName(
                    self.developer_name.trim().to_string(),
                ));
            }
        } else {
            names::ensure_unchanged(self.stored_name.as_deref(), &self.developer_name)?;
            if self.object_api_name.trim().is_empty() {
                return Err(TriggerError::Validation("Object API Name is required.".into()));
            }
        }
        Ok(())
    }

    /// Developer name sent with the payload. Existing records keep theirs.
    pub fn payload_name(&self) -> String {
        match (&self.id, &self.stored_name) {
            (Some(_), Some(stored)) => stored.clone(),
            _ => self.developer_name.trim().to_string(),
        }
    }

    pub fn to_record(&self) -> SettingRecord {
        SettingRecord {
            id: self.id.clone(),
            developer_name: self.payload_name(),
            label: self.label.trim().to_string(),
            object_api_name: self.object_api_name.trim().to_string(),
            object_namespace: non_empty(Some(self.object_namespace.clone())),
            record_class_name: non_empty(Some(self.record_class_name.clone())),
            required_permission: non_empty(Some(self.required_permission.clone())),
            bypass_permission: non_empty(Some(self.bypass_permission.clone())),
            bypass_execution: self.bypass_execution,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
