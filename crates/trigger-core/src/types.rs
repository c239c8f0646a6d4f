use crate::error::TriggerError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The lifecycle event a user is browsing: which DML operation fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Created,
    Updated,
    Deleted,
    Restored,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Created,
            Category::Updated,
            Category::Deleted,
            Category::Restored,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Created => "CREATED",
            Category::Updated => "UPDATED",
            Category::Deleted => "DELETED",
            Category::Restored => "RESTORED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Created => "Created",
            Category::Updated => "Updated",
            Category::Deleted => "Deleted",
            Category::Restored => "Restored",
        }
    }

    /// Before-phase binding field, if the event has one. Undelete never does.
    pub fn before_field(self) -> Option<BindingField> {
        match self {
            Category::Created => Some(BindingField::BeforeInsert),
            Category::Updated => Some(BindingField::BeforeUpdate),
            Category::Deleted => Some(BindingField::BeforeDelete),
            Category::Restored => None,
        }
    }

    pub fn after_field(self) -> BindingField {
        match self {
            Category::Created => BindingField::AfterInsert,
            Category::Updated => BindingField::AfterUpdate,
            Category::Deleted => BindingField::AfterDelete,
            Category::Restored => BindingField::AfterUndelete,
        }
    }

    pub fn field(self, section: Section) -> Option<BindingField> {
        match section {
            Section::Before => self.before_field(),
            Section::After => Some(self.after_field()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATED" => Ok(Category::Created),
            "UPDATED" => Ok(Category::Updated),
            "DELETED" => Ok(Category::Deleted),
            "RESTORED" => Ok(Category::Restored),
            _ => Err(TriggerError::InvalidCategory(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Timing {
    Before,
    After,
    Both,
}

impl Timing {
    pub fn all() -> &'static [Timing] {
        &[Timing::Before, Timing::After, Timing::Both]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Timing::Before => "BEFORE",
            Timing::After => "AFTER",
            Timing::Both => "BOTH",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Timing::Before => "Before",
            Timing::After => "After",
            Timing::Both => "Before and After",
        }
    }

    pub fn includes(self, section: Section) -> bool {
        matches!(
            (self, section),
            (Timing::Both, _) | (Timing::Before, Section::Before) | (Timing::After, Section::After)
        )
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Timing {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BEFORE" => Ok(Timing::Before),
            "AFTER" => Ok(Timing::After),
            "BOTH" => Ok(Timing::Both),
            _ => Err(TriggerError::InvalidTiming(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// One of the two displayed action lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Before,
    After,
}

impl Section {
    pub fn all() -> &'static [Section] {
        &[Section::Before, Section::After]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Before => "before",
            Section::After => "after",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Before => "Before Actions",
            Section::After => "After Actions",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Section {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "before" => Ok(Section::Before),
            "after" => Ok(Section::After),
            _ => Err(TriggerError::InvalidSection(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Direction / OrderMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderMode {
    /// Up/down moves; commit assigns consecutive integers.
    Positional,
    /// Direct numeric entry per item.
    Manual,
}

impl fmt::Display for OrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderMode::Positional => "positional",
            OrderMode::Manual => "manual",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// BindingField
// ---------------------------------------------------------------------------

/// The seven lifecycle-binding fields on a trigger action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingField {
    BeforeInsert,
    AfterInsert,
    BeforeUpdate,
    AfterUpdate,
    BeforeDelete,
    AfterDelete,
    AfterUndelete,
}

impl BindingField {
    pub fn all() -> &'static [BindingField] {
        &[
            BindingField::BeforeInsert,
            BindingField::AfterInsert,
            BindingField::BeforeUpdate,
            BindingField::AfterUpdate,
            BindingField::BeforeDelete,
            BindingField::AfterDelete,
            BindingField::AfterUndelete,
        ]
    }

    /// Platform field API name.
    pub fn api_name(self) -> &'static str {
        match self {
            BindingField::BeforeInsert => "Before_Insert__c",
            BindingField::AfterInsert => "After_Insert__c",
            BindingField::BeforeUpdate => "Before_Update__c",
            BindingField::AfterUpdate => "After_Update__c",
            BindingField::BeforeDelete => "Before_Delete__c",
            BindingField::AfterDelete => "After_Delete__c",
            BindingField::AfterUndelete => "After_Undelete__c",
        }
    }

    pub fn section(self) -> Section {
        match self {
            BindingField::BeforeInsert
            | BindingField::BeforeUpdate
            | BindingField::BeforeDelete => Section::Before,
            _ => Section::After,
        }
    }
}

impl fmt::Display for BindingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_field_mapping() {
        assert_eq!(Category::Created.before_field(), Some(BindingField::BeforeInsert));
        assert_eq!(Category::Created.after_field(), BindingField::AfterInsert);
        assert_eq!(Category::Updated.before_field(), Some(BindingField::BeforeUpdate));
        assert_eq!(Category::Deleted.after_field(), BindingField::AfterDelete);
        assert_eq!(Category::Restored.before_field(), None);
        assert_eq!(Category::Restored.after_field(), BindingField::AfterUndelete);
    }

    #[test]
    fn every_binding_field_belongs_to_one_category() {
        for field in BindingField::all() {
            let owners = Category::all()
                .iter()
                .filter(|c| c.before_field() == Some(*field) || c.after_field() == *field)
                .count();
            assert_eq!(owners, 1, "{field}");
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("created".parse::<Category>().unwrap(), Category::Created);
        assert_eq!("RESTORED".parse::<Category>().unwrap(), Category::Restored);
        assert_eq!("Both".parse::<Timing>().unwrap(), Timing::Both);
        assert_eq!("AFTER".parse::<Section>().unwrap(), Section::After);
        assert!("inserted".parse::<Category>().is_err());
        assert!("during".parse::<Timing>().is_err());
    }

    #[test]
    fn timing_includes_sections() {
        assert!(Timing::Before.includes(Section::Before));
        assert!(!Timing::Before.includes(Section::After));
        assert!(Timing::Both.includes(Section::Before));
        assert!(Timing::Both.includes(Section::After));
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Category::Updated).unwrap(), "\"UPDATED\"");
        assert_eq!(serde_json::to_string(&Timing::Both).unwrap(), "\"BOTH\"");
    }
}
