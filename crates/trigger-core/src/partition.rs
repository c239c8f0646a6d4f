use crate::action::TriggerAction;
use crate::setting::TriggerSetting;
use crate::types::{Category, Section, Timing};
use serde::Serialize;

/// The two display-ordered action lists for one selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Partition {
    pub before: Vec<TriggerAction>,
    pub after: Vec<TriggerAction>,
}

impl Partition {
    pub fn section(&self, section: Section) -> &[TriggerAction] {
        match section {
            Section::Before => &self.before,
            Section::After => &self.after,
        }
    }

    pub fn total(&self) -> usize {
        self.before.len() + self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Split `actions` into the before/after lists bound to `setting` for
/// `category`, each sorted ascending by order value.
///
/// Pure: the input slice is only read, and equal order values keep their
/// input order.
pub fn partition(
    actions: &[TriggerAction],
    setting: Option<&TriggerSetting>,
    category: Category,
    timing: Timing,
) -> Partition {
    let Some(setting) = setting else {
        return Partition::default();
    };
    Partition {
        before: section_list(actions, &setting.id, category, timing, Section::Before),
        after: section_list(actions, &setting.id, category, timing, Section::After),
    }
}

fn section_list(
    actions: &[TriggerAction],
    setting_id: &str,
    category: Category,
    timing: Timing,
    section: Section,
) -> Vec<TriggerAction> {
    if !timing.includes(section) {
        return Vec::new();
    }
    let Some(field) = category.field(section) else {
        return Vec::new();
    };
    let mut list: Vec<TriggerAction> = actions
        .iter()
        .filter(|a| a.bindings.is_bound(field, setting_id))
        .cloned()
        .collect();
    list.sort_by(|a, b| a.order.total_cmp(&b.order));
    list
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
