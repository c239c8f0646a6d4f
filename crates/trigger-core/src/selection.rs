use crate::setting::{TriggerSetting, CHANGE_EVENT_SUFFIX};
use crate::store::PersistedSelection;
use crate::types::{Category, Timing};
use chrono::Utc;
use serde::Serialize;

/// Category and timing choices legal for the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionOptions {
    pub categories: Vec<Category>,
    pub timings: Vec<Timing>,
}

impl SelectionOptions {
    pub fn allows(&self, category: Category, timing: Timing) -> bool {
        self.categories.contains(&category) && self.timings.contains(&timing)
    }
}

/// The user's current object / event / timing filter.
#[derive(Debug, Clone)]
pub struct SelectionContext {
    setting_id: Option<String>,
    change_event: bool,
    category: Category,
    timing: Timing,
    change_event_suffix: String,
}

impl Default for SelectionContext {
    fn default() -> Self {
        Self::with_suffix(CHANGE_EVENT_SUFFIX)
    }
}

impl SelectionContext {
    pub fn with_suffix(change_event_suffix: impl Into<String>) -> Self {
        Self {
            setting_id: None,
            change_event: false,
            category: Category::Created,
            timing: Timing::Before,
            change_event_suffix: change_event_suffix.into(),
        }
    }

    pub fn setting_id(&self) -> Option<&str> {
        self.setting_id.as_deref()
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn is_change_event(&self) -> bool {
        self.change_event
    }

    /// Activate `setting` and reset category/timing to the object-type default.
    pub fn select_setting(&mut self, setting: &TriggerSetting) {
        self.setting_id = Some(setting.id.clone());
        self.change_event = setting.is_change_event_with(&self.change_event_suffix);
        self.category = Category::Created;
        self.timing = self.default_timing(Category::Created);
    }

    /// Set the category and reset timing to that category's default.
    pub fn select_category(&mut self, category: Category) {
        self.category = category;
        self.timing = self.default_timing(category);
    }

    /// Set the timing only. Callers check [`Self::options`] first.
    pub fn select_timing(&mut self, timing: Timing) {
        self.timing = timing;
    }

    pub fn clear(&mut self) {
        self.setting_id = None;
        self.change_event = false;
        self.category = Category::Created;
        self.timing = Timing::Before;
    }

    fn default_timing(&self, category: Category) -> Timing {
        if self.change_event || category == Category::Restored {
            Timing::After
        } else {
            Timing::Before
        }
    }

    pub fn options(&self) -> SelectionOptions {
        self.options_for(self.category)
    }

    fn options_for(&self, category: Category) -> SelectionOptions {
        if self.change_event {
            return SelectionOptions {
                categories: vec![Category::Created],
                timings: vec![Timing::After],
            };
        }
        let timings = if category == Category::Restored {
            vec![Timing::After]
        } else {
            Timing::all().to_vec()
        };
        SelectionOptions {
            categories: Category::all().to_vec(),
            timings,
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn to_persisted(&self) -> Option<PersistedSelection> {
        Some(PersistedSelection {
            setting_id: self.setting_id.clone()?,
            category: self.category,
            timing: self.timing,
            timestamp: Utc::now(),
        })
    }

    /// Re-apply a saved selection against freshly loaded settings.
    ///
    /// A setting that no longer exists drops the whole payload. A category
    /// or timing that is no longer legal is dropped, leaving the default
    /// chosen by the step before it. Returns `true` if the setting was
    /// restored.
    pub fn restore(&mut self, saved: &PersistedSelection, settings: &[TriggerSetting]) -> bool {
        let Some(setting) = settings.iter().find(|s| s.id == saved.setting_id) else {
            tracing::debug!(setting = %saved.setting_id, "saved selection refers to a missing setting");
            return false;
        };
        self.select_setting(setting);
        if !self.options().categories.contains(&saved.category) {
            return true;
        }
        self.select_category(saved.category);
        if self.options().timings.contains(&saved.timing) {
            self.timing = saved.timing;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
