use crate::action::ActionDraft;
use crate::backend::Mutation;
use crate::deployment::Surface;
use crate::error::Result;
use crate::names::KnownNames;
use crate::setting::SettingDraft;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMode {
    View,
    Edit,
    Create,
}

impl ModalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ModalMode::View => "view",
            ModalMode::Edit => "edit",
            ModalMode::Create => "create",
        }
    }

    pub fn is_read_only(self) -> bool {
        self == ModalMode::View
    }
}

impl fmt::Display for ModalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalContent {
    Setting(SettingDraft),
    Action(ActionDraft),
}

impl ModalContent {
    pub fn surface(&self) -> Surface {
        match self {
            ModalContent::Setting(_) => Surface::SettingModal,
            ModalContent::Action(_) => Surface::ActionModal,
        }
    }
}

// ---------------------------------------------------------------------------
// Modal
// ---------------------------------------------------------------------------

/// An open detail/edit form over a deep copy of one record.
#[derive(Debug, Clone)]
pub struct Modal {
    mode: ModalMode,
    content: ModalContent,
    original: ModalContent,
    /// Last validation or deployment error, shown inside the modal.
    pub error: Option<String>,
}

impl Modal {
    pub fn new(mode: ModalMode, content: ModalContent) -> Self {
        Self {
            mode,
            original: content.clone(),
            content,
            error: None,
        }
    }

    pub fn mode(&self) -> ModalMode {
        self.mode
    }

    pub fn content(&self) -> &ModalContent {
        &self.content
    }

    pub fn original(&self) -> &ModalContent {
        &self.original
    }

    pub fn surface(&self) -> Surface {
        self.content.surface()
    }

    pub fn title(&self) -> &'static str {
        match (&self.content, self.mode) {
            (ModalContent::Setting(_), ModalMode::Create) => "Create SObject Trigger Setting",
            (ModalContent::Setting(_), ModalMode::Edit) => "Edit SObject Trigger Setting",
            (ModalContent::Setting(_), ModalMode::View) => "SObject Trigger Setting Details",
            (ModalContent::Action(_), ModalMode::Create) => "New Trigger Action",
            (ModalContent::Action(_), ModalMode::Edit) => "Edit Trigger Action",
            (ModalContent::Action(_), ModalMode::View) => "View Trigger Action Details",
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.content != self.original
    }

    pub fn setting_draft(&self) -> Option<&SettingDraft> {
        match &self.content {
            ModalContent::Setting(d) => Some(d),
            ModalContent::Action(_) => None,
        }
    }

    pub fn action_draft(&self) -> Option<&ActionDraft> {
        match &self.content {
            ModalContent::Action(d) => Some(d),
            ModalContent::Setting(_) => None,
        }
    }

    /// Editable draft. `None` for read-only modals and for the other kind.
    pub fn setting_draft_mut(&mut self) -> Option<&mut SettingDraft> {
        if self.mode.is_read_only() {
            return None;
        }
        match &mut self.content {
            ModalContent::Setting(d) => Some(d),
            ModalContent::Action(_) => None,
        }
    }

    pub fn action_draft_mut(&mut self) -> Option<&mut ActionDraft> {
        if self.mode.is_read_only() {
            return None;
        }
        match &mut self.content {
            ModalContent::Action(d) => Some(d),
            ModalContent::Setting(_) => None,
        }
    }

    pub(crate) fn set_mode(&mut self, mode: ModalMode) {
        self.mode = mode;
    }

    /// Put every field back to its value when the modal opened.
    pub(crate) fn revert(&mut self) {
        self.content = self.original.clone();
        self.error = None;
    }

    pub fn validate(&self, known: &KnownNames) -> Result<()> {
        match &self.content {
            ModalContent::Setting(d) => d.validate(known),
            ModalContent::Action(d) => d.validate(known),
        }
    }

    pub fn to_mutation(&self) -> Result<Mutation> {
        Ok(match &self.content {
            ModalContent::Setting(d) => Mutation::UpsertSetting(d.to_record()),
            ModalContent::Action(d) => Mutation::UpsertAction(d.to_record()?),
        })
    }
}
