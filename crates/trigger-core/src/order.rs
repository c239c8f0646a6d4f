use crate::action::{format_order, TriggerAction};
use crate::error::{ManualOrderError, Result, TriggerError};
use crate::types::{Direction, OrderMode, Section};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Fractional digits accepted for a manually entered order value.
pub const MAX_ORDER_DECIMALS: usize = 4;

// ---------------------------------------------------------------------------
// Manual order input
// ---------------------------------------------------------------------------

static NUMBER_RE: OnceLock<Regex> = OnceLock::new();

fn number_re() -> &'static Regex {
    NUMBER_RE.get_or_init(|| Regex::new(r"^-?(\d+(\.\d*)?|\.\d+)$").unwrap())
}

/// Parse text typed into an order field.
///
/// Blank input is `Ok(None)`: the field falls back to the stored order value.
/// A trailing decimal point (`"3."`) is accepted so partial keystrokes pass.
pub fn parse_order_input(raw: &str) -> std::result::Result<Option<f64>, ManualOrderError> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if !number_re().is_match(value) {
        return Err(ManualOrderError::NotANumber(value.to_string()));
    }
    if let Some((_, fraction)) = value.split_once('.') {
        if fraction.len() > MAX_ORDER_DECIMALS {
            return Err(ManualOrderError::TooManyDecimals {
                max: MAX_ORDER_DECIMALS,
            });
        }
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ManualOrderError::NotANumber(value.to_string()))
}

// ---------------------------------------------------------------------------
// SessionItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SessionItem {
    pub action: TriggerAction,
    /// Last valid manual entry. `None` until the user types a value.
    pub manual_order: Option<String>,
}

impl SessionItem {
    fn new(action: TriggerAction) -> Self {
        Self {
            action,
            manual_order: None,
        }
    }

    /// Manual value if one was entered, otherwise the stored order.
    pub fn effective_order(&self) -> f64 {
        self.manual_order
            .as_deref()
            .and_then(|raw| parse_order_input(raw).ok().flatten())
            .unwrap_or(self.action.order)
    }

    /// Text shown in the manual order field.
    pub fn manual_display(&self) -> String {
        self.manual_order
            .clone()
            .unwrap_or_else(|| format_order(self.action.order))
    }
}

// ---------------------------------------------------------------------------
// OrderEditSession
// ---------------------------------------------------------------------------

/// Draft reordering of one section's action list.
///
/// Works on a copy of the partitioned list; nothing here touches the
/// canonical collections. First/last affordances are derived from the
/// current item positions on every read.
#[derive(Debug, Clone)]
pub struct OrderEditSession {
    section: Section,
    mode: OrderMode,
    items: Vec<SessionItem>,
    snapshot: Vec<TriggerAction>,
    field_errors: HashMap<String, ManualOrderError>,
}

impl OrderEditSession {
    /// Open a session in positional mode over `actions`.
    pub fn begin(section: Section, actions: &[TriggerAction]) -> Self {
        Self {
            section,
            mode: OrderMode::Positional,
            items: actions.iter().cloned().map(SessionItem::new).collect(),
            snapshot: actions.to_vec(),
            field_errors: HashMap::new(),
        }
    }

    /// Reopen a session whose working list differs from its snapshot, as
    /// after a failed deployment of `working`.
    pub fn resume(
        section: Section,
        mode: OrderMode,
        working: Vec<TriggerAction>,
        snapshot: Vec<TriggerAction>,
    ) -> Self {
        let items = working
            .into_iter()
            .map(|action| {
                let manual_order = match mode {
                    OrderMode::Manual => Some(format_order(action.order)),
                    OrderMode::Positional => None,
                };
                SessionItem {
                    action,
                    manual_order,
                }
            })
            .collect();
        Self {
            section,
            mode,
            items,
            snapshot,
            field_errors: HashMap::new(),
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn mode(&self) -> OrderMode {
        self.mode
    }

    /// Switch strategies. Moves and manual entries made so far are kept.
    pub fn set_mode(&mut self, mode: OrderMode) {
        if self.mode != mode {
            tracing::debug!(section = %self.section, %mode, "order edit mode changed");
            self.mode = mode;
        }
    }

    pub fn toggle_mode(&mut self) {
        let next = match self.mode {
            OrderMode::Positional => OrderMode::Manual,
            OrderMode::Manual => OrderMode::Positional,
        };
        self.set_mode(next);
    }

    pub fn items(&self) -> &[SessionItem] {
        &self.items
    }

    pub fn snapshot(&self) -> &[TriggerAction] {
        &self.snapshot
    }

    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.action.id.as_str()).collect()
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.items
            .iter()
            .position(|i| i.action.id == id)
            .ok_or_else(|| TriggerError::ActionNotFound(id.to_string()))
    }

    pub fn is_first(&self, id: &str) -> bool {
        self.items.first().is_some_and(|i| i.action.id == id)
    }

    pub fn is_last(&self, id: &str) -> bool {
        self.items.last().is_some_and(|i| i.action.id == id)
    }

    pub fn can_move(&self, id: &str, direction: Direction) -> bool {
        match direction {
            Direction::Up => !self.is_first(id),
            Direction::Down => !self.is_last(id),
        }
    }

    // -----------------------------------------------------------------------
    // Positional mode
    // -----------------------------------------------------------------------

    /// Swap `id` with its neighbour. Returns `false` when nothing moved
    /// (edge of the list, or not in positional mode).
    pub fn move_action(&mut self, id: &str, direction: Direction) -> Result<bool> {
        let from = self.position(id)?;
        if self.mode != OrderMode::Positional || !self.can_move(id, direction) {
            return Ok(false);
        }
        let to = match direction {
            Direction::Up => from - 1,
            Direction::Down => from + 1,
        };
        self.items.swap(from, to);
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Manual mode
    // -----------------------------------------------------------------------

    /// Live keystroke handler. Invalid input records a field error and
    /// leaves the previous valid value in place.
    pub fn edit_manual(&mut self, id: &str, raw: &str) -> Result<()> {
        let idx = self.position(id)?;
        self.accept_manual(idx, raw)
    }

    /// Focus-loss handler: accepts the value like [`Self::edit_manual`], then
    /// re-sorts the whole working list by effective order.
    pub fn blur_manual(&mut self, id: &str, raw: &str) -> Result<()> {
        let idx = self.position(id)?;
        self.accept_manual(idx, raw)?;
        self.sort_by_effective_order();
        Ok(())
    }

    fn accept_manual(&mut self, idx: usize, raw: &str) -> Result<()> {
        let id = self.items[idx].action.id.clone();
        match parse_order_input(raw) {
            Ok(parsed) => {
                self.items[idx].manual_order = parsed.map(|_| raw.trim().to_string());
                self.field_errors.remove(&id);
                Ok(())
            }
            Err(e) => {
                tracing::debug!(action = %id, error = %e, "manual order input rejected");
                self.field_errors.insert(id, e.clone());
                Err(e.into())
            }
        }
    }

    fn sort_by_effective_order(&mut self) {
        self.items
            .sort_by(|a, b| a.effective_order().total_cmp(&b.effective_order()));
    }

    pub fn field_error(&self, id: &str) -> Option<&ManualOrderError> {
        self.field_errors.get(id)
    }

    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty()
    }

    // -----------------------------------------------------------------------
    // Terminal transitions
    // -----------------------------------------------------------------------

    /// Final ordering with order values assigned for the current mode.
    ///
    /// Positional mode numbers items 1..=N in visual order. Manual mode
    /// uses each entered value, or the stored order for untouched items.
    /// Fails while any manual field holds a validation error.
    pub fn commit(&self) -> Result<Vec<TriggerAction>> {
        if let Some((id, e)) = self.field_errors.iter().next() {
            return Err(TriggerError::Validation(format!("{id}: {e}")));
        }
        let mut out: Vec<TriggerAction> = match self.mode {
            OrderMode::Positional => self
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let mut a = item.action.clone();
                    a.order = (i + 1) as f64;
                    a
                })
                .collect(),
            OrderMode::Manual => self
                .items
                .iter()
                .map(|item| {
                    let mut a = item.action.clone();
                    a.order = item.effective_order();
                    a
                })
                .collect(),
        };
        if self.mode == OrderMode::Manual {
            out.sort_by(|a, b| a.order.total_cmp(&b.order));
        }
        tracing::debug!(section = %self.section, mode = %self.mode, count = out.len(), "order edit committed");
        Ok(out)
    }

    /// Discard every edit and hand back the pre-edit list verbatim.
    pub fn cancel(self) -> Vec<TriggerAction> {
        tracing::debug!(section = %self.section, "order edit cancelled");
        self.snapshot
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
