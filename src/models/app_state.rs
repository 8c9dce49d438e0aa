use crate::models::record::{FIELD_EMAIL, FIELD_NAME, Record, RecordId};
use crate::services::view;
use std::fmt;
use thiserror::Error;

/// Errors raised by state transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Record {0} not found")]
    RecordNotFound(RecordId),

    #[error("Unknown editable field: {0}")]
    UnknownField(String),
}

/// Outcome of the startup fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Loading,
    Loaded,
    Failed(String),
}

impl LoadStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, LoadStatus::Failed(_))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn is_ascending(self) -> bool {
        self == SortDirection::Ascending
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "ascending"),
            SortDirection::Descending => write!(f, "descending"),
        }
    }
}

/// Active ordering of the table. `key == None` keeps fetch order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortConfig {
    pub key: Option<String>,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn by(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: Some(key.into()),
            direction,
        }
    }

    /// Configuration after the header for `key` is clicked.
    ///
    /// Same key while ascending flips to descending; anything else starts
    /// ascending on `key`. There is no way back to unsorted.
    pub fn clicked(&self, key: &str) -> Self {
        let direction = match (&self.key, self.direction) {
            (Some(current), SortDirection::Ascending) if current == key => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        Self::by(key, direction)
    }
}

/// Fields the inline editor can change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditField {
    Name,
    Email,
}

impl std::str::FromStr for EditField {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            FIELD_NAME => Ok(EditField::Name),
            FIELD_EMAIL => Ok(EditField::Email),
            other => Err(TableError::UnknownField(other.to_string())),
        }
    }
}

/// Uncommitted values for the row being edited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub email: String,
}

impl Draft {
    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
        }
    }

    pub fn set(&mut self, field: EditField, value: String) {
        match field {
            EditField::Name => self.name = value,
            EditField::Email => self.email = value,
        }
    }
}

/// Inline editor state. At most one row is ever being edited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing { id: RecordId, draft: Draft },
}

impl EditState {
    pub fn active_id(&self) -> Option<RecordId> {
        match self {
            EditState::Idle => None,
            EditState::Editing { id, .. } => Some(*id),
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        match self {
            EditState::Idle => None,
            EditState::Editing { draft, .. } => Some(draft),
        }
    }
}

/// Single owner of all table state.
///
/// Mutations go through the transition methods below, which
/// [`StateManager`](crate::state::StateManager) wraps to emit change events.
/// Nothing here touches the network or the UI.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    // Data store
    pub records: Vec<Record>,
    pub load_status: LoadStatus,
    /// Bumped every time `records` is replaced wholesale.
    pub generation: u64,

    // View inputs
    pub search_text: String,
    pub sort: SortConfig,

    // Inline editor
    pub edit: EditState,
}

impl AppState {
    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn is_editing(&self, id: RecordId) -> bool {
        self.edit.active_id() == Some(id)
    }

    /// The filtered and sorted projection that is rendered.
    pub fn derived_view(&self) -> Vec<&Record> {
        view::derive_view(&self.records, &self.sort, &self.search_text)
    }

    /// Replace the record list with a fresh fetch. Any open edit is dropped
    /// because its draft may refer to data that no longer exists.
    pub fn replace_records(&mut self, records: Vec<Record>) {
        self.records = records;
        self.generation += 1;
        self.edit = EditState::Idle;
    }

    pub fn apply_sort_click(&mut self, key: &str) {
        self.sort = self.sort.clicked(key);
    }

    /// Start editing `id`, seeding the draft from the stored record.
    ///
    /// Editing another row switches the target and throws the old draft away.
    /// Re-entering the row already being edited keeps its draft.
    pub fn begin_edit(&mut self, id: RecordId) -> Result<(), TableError> {
        if self.is_editing(id) {
            return Ok(());
        }

        let record = self.record(id).ok_or(TableError::RecordNotFound(id))?;
        self.edit = EditState::Editing {
            id,
            draft: Draft::from_record(record),
        };
        Ok(())
    }

    /// Returns false when nothing is being edited.
    pub fn change_draft(&mut self, field: EditField, value: String) -> bool {
        match &mut self.edit {
            EditState::Idle => false,
            EditState::Editing { draft, .. } => {
                draft.set(field, value);
                true
            }
        }
    }

    /// Commit the draft into the store and return to idle.
    ///
    /// Returns the id that was being edited, or `None` when idle. If the
    /// record disappeared the draft is dropped without touching the store.
    pub fn save_edit(&mut self) -> Option<RecordId> {
        let EditState::Editing { id, draft } = std::mem::take(&mut self.edit) else {
            return None;
        };

        match self.records.iter_mut().find(|r| r.id == id) {
            Some(slot) => *slot = slot.with_contact(draft.name, draft.email),
            None => tracing::warn!("Record {} vanished before save, draft dropped", id),
        }

        Some(id)
    }

    /// Discard the draft. Returns the id that was being edited.
    pub fn cancel_edit(&mut self) -> Option<RecordId> {
        std::mem::take(&mut self.edit).active_id()
    }

    /// One-line description of the table for the status bar.
    pub fn status_message(&self, visible: usize) -> String {
        match &self.load_status {
            LoadStatus::Loading => "Loading users...".to_string(),
            LoadStatus::Failed(reason) => format!("Load failed: {}", reason),
            LoadStatus::Loaded if self.search_text.is_empty() => {
                format!("{} users", self.records.len())
            }
            LoadStatus::Loaded => format!(
                "{} of {} users match \"{}\"",
                visible,
                self.records.len(),
                self.search_text
            ),
        }
    }
}
