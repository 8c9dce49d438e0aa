// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for GUI updates.

use crate::metrics::Metrics;
use crate::models::{
    AppState, EditField, EditState, LoadStatus, Record, RecordId, SortDirection, TableError,
};
use crate::services::fetch::FetchError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events are emitted to notify interested parties (primarily the GUI)
/// about state changes without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Fetch started, finished or failed
    LoadStatusChanged { status: LoadStatus },

    /// The record list was replaced by a fetch
    RecordsReplaced { count: usize },

    /// A single record's content changed
    RecordUpdated { id: RecordId },

    SearchChanged { text: String },

    SortChanged {
        key: Option<String>,
        direction: SortDirection,
    },

    /// A row entered edit mode (also emitted when the edit target switches)
    EditStarted { id: RecordId },

    DraftChanged { id: RecordId },

    /// The draft was committed into the store
    EditSaved { id: RecordId },

    /// The draft was thrown away
    EditCancelled { id: RecordId },
}

/// Thread-safe state manager with event emission
///
/// This is the one owner of table state:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Runs the named transitions (search, sort click, edit lifecycle, load)
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// Every transition runs to completion under the write lock, so two UI
/// events can never interleave.
pub struct StateManager {
    state: Arc<RwLock<AppState>>,

    state_tx: broadcast::Sender<StateChange>,

    /// Set from `try_begin_load` until `finish_load`; at most one fetch runs
    fetch_in_flight: Arc<AtomicBool>,

    metrics: Arc<Metrics>,
}

impl StateManager {
    /// Create a new StateManager with default state and its own metrics
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(Metrics::new()))
    }

    /// Create a new StateManager reporting into shared metrics
    pub fn with_metrics(metrics: Arc<Metrics>) -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
            fetch_in_flight: Arc::new(AtomicBool::new(false)),
            metrics,
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a cloned snapshot of the current state
    pub fn snapshot(&self) -> AppState {
        self.read_guard().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let editing = state_manager.read(|state| state.edit.active_id());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        f(&self.read_guard())
    }

    /// Owned copy of the derived view (sorted, then filtered).
    pub fn visible_records(&self) -> Vec<Record> {
        self.read(|s| s.derived_view().into_iter().cloned().collect())
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Update the state and emit change events
    ///
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// Returns the events that were emitted.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        self.update_with(|state| {
            update_fn(state);
            Vec::new()
        })
    }

    /// Like [`update`](Self::update) but the closure may add events that
    /// can't be inferred by diffing (save vs. cancel look the same afterwards).
    fn update_with<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState) -> Vec<StateChange>,
    {
        let mut state = self.write_guard();
        let old_state = state.clone();

        let explicit = update_fn(&mut state);

        let mut changes = self.detect_changes(&old_state, &state);
        changes.extend(explicit);
        drop(state);

        self.metrics.record_state_update();
        for change in &changes {
            // No subscribers is fine
            if self.state_tx.send(change.clone()).is_ok() {
                self.metrics.record_state_broadcast();
            }
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(&self, old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.load_status != new.load_status {
            changes.push(StateChange::LoadStatusChanged {
                status: new.load_status.clone(),
            });
        }

        if old.generation != new.generation {
            changes.push(StateChange::RecordsReplaced {
                count: new.records.len(),
            });
        } else if old.records != new.records {
            for record in &new.records {
                if old.record(record.id) != Some(record) {
                    changes.push(StateChange::RecordUpdated { id: record.id });
                }
            }
        }

        if old.search_text != new.search_text {
            changes.push(StateChange::SearchChanged {
                text: new.search_text.clone(),
            });
        }

        if old.sort != new.sort {
            changes.push(StateChange::SortChanged {
                key: new.sort.key.clone(),
                direction: new.sort.direction,
            });
        }

        // Entering/leaving edit mode on save or cancel is reported explicitly
        if let EditState::Editing { id, draft } = &new.edit {
            match &old.edit {
                EditState::Editing {
                    id: old_id,
                    draft: old_draft,
                } if old_id == id => {
                    if old_draft != draft {
                        changes.push(StateChange::DraftChanged { id: *id });
                    }
                }
                _ => changes.push(StateChange::EditStarted { id: *id }),
            }
        }

        changes
    }

    // Transitions

    /// Claim the fetch slot and mark the state as loading
    ///
    /// Returns `None` without touching the state when a fetch is already
    /// running. The slot is released by [`finish_load`](Self::finish_load).
    pub fn try_begin_load(&self) -> Option<Vec<StateChange>> {
        if self
            .fetch_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Fetch already in flight, not starting another");
            return None;
        }

        Some(self.update(|state| {
            state.load_status = LoadStatus::Loading;
        }))
    }

    pub fn is_fetch_in_flight(&self) -> bool {
        self.fetch_in_flight.load(Ordering::Acquire)
    }

    /// Apply the outcome of a fetch and release the fetch slot
    ///
    /// Success replaces the record list wholesale (closing any open edit).
    /// Failure keeps whatever records were there and records the reason.
    pub fn finish_load(&self, result: Result<Vec<Record>, FetchError>) -> Vec<StateChange> {
        let changes = self.update_with(|state| {
            let mut explicit = Vec::new();

            match result {
                Ok(records) => {
                    tracing::info!("Loaded {} records", records.len());
                    if let Some(id) = state.edit.active_id() {
                        tracing::info!("Reload discarded open edit on record {}", id);
                        explicit.push(StateChange::EditCancelled { id });
                    }
                    state.replace_records(records);
                    state.load_status = LoadStatus::Loaded;
                }
                Err(e) => {
                    tracing::error!("Failed to load records: {}", e);
                    state.load_status = LoadStatus::Failed(e.to_string());
                }
            }

            explicit
        });

        self.fetch_in_flight.store(false, Ordering::Release);
        changes
    }

    /// Replace the search text
    pub fn set_search_text(&self, text: impl Into<String>) -> Vec<StateChange> {
        let text = text.into();
        self.update(|state| {
            state.search_text = text;
        })
    }

    /// Handle a click on the header for `key`
    pub fn sort_by(&self, key: &str) -> Vec<StateChange> {
        self.update(|state| {
            state.apply_sort_click(key);
            tracing::debug!(
                "Sort set to {:?} {}",
                state.sort.key,
                state.sort.direction
            );
        })
    }

    /// Put the record with `id` into edit mode
    ///
    /// Switching from another row discards that row's draft and reports it
    /// as cancelled.
    pub fn begin_edit(&self, id: RecordId) -> Result<Vec<StateChange>, TableError> {
        let mut outcome = Ok(());
        let changes = self.update_with(|state| {
            let previous = state.edit.active_id();
            outcome = state.begin_edit(id);

            match previous {
                Some(prev) if outcome.is_ok() && prev != id => {
                    tracing::debug!("Edit switched from record {} to {}", prev, id);
                    self.metrics.record_edit_cancelled();
                    vec![StateChange::EditCancelled { id: prev }]
                }
                _ => Vec::new(),
            }
        });

        outcome.map(|()| changes)
    }

    /// Update one field of the draft. No-op while idle.
    pub fn change_draft(&self, field: EditField, value: impl Into<String>) -> Vec<StateChange> {
        let value = value.into();
        self.update(|state| {
            state.change_draft(field, value);
        })
    }

    /// Commit the draft into the store. No-op while idle.
    pub fn save_edit(&self) -> Vec<StateChange> {
        self.update_with(|state| match state.save_edit() {
            Some(id) => {
                tracing::info!("Saved edit on record {}", id);
                self.metrics.record_edit_saved();
                vec![StateChange::EditSaved { id }]
            }
            None => Vec::new(),
        })
    }

    /// Throw the draft away. No-op while idle.
    pub fn cancel_edit(&self) -> Vec<StateChange> {
        self.update_with(|state| match state.cancel_edit() {
            Some(id) => {
                tracing::debug!("Cancelled edit on record {}", id);
                self.metrics.record_edit_cancelled();
                vec![StateChange::EditCancelled { id }]
            }
            None => Vec::new(),
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
            fetch_in_flight: Arc::clone(&self.fetch_in_flight),
            metrics: Arc::clone(&self.metrics),
        }
    }
}
