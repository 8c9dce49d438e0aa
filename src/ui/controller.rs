// GUI Controller - Bridges the Slint UI with the table state
//
// This module contains the GuiController which coordinates between:
// - Slint UI (MainWindow)
// - StateManager (records, search, sort, inline editor)
// - UserSource (the startup fetch)
// - EventLoopBridge (async/GUI coordination)
//
// Search, sort and edit callbacks run on the Slint thread and re-render
// synchronously. Only the fetch runs on tokio; its completion reaches the UI
// through the state subscription and the bridge.

use crate::models::{AppState, EditField, LoadStatus, Record, RecordId};
use crate::services::{UserSource, load_records};
use crate::state::{StateChange, StateManager};
use crate::ui::bridge::{EventLoopBridge, EventLoopBridgeHandle};
use anyhow::{Context, Result};
use slint::{ModelRc, VecModel};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

// Include the generated Slint code
slint::include_modules!();

/// GUI Controller that wires up the Slint UI with application state
///
/// # Example
/// ```ignore
/// let state_manager = Arc::new(StateManager::new());
/// let source: Arc<dyn UserSource> = Arc::new(HttpUserSource::new(endpoint, timeout)?);
/// let runtime = tokio::runtime::Runtime::new()?;
///
/// let controller = GuiController::new(state_manager, source, runtime.handle().clone())?;
/// controller.run()?;  // Blocks until window is closed
/// ```
pub struct GuiController {
    ui: MainWindow,

    _bridge: EventLoopBridge<MainWindow>,

    state_manager: Arc<StateManager>,
}

impl GuiController {
    /// Create the window, wire callbacks, and start the initial fetch
    pub fn new(
        state_manager: Arc<StateManager>,
        source: Arc<dyn UserSource>,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;

        let bridge = EventLoopBridge::new(&ui, tokio_handle, Arc::clone(state_manager.metrics()));

        Self::render(&ui, &state_manager);
        Self::setup_callbacks(&ui, &bridge, &state_manager, &source);
        Self::setup_state_subscription(&bridge, &state_manager);

        // Subscription is live, so the fetch outcome can't be missed
        Self::spawn_load(&bridge.clone_handle(), &state_manager, &source);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
            state_manager,
        })
    }

    /// Run the GUI (blocks until window is closed)
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        let result = self.ui.run();

        let open_edit = self.state_manager.read(|s| s.edit.active_id());
        if let Some(id) = open_edit {
            tracing::info!("Window closed with unsaved edit on record {}, discarding", id);
        }

        result
    }

    /// Push the current state into the window
    ///
    /// Rebuilds the row model from the derived view and refreshes the header,
    /// status and draft properties.
    fn render(ui: &MainWindow, state_manager: &StateManager) {
        state_manager.read(|state| {
            let rows = Self::build_rows(state);
            let visible = rows.len();

            ui.set_rows(ModelRc::new(VecModel::from(rows)));
            ui.set_load_phase(Self::load_phase(&state.load_status));
            ui.set_status_message(state.status_message(visible).into());
            ui.set_sort_key(state.sort.key.clone().unwrap_or_default().into());
            ui.set_sort_ascending(state.sort.direction.is_ascending());

            if let Some(draft) = state.edit.draft() {
                ui.set_draft_name(draft.name.as_str().into());
                ui.set_draft_email(draft.email.as_str().into());
            }
        });

        state_manager.metrics().record_render();
    }

    fn build_rows(state: &AppState) -> Vec<UserRow> {
        state
            .derived_view()
            .into_iter()
            .map(|record| Self::to_row(record, state.is_editing(record.id)))
            .collect()
    }

    fn to_row(record: &Record, editing: bool) -> UserRow {
        UserRow {
            id: record.id.to_string().into(),
            name: record.name.as_str().into(),
            email: record.email.as_str().into(),
            editing,
        }
    }

    fn load_phase(status: &LoadStatus) -> LoadPhase {
        match status {
            LoadStatus::Loading => LoadPhase::Loading,
            LoadStatus::Loaded => LoadPhase::Loaded,
            LoadStatus::Failed(_) => LoadPhase::Failed,
        }
    }

    /// Run one fetch on the tokio runtime
    fn spawn_load(
        bridge: &EventLoopBridgeHandle<MainWindow>,
        state_manager: &Arc<StateManager>,
        source: &Arc<dyn UserSource>,
    ) {
        let state = Arc::clone(state_manager);
        let source = Arc::clone(source);

        bridge.spawn_async(move || async move {
            load_records(source.as_ref(), &state).await;
        });
    }

    /// Set up Slint UI callbacks
    fn setup_callbacks(
        ui: &MainWindow,
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        source: &Arc<dyn UserSource>,
    ) {
        let state = Arc::clone(state_manager);
        let ui_weak = ui.as_weak();

        ui.on_search_edited(move |text| {
            tracing::trace!("Search text: {:?}", text.as_str());
            state.set_search_text(text.as_str());

            if let Some(ui) = ui_weak.upgrade() {
                Self::render(&ui, &state);
            }
        });

        let state = Arc::clone(state_manager);
        let ui_weak = ui.as_weak();

        ui.on_sort_requested(move |key| {
            tracing::debug!("Header clicked: {}", key);
            state.sort_by(key.as_str());

            if let Some(ui) = ui_weak.upgrade() {
                Self::render(&ui, &state);
            }
        });

        let state = Arc::clone(state_manager);
        let ui_weak = ui.as_weak();

        ui.on_edit_requested(move |id| {
            let id: RecordId = match id.parse() {
                Ok(id) => id,
                Err(e) => {
                    tracing::error!("Edit requested with malformed id {:?}: {}", id.as_str(), e);
                    return;
                }
            };

            match state.begin_edit(id) {
                Ok(_) => {
                    if let Some(ui) = ui_weak.upgrade() {
                        Self::render(&ui, &state);
                    }
                }
                Err(e) => tracing::warn!("Cannot edit: {}", e),
            }
        });

        // Draft edits don't change the derived view. Skipping the row rebuild
        // keeps focus in the field being typed into.
        let state = Arc::clone(state_manager);
        let ui_weak = ui.as_weak();

        ui.on_draft_name_edited(move |value| {
            state.change_draft(EditField::Name, value.as_str());
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_draft_name(value);
            }
        });

        let state = Arc::clone(state_manager);
        let ui_weak = ui.as_weak();

        ui.on_draft_email_edited(move |value| {
            state.change_draft(EditField::Email, value.as_str());
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_draft_email(value);
            }
        });

        let state = Arc::clone(state_manager);
        let ui_weak = ui.as_weak();

        ui.on_save_requested(move || {
            state.save_edit();
            if let Some(ui) = ui_weak.upgrade() {
                Self::render(&ui, &state);
            }
        });

        let state = Arc::clone(state_manager);
        let ui_weak = ui.as_weak();

        ui.on_cancel_requested(move || {
            state.cancel_edit();
            if let Some(ui) = ui_weak.upgrade() {
                Self::render(&ui, &state);
            }
        });

        let bridge_handle = bridge.clone_handle();
        let state = Arc::clone(state_manager);
        let source = Arc::clone(source);

        ui.on_reload_requested(move || {
            if state.is_fetch_in_flight() {
                tracing::debug!("Retry ignored, a fetch is already running");
                return;
            }

            tracing::info!("Retry requested");
            Self::spawn_load(&bridge_handle, &state, &source);
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Re-render when the background fetch changes the store
    ///
    /// Spawns a thread that listens for load events and queues a render on
    /// the Slint event loop through the bridge. Events caused by UI callbacks
    /// are ignored here because those callbacks already rendered.
    fn setup_state_subscription(
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
    ) {
        let bridge_handle = bridge.clone_handle();
        let rx = state_manager.subscribe();
        let state = Arc::downgrade(state_manager);

        let spawned = std::thread::Builder::new()
            .name("usertable-state-sub".to_string())
            .spawn(move || {
                forward_renders(rx, state, |state| {
                    bridge_handle.update_ui(move |ui| Self::render(ui, &state));
                });
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to start state subscription thread: {}", e);
        }
    }

    fn needs_async_render(change: &StateChange) -> bool {
        matches!(
            change,
            StateChange::LoadStatusChanged { .. } | StateChange::RecordsReplaced { .. }
        )
    }
}

/// Call `render` for every change the GUI must redraw for, until the
/// channel closes or the state manager is gone.
///
/// Only a weak reference is held, so this never keeps the broadcast sender
/// (owned by the manager) alive by itself.
fn forward_renders<F>(
    mut rx: broadcast::Receiver<StateChange>,
    state: Weak<StateManager>,
    mut render: F,
) where
    F: FnMut(Arc<StateManager>),
{
    tracing::debug!("State subscription thread started");

    loop {
        let wanted = match rx.blocking_recv() {
            Ok(change) => {
                tracing::trace!("State change received: {:?}", change);
                GuiController::needs_async_render(&change)
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("State subscription lagged, {} events skipped", skipped);
                true
            }
            Err(RecvError::Closed) => break,
        };

        if wanted {
            match state.upgrade() {
                Some(state) => render(state),
                None => break,
            }
        }
    }

    tracing::debug!("State subscription thread terminated");
}
