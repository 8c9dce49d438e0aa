//! UserTable - desktop table of remote user records
//!
//! Main entry point for the GUI application.
//!
//! # Execution Flow
//!
//! 1. Load `UserTable Data/UserTable Config.yaml` (plus `USERTABLE_*` overrides)
//! 2. Initialize logging → `<log dir>/usertable.<date>`
//! 3. Create tokio runtime for the startup fetch
//! 4. Create StateManager and the HTTP user source
//! 5. Create GuiController (wires Slint UI to state, starts the fetch)
//! 6. Run Slint event loop (blocks until window closed)
//! 7. Log session metrics and shut the runtime down

use anyhow::Result;
use camino::Utf8PathBuf;
use std::sync::Arc;
use std::time::Duration;
use usertable::services::{HttpUserSource, UserSource};
use usertable::ui::GuiController;
use usertable::{APP_NAME, ConfigManager, Metrics, StateManager, VERSION};

/// Directory holding the YAML configuration
const CONFIG_DIR: &str = "UserTable Data";

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(CONFIG_DIR)?;
    let user_config = config_manager.load_user_config()?;
    let settings = user_config.settings;

    // Held until exit so buffered log lines are flushed
    let _log_guard = usertable::logging::setup_logging_with_console(
        &Utf8PathBuf::from(&settings.log_directory),
        settings.debug_mode,
        settings.debug_mode,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!(
        "Settings: endpoint={}, timeout={}s, debug={}",
        settings.endpoint,
        settings.request_timeout,
        settings.debug_mode
    );

    // A single background fetch is all the async work there is
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("usertable-worker")
        .build()?;

    let metrics = Arc::new(Metrics::new());
    let state_manager = Arc::new(StateManager::with_metrics(Arc::clone(&metrics)));

    let source: Arc<dyn UserSource> = Arc::new(HttpUserSource::new(
        settings.endpoint.clone(),
        settings.request_timeout(),
    )?);

    let gui_controller =
        GuiController::new(Arc::clone(&state_manager), source, runtime.handle().clone())?;

    tracing::info!("GUI controller initialized, launching window");

    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");
    metrics.log_summary();

    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
