// UserTable - searchable, sortable, inline-editable table of remote user records
//
// This is the library crate containing state management, the derived-view
// pipeline and the fetch service. The binary crate (main.rs) provides the GUI
// entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::Metrics;
pub use models::{AppState, EditField, EditState, LoadStatus, Record, SortConfig, SortDirection, UserConfig};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
