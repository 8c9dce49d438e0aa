//! Data models for the UserTable application.
//!
//! - [`Record`]: one fetched user, with passthrough of fields the table does not show
//! - [`AppState`]: the single state owner (records, load status, search, sort, editor)
//!   together with its transition methods
//! - [`UserConfig`]: endpoint and logging settings loaded from `UserTable Config.yaml`
//!
//! State updates go through [`StateManager`](crate::state::StateManager) so every
//! transition is observed and broadcast.

pub mod app_state;
pub mod config;
pub mod record;

pub use app_state::{
    AppState, Draft, EditField, EditState, LoadStatus, SortConfig, SortDirection, TableError,
};
pub use config::{DEFAULT_ENDPOINT, TableSettings, UserConfig};
pub use record::{FIELD_EMAIL, FIELD_ID, FIELD_NAME, FieldValue, Record, RecordId};
