//! Services module - framework-agnostic logic behind the table.
//!
//! Nothing in here knows about Slint, so every piece is testable on its own.
//!
//! # Components
//!
//! - [`view`]: the derived-view pipeline. Sorts the record list by the active
//!   [`SortConfig`](crate::models::SortConfig) (string or numeric comparison
//!   chosen from the field's runtime type), then filters by name.
//! - [`UserSource`] / [`HttpUserSource`]: where records come from. The HTTP
//!   source issues one GET and decodes a JSON array, mapping timeouts, bad
//!   status codes and malformed bodies to [`FetchError`].
//! - [`load_records`]: drives one fetch through the
//!   [`StateManager`](crate::state::StateManager) load transitions.
//!
//! # Usage Example
//!
//! ```ignore
//! use usertable::services::{HttpUserSource, load_records};
//!
//! let source = HttpUserSource::new(settings.endpoint.clone(), settings.request_timeout())?;
//! load_records(&source, &state_manager).await;
//! let rows = state_manager.visible_records();
//! ```

pub mod fetch;
pub mod loader;
pub mod view;

pub use fetch::{FetchError, HttpUserSource, UserSource};
pub use loader::load_records;
pub use view::{derive_view, filter_records, locale_compare, sort_records};
