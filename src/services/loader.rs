use crate::services::fetch::UserSource;
use crate::state::{StateChange, StateManager};
use std::time::Instant;

/// Run one fetch against `source` and fold the outcome into `state`.
///
/// Marks the state as loading, awaits the source, records timing, then hands
/// the result to [`StateManager::finish_load`]. A failed fetch is not retried.
///
/// Returns no changes, and never calls the source, when another fetch is
/// still running.
pub async fn load_records<S>(source: &S, state: &StateManager) -> Vec<StateChange>
where
    S: UserSource + ?Sized,
{
    let Some(mut changes) = state.try_begin_load() else {
        tracing::info!("Skipping fetch from {}, one is already running", source.describe());
        return Vec::new();
    };

    tracing::info!("Fetching users from {}", source.describe());

    let started = Instant::now();
    let result = source.fetch_users().await;
    let elapsed = started.elapsed();

    state.metrics().record_fetch(elapsed, result.is_ok());
    tracing::debug!("Fetch finished in {:?}", elapsed);

    changes.extend(state.finish_load(result));
    changes
}
