// EventLoopBridge - Coordinates between the tokio runtime and the Slint event loop
//
// Slint owns the main thread and is single-threaded; the startup fetch runs on
// tokio. The bridge lets callbacks spawn async work and lets that work queue
// UI updates back onto the Slint thread.

use crate::metrics::Metrics;
use slint::ComponentHandle;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

type UiUpdate<T> = Box<dyn FnOnce(&T) + Send>;

/// Capacity of the pending UI update queue.
const UI_UPDATE_CAPACITY: usize = 100;

/// Coordinates between tokio async runtime and Slint event loop
///
/// Owns the background thread that forwards queued updates with
/// `upgrade_in_event_loop`. Callbacks get cheap clones through
/// [`clone_handle`](Self::clone_handle) and do their work on those.
pub struct EventLoopBridge<T: ComponentHandle> {
    handle: EventLoopBridgeHandle<T>,
}

impl<T: ComponentHandle + 'static> EventLoopBridge<T> {
    /// Create a new EventLoopBridge and start its forwarding thread
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle, metrics: Arc<Metrics>) -> Self {
        let (ui_update_tx, mut ui_update_rx) = mpsc::channel::<UiUpdate<T>>(UI_UPDATE_CAPACITY);

        let ui_weak = ui.as_weak();
        let spawned = std::thread::Builder::new()
            .name("usertable-ui-bridge".to_string())
            .spawn(move || {
                tracing::debug!("EventLoopBridge handler thread started");

                while let Some(update_fn) = ui_update_rx.blocking_recv() {
                    let result = ui_weak.upgrade_in_event_loop(move |ui| {
                        update_fn(&ui);
                    });

                    if let Err(e) = result {
                        // Event loop is gone, nothing left to update
                        tracing::warn!("Failed to queue UI update to event loop: {:?}", e);
                        break;
                    }
                }

                tracing::debug!("EventLoopBridge handler thread terminated");
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to start UI bridge thread: {}", e);
        }

        Self {
            handle: EventLoopBridgeHandle {
                tokio_handle,
                ui_update_tx,
                metrics,
            },
        }
    }

    /// Cloneable handle for capture by Slint callbacks
    pub fn clone_handle(&self) -> EventLoopBridgeHandle<T> {
        self.handle.clone()
    }
}

/// Lightweight handle that can be cloned and passed to callbacks
pub struct EventLoopBridgeHandle<T: ComponentHandle> {
    tokio_handle: tokio::runtime::Handle,
    ui_update_tx: mpsc::Sender<UiUpdate<T>>,
    metrics: Arc<Metrics>,
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T: ComponentHandle> Clone for EventLoopBridgeHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tokio_handle: self.tokio_handle.clone(),
            ui_update_tx: self.ui_update_tx.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<T: ComponentHandle + 'static> EventLoopBridgeHandle<T> {
    /// Queue `update` to run on the Slint event loop thread.
    ///
    /// Drops the update (with a warning) when the queue is full or the
    /// forwarding thread has stopped.
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        match self.ui_update_tx.try_send(Box::new(update)) {
            Ok(_) => self.metrics.record_ui_update(),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.record_ui_channel_full();
                tracing::warn!("UI update channel full - skipping update to prevent backpressure");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Failed to send UI update - handler thread has stopped");
            }
        }
    }

    /// Spawn an async task on the tokio runtime
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        });
    }
}
