//! Domain Event Channel
//!
//! The coordinator publishes domain events (e.g. a fresh plugin list) on an
//! unbounded channel so the owner of the plugin state can pick them up.

use tokio::sync::mpsc;
use tracing::debug;

use super::types::{AttemptId, SitePlugins, SiteRef};

#[derive(Debug, Clone)]
pub enum TransferEvent {
    /// The plugin list of `site` was fetched after a completed transfer
    PluginsReceived { site: SiteRef, plugins: SitePlugins },
    /// An attempt reached a terminal phase
    Finished { attempt_id: AttemptId, succeeded: bool },
}

/// Sender side (held by the coordinator)
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<TransferEvent>,
}

impl EventSender {
    /// Publish an event. A dropped receiver is not an error: nobody is
    /// interested any more.
    pub fn dispatch(&self, event: TransferEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!(event = ?e.0, "Event receiver dropped");
        }
    }
}

/// Receiver side (held by whoever owns plugin state)
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<TransferEvent>,
}

impl EventReceiver {
    pub fn try_recv(&mut self) -> Option<TransferEvent> {
        self.rx.try_recv().ok()
    }

    pub async fn recv(&mut self) -> Option<TransferEvent> {
        self.rx.recv().await
    }
}

/// Create a new event channel pair
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}
