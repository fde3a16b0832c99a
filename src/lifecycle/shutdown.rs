//! Graceful stop for running servers.
//!
//! Every `HttpServer::run` holds one receiver; `trigger` asks all of them to
//! stop accepting connections and drain the ones in flight.

use tokio::sync::broadcast;

/// Stop handle shared between the signal task and the servers it controls.
#[derive(Debug, Clone)]
pub struct Shutdown {
    notify: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self { notify }
    }

    /// A receiver to hand to `HttpServer::run`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify.subscribe()
    }

    /// Ask every subscribed server to stop. Returns how many were notified.
    pub fn trigger(&self) -> usize {
        let notified = self.notify.send(()).unwrap_or(0);
        tracing::debug!(servers = notified, "Shutdown triggered");
        notified
    }

    /// Servers still holding a receiver.
    pub fn active_servers(&self) -> usize {
        self.notify.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
