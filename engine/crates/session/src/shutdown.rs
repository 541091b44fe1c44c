use tokio::sync::watch;

/// Sender side. Held by whoever may end the subsystem.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<bool>);

/// Receiver side. Cloned to each task that must stop.
#[derive(Debug, Clone)]
pub struct ShutdownRx(watch::Receiver<bool>);

/// Create a shutdown channel pair.
pub fn shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTx(tx), ShutdownRx(rx))
}

impl ShutdownTx {
    /// Signal all receivers to shut down.
    pub fn trigger(&self) {
        let _ = self.0.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// A new receiver observing this sender.
    pub fn subscribe(&self) -> ShutdownRx {
        ShutdownRx(self.0.subscribe())
    }
}

impl ShutdownRx {
    /// Async wait until shutdown is signaled. Returns immediately if the
    /// sender is gone.
    pub async fn wait(&mut self) {
        while !*self.0.borrow() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }

    /// Non-blocking check.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }
}
