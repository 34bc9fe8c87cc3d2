//! Process-wide shutdown signal
//!
//! Observed by the producer, every stream session and the HTTP server. Sessions
//! must observe it: their bodies never end on their own, so graceful shutdown
//! would otherwise wait on them forever.

use std::sync::Arc;

use tokio::sync::watch;

/// Shutdown trigger, cheap to clone
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Create an untriggered signal
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Signal shutdown to every listener (idempotent)
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Whether shutdown has been signalled
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Create a listener for this signal
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`]
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Whether shutdown has been signalled
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until shutdown is signalled
    ///
    /// Returns immediately if it already was. Never returns once every
    /// [`Shutdown`] handle has been dropped untriggered.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|triggered| *triggered).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_trigger_wakes_listener() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.listener();
        assert!(!listener.is_triggered());

        let waiter = tokio::spawn(async move {
            listener.wait().await;
        });

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_late_listener_sees_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();

        let mut listener = shutdown.listener();
        assert!(listener.is_triggered());
        listener.wait().await;
    }

    #[tokio::test]
    async fn test_dropped_trigger_never_fires() {
        let mut listener = Shutdown::new().listener();

        let result = tokio::time::timeout(Duration::from_millis(20), listener.wait()).await;
        assert!(result.is_err());
        assert!(!listener.is_triggered());
    }
}
