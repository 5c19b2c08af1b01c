//! Token de cancelación compartido por secuenciadores, workers y reporter.

use std::sync::Arc;
use tokio::sync::watch;

/// Cancelar es idempotente y visible para todos los clones.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx),
               rx }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Se completa cuando alguien llama a `cancel`.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // Cada clon conserva el sender: el canal no puede cerrarse mientras se espera.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
