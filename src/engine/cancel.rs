use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

/// Registry of cancellation tokens, one broadcast channel per run id.
#[derive(Clone)]
pub struct CancelRegistry {
    senders: Arc<Mutex<HashMap<String, broadcast::Sender<()>>>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self {
            senders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn register(&self, id: &str) -> broadcast::Receiver<()> {
        let (tx, rx) = broadcast::channel(1);
        self.senders.lock().unwrap().insert(id.to_string(), tx);
        rx
    }

    pub fn cancel(&self, id: &str) -> bool {
        if let Some(tx) = self.senders.lock().unwrap().remove(id) {
            let _ = tx.send(());
            return true;
        }
        false
    }

    pub fn remove(&self, id: &str) {
        self.senders.lock().unwrap().remove(id);
    }
}

/// Non-blocking check, honored at the top of each scenario iteration.
pub fn cancel_requested(cancel_rx: &mut broadcast::Receiver<()>) -> bool {
    use tokio::sync::broadcast::error::TryRecvError;

    match cancel_rx.try_recv() {
        Ok(_) => true,
        Err(TryRecvError::Lagged(_)) => true,
        Err(TryRecvError::Closed) => true,
        Err(TryRecvError::Empty) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_fires_registered_receiver() {
        let registry = CancelRegistry::new();
        let mut rx = registry.register("run-1");
        assert!(!cancel_requested(&mut rx));
        assert!(registry.cancel("run-1"));
        assert!(cancel_requested(&mut rx));
    }

    #[test]
    fn cancel_unknown_id_is_a_noop() {
        let registry = CancelRegistry::new();
        assert!(!registry.cancel("missing"));
    }

    #[test]
    fn remove_discards_the_token() {
        let registry = CancelRegistry::new();
        let _rx = registry.register("run-1");
        registry.remove("run-1");
        assert!(!registry.cancel("run-1"));
    }
}
