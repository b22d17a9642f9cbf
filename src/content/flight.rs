//! In-Flight Fetch Gates
//!
//! Per-key async gates that let one caller fetch a missing key while other
//! callers for the same key wait for it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Gate = Arc<AsyncMutex<()>>;

// == In-Flight Registry ==
/// Registry of keys that currently have a fetch running or queued.
#[derive(Debug, Clone, Default)]
pub(crate) struct InFlight {
    gates: Arc<Mutex<HashMap<String, Gate>>>,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Waits until no other holder owns the gate for `key`, then takes it.
    pub(crate) async fn acquire(&self, key: &str) -> FlightPermit {
        let gate = {
            let mut gates = self.gates.lock();
            gates.entry(key.to_string()).or_default().clone()
        };

        let guard = gate.lock_owned().await;
        FlightPermit {
            gates: Arc::clone(&self.gates),
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys with a gate currently registered.
    pub(crate) fn len(&self) -> usize {
        self.gates.lock().len()
    }
}

// == Flight Permit ==
/// Exclusive right to fetch one key. Dropping it wakes the next waiter and
/// unregisters the gate once nobody else references it.
#[derive(Debug)]
pub(crate) struct FlightPermit {
    gates: Arc<Mutex<HashMap<String, Gate>>>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        // The owned guard carries its own reference to the gate.
        drop(self.guard.take());

        // Waiters clone the gate under this same lock, so the count is exact.
        let mut gates = self.gates.lock();
        if gates
            .get(&self.key)
            .is_some_and(|gate| Arc::strong_count(gate) == 1)
        {
            gates.remove(&self.key);
        }
    }
}
