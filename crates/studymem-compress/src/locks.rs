use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use studymem_core::Module;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// One async mutex per (student, module), created on first use.
///
/// Entries nobody holds or waits on are pruned on the next acquire, so the
/// table only grows with concurrent work, not with every student seen.
#[derive(Debug, Default)]
pub struct LockTable {
    locks: Mutex<HashMap<(String, Module), Arc<AsyncMutex<()>>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a student's module memory
    pub async fn acquire(&self, student_id: &str, module: Module) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = match self.locks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry((student_id.to_string(), module))
                .or_default()
                .clone()
        };
        let guard = lock.lock_owned().await;
        debug!(student_id, %module, "acquired memory lock");
        guard
    }

    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
