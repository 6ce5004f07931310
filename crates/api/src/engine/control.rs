//! Shared handle between the HTTP layer and the job processor.

use std::collections::HashMap;

use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use torrentforge_core::types::TaskId;

/// Wake-up signal plus the cancellation tokens of builds in flight.
///
/// Each build gets its own slot, so a task retried while its previous build
/// is still stopping has two independent entries.
#[derive(Default)]
pub struct JobControl {
    wake: Notify,
    registry: Mutex<Registry>,
}

#[derive(Default)]
struct Registry {
    next_slot: u64,
    slots: HashMap<u64, Slot>,
}

struct Slot {
    task_id: TaskId,
    token: CancellationToken,
}

/// Handle of one registered build, returned to the worker that runs it.
pub(crate) struct Registration {
    pub(crate) token: CancellationToken,
    slot: u64,
}

impl JobControl {
    /// Ask the processor to look for work now instead of at its next tick.
    ///
    /// A wake-up sent while the processor is busy is remembered.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    pub(crate) async fn woken(&self) {
        self.wake.notified().await;
    }

    /// Register a build of `id` as in flight.
    pub(crate) async fn register(&self, id: &str) -> Registration {
        let token = CancellationToken::new();
        let mut registry = self.registry.lock().await;
        let slot = registry.next_slot;
        registry.next_slot += 1;
        registry.slots.insert(
            slot,
            Slot {
                task_id: id.to_string(),
                token: token.clone(),
            },
        );
        Registration { token, slot }
    }

    /// Release exactly the slot taken by `registration`.
    pub(crate) async fn unregister(&self, registration: Registration) {
        self.registry.lock().await.slots.remove(&registration.slot);
    }

    /// Abort every build of the task still running. Returns whether one was found.
    pub async fn cancel(&self, id: &str) -> bool {
        let registry = self.registry.lock().await;
        let mut found = false;
        for slot in registry.slots.values().filter(|s| s.task_id == id) {
            slot.token.cancel();
            found = true;
        }
        found
    }

    /// Abort every running build.
    pub async fn cancel_all(&self) -> usize {
        let registry = self.registry.lock().await;
        for slot in registry.slots.values() {
            slot.token.cancel();
        }
        registry.slots.len()
    }

    /// Whether a build of `id` has not returned yet.
    pub async fn is_in_flight(&self, id: &str) -> bool {
        self.registry
            .lock()
            .await
            .slots
            .values()
            .any(|s| s.task_id == id)
    }

    pub async fn in_flight(&self) -> usize {
        self.registry.lock().await.slots.len()
    }
}
