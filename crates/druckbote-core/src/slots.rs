// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded counting slot set.
//
// Wraps a tokio semaphore so that workers get RAII permits while observers
// can read how many slots are currently held.  Used for the global payload
// download budget and for each printer's queue budget.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A fixed-capacity set of slots with an observable holder count.
///
/// Cloning is cheap; clones share the same underlying slots.
#[derive(Debug, Clone)]
pub struct JobSlots {
    capacity: usize,
    permits: Arc<Semaphore>,
}

impl JobSlots {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            permits: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Wait for a free slot.  The slot is returned when the permit drops.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .expect("slot semaphore closed")
    }

    /// Number of slots currently held.
    pub fn in_use(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn permits_track_holder_count() {
        let slots = JobSlots::new(3);
        assert_eq!(slots.in_use(), 0);

        let first = slots.acquire().await;
        let second = slots.acquire().await;
        assert_eq!(slots.in_use(), 2);

        drop(first);
        assert_eq!(slots.in_use(), 1);
        drop(second);
        assert_eq!(slots.in_use(), 0);
    }

    #[tokio::test]
    async fn acquire_blocks_at_capacity() {
        let slots = JobSlots::new(1);
        let held = slots.acquire().await;

        let blocked =
            tokio::time::timeout(Duration::from_millis(20), slots.acquire()).await;
        assert!(blocked.is_err(), "second acquire should wait");

        drop(held);
        let granted =
            tokio::time::timeout(Duration::from_millis(200), slots.acquire()).await;
        assert!(granted.is_ok(), "freed slot should be grantable");
    }

    #[tokio::test]
    async fn clones_share_the_same_budget() {
        let slots = JobSlots::new(2);
        let twin = slots.clone();

        let _held = slots.acquire().await;
        assert_eq!(twin.in_use(), 1);
        assert_eq!(twin.capacity(), 2);
    }
}
