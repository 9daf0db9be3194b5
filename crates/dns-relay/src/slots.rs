use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// A fixed arena of slots for requests that are currently being forwarded.
///
/// Acquiring waits until one of the `capacity` slots is free, which bounds the number of
/// tasks and upstream sockets alive at any time. Every claim bumps the slot's generation,
/// so a stale guard can never release a slot that has been handed out again.
#[derive(Debug)]
pub struct InFlight {
    permits: Arc<Semaphore>,
    slots: Mutex<Vec<Slot>>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    occupant: Option<Occupant>,
}

#[derive(Debug, Clone, Copy)]
struct Occupant {
    client: SocketAddr,
    started_at: Instant,
}

impl InFlight {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            permits: Arc::new(Semaphore::new(capacity)),
            slots: Mutex::new((0..capacity).map(|_| Slot::default()).collect()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.lock().len()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().iter().filter(|s| s.occupant.is_some()).count()
    }

    /// The client of the oldest request still in flight, and how long it has been running.
    pub fn oldest(&self) -> Option<(SocketAddr, Duration)> {
        self.lock()
            .iter()
            .filter_map(|s| s.occupant)
            .min_by_key(|o| o.started_at)
            .map(|o| (o.client, o.started_at.elapsed()))
    }

    /// Claims a slot for a request from `client`, waiting for one to become free.
    pub async fn acquire(self: &Arc<Self>, client: SocketAddr) -> Result<SlotGuard, AcquireError> {
        let permit = Arc::clone(&self.permits).acquire_owned().await?;

        let mut slots = self.lock();
        // Holding a permit means a slot is free; growing is only a fallback.
        let index = match slots.iter().position(|s| s.occupant.is_none()) {
            Some(index) => index,
            None => {
                slots.push(Slot::default());
                slots.len() - 1
            }
        };
        let slot = &mut slots[index];
        slot.generation += 1;
        slot.occupant = Some(Occupant {
            client,
            started_at: Instant::now(),
        });
        let generation = slot.generation;
        drop(slots);

        Ok(SlotGuard {
            arena: Arc::clone(self),
            index,
            generation,
            _permit: permit,
        })
    }

    fn release(&self, index: usize, generation: u64) {
        let mut slots = self.lock();
        if let Some(slot) = slots.get_mut(index) {
            if slot.generation == generation {
                slot.occupant = None;
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds one slot of an [`InFlight`] arena until dropped.
#[derive(Debug)]
pub struct SlotGuard {
    arena: Arc<InFlight>,
    index: usize,
    generation: u64,
    _permit: OwnedSemaphorePermit,
}

impl SlotGuard {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // The slot is freed before the permit (a field) is returned to the semaphore.
        self.arena.release(self.index, self.generation);
    }
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, time::Duration};

    use tokio::time::timeout;

    use super::InFlight;

    fn client(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn test_acquire_is_bounded_by_capacity() {
        let arena = InFlight::new(2);
        let first = arena.acquire(client(1)).await.unwrap();
        let _second = arena.acquire(client(2)).await.unwrap();
        assert_eq!(arena.in_flight(), 2);

        let third = timeout(Duration::from_millis(50), arena.acquire(client(3))).await;
        assert!(third.is_err(), "a third slot must not be handed out");

        drop(first);
        assert_eq!(arena.in_flight(), 1);
        let third = timeout(Duration::from_millis(50), arena.acquire(client(3)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(third.index(), 0);
        assert_eq!(arena.in_flight(), 2);
        assert_eq!(arena.capacity(), 2);
    }

    #[tokio::test]
    async fn test_reused_slot_gets_new_generation() {
        let arena = InFlight::new(1);
        let first = arena.acquire(client(1)).await.unwrap();
        let (index, generation) = (first.index(), first.generation());
        drop(first);

        let second = arena.acquire(client(2)).await.unwrap();
        assert_eq!(second.index(), index);
        assert!(second.generation() > generation);

        // a stale release must not free the slot now owned by `second`
        arena.release(index, generation);
        assert_eq!(arena.in_flight(), 1);
        assert_eq!(arena.oldest().map(|(client, _)| client), Some(client(2)));

        drop(second);
        assert_eq!(arena.in_flight(), 0);
        assert!(arena.oldest().is_none());
    }
}
