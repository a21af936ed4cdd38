use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds how many `Collect` calls run at once, independently of how many
/// requests are in flight.
pub struct CollectGate {
    sem: Arc<Semaphore>,
    limit: usize,
}

impl Clone for CollectGate {
    fn clone(&self) -> Self { CollectGate { sem: self.sem.clone(), limit: self.limit } }
}

impl CollectGate {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        CollectGate { sem: Arc::new(Semaphore::new(limit)), limit }
    }

    pub fn limit(&self) -> usize { self.limit }

    pub fn available(&self) -> usize { self.sem.available_permits() }

    /// Waits for a slot. The slot is released when the permit drops.
    /// Returns `None` only if the gate has been closed.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.sem.clone().acquire_owned().await.ok()
    }

    pub fn close(&self) { self.sem.close(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permits_are_bounded_and_released() {
        let gate = CollectGate::new(2);
        let a = gate.acquire().await.unwrap();
        let _b = gate.acquire().await.unwrap();
        assert_eq!(gate.available(), 0);
        drop(a);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn zero_limit_is_clamped() {
        let gate = CollectGate::new(0);
        assert_eq!(gate.limit(), 1);
        let _p = gate.acquire().await.unwrap();
        assert_eq!(gate.clone().available(), 0);
    }

    #[tokio::test]
    async fn closed_gate_yields_none() {
        let gate = CollectGate::new(1);
        gate.close();
        assert!(gate.acquire().await.is_none());
    }
}
