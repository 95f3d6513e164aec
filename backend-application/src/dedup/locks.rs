use std::collections::HashMap;
use std::sync::Arc;

use backend_domain::Fingerprint;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// In-process mutual exclusion keyed by fingerprint. Holding the guard across
/// resolve and record closes the race where two concurrent identical alerts
/// both resolve as "new".
#[derive(Debug, Default)]
pub struct FingerprintLocks {
    slots: Mutex<HashMap<Fingerprint, Arc<Mutex<()>>>>,
}

#[derive(Debug)]
pub struct FingerprintGuard {
    _guard: OwnedMutexGuard<()>,
}

impl FingerprintLocks {
    pub async fn acquire(&self, fingerprint: &Fingerprint) -> FingerprintGuard {
        let slot = {
            let mut slots = self.slots.lock().await;
            // A slot only referenced by the map has no holder and no waiter.
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(fingerprint.clone()).or_default().clone()
        };
        FingerprintGuard {
            _guard: slot.lock_owned().await,
        }
    }

    #[cfg(test)]
    pub(crate) async fn tracked(&self) -> usize {
        self.slots.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fp(value: &str) -> Fingerprint {
        Fingerprint(value.to_string())
    }

    #[tokio::test]
    async fn same_fingerprint_waits_for_holder() {
        let locks = Arc::new(FingerprintLocks::default());
        let guard = locks.acquire(&fp("a")).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&fp("a")).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should acquire after release")
            .expect("task panicked");
    }

    #[tokio::test]
    async fn distinct_fingerprints_do_not_block() {
        let locks = FingerprintLocks::default();
        let _a = locks.acquire(&fp("a")).await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.acquire(&fp("b"))).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn released_slots_are_pruned() {
        let locks = FingerprintLocks::default();
        drop(locks.acquire(&fp("a")).await);
        drop(locks.acquire(&fp("b")).await);
        let _c = locks.acquire(&fp("c")).await;
        assert_eq!(locks.tracked().await, 1);
    }
}
