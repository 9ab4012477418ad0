//! Quota governor
//!
//! Two states: `Available` and `Suspended { until }`. A quota or billing error
//! from the image API suspends every further call for the cooldown period;
//! the suspension is global, not per ship. Expiry is checked lazily on the
//! next access. Other failures never change the state.

mod store;

pub use store::{FileFlagStore, MemoryFlagStore, QuotaFlag, QuotaFlagStore};

use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Current governor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaState {
    Available,
    Suspended { until: DateTime<Utc> },
}

impl QuotaState {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Tracks the suspension flag and its cooldown
pub struct QuotaGovernor {
    flag: Mutex<Option<QuotaFlag>>,
    cooldown: Duration,
    clock: Arc<dyn Clock>,
    store: Arc<dyn QuotaFlagStore>,
    /// Held across every store write so a clear cannot overtake a save
    store_writes: tokio::sync::Mutex<()>,
}

impl QuotaGovernor {
    /// Create a governor in the `Available` state
    pub fn new(cooldown: Duration, clock: Arc<dyn Clock>, store: Arc<dyn QuotaFlagStore>) -> Self {
        Self {
            flag: Mutex::new(None),
            cooldown,
            clock,
            store,
            store_writes: tokio::sync::Mutex::new(()),
        }
    }

    /// Create a governor and pick up a still-active flag from the store.
    ///
    /// An unreadable store is logged and treated as empty.
    pub async fn restore(
        cooldown: Duration,
        clock: Arc<dyn Clock>,
        store: Arc<dyn QuotaFlagStore>,
    ) -> Self {
        let governor = Self::new(cooldown, clock, store);

        match governor.store.load().await {
            Ok(Some(flag)) if flag.is_active(governor.clock.now()) => {
                info!("Image API suspended until {} (restored)", flag.until);
                *governor.lock() = Some(flag);
            }
            Ok(Some(_)) => {
                debug!("Stored quota flag has expired");
                governor.clear_store().await;
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring unreadable quota flag: {}", e),
        }

        governor
    }

    /// Current state without side effects
    pub fn state(&self) -> QuotaState {
        let now = self.clock.now();
        match self.lock().as_ref() {
            Some(flag) if flag.is_active(now) => QuotaState::Suspended { until: flag.until },
            _ => QuotaState::Available,
        }
    }

    /// Current state; an expired suspension is cleared here and in the store
    pub async fn check(&self) -> QuotaState {
        let now = self.clock.now();
        let expired = {
            let mut flag = self.lock();
            match flag.as_ref() {
                Some(active) if active.is_active(now) => {
                    return QuotaState::Suspended {
                        until: active.until,
                    }
                }
                Some(_) => {
                    *flag = None;
                    true
                }
                None => false,
            }
        };

        if expired {
            info!("Quota cooldown elapsed, image API available again");
            let _writes = self.store_writes.lock().await;
            // a suspend() may have landed since the flag was dropped
            let suspended_again = self.lock().is_some();
            if !suspended_again {
                self.clear_store().await;
            }
        }
        QuotaState::Available
    }

    /// Enter (or extend) the suspended state after a quota error
    pub async fn suspend(&self, reason: &str) -> DateTime<Utc> {
        let now = self.clock.now();
        let deadline = now
            .checked_add_signed(self.cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let flag = {
            let mut current = self.lock();
            let until = match current.as_ref() {
                Some(existing) if existing.until > deadline => existing.until,
                _ => deadline,
            };
            let flag = QuotaFlag {
                suspended_at: now,
                until,
                reason: reason.to_string(),
            };
            *current = Some(flag.clone());
            flag
        };

        warn!("Image API suspended until {}: {}", flag.until, reason);
        let _writes = self.store_writes.lock().await;
        // persist whatever is current; a later suspend may have extended it
        let current = self.lock().clone();
        if let Some(current) = current {
            if let Err(e) = self.store.save(&current).await {
                warn!("Failed to persist quota flag: {}", e);
            }
        }
        flag.until
    }

    /// Clear any suspension immediately
    pub async fn reset(&self) {
        *self.lock() = None;
        let _writes = self.store_writes.lock().await;
        self.clear_store().await;
        info!("Quota suspension cleared");
    }

    /// The active flag, if suspended
    pub fn flag(&self) -> Option<QuotaFlag> {
        let now = self.clock.now();
        self.lock().clone().filter(|flag| flag.is_active(now))
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    async fn clear_store(&self) {
        if let Err(e) = self.store.clear().await {
            warn!("Failed to clear persisted quota flag: {}", e);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<QuotaFlag>> {
        self.flag.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ShipgenResult;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// Memory store whose `clear` waits until released
    #[derive(Default)]
    struct GatedStore {
        inner: MemoryFlagStore,
        clearing: Notify,
        release: Notify,
    }

    #[async_trait]
    impl QuotaFlagStore for GatedStore {
        async fn load(&self) -> ShipgenResult<Option<QuotaFlag>> {
            self.inner.load().await
        }

        async fn save(&self, flag: &QuotaFlag) -> ShipgenResult<()> {
            self.inner.save(flag).await
        }

        async fn clear(&self) -> ShipgenResult<()> {
            self.clearing.notify_one();
            self.release.notified().await;
            self.inner.clear().await
        }
    }

    fn governor() -> (QuotaGovernor, Arc<ManualClock>, Arc<MemoryFlagStore>) {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemoryFlagStore::new());
        let governor = QuotaGovernor::new(Duration::hours(24), clock.clone(), store.clone());
        (governor, clock, store)
    }

    #[tokio::test]
    async fn starts_available() {
        let (governor, _clock, _store) = governor();
        assert_eq!(governor.check().await, QuotaState::Available);
        assert!(governor.flag().is_none());
    }

    #[tokio::test]
    async fn suspends_for_cooldown_then_recovers() {
        let (governor, clock, store) = governor();
        let start = clock.now();
        let until = governor.suspend("RESOURCE_EXHAUSTED").await;
        assert_eq!(until, start + Duration::hours(24));
        assert!(store.load().await.unwrap().is_some());

        clock.advance(Duration::hours(24) - Duration::seconds(1));
        assert_eq!(governor.check().await, QuotaState::Suspended { until });

        clock.advance(Duration::seconds(1));
        assert_eq!(governor.check().await, QuotaState::Available);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn state_is_side_effect_free() {
        let (governor, clock, store) = governor();
        governor.suspend("quota").await;
        clock.advance(Duration::hours(25));

        assert!(governor.state().is_available());
        // the persisted flag is only cleared by check()
        assert!(store.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn repeated_suspend_extends_window() {
        let (governor, clock, _store) = governor();
        governor.suspend("first").await;
        clock.advance(Duration::hours(1));
        let until = governor.suspend("second").await;
        assert_eq!(until, clock.now() + Duration::hours(24));
        assert_eq!(governor.flag().unwrap().reason, "second");
    }

    #[tokio::test]
    async fn restore_picks_up_active_flag() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemoryFlagStore::new());
        store
            .save(&QuotaFlag {
                suspended_at: clock.now(),
                until: clock.now() + Duration::hours(2),
                reason: "billing".to_string(),
            })
            .await
            .unwrap();

        let governor = QuotaGovernor::restore(Duration::hours(24), clock.clone(), store).await;
        assert!(!governor.state().is_available());
    }

    #[tokio::test]
    async fn restore_drops_expired_flag() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemoryFlagStore::new());
        store
            .save(&QuotaFlag {
                suspended_at: clock.now() - Duration::hours(30),
                until: clock.now() - Duration::hours(6),
                reason: "billing".to_string(),
            })
            .await
            .unwrap();

        let governor =
            QuotaGovernor::restore(Duration::hours(24), clock.clone(), store.clone()).await;
        assert!(governor.state().is_available());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_clears_suspension() {
        let (governor, _clock, store) = governor();
        governor.suspend("quota").await;
        governor.reset().await;
        assert_eq!(governor.check().await, QuotaState::Available);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn huge_cooldown_saturates() {
        let clock = Arc::new(ManualClock::default());
        let governor = QuotaGovernor::new(
            Duration::MAX,
            clock.clone(),
            Arc::new(MemoryFlagStore::new()),
        );
        let until = governor.suspend("quota").await;
        assert_eq!(until, DateTime::<Utc>::MAX_UTC);
        assert!(!governor.check().await.is_available());
    }

    #[tokio::test]
    async fn expiry_clear_does_not_drop_a_new_suspension() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(GatedStore::default());
        let governor = Arc::new(QuotaGovernor::new(
            Duration::hours(24),
            clock.clone(),
            store.clone(),
        ));
        governor.suspend("first").await;
        clock.advance(Duration::hours(25));

        let checker = {
            let governor = governor.clone();
            tokio::spawn(async move { governor.check().await })
        };
        store.clearing.notified().await;

        let suspender = {
            let governor = governor.clone();
            tokio::spawn(async move { governor.suspend("second").await })
        };
        tokio::task::yield_now().await;
        store.release.notify_one();

        assert_eq!(checker.await.unwrap(), QuotaState::Available);
        suspender.await.unwrap();

        let persisted = store.inner.load().await.unwrap().unwrap();
        assert_eq!(persisted.reason, "second");
        assert!(!governor.state().is_available());
    }
}
