//! Cache primitives injected into the aggregator.
//!
//! Both services are explicitly constructed and owned by their users; there
//! is no module-level mutable state. `TtlCache` is a single-slot
//! (value, capture-time) pair; `SingleFlight` collapses concurrent callers
//! of the same key onto one in-flight future.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Single-slot cache holding a value and its capture time.
#[derive(Debug, Default)]
pub struct TtlCache<T> {
    slot: Mutex<Option<(T, Instant)>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// The cached value, if one was stored less than `ttl` ago.
    pub fn get(&self, ttl: Duration) -> Option<T> {
        let slot = self.slot.lock().unwrap();
        slot.as_ref()
            .and_then(|(value, at)| (at.elapsed() < ttl).then(|| value.clone()))
    }

    /// Store a value, stamping it with the current time.
    pub fn put(&self, value: T) {
        *self.slot.lock().unwrap() = Some((value, Instant::now()));
    }

    /// Drop the cached value.
    pub fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }
}

type SharedFlight<T> = Shared<BoxFuture<'static, T>>;

/// Collapses concurrent requests for the same key onto one future.
///
/// The first caller for a key installs the future; callers arriving while it
/// is pending await the same shared future instead of issuing duplicates.
pub struct SingleFlight<T: Clone> {
    inflight: Mutex<HashMap<String, SharedFlight<T>>>,
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Run `make()` under the single-flight guard for `key`.
    ///
    /// `make` is only invoked when no flight for `key` is pending.
    pub async fn run<F, Fut>(&self, key: &str, make: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let flight = {
            let mut inflight = self.inflight.lock().unwrap();
            match inflight.get(key) {
                Some(existing) => existing.clone(),
                None => {
                    let flight = make().boxed().shared();
                    inflight.insert(key.to_string(), flight.clone());
                    flight
                }
            }
        };

        let out = flight.clone().await;

        // Retire the flight once resolved; a newer flight under the same key
        // must not be removed by a late waiter.
        let mut inflight = self.inflight.lock().unwrap();
        if inflight.get(key).is_some_and(|cur| cur.ptr_eq(&flight)) {
            inflight.remove(key);
        }
        out
    }
}
