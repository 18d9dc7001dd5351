use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fxhash::FxHashMap;
use geo_types::Point;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::kmh::Kmh;
use crate::provider::{DistanceProvider, GreatCircle};
use crate::store::DistanceCacheStore;

/// One leg between two points: kilometers and travel minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub km: f64,
    pub minutes: f64,
}

impl Leg {
    pub const ZERO: Leg = Leg {
        km: 0.0,
        minutes: 0.0,
    };
}

/// Canonical unordered pair key: `lexmin:lexmax` of the two ids.
fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}:{b}")
    } else {
        format!("{b}:{a}")
    }
}

/// Memoizing distance oracle.
///
/// Pure great-circle math plus a per-run in-memory cache keyed by the
/// canonical unordered id pair, optionally backed by an external cache
/// store. Reads take the shared lock; a missed pair is computed outside any
/// lock and inserted last-writer-wins, so concurrent duplicate computation
/// is harmless.
pub struct DistanceOracle {
    provider: Arc<dyn DistanceProvider>,
    speed: Kmh,
    cache: RwLock<FxHashMap<String, Leg>>,
    store: Option<Arc<dyn DistanceCacheStore>>,
    store_down: AtomicBool,
}

impl DistanceOracle {
    pub fn new(speed: Kmh) -> Self {
        Self::with_provider(Arc::new(GreatCircle), speed)
    }

    pub fn with_provider(provider: Arc<dyn DistanceProvider>, speed: Kmh) -> Self {
        DistanceOracle {
            provider,
            speed,
            cache: RwLock::new(FxHashMap::default()),
            store: None,
            store_down: AtomicBool::new(false),
        }
    }

    pub fn with_cache_store(mut self, store: Arc<dyn DistanceCacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn speed(&self) -> Kmh {
        self.speed
    }

    /// Uncached leg between two raw coordinates (used for cluster centroids,
    /// which have no stable identity).
    pub fn travel(&self, from: Point, to: Point) -> Leg {
        let km = self.provider.distance_km(from, to);
        Leg {
            km,
            minutes: self.speed.minutes_for(km),
        }
    }

    /// Memoized leg between two identified points.
    pub fn between(&self, a_id: &str, a: Point, b_id: &str, b: Point) -> Leg {
        if a_id == b_id {
            return Leg::ZERO;
        }

        let key = pair_key(a_id, b_id);

        if let Some(leg) = self.cache.read().get(&key) {
            return *leg;
        }

        if let Some(leg) = self.store_get(&key) {
            self.cache.write().insert(key, leg);
            return leg;
        }

        let leg = self.travel(a, b);
        self.store_put(&key, leg);
        self.cache.write().insert(key, leg);
        leg
    }

    fn store_get(&self, key: &str) -> Option<Leg> {
        let store = self.store.as_ref()?;
        if self.store_down.load(Ordering::Relaxed) {
            return None;
        }

        match store.get(key) {
            Ok(hit) => hit,
            Err(error) => {
                self.degrade_store(&error.to_string());
                None
            }
        }
    }

    fn store_put(&self, key: &str, leg: Leg) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if self.store_down.load(Ordering::Relaxed) {
            return;
        }

        if let Err(error) = store.put(key, leg) {
            self.degrade_store(&error.to_string());
        }
    }

    fn degrade_store(&self, error: &str) {
        if !self.store_down.swap(true, Ordering::Relaxed) {
            warn!(error, "distance cache store unavailable, computing for the rest of the run");
        }
    }
}
