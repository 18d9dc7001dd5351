use thiserror::Error;

use crate::oracle::Leg;

#[derive(Debug, Error)]
#[error("distance cache store: {0}")]
pub struct CacheStoreError(pub String);

/// External key-value backend for computed legs, shared across runs.
///
/// Keys are the canonical `lexmin:lexmax` form of the two ticket ids.
/// Entries never invalidate within a run; eviction is the backend's concern.
pub trait DistanceCacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Leg>, CacheStoreError>;
    fn put(&self, key: &str, leg: Leg) -> Result<(), CacheStoreError>;
}
