//! Snapshot cache for fetched fellow tables.
//!
//! Keyed by the full fetch query so a change of base, view, or field list
//! never serves a stale shape. Concurrent misses on the same key share one
//! fetch.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::info;

use crate::error::DashboardError;
use crate::models::{FellowTable, FetchQuery};

pub const DEFAULT_CAPACITY: u64 = 2;
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct SnapshotCache {
    inner: Cache<FetchQuery, Arc<FellowTable>>,
}

impl SnapshotCache {
    #[must_use]
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Returns the cached table for `query`, running `load` on a miss.
    /// Failed loads are not cached.
    pub async fn get_or_load<F, Fut>(
        &self,
        query: &FetchQuery,
        load: F,
    ) -> Result<Arc<FellowTable>, DashboardError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FellowTable, DashboardError>>,
    {
        self.inner
            .try_get_with(query.clone(), async move {
                info!("snapshot cache miss");
                load().await.map(Arc::new)
            })
            .await
            .map_err(|e| (*e).clone())
    }

    /// Drops every snapshot; the next render fetches again.
    pub fn clear(&self) {
        self.inner.invalidate_all();
        info!("snapshot cache cleared");
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
