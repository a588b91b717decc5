//! Cache statistics snapshot

use serde::Serialize;

/// Counters accumulated since the last reset, plus the current entry count
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    /// Number of pattern deletes issued
    pub invalidations: u64,
    /// Keys removed by pattern deletes
    pub keys_invalidated: u64,
    /// Backend failures and timeouts, all of which were absorbed
    pub errors: u64,
    pub hit_rate: f64,
    pub size: usize,
}

impl CacheStats {
    /// Hit ratio in `[0, 1]`; zero when nothing has been looked up yet
    pub fn compute_hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}
