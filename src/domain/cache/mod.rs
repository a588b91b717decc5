//! Cache domain - store abstraction, keys, patterns and statistics

mod clock;
pub mod key;
mod pattern;
mod repository;
mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use key::{KeyBuilder, KeyField, KeyedFilter};
pub use pattern::KeyPattern;
pub use repository::Cache;
pub use stats::CacheStats;

#[cfg(test)]
pub use repository::CacheExt;
#[cfg(test)]
pub use repository::mock::MockCache;
