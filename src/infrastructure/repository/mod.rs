//! Cached repositories over the system of record

mod cached;
mod equipment;
mod user;

pub use cached::CachedRepository;
