//! Storage infrastructure - Storage implementations

mod factory;
mod in_memory;
mod postgres;
mod seed;

pub use factory::{StorageConfig, StorageFactory, StorageType};
pub use in_memory::InMemoryStorage;
pub use postgres::{PostgresConfig, PostgresStorage};
pub use seed::{catalog, seed_catalog};
