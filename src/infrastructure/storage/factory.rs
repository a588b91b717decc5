//! Storage factory for runtime storage selection

use std::sync::Arc;

use serde::Deserialize;
use sqlx::PgPool;

use crate::domain::DomainError;
use crate::domain::storage::{Storage, StorageEntity};

use super::in_memory::InMemoryStorage;
use super::postgres::{PostgresConfig, PostgresStorage};

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    #[default]
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl std::str::FromStr for StorageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(DomainError::configuration(format!(
                "Unknown storage type: {}. Valid types: in_memory, postgres",
                s
            ))),
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InMemory => write!(f, "in_memory"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

/// Storage section of the application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageType,
    pub postgres: PostgresConfig,
    /// Load the equipment and exercise catalog at startup (in-memory only)
    pub seed_catalog: bool,
}

impl StorageConfig {
    /// Creates an in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a PostgreSQL configuration from a URL
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self {
            backend: StorageType::Postgres,
            postgres: PostgresConfig::new(url),
            seed_catalog: false,
        }
    }
}

/// Factory for creating storage instances
///
/// Postgres tables share one pool, opened on first use.
#[derive(Debug, Default)]
pub struct StorageFactory {
    config: StorageConfig,
    pool: Option<PgPool>,
}

impl StorageFactory {
    /// Connects whatever the configured backend needs
    pub async fn connect(config: StorageConfig) -> Result<Self, DomainError> {
        let pool = match config.backend {
            StorageType::InMemory => None,
            StorageType::Postgres => Some(config.postgres.connect().await?),
        };

        Ok(Self { config, pool })
    }

    pub fn storage_type(&self) -> StorageType {
        self.config.backend
    }

    /// Creates a storage instance for one table
    pub async fn create<E>(&self, table_name: &str) -> Result<Arc<dyn Storage<E>>, DomainError>
    where
        E: StorageEntity + 'static,
    {
        match &self.pool {
            None => Ok(Arc::new(InMemoryStorage::<E>::new())),
            Some(pool) => {
                let storage = PostgresStorage::<E>::new(pool.clone(), table_name)?;
                storage.ensure_table().await?;
                Ok(Arc::new(storage))
            }
        }
    }
}
