//! Storage entity traits and types

use std::fmt::{Debug, Display};

use serde::{Serialize, de::DeserializeOwned};

use crate::domain::DomainError;

/// Trait for types that can be used as storage keys
pub trait StorageKey:
    Clone + Debug + Display + Send + Sync + Eq + std::hash::Hash + 'static
{
    /// Returns the key as a string for storage backends that require string keys
    fn as_str(&self) -> &str;

    /// Parses a key received from outside (path segment, database column)
    fn parse(raw: &str) -> Result<Self, DomainError>;
}

/// Trait for types that can be stored
pub trait StorageEntity:
    Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// The key type for this entity
    type Key: StorageKey;

    /// Returns the entity's key
    fn key(&self) -> &Self::Key;
}
