//! Traits shared by every cached fitness resource

use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use serde::de::DeserializeOwned;

use super::DomainError;
use super::cache::{KeyBuilder, KeyedFilter};
use super::query::Page;
use super::storage::StorageEntity;

/// A relation that can be included when loading an entity
pub trait Relation:
    Copy + Ord + Hash + Debug + Display + FromStr<Err = DomainError> + Send + Sync + 'static
{
    fn as_str(&self) -> &'static str;
}

/// Relation type for resources with nothing to include
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NoRelation {}

impl Relation for NoRelation {
    fn as_str(&self) -> &'static str {
        match *self {}
    }
}

impl Display for NoRelation {
    fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {}
    }
}

impl FromStr for NoRelation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Err(DomainError::validation(format!(
            "Unknown relation '{}': this resource has no relations",
            s
        )))
    }
}

/// An entity held in the system of record and served through the cache
pub trait Resource: StorageEntity {
    /// Resource name; also the first segment of every cache key
    const NAME: &'static str;

    /// Key builder for this resource's namespace
    const KEYS: KeyBuilder = KeyBuilder::new(Self::NAME);

    type Filter: ResourceFilter<Self>;
    type Relation: Relation;
    type Draft: DeserializeOwned + Debug + Send + Sync + 'static;
    type Patch: DeserializeOwned + Debug + Send + Sync + 'static;

    /// Build a new entity from validated input
    fn from_draft(draft: Self::Draft) -> Result<Self, DomainError>;

    /// Apply a partial update, validating the result
    fn apply_patch(&mut self, patch: Self::Patch) -> Result<(), DomainError>;

    /// Drop every relation not listed in `include`
    fn retain_relations(&mut self, _include: &[Self::Relation]) {}

    /// Secondary lookup keys derived from this entity's current field values
    fn secondary_keys(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Typed filter object for list queries
///
/// Every field that changes the result must appear in the filter's key table,
/// otherwise two different queries would share a cache entry.
pub trait ResourceFilter<E: Resource>:
    KeyedFilter + Default + Clone + Debug + DeserializeOwned
{
    /// Predicate over one entity
    fn matches(&self, entity: &E) -> bool;

    /// Ordering of the result
    fn compare(&self, a: &E, b: &E) -> Ordering;

    fn page(&self) -> Page;

    /// Relations to keep on each returned entity
    fn includes(&self) -> &[E::Relation] {
        &[]
    }

    /// Run the filter over a full entity set
    fn apply(&self, entities: Vec<E>) -> Vec<E> {
        let mut matching: Vec<E> = entities.into_iter().filter(|e| self.matches(e)).collect();
        matching.sort_by(|a, b| self.compare(a, b));

        let include = self.includes();
        self.page()
            .slice(matching)
            .into_iter()
            .map(|mut entity| {
                entity.retain_relations(include);
                entity
            })
            .collect()
    }
}

/// Declares a UUID-backed identifier newtype implementing `StorageKey`
#[macro_export]
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh identifier
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }

        impl $crate::domain::StorageKey for $name {
            fn as_str(&self) -> &str {
                &self.0
            }

            fn parse(raw: &str) -> Result<Self, $crate::domain::DomainError> {
                uuid::Uuid::parse_str(raw.trim())
                    .map(|uuid| Self(uuid.to_string()))
                    .map_err(|_| {
                        $crate::domain::DomainError::invalid_id(format!(
                            "'{}' is not a valid {} id",
                            raw, $label
                        ))
                    })
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::domain::DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                <Self as $crate::domain::StorageKey>::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as $crate::domain::StorageKey>::parse(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

/// Declares a relation enum with its wire names
#[macro_export]
macro_rules! relation_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $crate::domain::resource::Relation for $name {
            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::domain::resource::Relation::as_str(self))
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($wire => Ok(Self::$variant),)+
                    other => Err($crate::domain::DomainError::validation(format!(
                        "Unknown relation '{}'",
                        other
                    ))),
                }
            }
        }
    };
}
