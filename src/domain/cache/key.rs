//! Cache key construction
//!
//! Keys are namespaced by resource type and then split into two families:
//!
//! - `<resource>:filters[:<field>:<value>]*` for list queries
//! - `<resource>:<id>:rel:<relations>` for single entities
//!
//! Secondary lookups (by email, by category, ...) live under
//! `<resource>:<name>:<value>`. Filter fields come from a typed table declared
//! on each filter type, so every field that shapes a query is listed in one
//! place and serialized the same way every time.

use std::fmt::{Debug, Display};

use super::pattern::KeyPattern;

/// Segment used for list-query keys
pub const FILTERS_SEGMENT: &str = "filters";

/// Segment that separates an entity id from its included relations
pub const RELATIONS_SEGMENT: &str = "rel";

/// Placeholder for "no relations included"
pub const NO_RELATIONS: &str = "-";

/// One entry of a filter's key table: the key segment name and how to render
/// the field. `None` means the field is absent and is left out of the key.
pub struct KeyField<F> {
    pub name: &'static str,
    pub serialize: fn(&F) -> Option<String>,
}

impl<F> Debug for KeyField<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyField").field("name", &self.name).finish()
    }
}

/// Filter types that can be turned into cache keys
pub trait KeyedFilter: Sized + Send + Sync + 'static {
    /// Ordered field table; order here is the order in the key
    const KEY_FIELDS: &'static [KeyField<Self>];

    /// Render the present fields as `(name, value)` pairs
    fn key_segments(&self) -> Vec<(&'static str, String)> {
        Self::KEY_FIELDS
            .iter()
            .filter_map(|field| (field.serialize)(self).map(|value| (field.name, value)))
            .collect()
    }
}

/// Escape characters that carry meaning inside keys or glob patterns
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            ',' => out.push_str("%2C"),
            '*' => out.push_str("%2A"),
            '?' => out.push_str("%3F"),
            '[' => out.push_str("%5B"),
            ']' => out.push_str("%5D"),
            other => out.push(other),
        }
    }
    out
}

/// Serialize an optional text field
pub fn text(value: &Option<String>) -> Option<String> {
    value.as_deref().map(escape)
}

/// Serialize an optional scalar through its `Display` form
pub fn display<T: Display>(value: &Option<T>) -> Option<String> {
    value.as_ref().map(|v| escape(&v.to_string()))
}

/// Serialize an optional list: sorted, de-duplicated and comma-joined.
///
/// An empty list renders as an empty value, which keeps it distinct from an
/// absent field.
pub fn list<T: Display>(values: &Option<Vec<T>>) -> Option<String> {
    values.as_ref().map(|values| {
        let mut rendered: Vec<String> = values.iter().map(|v| escape(&v.to_string())).collect();
        rendered.sort();
        rendered.dedup();
        rendered.join(",")
    })
}

/// Key builder bound to one resource namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBuilder {
    namespace: &'static str,
}

impl KeyBuilder {
    pub const fn new(namespace: &'static str) -> Self {
        Self { namespace }
    }

    /// Key for a list query
    pub fn filters<F: KeyedFilter>(&self, filter: &F) -> String {
        let mut key = format!("{}:{}", self.namespace, FILTERS_SEGMENT);
        for (name, value) in filter.key_segments() {
            key.push(':');
            key.push_str(name);
            key.push(':');
            key.push_str(&value);
        }
        key
    }

    /// Key for a single entity with the given included relations
    pub fn entity<'a, I>(&self, id: &str, relations: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut relations: Vec<String> = relations.into_iter().map(escape).collect();
        relations.sort();
        relations.dedup();

        let relations = if relations.is_empty() {
            NO_RELATIONS.to_string()
        } else {
            relations.join(",")
        };

        format!(
            "{}:{}:{}:{}",
            self.namespace,
            escape(id),
            RELATIONS_SEGMENT,
            relations
        )
    }

    /// Key for a secondary lookup such as `user:email:<value>`
    pub fn secondary(&self, name: &str, value: &str) -> String {
        format!("{}:{}:{}", self.namespace, name, escape(value))
    }

    /// Pattern covering every list query of this resource
    pub fn filters_pattern(&self) -> KeyPattern {
        KeyPattern::new(format!("{}:{}*", self.namespace, FILTERS_SEGMENT))
    }

    /// Pattern covering every cached view of one entity
    pub fn entity_pattern(&self, id: &str) -> KeyPattern {
        KeyPattern::new(format!("{}:{}:*", self.namespace, escape(id)))
    }

    /// Pattern covering the whole namespace
    pub fn namespace_pattern(&self) -> KeyPattern {
        KeyPattern::new(format!("{}:*", self.namespace))
    }
}
