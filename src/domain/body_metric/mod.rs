//! Body metric domain

mod entity;
mod filter;

pub use entity::{BodyMetric, BodyMetricDraft, BodyMetricPatch, MetricId, MetricKind};
pub use filter::{BodyMetricFilter, MetricSortField};
