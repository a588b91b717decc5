//! Body metric list filter and cache wiring

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::entity::{BodyMetric, BodyMetricDraft, BodyMetricPatch, MetricId, MetricKind};
use crate::domain::DomainError;
use crate::domain::cache::key::{self, KeyField, KeyedFilter};
use crate::domain::query::{Page, SortOrder, comma_separated};
use crate::domain::resource::{NoRelation, Resource, ResourceFilter};
use crate::domain::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSortField {
    RecordedAt,
    Value,
}

impl std::fmt::Display for MetricSortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::RecordedAt => "recorded_at",
            Self::Value => "value",
        })
    }
}

/// Query over body metrics, usually scoped to one user and a time window
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BodyMetricFilter {
    #[serde(deserialize_with = "comma_separated")]
    pub ids: Option<Vec<MetricId>>,
    pub user_id: Option<UserId>,
    #[serde(deserialize_with = "comma_separated")]
    pub kinds: Option<Vec<MetricKind>>,
    /// Inclusive lower bound on `recorded_at`
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `recorded_at`
    pub to: Option<DateTime<Utc>>,
    pub sort_by: Option<MetricSortField>,
    pub order: Option<SortOrder>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

fn timestamp(value: &Option<DateTime<Utc>>) -> Option<String> {
    value.map(|t| key::escape(&t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)))
}

impl KeyedFilter for BodyMetricFilter {
    const KEY_FIELDS: &'static [KeyField<Self>] = &[
        KeyField {
            name: "ids",
            serialize: |f| key::list(&f.ids),
        },
        KeyField {
            name: "user",
            serialize: |f| key::display(&f.user_id),
        },
        KeyField {
            name: "kinds",
            serialize: |f| key::list(&f.kinds),
        },
        KeyField {
            name: "from",
            serialize: |f| timestamp(&f.from),
        },
        KeyField {
            name: "to",
            serialize: |f| timestamp(&f.to),
        },
        KeyField {
            name: "sort",
            serialize: |f| key::display(&f.sort_by),
        },
        KeyField {
            name: "order",
            serialize: |f| key::display(&f.order),
        },
        KeyField {
            name: "limit",
            serialize: |f| key::display(&f.limit),
        },
        KeyField {
            name: "offset",
            serialize: |f| key::display(&f.offset),
        },
    ];
}

impl ResourceFilter<BodyMetric> for BodyMetricFilter {
    fn matches(&self, metric: &BodyMetric) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(metric.id()) {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if metric.user_id() != user_id {
                return false;
            }
        }
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&metric.kind()) {
                return false;
            }
        }
        if let Some(from) = self.from {
            if metric.recorded_at() < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if metric.recorded_at() >= to {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &BodyMetric, b: &BodyMetric) -> Ordering {
        let ordering = match self.sort_by.unwrap_or(MetricSortField::RecordedAt) {
            MetricSortField::RecordedAt => a.recorded_at().cmp(&b.recorded_at()),
            MetricSortField::Value => a.value().total_cmp(&b.value()),
        };
        self.order
            .unwrap_or_default()
            .apply(ordering.then_with(|| a.id().cmp(b.id())))
    }

    fn page(&self) -> Page {
        Page::new(self.offset, self.limit)
    }
}

impl Resource for BodyMetric {
    const NAME: &'static str = "body_metric";

    type Filter = BodyMetricFilter;
    type Relation = NoRelation;
    type Draft = BodyMetricDraft;
    type Patch = BodyMetricPatch;

    fn from_draft(draft: BodyMetricDraft) -> Result<Self, DomainError> {
        draft.build()
    }

    fn apply_patch(&mut self, patch: BodyMetricPatch) -> Result<(), DomainError> {
        patch.apply_to(self)
    }
}
