//! Body measurements recorded over time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;
use crate::domain::validation::{validate_optional_text, validate_range};
use crate::domain::{DomainError, StorageEntity};

crate::entity_id!(
    /// Body metric identifier
    MetricId,
    "body metric"
);

const MAX_NOTE_LENGTH: usize = 280;

/// What was measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    WeightKg,
    BodyFatPercent,
    RestingHeartRate,
    WaistCm,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WeightKg => "weight_kg",
            Self::BodyFatPercent => "body_fat_percent",
            Self::RestingHeartRate => "resting_heart_rate",
            Self::WaistCm => "waist_cm",
        }
    }

    /// Plausible range for a reading of this kind
    fn bounds(&self) -> (f64, f64) {
        match self {
            Self::WeightKg => (20.0, 400.0),
            Self::BodyFatPercent => (2.0, 70.0),
            Self::RestingHeartRate => (25.0, 220.0),
            Self::WaistCm => (30.0, 250.0),
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetricKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weight_kg" => Ok(Self::WeightKg),
            "body_fat_percent" => Ok(Self::BodyFatPercent),
            "resting_heart_rate" => Ok(Self::RestingHeartRate),
            "waist_cm" => Ok(Self::WaistCm),
            other => Err(DomainError::validation(format!(
                "Unknown metric kind '{}'",
                other
            ))),
        }
    }
}

/// A single reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyMetric {
    id: MetricId,
    user_id: UserId,
    kind: MetricKind,
    value: f64,
    recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BodyMetricDraft {
    pub user_id: UserId,
    pub kind: MetricKind,
    pub value: f64,
    /// Defaults to now
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BodyMetricPatch {
    pub value: Option<f64>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl BodyMetric {
    pub fn new(
        user_id: UserId,
        kind: MetricKind,
        value: f64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        let metric = Self {
            id: MetricId::generate(),
            user_id,
            kind,
            value,
            recorded_at,
            note: None,
            created_at: now,
            updated_at: now,
        };
        metric.validate()?;
        Ok(metric)
    }

    pub fn id(&self) -> &MetricId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    fn validate(&self) -> Result<(), DomainError> {
        let (min, max) = self.kind.bounds();
        validate_range("value", self.value, min, max)?;
        validate_optional_text("note", self.note.as_deref(), MAX_NOTE_LENGTH)?;
        if self.recorded_at > Utc::now() + chrono::Duration::minutes(5) {
            return Err(DomainError::validation("recorded_at cannot be in the future"));
        }
        Ok(())
    }
}

impl StorageEntity for BodyMetric {
    type Key = MetricId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl BodyMetricDraft {
    pub(crate) fn build(self) -> Result<BodyMetric, DomainError> {
        let mut metric = BodyMetric::new(
            self.user_id,
            self.kind,
            self.value,
            self.recorded_at.unwrap_or_else(Utc::now),
        )?;
        metric.note = self.note;
        metric.validate()?;
        Ok(metric)
    }
}

impl BodyMetricPatch {
    pub(crate) fn apply_to(self, metric: &mut BodyMetric) -> Result<(), DomainError> {
        if let Some(value) = self.value {
            metric.value = value;
        }
        if let Some(recorded_at) = self.recorded_at {
            metric.recorded_at = recorded_at;
        }
        if let Some(note) = self.note {
            metric.note = Some(note);
        }
        metric.validate()?;
        metric.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_bounds_depend_on_kind() {
        let user = UserId::generate();
        let now = Utc::now();
        assert!(BodyMetric::new(user.clone(), MetricKind::WeightKg, 80.0, now).is_ok());
        assert!(BodyMetric::new(user.clone(), MetricKind::BodyFatPercent, 80.0, now).is_err());
        assert!(BodyMetric::new(user, MetricKind::RestingHeartRate, 10.0, now).is_err());
    }

    #[test]
    fn test_future_readings_rejected() {
        let later = Utc::now() + chrono::Duration::days(1);
        assert!(BodyMetric::new(UserId::generate(), MetricKind::WaistCm, 80.0, later).is_err());
    }

    #[test]
    fn test_patch_value() {
        let mut metric =
            BodyMetric::new(UserId::generate(), MetricKind::WeightKg, 80.0, Utc::now()).unwrap();
        BodyMetricPatch {
            value: Some(79.5),
            ..Default::default()
        }
        .apply_to(&mut metric)
        .unwrap();
        assert_eq!(metric.value(), 79.5);

        let invalid = BodyMetricPatch {
            value: Some(1.0),
            ..Default::default()
        };
        assert!(invalid.apply_to(&mut metric).is_err());
    }
}
