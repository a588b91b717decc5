//! Domain layer - Core entities, filters and cache abstractions

pub mod body_metric;
pub mod cache;
pub mod equipment;
pub mod error;
pub mod exercise;
pub mod query;
pub mod resource;
pub mod storage;
pub mod user;
pub mod validation;
pub mod workout_plan;

pub use body_metric::{BodyMetric, BodyMetricFilter, MetricId};
pub use cache::{Cache, CacheStats, Clock, KeyBuilder, KeyPattern, ManualClock, SystemClock};
pub use equipment::{Equipment, EquipmentCategory, EquipmentFilter, EquipmentId};
pub use error::DomainError;
pub use exercise::{Exercise, ExerciseFilter, ExerciseId};
pub use resource::{NoRelation, Relation, Resource, ResourceFilter};
pub use storage::{Storage, StorageEntity, StorageKey};
pub use user::{User, UserFilter, UserId};
pub use validation::ValidationError;
pub use workout_plan::{PlanId, WorkoutPlan, WorkoutPlanFilter};
