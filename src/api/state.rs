//! Application state shared by every handler

use std::sync::Arc;

use axum::extract::FromRef;

use crate::domain::{BodyMetric, Equipment, Exercise, User, WorkoutPlan};
use crate::infrastructure::cache::CacheManager;
use crate::infrastructure::repository::CachedRepository;

/// Cache manager plus one cached repository per resource
///
/// Handlers extract the piece they need through `FromRef`, e.g.
/// `State(repo): State<Arc<CachedRepository<Equipment>>>`.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheManager>,
    pub users: Arc<CachedRepository<User>>,
    pub equipment: Arc<CachedRepository<Equipment>>,
    pub exercises: Arc<CachedRepository<Exercise>>,
    pub workout_plans: Arc<CachedRepository<WorkoutPlan>>,
    pub body_metrics: Arc<CachedRepository<BodyMetric>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cache", &self.cache.backend_name())
            .field("storage", &self.users.storage().backend_name())
            .finish()
    }
}

impl FromRef<AppState> for Arc<CacheManager> {
    fn from_ref(state: &AppState) -> Self {
        state.cache.clone()
    }
}

macro_rules! repository_from_ref {
    ($($entity:ty => $field:ident),+ $(,)?) => {
        $(
            impl FromRef<AppState> for Arc<CachedRepository<$entity>> {
                fn from_ref(state: &AppState) -> Self {
                    state.$field.clone()
                }
            }
        )+
    };
}

repository_from_ref!(
    User => users,
    Equipment => equipment,
    Exercise => exercises,
    WorkoutPlan => workout_plans,
    BodyMetric => body_metrics,
);
