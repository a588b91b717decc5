//! User domain
//!
//! User accounts with optional profile and preference relations. Users are
//! also looked up by email, which makes the email a secondary cache key.

mod entity;
mod filter;

pub use entity::{
    UnitSystem, User, UserDraft, UserId, UserPatch, UserPreferences, UserProfile, UserRelation,
    UserStatus,
};
pub use filter::{EMAIL_LOOKUP, UserFilter, UserSortField};
