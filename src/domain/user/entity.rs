//! User entity and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::validation::{
    normalize_email, validate_email, validate_optional_text, validate_range, validate_text,
};
use crate::domain::{DomainError, StorageEntity};

crate::entity_id!(
    /// User identifier
    UserId,
    "user"
);

crate::relation_enum!(
    /// Optional parts of a user that are loaded on request
    UserRelation {
        Profile => "profile",
        Preferences => "preferences",
    }
);

const MAX_NAME_LENGTH: usize = 100;
const MAX_BIO_LENGTH: usize = 500;

/// Status of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Suspended,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Suspended => f.write_str("suspended"),
        }
    }
}

/// Unit system preferred by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

/// Physical profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl UserProfile {
    fn validate(&self) -> Result<(), DomainError> {
        if let Some(height) = self.height_cm {
            validate_range("height_cm", height, 50.0, 272.0)?;
        }
        validate_optional_text("bio", self.bio.as_deref(), MAX_BIO_LENGTH)?;
        Ok(())
    }
}

/// Training preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserPreferences {
    #[serde(default)]
    pub units: UnitSystem,
    /// Target workouts per week
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_goal: Option<u8>,
}

impl UserPreferences {
    fn validate(&self) -> Result<(), DomainError> {
        if let Some(goal) = self.weekly_goal {
            validate_range("weekly_goal", goal as f64, 1.0, 14.0)?;
        }
        Ok(())
    }
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    /// Stored lowercased
    email: String,
    name: String,
    status: UserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preferences: Option<UserPreferences>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct UserDraft {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub preferences: Option<UserPreferences>,
}

/// Partial update of a user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub status: Option<UserStatus>,
    pub profile: Option<UserProfile>,
    pub preferences: Option<UserPreferences>,
}

impl User {
    /// Create a new active user
    pub fn new(email: &str, name: impl Into<String>) -> Result<Self, DomainError> {
        let email = normalize_email(email);
        validate_email(&email)?;

        let name = name.into();
        validate_text("name", &name, MAX_NAME_LENGTH)?;

        let now = Utc::now();
        Ok(Self {
            id: UserId::generate(),
            email,
            name,
            status: UserStatus::Active,
            profile: None,
            preferences: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_preferences(mut self, preferences: UserPreferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    // Getters

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn preferences(&self) -> Option<&UserPreferences> {
        self.preferences.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    pub fn set_email(&mut self, email: &str) -> Result<(), DomainError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        self.email = email;
        self.touch();
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        let name = name.into();
        validate_text("name", &name, MAX_NAME_LENGTH)?;
        self.name = name;
        self.touch();
        Ok(())
    }

    pub fn set_status(&mut self, status: UserStatus) {
        self.status = status;
        self.touch();
    }

    pub fn set_profile(&mut self, profile: UserProfile) -> Result<(), DomainError> {
        profile.validate()?;
        self.profile = Some(profile);
        self.touch();
        Ok(())
    }

    pub fn set_preferences(&mut self, preferences: UserPreferences) -> Result<(), DomainError> {
        preferences.validate()?;
        self.preferences = Some(preferences);
        self.touch();
        Ok(())
    }

    /// Drop relations that were not requested
    pub(crate) fn keep_relations(&mut self, include: &[UserRelation]) {
        if !include.contains(&UserRelation::Profile) {
            self.profile = None;
        }
        if !include.contains(&UserRelation::Preferences) {
            self.preferences = None;
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl StorageEntity for User {
    type Key = UserId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl UserDraft {
    pub(crate) fn build(self) -> Result<User, DomainError> {
        let mut user = User::new(&self.email, self.name)?;
        if let Some(profile) = self.profile {
            user.set_profile(profile)?;
        }
        if let Some(preferences) = self.preferences {
            user.set_preferences(preferences)?;
        }
        Ok(user)
    }
}

impl UserPatch {
    pub(crate) fn apply_to(self, user: &mut User) -> Result<(), DomainError> {
        if let Some(email) = self.email {
            user.set_email(&email)?;
        }
        if let Some(name) = self.name {
            user.set_name(name)?;
        }
        if let Some(status) = self.status {
            user.set_status(status);
        }
        if let Some(profile) = self.profile {
            user.set_profile(profile)?;
        }
        if let Some(preferences) = self.preferences {
            user.set_preferences(preferences)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation_normalizes_email() {
        let user = User::new("  Runner@Example.com ", "Runner").unwrap();

        assert_eq!(user.email(), "runner@example.com");
        assert_eq!(user.name(), "Runner");
        assert_eq!(user.status(), UserStatus::Active);
        assert!(user.profile().is_none());
    }

    #[test]
    fn test_user_creation_rejects_bad_input() {
        assert!(User::new("nope", "Runner").is_err());
        assert!(User::new("runner@example.com", "  ").is_err());
    }

    #[test]
    fn test_draft_validates_profile() {
        let draft = UserDraft {
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            profile: Some(UserProfile {
                height_cm: Some(20.0),
                ..Default::default()
            }),
            preferences: None,
        };
        assert!(draft.build().is_err());
    }

    #[test]
    fn test_patch_updates_fields() {
        let mut user = User::new("a@example.com", "A").unwrap();
        let original_updated = user.updated_at();
        std::thread::sleep(std::time::Duration::from_millis(5));

        UserPatch {
            email: Some("B@Example.com".to_string()),
            status: Some(UserStatus::Suspended),
            ..Default::default()
        }
        .apply_to(&mut user)
        .unwrap();

        assert_eq!(user.email(), "b@example.com");
        assert_eq!(user.status(), UserStatus::Suspended);
        assert!(user.updated_at() > original_updated);
    }

    #[test]
    fn test_keep_relations() {
        let mut user = User::new("a@example.com", "A")
            .unwrap()
            .with_profile(UserProfile::default())
            .with_preferences(UserPreferences::default());

        user.keep_relations(&[UserRelation::Preferences]);
        assert!(user.profile().is_none());
        assert!(user.preferences().is_some());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("profile").is_none());
    }
}
