//! User lookups beyond id and filter

use crate::domain::DomainError;
use crate::domain::resource::Resource;
use crate::domain::user::{EMAIL_LOOKUP, User, UserDraft, UserId, UserPatch};
use crate::domain::validation::normalize_email;

use super::CachedRepository;

impl CachedRepository<User> {
    /// Loads a user by email, cached under `user:email:<normalized email>`
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = normalize_email(email);
        let key = User::KEYS.secondary(EMAIL_LOOKUP, &email);

        self.read_through(&key, "find_by_email", self.email_owner(&email))
            .await
    }

    /// Creates a user whose email is not taken yet
    pub async fn register(&self, draft: UserDraft) -> Result<User, DomainError> {
        let email = normalize_email(&draft.email);
        if self.email_owner(&email).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "A user with email '{}' already exists",
                email
            )));
        }

        self.create(draft).await
    }

    /// Updates a user, refusing to move it onto another user's email
    pub async fn update_profile(&self, id: &UserId, patch: UserPatch) -> Result<User, DomainError> {
        if let Some(email) = &patch.email {
            let email = normalize_email(email);
            if let Some(owner) = self.email_owner(&email).await? {
                if owner.id() != id {
                    return Err(DomainError::conflict(format!(
                        "A user with email '{}' already exists",
                        email
                    )));
                }
            }
        }

        self.update(id, patch).await
    }

    /// Reads the system of record directly; uniqueness checks must not trust the cache
    async fn email_owner(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.storage().list().await?;
        Ok(users.into_iter().find(|user| user.email() == email))
    }
}
