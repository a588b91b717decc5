//! User list filter and cache wiring

use std::cmp::Ordering;

use serde::Deserialize;

use super::entity::{User, UserDraft, UserId, UserPatch, UserRelation, UserStatus};
use crate::domain::DomainError;
use crate::domain::cache::key::{self, KeyField, KeyedFilter};
use crate::domain::query::{Page, SortOrder, comma_separated, contains_ignore_case};
use crate::domain::resource::{Resource, ResourceFilter};
use crate::domain::validation::normalize_email;

/// Secondary lookup name for users by email
pub const EMAIL_LOOKUP: &str = "email";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    Name,
    Email,
    CreatedAt,
}

impl std::fmt::Display for UserSortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::CreatedAt => "created_at",
        })
    }
}

/// Query over users
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserFilter {
    #[serde(deserialize_with = "comma_separated")]
    pub ids: Option<Vec<UserId>>,
    pub email: Option<String>,
    /// Case-insensitive match on the name
    pub q: Option<String>,
    pub status: Option<UserStatus>,
    pub sort_by: Option<UserSortField>,
    pub order: Option<SortOrder>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    #[serde(deserialize_with = "comma_separated")]
    pub include: Option<Vec<UserRelation>>,
}

impl KeyedFilter for UserFilter {
    const KEY_FIELDS: &'static [KeyField<Self>] = &[
        KeyField {
            name: "ids",
            serialize: |f| key::list(&f.ids),
        },
        KeyField {
            name: "email",
            serialize: |f| key::text(&f.email.as_deref().map(normalize_email)),
        },
        KeyField {
            name: "q",
            serialize: |f| key::text(&f.q),
        },
        KeyField {
            name: "status",
            serialize: |f| key::display(&f.status),
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
        KeyField {
            name: "include",
            serialize: |f| key::list(&f.include),
        },
    ];
}

impl ResourceFilter<User> for UserFilter {
    fn matches(&self, user: &User) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(user.id()) {
                return false;
            }
        }
        if let Some(email) = &self.email {
            if normalize_email(email) != user.email() {
                return false;
            }
        }
        if let Some(q) = &self.q {
            if !contains_ignore_case(user.name(), q) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if user.status() != status {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &User, b: &User) -> Ordering {
        let ordering = match self.sort_by.unwrap_or(UserSortField::CreatedAt) {
            UserSortField::Name => a.name().cmp(b.name()),
            UserSortField::Email => a.email().cmp(b.email()),
            UserSortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        };
        self.order
            .unwrap_or_default()
            .apply(ordering.then_with(|| a.id().cmp(b.id())))
    }

    fn page(&self) -> Page {
        Page::new(self.offset, self.limit)
    }

    fn includes(&self) -> &[UserRelation] {
        self.include.as_deref().unwrap_or(&[])
    }
}

impl Resource for User {
    const NAME: &'static str = "user";

    type Filter = UserFilter;
    type Relation = UserRelation;
    type Draft = UserDraft;
    type Patch = UserPatch;

    fn from_draft(draft: UserDraft) -> Result<Self, DomainError> {
        draft.build()
    }

    fn apply_patch(&mut self, patch: UserPatch) -> Result<(), DomainError> {
        patch.apply_to(self)
    }

    fn retain_relations(&mut self, include: &[UserRelation]) {
        self.keep_relations(include);
    }

    fn secondary_keys(&self) -> Vec<String> {
        vec![Self::KEYS.secondary(EMAIL_LOOKUP, self.email())]
    }
}
