// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use brokerage_domain::{Account, AccountStatus, ContactDetails};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Number of accounts per page in the review list.
pub const ACCOUNTS_PER_PAGE: usize = 25;

/// Serializable representation of an Actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorData {
    pub id: String,
    pub actor_type: String,
    pub user_id: Option<i64>,
    pub username: Option<String>,
}

/// Serializable representation of a Cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CauseData {
    pub id: String,
    pub description: String,
}

/// Serializable representation of an Action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    pub name: String,
    pub details: Option<String>,
}

/// Serializable representation of a `StateSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshotData {
    pub data: String,
}

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: String,
    pub last_login_at: Option<String>,
}

impl UserData {
    /// Returns true if the user may review applications.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}

/// A stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub session_id: i64,
    pub session_token: String,
    pub user_id: i64,
    pub created_at: String,
    pub last_activity_at: String,
    pub expires_at: String,
}

/// A user to be created. The password is hashed before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// A registration: a new user together with their first application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub user: NewUser,
    pub contact: ContactDetails,
}

/// Filters for the review list. Every filter is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFilter {
    /// Only accounts in this status.
    pub status: Option<AccountStatus>,
    /// Only accounts attributed to this reviewer.
    pub reviewed_by: Option<i64>,
    /// Case-insensitive substring of username, email or phone number.
    pub search: Option<String>,
    /// Only accounts created at or after this time.
    pub created_after: Option<OffsetDateTime>,
    /// Only accounts created before this time.
    pub created_before: Option<OffsetDateTime>,
    /// 1-based page number.
    pub page: usize,
}

impl Default for AccountFilter {
    fn default() -> Self {
        Self {
            status: None,
            reviewed_by: None,
            search: None,
            created_after: None,
            created_before: None,
            page: 1,
        }
    }
}

/// One page of the review list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPage {
    pub accounts: Vec<Account>,
    /// Number of accounts matching the filter across all pages.
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}
