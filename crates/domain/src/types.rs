// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::account_status::AccountStatus;
use time::OffsetDateTime;

/// The user an account belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountOwner {
    /// The owning user's identifier.
    pub user_id: i64,
    /// The owning user's login name.
    pub username: String,
}

impl AccountOwner {
    /// Creates a new `AccountOwner`.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The owning user's identifier
    /// * `username` - The owning user's login name
    #[must_use]
    pub fn new(user_id: i64, username: &str) -> Self {
        Self {
            user_id,
            username: username.to_string(),
        }
    }
}

/// Contact details submitted with an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    /// Phone number as entered; unique across accounts.
    pub phone_number: String,
    /// Free-text postal address.
    pub address: String,
}

impl ContactDetails {
    /// Creates new contact details.
    ///
    /// # Arguments
    ///
    /// * `phone_number` - The phone number as entered
    /// * `address` - The postal address
    #[must_use]
    pub fn new(phone_number: &str, address: &str) -> Self {
        Self {
            phone_number: phone_number.to_string(),
            address: address.to_string(),
        }
    }
}

/// A brokerage account application.
///
/// Each user holds at most one account. The reviewer and timestamp fields
/// are derived by the save hook and are never set directly by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// The canonical identifier. `None` until persisted.
    pub account_id: Option<i64>,
    /// The owning user's identifier.
    pub user_id: i64,
    /// The owning user's login name.
    pub username: String,
    /// Contact details.
    pub contact: ContactDetails,
    /// Current lifecycle status.
    pub status: AccountStatus,
    /// Why the application was rejected.
    pub rejection_reason: Option<String>,
    /// Which additional documents the reviewer asked for.
    pub additional_docs_reason: Option<String>,
    /// When the account was approved. Set only while approved.
    pub approved_at: Option<OffsetDateTime>,
    /// The reviewer first attributed with a decision.
    pub reviewed_by: Option<i64>,
    /// When `reviewed_by` was attributed.
    pub reviewed_at: Option<OffsetDateTime>,
    /// When the account was created.
    pub created_at: OffsetDateTime,
    /// When the account was last saved.
    pub updated_at: OffsetDateTime,
}

impl Account {
    /// Creates a new pending application for an owner.
    ///
    /// # Arguments
    ///
    /// * `owner` - The user submitting the application
    /// * `contact` - The submitted contact details
    /// * `now` - The creation time
    #[must_use]
    pub fn new_application(owner: &AccountOwner, contact: ContactDetails, now: OffsetDateTime) -> Self {
        Self {
            account_id: None,
            user_id: owner.user_id,
            username: owner.username.clone(),
            contact,
            status: AccountStatus::Pending,
            rejection_reason: None,
            additional_docs_reason: None,
            approved_at: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy of this account carrying its persisted identifier.
    #[must_use]
    pub fn with_id(mut self, account_id: i64) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Returns the owner of this account.
    #[must_use]
    pub fn owner(&self) -> AccountOwner {
        AccountOwner::new(self.user_id, &self.username)
    }

    /// Returns true if the account is approved.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == AccountStatus::Approved
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.username, self.status.display_name())
    }
}
