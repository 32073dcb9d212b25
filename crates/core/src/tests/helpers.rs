// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use brokerage_audit::{Actor, Cause};
use brokerage_domain::{Account, AccountOwner, AccountStatus, ContactDetails};
use time::OffsetDateTime;
use time::macros::datetime;

pub fn create_test_reviewer() -> Actor {
    Actor::with_user(7, "reviewer", "staff")
}

pub fn create_other_reviewer() -> Actor {
    Actor::with_user(8, "second-reviewer", "staff")
}

pub fn create_test_applicant_actor() -> Actor {
    Actor::with_user(1, "applicant", "user")
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Review request"))
}

pub fn create_test_owner() -> AccountOwner {
    AccountOwner::new(1, "applicant")
}

pub fn create_test_contact() -> ContactDetails {
    ContactDetails::new("555-123-4567", "1 Market St")
}

pub fn created_at() -> OffsetDateTime {
    datetime!(2026-03-01 12:00 UTC)
}

pub fn review_time() -> OffsetDateTime {
    datetime!(2026-03-02 09:30 UTC)
}

pub fn later_time() -> OffsetDateTime {
    datetime!(2026-03-05 16:45 UTC)
}

/// A persisted account in the given status with whatever reason that
/// status needs.
pub fn create_persisted_account(account_id: i64, status: AccountStatus) -> Account {
    let mut account: Account =
        Account::new_application(&create_test_owner(), create_test_contact(), created_at())
            .with_id(account_id);
    account.status = status;
    match status {
        AccountStatus::Rejected => {
            account.rejection_reason = Some(String::from("Identity could not be verified"));
        }
        AccountStatus::AdditionalDocsRequired => {
            account.additional_docs_reason = Some(String::from("Upload a utility bill"));
        }
        AccountStatus::Pending | AccountStatus::Approved => {}
    }
    account
}
