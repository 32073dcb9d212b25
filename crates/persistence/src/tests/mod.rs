// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod bulk_approve_tests;
mod initialization_tests;

use crate::{NewRegistration, NewUser, Persistence};
use brokerage_audit::{Actor, Cause};
use brokerage_domain::{Account, ContactDetails};
use time::OffsetDateTime;
use time::macros::datetime;

/// An isolated in-memory database with a cheap bcrypt cost.
pub fn create_test_persistence() -> Persistence {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    persistence.set_password_cost(4);
    persistence
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("test-cause"), String::from("Test operation"))
}

pub fn registration_time() -> OffsetDateTime {
    datetime!(2026-03-01 12:00 UTC)
}

pub fn review_time() -> OffsetDateTime {
    datetime!(2026-03-02 09:30 UTC)
}

pub fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: String::from("Test"),
        last_name: String::from("User"),
        password: String::from("correct-horse-battery"),
        is_staff: false,
        is_superuser: false,
    }
}

/// Registers an applicant with a pending application.
pub fn register_applicant(
    persistence: &mut Persistence,
    username: &str,
    phone_number: &str,
) -> Account {
    register_applicant_at(persistence, username, phone_number, registration_time())
}

pub fn register_applicant_at(
    persistence: &mut Persistence,
    username: &str,
    phone_number: &str,
    now: OffsetDateTime,
) -> Account {
    let registration: NewRegistration = NewRegistration {
        user: new_user(username),
        contact: ContactDetails::new(phone_number, "1 Market St"),
    };
    persistence
        .register_user_with_account(&registration, now)
        .unwrap()
}

/// Creates a staff user and returns the actor for them.
pub fn create_reviewer(persistence: &mut Persistence, username: &str) -> Actor {
    let mut user: NewUser = new_user(username);
    user.is_staff = true;
    let user_id: i64 = persistence.create_user(&user).unwrap();
    Actor::with_user(user_id, username, "staff")
}
