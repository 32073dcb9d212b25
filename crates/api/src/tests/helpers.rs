// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use brokerage_audit::Cause;
use brokerage_domain::Account;
use brokerage_persistence::{NewUser, Persistence, UserData};
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{
    AuthenticatedUser, RegisterResponse, RegistrationRequest, ReviewAccountRequest, register,
    review_account,
};

pub const TEST_PASSWORD: &str = "tr4d3-ready";

pub fn setup_test_persistence() -> Persistence {
    let mut persistence: Persistence =
        Persistence::new_in_memory().expect("Failed to create in-memory persistence");
    persistence.set_password_cost(4);
    persistence
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-456"), String::from("API request"))
}

pub fn request_time() -> OffsetDateTime {
    datetime!(2026-03-01 12:00 UTC)
}

pub fn later_time() -> OffsetDateTime {
    datetime!(2026-03-02 09:30 UTC)
}

pub fn registration_request(username: &str, phone_number: &str) -> RegistrationRequest {
    RegistrationRequest {
        username: username.to_string(),
        first_name: String::from("Jane"),
        last_name: String::from("Doe"),
        email: format!("{username}@example.com"),
        password1: String::from(TEST_PASSWORD),
        password2: String::from(TEST_PASSWORD),
        phone_number: phone_number.to_string(),
        address: String::from("1 Market St"),
    }
}

/// Registers an applicant through the handler and returns them.
pub fn register_applicant(
    persistence: &mut Persistence,
    username: &str,
    phone_number: &str,
) -> (AuthenticatedUser, RegisterResponse) {
    let response: RegisterResponse = register(
        persistence,
        &registration_request(username, phone_number),
        request_time(),
    )
    .expect("Registration failed");
    let user: UserData = persistence
        .get_user_by_id(response.user_id)
        .unwrap()
        .expect("Registered user not found");
    (AuthenticatedUser::from_user(&user), response)
}

fn create_user(persistence: &mut Persistence, username: &str, is_staff: bool) -> AuthenticatedUser {
    let new_user: NewUser = NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: String::from("Test"),
        last_name: String::from("User"),
        password: String::from(TEST_PASSWORD),
        is_staff,
        is_superuser: false,
    };
    let user_id: i64 = persistence
        .create_user(&new_user)
        .expect("Failed to create user");
    let user: UserData = persistence.get_user_by_id(user_id).unwrap().unwrap();
    AuthenticatedUser::from_user(&user)
}

/// Creates a staff reviewer with no account of their own.
pub fn create_staff(persistence: &mut Persistence, username: &str) -> AuthenticatedUser {
    create_user(persistence, username, true)
}

/// Creates an applicant who has not submitted an application.
pub fn create_applicant_without_account(
    persistence: &mut Persistence,
    username: &str,
) -> AuthenticatedUser {
    create_user(persistence, username, false)
}

pub fn review_request(status: &str) -> ReviewAccountRequest {
    ReviewAccountRequest {
        status: status.to_string(),
        rejection_reason: None,
        additional_docs_reason: None,
        phone_number: None,
        address: None,
    }
}

/// Moves an account to `status` as `reviewer`, with reasons where needed.
pub fn review_to(
    persistence: &mut Persistence,
    reviewer: &AuthenticatedUser,
    account_id: i64,
    status: &str,
) {
    let mut request: ReviewAccountRequest = review_request(status);
    request.rejection_reason = Some(String::from("incomplete docs"));
    request.additional_docs_reason = Some(String::from("Please upload a utility bill"));
    review_account(
        persistence,
        reviewer,
        account_id,
        &request,
        &create_test_cause(),
        later_time(),
    )
    .expect("Review failed");
}

pub fn account_of(persistence: &mut Persistence, user: &AuthenticatedUser) -> Account {
    persistence
        .get_account_for_user(user.user_id)
        .unwrap()
        .expect("Account not found")
}
