// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Self-service registration tests.

use brokerage_domain::{Account, AccountStatus};
use brokerage_persistence::Persistence;

use crate::{
    ApiError, AuthenticationService, RegisterResponse, RegistrationRequest,
    REGISTRATION_SUCCESS_MESSAGE, Role, register,
};

use super::helpers::{register_applicant, registration_request, request_time, setup_test_persistence};

fn form_errors(result: Result<RegisterResponse, ApiError>) -> std::collections::BTreeMap<String, Vec<String>> {
    match result {
        Err(ApiError::FormInvalid { errors }) => errors,
        other => panic!("expected a form error, got {other:?}"),
    }
}

#[test]
fn test_registration_creates_pending_application_and_logs_in() {
    let mut persistence: Persistence = setup_test_persistence();

    let response: RegisterResponse = register(
        &mut persistence,
        &registration_request("jdoe", "555-123-4567"),
        request_time(),
    )
    .unwrap();

    assert_eq!(response.message, REGISTRATION_SUCCESS_MESSAGE);
    assert_eq!(response.username, "jdoe");

    let account: Account = persistence
        .get_account_by_id(response.account_id)
        .unwrap()
        .unwrap();
    assert_eq!(account.user_id, response.user_id);
    assert_eq!(account.status, AccountStatus::Pending);
    assert_eq!(account.contact.phone_number, "555-123-4567");
    assert_eq!(account.reviewed_by, None);

    let (user, _) = AuthenticationService::validate_session(
        &mut persistence,
        &response.session_token,
        request_time(),
    )
    .unwrap();
    assert_eq!(user.user_id, response.user_id);
    assert_eq!(user.role, Role::Applicant);
}

#[test]
fn test_registration_rejects_taken_username() {
    let mut persistence: Persistence = setup_test_persistence();
    register_applicant(&mut persistence, "jdoe", "555-123-4567");

    let errors = form_errors(register(
        &mut persistence,
        &registration_request("jdoe", "555-987-6543"),
        request_time(),
    ));

    assert_eq!(
        errors["username"],
        vec![String::from("A user with that username already exists.")]
    );
}

#[test]
fn test_registration_rejects_taken_phone_number_and_writes_nothing() {
    let mut persistence: Persistence = setup_test_persistence();
    register_applicant(&mut persistence, "jdoe", "555-123-4567");

    let errors = form_errors(register(
        &mut persistence,
        &registration_request("asmith", "555-123-4567"),
        request_time(),
    ));

    assert_eq!(
        errors["phone_number"],
        vec![String::from("Account with this Phone number already exists.")]
    );
    assert!(persistence.get_user_by_username("asmith").unwrap().is_none());
}

#[test]
fn test_registration_reports_password_problems_on_confirmation_field() {
    let mut persistence: Persistence = setup_test_persistence();

    let mismatched: RegistrationRequest = RegistrationRequest {
        password2: String::from("something-else"),
        ..registration_request("jdoe", "555-123-4567")
    };
    let errors = form_errors(register(&mut persistence, &mismatched, request_time()));
    assert_eq!(
        errors["password2"],
        vec![String::from("The two password fields didn't match.")]
    );

    let numeric: RegistrationRequest = RegistrationRequest {
        password1: String::from("12345678"),
        password2: String::from("12345678"),
        ..registration_request("jdoe", "555-123-4567")
    };
    let errors = form_errors(register(&mut persistence, &numeric, request_time()));
    assert_eq!(
        errors["password2"],
        vec![String::from("This password is entirely numeric.")]
    );
}

#[test]
fn test_registration_reports_all_invalid_fields_together() {
    let mut persistence: Persistence = setup_test_persistence();

    let request: RegistrationRequest = RegistrationRequest {
        first_name: String::new(),
        email: String::from("nope"),
        password1: String::from("short"),
        password2: String::from("short"),
        phone_number: String::from("not a phone"),
        ..registration_request("jdoe", "555-123-4567")
    };

    let errors = form_errors(register(&mut persistence, &request, request_time()));

    assert_eq!(
        errors.keys().map(String::as_str).collect::<Vec<&str>>(),
        vec!["email", "first_name", "password2", "phone_number"]
    );
    assert!(persistence.get_user_by_username("jdoe").unwrap().is_none());
}
