// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Login, session and role tests.

use brokerage_audit::Actor;
use brokerage_persistence::Persistence;
use time::Duration;

use crate::{
    ApiError, AuthError, AuthenticatedUser, AuthenticationService, AuthorizationService,
    LoginRequest, LoginResponse, Role, login, logout, whoami,
};

use super::helpers::{
    TEST_PASSWORD, create_staff, register_applicant, request_time, setup_test_persistence,
};

fn login_request(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[test]
fn test_login_creates_session_for_valid_credentials() {
    let mut persistence: Persistence = setup_test_persistence();
    register_applicant(&mut persistence, "jdoe", "555-123-4567");

    let response: LoginResponse = login(
        &mut persistence,
        &login_request("jdoe", TEST_PASSWORD),
        request_time(),
    )
    .unwrap();

    assert_eq!(response.username, "jdoe");
    assert_eq!(response.role, "user");
    assert_eq!(response.expires_at, "2026-03-15T12:00:00Z");

    let (user, _) = AuthenticationService::validate_session(
        &mut persistence,
        &response.session_token,
        request_time(),
    )
    .unwrap();
    assert_eq!(user.username, "jdoe");
    assert_eq!(user.role, Role::Applicant);
}

#[test]
fn test_login_rejects_wrong_password() {
    let mut persistence: Persistence = setup_test_persistence();
    register_applicant(&mut persistence, "jdoe", "555-123-4567");

    let result: Result<LoginResponse, ApiError> = login(
        &mut persistence,
        &login_request("jdoe", "not-the-password"),
        request_time(),
    );

    assert!(matches!(
        result,
        Err(ApiError::AuthenticationFailed { .. })
    ));
}

#[test]
fn test_login_rejects_unknown_user() {
    let mut persistence: Persistence = setup_test_persistence();

    let result: Result<LoginResponse, ApiError> = login(
        &mut persistence,
        &login_request("nobody", TEST_PASSWORD),
        request_time(),
    );

    assert!(matches!(
        result,
        Err(ApiError::AuthenticationFailed { .. })
    ));
}

#[test]
fn test_session_expires_after_fourteen_days() {
    let mut persistence: Persistence = setup_test_persistence();
    let (_, registered) = register_applicant(&mut persistence, "jdoe", "555-123-4567");

    let still_valid = AuthenticationService::validate_session(
        &mut persistence,
        &registered.session_token,
        request_time() + Duration::days(14),
    );
    assert!(still_valid.is_ok());

    let expired = AuthenticationService::validate_session(
        &mut persistence,
        &registered.session_token,
        request_time() + Duration::days(14) + Duration::seconds(1),
    );
    assert_eq!(
        expired,
        Err(AuthError::AuthenticationFailed {
            reason: String::from("Session expired")
        })
    );
}

#[test]
fn test_logout_invalidates_session() {
    let mut persistence: Persistence = setup_test_persistence();
    let (_, registered) = register_applicant(&mut persistence, "jdoe", "555-123-4567");

    logout(&mut persistence, &registered.session_token).unwrap();

    let result = AuthenticationService::validate_session(
        &mut persistence,
        &registered.session_token,
        request_time(),
    );
    assert!(result.is_err());
}

#[test]
fn test_whoami_reports_role_and_account() {
    let mut persistence: Persistence = setup_test_persistence();
    let (applicant, registered) = register_applicant(&mut persistence, "jdoe", "555-123-4567");
    let staff: AuthenticatedUser = create_staff(&mut persistence, "reviewer");

    let (_, applicant_data) = AuthenticationService::validate_session(
        &mut persistence,
        &registered.session_token,
        request_time(),
    )
    .unwrap();
    let response = whoami(&mut persistence, &applicant, &applicant_data).unwrap();
    assert_eq!(response.role, "user");
    assert!(!response.is_privileged);
    assert!(response.has_account);
    assert_eq!(response.email, "jdoe@example.com");

    let staff_data = persistence.get_user_by_id(staff.user_id).unwrap().unwrap();
    let response = whoami(&mut persistence, &staff, &staff_data).unwrap();
    assert_eq!(response.role, "staff");
    assert!(response.is_privileged);
    assert!(!response.has_account);
}

#[test]
fn test_only_reviewers_may_review() {
    let applicant: AuthenticatedUser = AuthenticatedUser::new(1, "jdoe", Role::Applicant);
    let staff: AuthenticatedUser = AuthenticatedUser::new(2, "reviewer", Role::Staff);
    let superuser: AuthenticatedUser = AuthenticatedUser::new(3, "root", Role::Superuser);

    assert_eq!(
        AuthorizationService::authorize_review(&applicant),
        Err(AuthError::Unauthorized {
            action: String::from("review_account"),
            required_role: String::from("Staff"),
        })
    );
    assert!(AuthorizationService::authorize_bulk_approve(&applicant).is_err());

    assert!(AuthorizationService::authorize_review(&staff).is_ok());
    assert!(AuthorizationService::authorize_bulk_approve(&superuser).is_ok());
}

#[test]
fn test_audit_actor_carries_user_and_role() {
    let staff: AuthenticatedUser = AuthenticatedUser::new(7, "reviewer", Role::Staff);

    let actor: Actor = staff.to_audit_actor();

    assert_eq!(actor.id, "7");
    assert_eq!(actor.actor_type, "staff");
    assert_eq!(actor.user_id, Some(7));
    assert_eq!(actor.username.as_deref(), Some("reviewer"));
}
