// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use super::*;
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode as HttpStatusCode},
};
use brokerage_api::Destination;
use serde_json::{Value, json};
use tower::ServiceExt;

const TEST_PASSWORD: &str = "tr4d3-ready";

/// Helper to create test app state with in-memory persistence.
fn create_test_app_state() -> AppState {
    let mut persistence: Persistence =
        Persistence::new_in_memory().expect("Failed to create in-memory persistence");
    persistence.set_password_cost(4);
    AppState {
        persistence: Arc::new(Mutex::new(persistence)),
    }
}

/// Sends one request through the router and decodes the JSON body.
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (HttpStatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request: Request<Body> = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response: Response = app.clone().oneshot(request).await.unwrap();
    let status: HttpStatusCode = response.status();
    let headers: HeaderMap = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, value)
}

fn registration_body(username: &str, phone_number: &str) -> Value {
    json!({
        "username": username,
        "first_name": "Jane",
        "last_name": "Doe",
        "email": format!("{username}@example.com"),
        "password1": TEST_PASSWORD,
        "password2": TEST_PASSWORD,
        "phone_number": phone_number,
        "address": "1 Market St",
    })
}

/// Registers an applicant and returns their session token and account id.
async fn register_applicant(app: &Router, username: &str, phone_number: &str) -> (String, i64) {
    let (status, _, body) = send(
        app,
        "POST",
        "/register/",
        None,
        Some(registration_body(username, phone_number)),
    )
    .await;
    assert_eq!(status, HttpStatusCode::CREATED, "registration failed: {body}");
    (
        body["session_token"].as_str().unwrap().to_string(),
        body["account_id"].as_i64().unwrap(),
    )
}

/// Provisions a reviewer and logs them in.
async fn login_reviewer(app: &Router, app_state: &AppState) -> String {
    {
        let mut persistence = app_state.persistence.lock().await;
        create_superuser(
            &mut persistence,
            "reviewer",
            "reviewer@example.com",
            TEST_PASSWORD,
        )
        .unwrap();
    }

    let (status, _, body) = send(
        app,
        "POST",
        "/login/",
        None,
        Some(json!({ "username": "reviewer", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["role"], "superuser");
    body["session_token"].as_str().unwrap().to_string()
}

fn location(headers: &HeaderMap) -> &str {
    headers
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app: Router = build_router(create_test_app_state());

    let (status, _, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_creates_pending_application() {
    let app: Router = build_router(create_test_app_state());
    let (token, _) = register_applicant(&app, "jdoe", "123-456-7890").await;

    let (status, _, body) = send(&app, "GET", "/status/", Some(&token), None).await;

    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["status_display"], "Pending");
}

#[tokio::test]
async fn test_register_reports_every_invalid_field() {
    let app: Router = build_router(create_test_app_state());
    let mut request: Value = registration_body("jdoe", "not a phone");
    request["password2"] = json!("something-else");

    let (status, _, body) = send(&app, "POST", "/register/", None, Some(request)).await;

    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "form_invalid");
    let field_errors: &Value = &body["field_errors"];
    assert!(field_errors.get("phone_number").is_some());
    assert_eq!(
        field_errors["password2"][0],
        "The two password fields didn't match."
    );
}

#[tokio::test]
async fn test_register_duplicate_username_is_rejected() {
    let app: Router = build_router(create_test_app_state());
    register_applicant(&app, "jdoe", "123-456-7890").await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/register/",
        None,
        Some(registration_body("jdoe", "555-000-1111")),
    )
    .await;

    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(
        body["field_errors"]["username"][0],
        "A user with that username already exists."
    );
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app: Router = build_router(create_test_app_state());

    let (status, _, body) = send(&app, "GET", "/status/", None, None).await;

    assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_failed");
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let app: Router = build_router(create_test_app_state());

    let (status, _, _) = send(&app, "GET", "/", Some("session_bogus"), None).await;

    assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app: Router = build_router(create_test_app_state());
    register_applicant(&app, "jdoe", "123-456-7890").await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/login/",
        None,
        Some(json!({ "username": "jdoe", "password": "wrong-password" })),
    )
    .await;

    assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Please enter a correct username and password.")
    );
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app: Router = build_router(create_test_app_state());
    let (token, _) = register_applicant(&app, "jdoe", "123-456-7890").await;

    let (status, _, body) = send(&app, "GET", "/whoami/", Some(&token), None).await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["username"], "jdoe");
    assert_eq!(body["has_account"], true);

    let (status, _, _) = send(&app, "POST", "/logout/", Some(&token), None).await;
    assert_eq!(status, HttpStatusCode::NO_CONTENT);

    let (status, _, _) = send(&app, "GET", "/whoami/", Some(&token), None).await;
    assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_resubmit_while_pending_conflicts() {
    let app: Router = build_router(create_test_app_state());
    let (token, _) = register_applicant(&app, "jdoe", "123-456-7890").await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/",
        Some(&token),
        Some(json!({ "phone_number": "555-000-1111", "address": "2 Main St" })),
    )
    .await;

    assert_eq!(status, HttpStatusCode::CONFLICT);
    assert_eq!(body["error"], "domain_rule_violation");
}

#[tokio::test]
async fn test_application_form_shows_blocked_reason_while_pending() {
    let app: Router = build_router(create_test_app_state());
    let (token, account_id) = register_applicant(&app, "jdoe", "123-456-7890").await;

    let (status, _, body) = send(&app, "GET", "/", Some(&token), None).await;

    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["can_submit"], false);
    assert!(body["blocked_reason"].is_string());
    assert_eq!(body["account"]["account_id"], account_id);
}

#[tokio::test]
async fn test_applicant_cannot_use_admin_routes() {
    let app: Router = build_router(create_test_app_state());
    let (token, account_id) = register_applicant(&app, "jdoe", "123-456-7890").await;

    let (status, _, _) = send(&app, "GET", "/admin/accounts", Some(&token), None).await;
    assert_eq!(status, HttpStatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &app,
        "POST",
        "/admin/accounts/approve",
        Some(&token),
        Some(json!({ "account_ids": [account_id] })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::FORBIDDEN);

    let (status, _, _) = send(&app, "GET", "/admin-without-account/", Some(&token), None).await;
    assert_eq!(status, HttpStatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bulk_approve_redirects_applicant_to_congratulations() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    let (token, account_id) = register_applicant(&app, "jdoe", "123-456-7890").await;
    let staff_token: String = login_reviewer(&app, &app_state).await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/admin/accounts/approve",
        Some(&staff_token),
        Some(json!({ "account_ids": [account_id] })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["updated_count"], 1);
    assert_eq!(body["message"], "1 applications approved successfully.");

    let (status, headers, body) = send(&app, "GET", "/", Some(&token), None).await;
    assert_eq!(status, HttpStatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/congratulations/");
    assert_eq!(body["redirect"], "/congratulations/");

    let (status, _, body) = send(&app, "GET", "/congratulations/", Some(&token), None).await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["username"], "jdoe");
    assert!(body["approved_at"].is_string());
}

#[tokio::test]
async fn test_bulk_approve_with_empty_selection_is_rejected() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    let staff_token: String = login_reviewer(&app, &app_state).await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/admin/accounts/approve",
        Some(&staff_token),
        Some(json!({ "account_ids": [] })),
    )
    .await;

    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["account_ids"].is_array());
}

#[tokio::test]
async fn test_pending_applicant_is_kept_off_congratulations() {
    let app: Router = build_router(create_test_app_state());
    let (token, _) = register_applicant(&app, "jdoe", "123-456-7890").await;

    let (status, headers, _) = send(&app, "GET", "/congratulations/", Some(&token), None).await;

    assert_eq!(status, HttpStatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/status/");
}

#[tokio::test]
async fn test_every_redirect_target_is_routed() {
    let app: Router = build_router(create_test_app_state());
    let (token, _) = register_applicant(&app, "jdoe", "555-000-0001").await;

    for destination in [
        Destination::Status,
        Destination::Congratulations,
        Destination::AdminWithoutAccount,
    ] {
        let (status, _, _) = send(&app, "GET", destination.path(), Some(&token), None).await;
        assert_ne!(status, HttpStatusCode::NOT_FOUND, "{destination:?}");
        assert_ne!(status, HttpStatusCode::METHOD_NOT_ALLOWED, "{destination:?}");
    }
}

#[tokio::test]
async fn test_reviewer_without_account_is_redirected() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    let staff_token: String = login_reviewer(&app, &app_state).await;

    let (status, headers, _) = send(&app, "GET", "/status/", Some(&staff_token), None).await;
    assert_eq!(status, HttpStatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/admin-without-account/");

    let (status, _, body) = send(
        &app,
        "GET",
        "/admin-without-account/",
        Some(&staff_token),
        None,
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["username"], "reviewer");
}

#[tokio::test]
async fn test_applicant_without_account_gets_not_found() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    {
        let mut persistence = app_state.persistence.lock().await;
        persistence
            .create_user(&NewUser {
                username: String::from("orphan"),
                email: String::from("orphan@example.com"),
                first_name: String::from("Orphan"),
                last_name: String::from("User"),
                password: String::from(TEST_PASSWORD),
                is_staff: false,
                is_superuser: false,
            })
            .unwrap();
    }
    let (_, _, body) = send(
        &app,
        "POST",
        "/login/",
        None,
        Some(json!({ "username": "orphan", "password": TEST_PASSWORD })),
    )
    .await;
    let token: &str = body["session_token"].as_str().unwrap();

    let (status, _, body) = send(&app, "GET", "/status/", Some(token), None).await;

    assert_eq!(status, HttpStatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_additional_docs_resubmission_through_supplement() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    let (token, account_id) = register_applicant(&app, "jdoe", "123-456-7890").await;
    let staff_token: String = login_reviewer(&app, &app_state).await;

    let (status, _, body) = send(
        &app,
        "POST",
        &format!("/admin/accounts/{account_id}"),
        Some(&staff_token),
        Some(json!({
            "status": "additional_docs_required",
            "additional_docs_reason": "Please upload a utility bill",
        })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK, "review failed: {body}");
    assert_eq!(body["account"]["reviewed_by_username"], "reviewer");

    let (status, _, body) = send(&app, "GET", "/supplement/", Some(&token), None).await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["can_submit"], true);

    let (status, headers, body) = send(
        &app,
        "POST",
        "/supplement/",
        Some(&token),
        Some(json!({ "phone_number": "555-000-1111", "address": "2 Main St" })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/status/");
    assert_eq!(body["message"], "Application submitted successfully!");

    let (_, _, body) = send(&app, "GET", "/status/", Some(&token), None).await;
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_review_without_required_reason_is_rejected() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    let (_, account_id) = register_applicant(&app, "jdoe", "123-456-7890").await;
    let staff_token: String = login_reviewer(&app, &app_state).await;

    let (status, _, body) = send(
        &app,
        "POST",
        &format!("/admin/accounts/{account_id}"),
        Some(&staff_token),
        Some(json!({ "status": "rejected", "rejection_reason": "   " })),
    )
    .await;

    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert!(body["field_errors"].is_object());

    let (_, _, body) = send(
        &app,
        "GET",
        &format!("/admin/accounts/{account_id}"),
        Some(&staff_token),
        None,
    )
    .await;
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_unknown_account_is_not_found_for_reviewer() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    let staff_token: String = login_reviewer(&app, &app_state).await;

    let (status, _, _) = send(&app, "GET", "/admin/accounts/999", Some(&staff_token), None).await;

    assert_eq!(status, HttpStatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_and_audit_timeline() {
    let app_state: AppState = create_test_app_state();
    let app: Router = build_router(app_state.clone());
    let (_, first_id) = register_applicant(&app, "jdoe", "123-456-7890").await;
    register_applicant(&app, "asmith", "555-000-1111").await;
    let staff_token: String = login_reviewer(&app, &app_state).await;

    send(
        &app,
        "POST",
        "/admin/accounts/approve",
        Some(&staff_token),
        Some(json!({ "account_ids": [first_id] })),
    )
    .await;

    let (status, _, body) = send(
        &app,
        "GET",
        "/admin/accounts?status=pending",
        Some(&staff_token),
        None,
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["accounts"][0]["username"], "asmith");

    let (status, _, body) = send(
        &app,
        "GET",
        &format!("/admin/accounts/{first_id}/audit"),
        Some(&staff_token),
        None,
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK);
    let actions: Vec<&str> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["AccountCreated", "BulkApprove"]);
    assert_eq!(body["events"][1]["cause_description"], "POST /admin/accounts/approve");
}

#[tokio::test]
async fn test_create_superuser_enforces_password_policy() {
    let app_state: AppState = create_test_app_state();
    let mut persistence = app_state.persistence.lock().await;

    let result = create_superuser(&mut persistence, "admin", "admin@example.com", "12345678");

    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::PasswordPolicyViolation { .. })
    ));
    assert!(persistence.get_user_by_username("admin").unwrap().is_none());
}
