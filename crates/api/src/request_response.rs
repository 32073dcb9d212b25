// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Forms with field validation live in [`crate::forms`].

use serde::{Deserialize, Serialize};

/// API request to log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// The login name.
    pub username: String,
    /// The password.
    pub password: String,
}

/// API response for a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// The bearer token for subsequent requests.
    pub session_token: String,
    /// The login name.
    pub username: String,
    /// The user's role (`user`, `staff` or `superuser`).
    pub role: String,
    /// When the session expires.
    pub expires_at: String,
}

/// API response for a successful registration.
///
/// Registration logs the new user in, so the response carries a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// The bearer token for subsequent requests.
    pub session_token: String,
    /// The new user's identifier.
    pub user_id: i64,
    /// The new account's identifier.
    pub account_id: i64,
    /// The login name.
    pub username: String,
    /// A success message.
    pub message: String,
}

/// API response describing the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    /// The user's identifier.
    pub user_id: i64,
    /// The login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// The user's role (`user`, `staff` or `superuser`).
    pub role: String,
    /// Whether the user may review applications.
    pub is_privileged: bool,
    /// Whether the user holds an account.
    pub has_account: bool,
}

/// Full account information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// The account identifier.
    pub account_id: i64,
    /// The owner's identifier.
    pub user_id: i64,
    /// The owner's login name.
    pub username: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Postal address.
    pub address: String,
    /// Status value (e.g. `additional_docs_required`).
    pub status: String,
    /// Status label (e.g. "Additional Documents Required").
    pub status_display: String,
    /// Why the application was rejected.
    pub rejection_reason: Option<String>,
    /// Which documents the reviewer asked for.
    pub additional_docs_reason: Option<String>,
    /// When the account was approved.
    pub approved_at: Option<String>,
    /// The reviewer's identifier.
    pub reviewed_by: Option<i64>,
    /// The reviewer's login name, when still on record.
    pub reviewed_by_username: Option<String>,
    /// When the reviewer was attributed.
    pub reviewed_at: Option<String>,
    /// When the account was created.
    pub created_at: String,
    /// When the account was last saved.
    pub updated_at: String,
}

/// The application form page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationFormView {
    /// The existing application, if any.
    pub account: Option<AccountInfo>,
    /// Whether the form may be submitted in the current status.
    pub can_submit: bool,
    /// Why submission is blocked, when it is.
    pub blocked_reason: Option<String>,
}

/// The application status page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStatusView {
    /// The account identifier.
    pub account_id: i64,
    /// Status value.
    pub status: String,
    /// Status label.
    pub status_display: String,
    /// What the applicant should expect or do next.
    pub guidance: String,
    /// Why the application was rejected.
    pub rejection_reason: Option<String>,
    /// Which documents the reviewer asked for.
    pub additional_docs_reason: Option<String>,
}

/// The congratulations page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CongratulationsView {
    /// The owner's login name.
    pub username: String,
    /// When the account was approved.
    pub approved_at: Option<String>,
    /// The page text.
    pub message: String,
}

/// The informational page for reviewers without an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminWithoutAccountView {
    /// The reviewer's login name.
    pub username: String,
    /// The page text.
    pub message: String,
}

/// Query parameters for the admin account list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAccountsRequest {
    /// Only accounts in this status.
    pub status: Option<String>,
    /// Only accounts attributed to this reviewer.
    pub reviewed_by: Option<i64>,
    /// Matches username, email or phone number.
    pub q: Option<String>,
    /// Only accounts created at or after this UTC time (`YYYY-MM-DDTHH:MM:SSZ`).
    pub created_after: Option<String>,
    /// Only accounts created before this UTC time.
    pub created_before: Option<String>,
    /// 1-based page number.
    pub page: Option<usize>,
}

/// One row in the admin account list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    /// The account identifier.
    pub account_id: i64,
    /// The owner's login name.
    pub username: String,
    /// Status value.
    pub status: String,
    /// Status label.
    pub status_display: String,
    /// The reviewer's identifier.
    pub reviewed_by: Option<i64>,
    /// The reviewer's login name.
    pub reviewed_by_username: Option<String>,
    /// When the reviewer was attributed.
    pub reviewed_at: Option<String>,
    /// When the account was created.
    pub created_at: String,
    /// When the account was last saved.
    pub updated_at: String,
}

/// API response for the admin account list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAccountsResponse {
    /// The accounts on this page.
    pub accounts: Vec<AccountSummary>,
    /// The number of matching accounts across all pages.
    pub total: usize,
    /// The page returned.
    pub page: usize,
    /// The page size.
    pub per_page: usize,
    /// The number of pages.
    pub num_pages: usize,
}

/// API request from the admin change form.
///
/// Derived fields (reviewer, timestamps) are not accepted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAccountRequest {
    /// The new status value.
    pub status: String,
    /// Why the application is rejected.
    #[serde(default)]
    pub rejection_reason: Option<String>,
    /// Which documents are needed.
    #[serde(default)]
    pub additional_docs_reason: Option<String>,
    /// A corrected phone number.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// A corrected address.
    #[serde(default)]
    pub address: Option<String>,
}

/// API response for a saved review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAccountResponse {
    /// The account after the save.
    pub account: AccountInfo,
    /// A success message.
    pub message: String,
}

/// API request for the bulk approve action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkApproveRequest {
    /// The selected accounts.
    pub account_ids: Vec<i64>,
}

/// API response for the bulk approve action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkApproveResponse {
    /// The number of accounts updated.
    pub updated_count: usize,
    /// A success message.
    pub message: String,
}

/// One audit event in an account's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEventInfo {
    /// The event identifier.
    pub event_id: i64,
    /// The actor's type (`user`, `staff`, `superuser` or `system`).
    pub actor_type: String,
    /// The acting user's identifier.
    pub actor_user_id: Option<i64>,
    /// The acting user's login name.
    pub actor_username: Option<String>,
    /// The cause identifier.
    pub cause_id: String,
    /// The cause description.
    pub cause_description: String,
    /// The action name.
    pub action: String,
    /// Action details.
    pub details: Option<String>,
    /// State before the change.
    pub before: String,
    /// State after the change.
    pub after: String,
}

/// API response for an account's audit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAuditTimelineResponse {
    /// The account identifier.
    pub account_id: i64,
    /// Events in the order they were recorded.
    pub events: Vec<AuditEventInfo>,
}
