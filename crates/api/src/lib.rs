// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for brokerage account applications.
//!
//! This crate sits between the HTTP server and the persistence layer. It
//! authenticates users, checks roles, validates submitted forms, and turns
//! lower-layer errors into field-scoped API errors.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod error;
mod forms;
mod handlers;
mod navigation;
mod password_policy;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedUser, AuthenticationService, AuthorizationService, Role};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error, translate_persistence_error,
};
pub use forms::{ApplicationRequest, RegistrationRequest, validate_form};
pub use handlers::{
    APPLICATION_SUBMITTED_MESSAGE, REGISTRATION_SUCCESS_MESSAGE, admin_without_account,
    application_form, application_status, bulk_approve_accounts, congratulations, get_account,
    get_account_audit_timeline, list_accounts, login, logout, register, review_account,
    submit_application, whoami,
};
pub use navigation::{Destination, Navigation};
pub use password_policy::{PasswordIdentity, PasswordPolicy, PasswordPolicyError};
pub use request_response::{
    AccountAuditTimelineResponse, AccountInfo, AccountSummary, AdminWithoutAccountView,
    ApplicationFormView, ApplicationStatusView, AuditEventInfo, BulkApproveRequest,
    BulkApproveResponse, CongratulationsView, ListAccountsRequest, ListAccountsResponse,
    LoginRequest, LoginResponse, RegisterResponse, ReviewAccountRequest, ReviewAccountResponse,
    WhoAmIResponse,
};
