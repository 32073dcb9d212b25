// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for the applicant pages and the admin interface.
//!
//! Every handler receives the authenticated user explicitly. Page handlers
//! return a [`Navigation`] so the server can either render the view or
//! redirect.

use std::collections::BTreeMap;
use std::str::FromStr;

use brokerage::{Command, CoreError, apply};
use brokerage_audit::{AuditEvent, Cause};
use brokerage_domain::{
    Account, AccountOwner, AccountStatus, ContactDetails, validate_contact_details,
};
use brokerage_persistence::{
    AccountFilter, AccountPage, NewRegistration, NewUser, Persistence, SessionData, UserData,
    format_timestamp, parse_timestamp,
};
use time::OffsetDateTime;
use tracing::info;
use validator::Validate;

use crate::auth::{AuthenticatedUser, AuthenticationService, AuthorizationService};
use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::forms::{
    ApplicationRequest, RegistrationRequest, collect_field_errors, merge_field_errors,
    validate_form,
};
use crate::navigation::{Destination, Navigation};
use crate::password_policy::{PasswordIdentity, PasswordPolicy, PasswordPolicyError};
use crate::request_response::{
    AccountAuditTimelineResponse, AccountInfo, AccountSummary, AdminWithoutAccountView,
    ApplicationFormView, ApplicationStatusView, AuditEventInfo, BulkApproveRequest,
    BulkApproveResponse, CongratulationsView, ListAccountsRequest, ListAccountsResponse,
    LoginRequest, LoginResponse, RegisterResponse, ReviewAccountRequest, ReviewAccountResponse,
    WhoAmIResponse,
};

/// Shown after a successful registration.
pub const REGISTRATION_SUCCESS_MESSAGE: &str =
    "Registration and application submitted successfully! Please wait for approval.";

/// Shown after the applicant submits the application form.
pub const APPLICATION_SUBMITTED_MESSAGE: &str = "Application submitted successfully!";

// ============================================================================
// Authentication
// ============================================================================

/// Registers a new user together with their application and logs them in.
///
/// All form fields are validated up front and every failure is reported
/// together. The user and account rows are written in one transaction.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `request` - The submitted registration form
/// * `now` - The time of the request
///
/// # Errors
///
/// Returns `FormInvalid` if any field fails validation, including a taken
/// username or phone number.
pub fn register(
    persistence: &mut Persistence,
    request: &RegistrationRequest,
    now: OffsetDateTime,
) -> Result<RegisterResponse, ApiError> {
    let mut errors: BTreeMap<String, Vec<String>> = match request.validate() {
        Ok(()) => BTreeMap::new(),
        Err(validation_errors) => collect_field_errors(&validation_errors),
    };

    if !errors.contains_key("password1") && !errors.contains_key("password2") {
        let identity: PasswordIdentity<'_> = PasswordIdentity {
            username: &request.username,
            email: &request.email,
            first_name: &request.first_name,
            last_name: &request.last_name,
        };
        let violations: Vec<PasswordPolicyError> = PasswordPolicy::default().violations(
            &request.password1,
            &request.password2,
            &identity,
        );
        merge_field_errors(
            &mut errors,
            "password2",
            violations.iter().map(ToString::to_string),
        );
    }

    if !errors.contains_key("username")
        && persistence
            .get_user_by_username(&request.username)
            .map_err(translate_persistence_error)?
            .is_some()
    {
        merge_field_errors(
            &mut errors,
            "username",
            [String::from("A user with that username already exists.")],
        );
    }

    errors.retain(|_, messages| !messages.is_empty());
    if !errors.is_empty() {
        return Err(ApiError::FormInvalid { errors });
    }

    let registration: NewRegistration = NewRegistration {
        user: NewUser {
            username: request.username.clone(),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            password: request.password1.clone(),
            is_staff: false,
            is_superuser: false,
        },
        contact: request.contact(),
    };

    let account: Account = persistence
        .register_user_with_account(&registration, now)
        .map_err(translate_persistence_error)?;
    let account_id: i64 = persisted_id(&account)?;

    let user: UserData = persistence
        .get_user_by_id(account.user_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::Internal {
            message: String::from("User not found after registration"),
        })?;
    let session_token: String = AuthenticationService::start_session(persistence, &user, now)?;

    Ok(RegisterResponse {
        session_token,
        user_id: user.user_id,
        account_id,
        username: user.username,
        message: String::from(REGISTRATION_SUCCESS_MESSAGE),
    })
}

/// Authenticates a user and creates a session.
///
/// # Errors
///
/// Returns an error if the credentials are wrong or the user is inactive.
pub fn login(
    persistence: &mut Persistence,
    request: &LoginRequest,
    now: OffsetDateTime,
) -> Result<LoginResponse, ApiError> {
    let (session_token, authenticated_user, _user): (String, AuthenticatedUser, UserData) =
        AuthenticationService::login(persistence, &request.username, &request.password, now)?;

    // Get session expiration from the session we just created
    let session: SessionData = persistence
        .get_session_by_token(&session_token)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::Internal {
            message: String::from("Session not found after creation"),
        })?;

    Ok(LoginResponse {
        session_token,
        username: authenticated_user.username,
        role: authenticated_user.role.as_str().to_string(),
        expires_at: session.expires_at,
    })
}

/// Logs out by deleting the session.
///
/// # Errors
///
/// Returns an error if the logout fails.
pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), ApiError> {
    AuthenticationService::logout(persistence, session_token)?;
    Ok(())
}

/// Returns the current user's information.
///
/// # Errors
///
/// Returns an error if the account lookup fails.
pub fn whoami(
    persistence: &mut Persistence,
    user: &AuthenticatedUser,
    user_data: &UserData,
) -> Result<WhoAmIResponse, ApiError> {
    let has_account: bool = persistence
        .get_account_for_user(user.user_id)
        .map_err(translate_persistence_error)?
        .is_some();

    Ok(WhoAmIResponse {
        user_id: user.user_id,
        username: user.username.clone(),
        email: user_data.email.clone(),
        role: user.role.as_str().to_string(),
        is_privileged: user.is_privileged(),
        has_account,
    })
}

// ============================================================================
// Applicant pages
// ============================================================================

/// Shows the application form.
///
/// - A reviewer without an account is sent to the informational page.
/// - An approved applicant is sent to the congratulations page.
/// - Otherwise the form is rendered with the existing application, if any.
///
/// # Errors
///
/// Returns an error if the account lookup fails.
pub fn application_form(
    persistence: &mut Persistence,
    user: &AuthenticatedUser,
) -> Result<Navigation<ApplicationFormView>, ApiError> {
    let existing: Option<Account> = persistence
        .get_account_for_user(user.user_id)
        .map_err(translate_persistence_error)?;

    let Some(account) = existing else {
        if user.is_privileged() {
            return Ok(Navigation::redirect(Destination::AdminWithoutAccount));
        }
        return Ok(Navigation::Render(ApplicationFormView {
            account: None,
            can_submit: true,
            blocked_reason: None,
        }));
    };

    if account.is_approved() {
        return Ok(Navigation::redirect(Destination::Congratulations));
    }

    let can_submit: bool = account.status.allows_owner_submission();
    let blocked_reason: Option<String> = (!can_submit).then(|| {
        CoreError::ResubmissionBlocked {
            status: account.status,
        }
        .to_string()
    });

    Ok(Navigation::Render(ApplicationFormView {
        account: Some(account_info(persistence, &account)?),
        can_submit,
        blocked_reason,
    }))
}

/// Submits the application form.
///
/// A first submission creates a pending application. An application that
/// needs additional documents is updated and returned to `pending`.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `user` - The applicant
/// * `request` - The submitted form
/// * `cause` - The cause for this action
/// * `now` - The time of the request
///
/// # Errors
///
/// Returns an error if:
/// - A form field is invalid or the phone number is taken
/// - The application is pending or rejected and cannot be changed
pub fn submit_application(
    persistence: &mut Persistence,
    user: &AuthenticatedUser,
    request: &ApplicationRequest,
    cause: &Cause,
    now: OffsetDateTime,
) -> Result<Navigation<()>, ApiError> {
    let existing: Option<Account> = persistence
        .get_account_for_user(user.user_id)
        .map_err(translate_persistence_error)?;

    match &existing {
        Some(account) if account.is_approved() => {
            return Ok(Navigation::redirect(Destination::Congratulations));
        }
        None if user.is_privileged() => {
            return Ok(Navigation::redirect(Destination::AdminWithoutAccount));
        }
        _ => {}
    }

    validate_form(request)?;

    let owner: AccountOwner = AccountOwner::new(user.user_id, &user.username);
    let candidate: Account = apply(
        existing.as_ref(),
        &owner,
        Command::SubmitApplication {
            contact: request.contact(),
        },
        now,
    )
    .map_err(translate_core_error)?;

    let saved: Account = persistence
        .save_account(candidate, &user.to_audit_actor(), cause, now)
        .map_err(translate_persistence_error)?;

    info!(
        account_id = saved.account_id,
        username = %saved.username,
        "Application submitted"
    );

    Ok(Navigation::redirect_with_message(
        Destination::Status,
        APPLICATION_SUBMITTED_MESSAGE,
    ))
}

/// Shows the application status with its guidance text and reasons.
///
/// # Errors
///
/// Returns `ResourceNotFound` if an applicant has no account.
pub fn application_status(
    persistence: &mut Persistence,
    user: &AuthenticatedUser,
) -> Result<Navigation<ApplicationStatusView>, ApiError> {
    let Some(account) = load_own_account(persistence, user)? else {
        return Ok(Navigation::redirect(Destination::AdminWithoutAccount));
    };

    Ok(Navigation::Render(ApplicationStatusView {
        account_id: persisted_id(&account)?,
        status: account.status.as_str().to_string(),
        status_display: account.status.display_name().to_string(),
        guidance: account.status.guidance().to_string(),
        rejection_reason: account.rejection_reason,
        additional_docs_reason: account.additional_docs_reason,
    }))
}

/// Shows the congratulations page. Only approved accounts see it.
///
/// # Errors
///
/// Returns `ResourceNotFound` if an applicant has no account.
pub fn congratulations(
    persistence: &mut Persistence,
    user: &AuthenticatedUser,
) -> Result<Navigation<CongratulationsView>, ApiError> {
    let Some(account) = load_own_account(persistence, user)? else {
        return Ok(Navigation::redirect(Destination::AdminWithoutAccount));
    };

    if !account.is_approved() {
        return Ok(Navigation::redirect(Destination::Status));
    }

    Ok(Navigation::Render(CongratulationsView {
        username: account.username.clone(),
        approved_at: format_optional(account.approved_at)?,
        message: AccountStatus::Approved.guidance().to_string(),
    }))
}

/// Shows the informational page for reviewers who hold no account.
///
/// # Errors
///
/// Returns `Unauthorized` for applicants.
pub fn admin_without_account(
    user: &AuthenticatedUser,
) -> Result<Navigation<AdminWithoutAccountView>, ApiError> {
    AuthorizationService::authorize_view_accounts(user)?;

    Ok(Navigation::Render(AdminWithoutAccountView {
        username: user.username.clone(),
        message: String::from(
            "You are signed in as a reviewer and do not have a brokerage account. Use the admin pages to review applications.",
        ),
    }))
}

// ============================================================================
// Admin
// ============================================================================

/// Lists accounts for reviewers, newest first, 25 per page.
///
/// # Errors
///
/// Returns an error if the user is not a reviewer, the status filter is
/// not a known status or a creation bound is not a timestamp.
pub fn list_accounts(
    persistence: &mut Persistence,
    user: &AuthenticatedUser,
    request: &ListAccountsRequest,
) -> Result<ListAccountsResponse, ApiError> {
    AuthorizationService::authorize_view_accounts(user)?;

    let status: Option<AccountStatus> = request
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(AccountStatus::from_str)
        .transpose()
        .map_err(translate_domain_error)?;

    let filter: AccountFilter = AccountFilter {
        status,
        reviewed_by: request.reviewed_by,
        search: request.q.clone(),
        created_after: parse_time_filter("created_after", request.created_after.as_deref())?,
        created_before: parse_time_filter("created_before", request.created_before.as_deref())?,
        page: request.page.unwrap_or(1).max(1),
    };

    let page: AccountPage = persistence
        .list_accounts(&filter)
        .map_err(translate_persistence_error)?;

    let accounts: Vec<AccountSummary> = page
        .accounts
        .iter()
        .map(|account| account_summary(persistence, account))
        .collect::<Result<Vec<AccountSummary>, ApiError>>()?;

    Ok(ListAccountsResponse {
        accounts,
        total: page.total,
        page: page.page,
        per_page: page.per_page,
        num_pages: page.total.div_ceil(page.per_page).max(1),
    })
}

/// Returns one account with its reviewer's name.
///
/// # Errors
///
/// Returns an error if the user is not a reviewer or the account does not
/// exist.
pub fn get_account(
    persistence: &mut Persistence,
    user: &AuthenticatedUser,
    account_id: i64,
) -> Result<AccountInfo, ApiError> {
    AuthorizationService::authorize_view_accounts(user)?;

    let account: Account = require_account(persistence, account_id)?;
    account_info(persistence, &account)
}

/// Saves a reviewer's change to an account through the save hook.
///
/// Only the status, both reasons and the contact details are editable.
/// The reviewer is attributed on the first decision.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `user` - The reviewer
/// * `account_id` - The account to change
/// * `request` - The submitted change form
/// * `cause` - The cause for this action
/// * `now` - The time of the request
///
/// # Errors
///
/// Returns an error if:
/// - The user is not a reviewer
/// - The account does not exist
/// - The status is unknown, or a required reason is missing
/// - The contact details are invalid or the phone number is taken
pub fn review_account(
    persistence: &mut Persistence,
    user: &AuthenticatedUser,
    account_id: i64,
    request: &ReviewAccountRequest,
    cause: &Cause,
    now: OffsetDateTime,
) -> Result<ReviewAccountResponse, ApiError> {
    AuthorizationService::authorize_review(user)?;

    let account: Account = require_account(persistence, account_id)?;

    let status: AccountStatus =
        AccountStatus::from_str(&request.status).map_err(translate_domain_error)?;

    let contact: Option<ContactDetails> =
        if request.phone_number.is_some() || request.address.is_some() {
            let contact: ContactDetails = ContactDetails::new(
                request
                    .phone_number
                    .as_deref()
                    .unwrap_or(&account.contact.phone_number)
                    .trim(),
                request
                    .address
                    .as_deref()
                    .unwrap_or(&account.contact.address)
                    .trim(),
            );
            validate_contact_details(&contact).map_err(translate_domain_error)?;
            Some(contact)
        } else {
            None
        };

    let owner: AccountOwner = account.owner();
    let candidate: Account = apply(
        Some(&account),
        &owner,
        Command::ReviewAccount {
            status,
            rejection_reason: request.rejection_reason.clone(),
            additional_docs_reason: request.additional_docs_reason.clone(),
            contact,
        },
        now,
    )
    .map_err(translate_core_error)?;

    let saved: Account = persistence
        .save_account(candidate, &user.to_audit_actor(), cause, now)
        .map_err(translate_persistence_error)?;

    info!(
        account_id,
        reviewer = %user.username,
        status = saved.status.as_str(),
        "Account reviewed"
    );

    Ok(ReviewAccountResponse {
        message: format!("The account \"{saved}\" was changed successfully."),
        account: account_info(persistence, &saved)?,
    })
}

/// Approves every selected account in one update.
///
/// The per-account save hook does not run; reasons are left as they were.
///
/// # Errors
///
/// Returns an error if the user is not a reviewer, nothing is selected, or
/// the update fails.
pub fn bulk_approve_accounts(
    persistence: &mut Persistence,
    user: &AuthenticatedUser,
    request: &BulkApproveRequest,
    cause: &Cause,
    now: OffsetDateTime,
) -> Result<BulkApproveResponse, ApiError> {
    AuthorizationService::authorize_bulk_approve(user)?;

    if request.account_ids.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("account_ids"),
            message: String::from(
                "Items must be selected in order to perform actions on them. No items have been changed.",
            ),
        });
    }

    let updated_count: usize = persistence
        .bulk_approve(&request.account_ids, &user.to_audit_actor(), cause, now)
        .map_err(translate_persistence_error)?;

    info!(
        updated_count,
        reviewer = %user.username,
        "Bulk approved applications"
    );

    Ok(BulkApproveResponse {
        updated_count,
        message: format!("{updated_count} applications approved successfully."),
    })
}

/// Returns the recorded history of an account, oldest first.
///
/// History is kept after an account is deleted, so an unknown account
/// yields an empty timeline rather than an error.
///
/// # Errors
///
/// Returns an error if the user is not a reviewer or the query fails.
pub fn get_account_audit_timeline(
    persistence: &mut Persistence,
    user: &AuthenticatedUser,
    account_id: i64,
) -> Result<AccountAuditTimelineResponse, ApiError> {
    AuthorizationService::authorize_view_accounts(user)?;

    let events: Vec<AuditEvent> = persistence
        .get_audit_events_for_account(account_id)
        .map_err(translate_persistence_error)?;

    Ok(AccountAuditTimelineResponse {
        account_id,
        events: events.into_iter().map(audit_event_info).collect(),
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Loads the user's own account.
///
/// Returns `Ok(None)` for a reviewer without an account; the caller
/// redirects them to the informational page.
fn load_own_account(
    persistence: &mut Persistence,
    user: &AuthenticatedUser,
) -> Result<Option<Account>, ApiError> {
    let account: Option<Account> = persistence
        .get_account_for_user(user.user_id)
        .map_err(translate_persistence_error)?;

    match account {
        Some(account) => Ok(Some(account)),
        None if user.is_privileged() => Ok(None),
        None => Err(ApiError::ResourceNotFound {
            resource_type: String::from("Account"),
            message: String::from("You have not submitted an application yet"),
        }),
    }
}

fn require_account(persistence: &mut Persistence, account_id: i64) -> Result<Account, ApiError> {
    persistence
        .get_account_by_id(account_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("Account"),
            message: format!("Account {account_id} does not exist"),
        })
}

fn persisted_id(account: &Account) -> Result<i64, ApiError> {
    account.account_id.ok_or_else(|| ApiError::Internal {
        message: String::from("Account has no identifier"),
    })
}

fn format_time(value: OffsetDateTime) -> Result<String, ApiError> {
    format_timestamp(value).map_err(translate_persistence_error)
}

fn format_optional(value: Option<OffsetDateTime>) -> Result<Option<String>, ApiError> {
    value.map(format_time).transpose()
}

fn parse_time_filter(
    field: &str,
    value: Option<&str>,
) -> Result<Option<OffsetDateTime>, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            parse_timestamp(v).map_err(|_| ApiError::InvalidInput {
                field: field.to_string(),
                message: format!("'{v}' is not a UTC timestamp like 2026-03-01T12:00:00Z"),
            })
        })
        .transpose()
}

fn reviewer_username(
    persistence: &mut Persistence,
    account: &Account,
) -> Result<Option<String>, ApiError> {
    match account.reviewed_by {
        Some(reviewer_id) => Ok(persistence
            .get_user_by_id(reviewer_id)
            .map_err(translate_persistence_error)?
            .map(|reviewer| reviewer.username)),
        None => Ok(None),
    }
}

fn account_info(persistence: &mut Persistence, account: &Account) -> Result<AccountInfo, ApiError> {
    let reviewed_by_username: Option<String> = reviewer_username(persistence, account)?;

    Ok(AccountInfo {
        account_id: persisted_id(account)?,
        user_id: account.user_id,
        username: account.username.clone(),
        phone_number: account.contact.phone_number.clone(),
        address: account.contact.address.clone(),
        status: account.status.as_str().to_string(),
        status_display: account.status.display_name().to_string(),
        rejection_reason: account.rejection_reason.clone(),
        additional_docs_reason: account.additional_docs_reason.clone(),
        approved_at: format_optional(account.approved_at)?,
        reviewed_by: account.reviewed_by,
        reviewed_by_username,
        reviewed_at: format_optional(account.reviewed_at)?,
        created_at: format_time(account.created_at)?,
        updated_at: format_time(account.updated_at)?,
    })
}

fn account_summary(
    persistence: &mut Persistence,
    account: &Account,
) -> Result<AccountSummary, ApiError> {
    Ok(AccountSummary {
        account_id: persisted_id(account)?,
        username: account.username.clone(),
        status: account.status.as_str().to_string(),
        status_display: account.status.display_name().to_string(),
        reviewed_by: account.reviewed_by,
        reviewed_by_username: reviewer_username(persistence, account)?,
        reviewed_at: format_optional(account.reviewed_at)?,
        created_at: format_time(account.created_at)?,
        updated_at: format_time(account.updated_at)?,
    })
}

fn audit_event_info(event: AuditEvent) -> AuditEventInfo {
    AuditEventInfo {
        event_id: event.event_id.unwrap_or_default(),
        actor_type: event.actor.actor_type,
        actor_user_id: event.actor.user_id,
        actor_username: event.actor.username,
        cause_id: event.cause.id,
        cause_description: event.cause.description,
        action: event.action.name,
        details: event.action.details,
        before: event.before.data,
        after: event.after.data,
    }
}
