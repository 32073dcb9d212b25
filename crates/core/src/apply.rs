// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::state::{BulkApproveResult, TransitionResult, account_snapshot};
use brokerage_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use brokerage_domain::{
    Account, AccountOwner, AccountStatus, validate_account, validate_contact_details,
};
use time::OffsetDateTime;

/// Applies a command to the current account, producing a candidate account.
///
/// The candidate has not passed the save hook yet; hand it to
/// [`prepare_save`] before writing it.
///
/// # Arguments
///
/// * `current` - The owner's existing account, if any
/// * `owner` - The user the account belongs to
/// * `command` - The command to apply
/// * `now` - The time of the request
///
/// # Errors
///
/// Returns an error if:
/// - The submitted contact details are invalid
/// - The owner resubmits while the status does not allow it
/// - A review targets an account that does not exist
pub fn apply(
    current: Option<&Account>,
    owner: &AccountOwner,
    command: Command,
    now: OffsetDateTime,
) -> Result<Account, CoreError> {
    match command {
        Command::SubmitApplication { contact } => {
            validate_contact_details(&contact)?;

            let Some(existing) = current else {
                return Ok(Account::new_application(owner, contact, now));
            };

            match existing.status {
                AccountStatus::Approved => Err(CoreError::AlreadyApproved),
                AccountStatus::AdditionalDocsRequired => {
                    let mut candidate: Account = existing.clone();
                    candidate.contact = contact;
                    candidate.status = AccountStatus::Pending;
                    Ok(candidate)
                }
                status @ (AccountStatus::Pending | AccountStatus::Rejected) => {
                    Err(CoreError::ResubmissionBlocked { status })
                }
            }
        }
        Command::ReviewAccount {
            status,
            rejection_reason,
            additional_docs_reason,
            contact,
        } => {
            let existing: &Account = current.ok_or(CoreError::AccountNotFound)?;

            let mut candidate: Account = existing.clone();
            candidate.status = status;
            candidate.rejection_reason = non_blank(rejection_reason);
            candidate.additional_docs_reason = non_blank(additional_docs_reason);
            if let Some(contact) = contact {
                candidate.contact = contact;
            }
            Ok(candidate)
        }
    }
}

/// The save hook. Every write of an account passes through here.
///
/// Derived fields are recomputed from the persisted state and the new
/// status, then the account is validated and the audit events for the
/// change are built:
///
/// - The first time the status leaves `pending` with no reviewer on record,
///   the acting user and the current time are stamped.
/// - `approved_at` is set when the status is `approved` and cleared otherwise.
///
/// # Arguments
///
/// * `before` - The persisted account, or `None` for a first save
/// * `candidate` - The account about to be written
/// * `actor` - The user performing the save
/// * `cause` - Why the save is happening
/// * `now` - The time of the save
///
/// # Errors
///
/// Returns an error if the resulting account violates a domain rule.
/// Nothing should be written in that case.
pub fn prepare_save(
    before: Option<&Account>,
    candidate: Account,
    actor: &Actor,
    cause: &Cause,
    now: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    let mut account: Account = candidate;

    // Derived fields are never taken from the caller.
    account.account_id = before.and_then(|b| b.account_id).or(account.account_id);
    account.reviewed_by = before.and_then(|b| b.reviewed_by);
    account.reviewed_at = before.and_then(|b| b.reviewed_at);
    account.approved_at = before.and_then(|b| b.approved_at);
    account.created_at = before.map_or(now, |b| b.created_at);
    account.updated_at = now;

    stamp_review(&mut account, actor, now);

    validate_account(&account)?;

    let audit_events: Vec<AuditEvent> = build_save_events(before, &account, actor, cause);

    Ok(TransitionResult {
        new_account: account,
        audit_events,
    })
}

/// Prepares an administrative bulk approval.
///
/// Every selected account is approved with the actor as reviewer and `now`
/// as both the review and approval time, overwriting earlier values. The
/// per-account save hook is bypassed, so no stamping rules apply beyond
/// these. Reasons are left untouched.
///
/// # Arguments
///
/// * `selected` - The accounts chosen by the reviewer
/// * `actor` - The reviewer performing the approval
/// * `cause` - Why the approval is happening
/// * `now` - The time of the approval
///
/// # Errors
///
/// Returns an error if an approved account would still violate a domain
/// rule, for example a stored address that is blank.
pub fn prepare_bulk_approve(
    selected: &[Account],
    actor: &Actor,
    cause: &Cause,
    now: OffsetDateTime,
) -> Result<BulkApproveResult, CoreError> {
    let mut approved_accounts: Vec<Account> = Vec::with_capacity(selected.len());
    let mut audit_events: Vec<AuditEvent> = Vec::new();

    for before in selected {
        let mut after: Account = before.clone();
        after.status = AccountStatus::Approved;
        after.approved_at = Some(now);
        after.reviewed_by = actor.user_id;
        after.reviewed_at = Some(now);
        after.updated_at = now;

        validate_account(&after)?;

        if before.status != AccountStatus::Approved {
            let action: Action = Action::new(
                String::from("BulkApprove"),
                Some(format!(
                    "{}: {} -> {} by {}",
                    before.username,
                    before.status.as_str(),
                    after.status.as_str(),
                    actor.display_name(),
                )),
            );
            audit_events.push(AuditEvent::new(
                actor.clone(),
                cause.clone(),
                action,
                account_snapshot(before),
                account_snapshot(&after),
                before.account_id,
            ));
        }

        approved_accounts.push(after);
    }

    Ok(BulkApproveResult {
        approved_accounts,
        audit_events,
    })
}

fn stamp_review(account: &mut Account, actor: &Actor, now: OffsetDateTime) {
    if account.status != AccountStatus::Pending && account.reviewed_by.is_none() {
        account.reviewed_by = actor.user_id;
        account.reviewed_at = Some(now);
    }

    if account.status == AccountStatus::Approved {
        if account.approved_at.is_none() {
            account.approved_at = Some(now);
        }
    } else {
        account.approved_at = None;
    }
}

fn build_save_events(
    before: Option<&Account>,
    after: &Account,
    actor: &Actor,
    cause: &Cause,
) -> Vec<AuditEvent> {
    let Some(before) = before else {
        let action: Action = Action::new(
            String::from("AccountCreated"),
            Some(format!(
                "Account created for {} with status {}",
                after.username,
                after.status.as_str()
            )),
        );
        return vec![AuditEvent::new(
            actor.clone(),
            cause.clone(),
            action,
            StateSnapshot::absent(),
            account_snapshot(after),
            after.account_id,
        )];
    };

    let action: Action = if before.status != after.status {
        Action::new(
            String::from("AccountStatusChanged"),
            Some(format!(
                "{}: {} -> {}; reviewer={}; rejection_reason={}; additional_docs_reason={}",
                after.username,
                before.status.as_str(),
                after.status.as_str(),
                after
                    .reviewed_by
                    .map_or_else(|| String::from("none"), |id| id.to_string()),
                after.rejection_reason.as_deref().unwrap_or(""),
                after.additional_docs_reason.as_deref().unwrap_or(""),
            )),
        )
    } else if before.contact != after.contact
        || before.rejection_reason != after.rejection_reason
        || before.additional_docs_reason != after.additional_docs_reason
    {
        Action::new(
            String::from("AccountUpdated"),
            Some(format!("Account details updated for {}", after.username)),
        )
    } else {
        return Vec::new();
    };

    vec![AuditEvent::new(
        actor.clone(),
        cause.clone(),
        action,
        account_snapshot(before),
        account_snapshot(after),
        after.account_id,
    )]
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
