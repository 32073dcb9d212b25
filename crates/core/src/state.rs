// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use brokerage_audit::{AuditEvent, StateSnapshot};
use brokerage_domain::Account;

/// The result of passing a candidate account through the save hook.
///
/// Contains the account as it must be written and the audit events the
/// write produces. Events are recorded only after the write commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The account with all derived fields stamped.
    pub new_account: Account,
    /// Zero or more audit events describing the change.
    pub audit_events: Vec<AuditEvent>,
}

/// The result of a bulk approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkApproveResult {
    /// Every selected account as it will look after the update.
    pub approved_accounts: Vec<Account>,
    /// One event per account whose status actually changed.
    pub audit_events: Vec<AuditEvent>,
}

impl BulkApproveResult {
    /// The number of rows the update touches.
    #[must_use]
    pub const fn updated_count(&self) -> usize {
        self.approved_accounts.len()
    }
}

/// Renders the audit snapshot of an account.
///
/// # Arguments
///
/// * `account` - The account to describe
#[must_use]
pub fn account_snapshot(account: &Account) -> StateSnapshot {
    let account_id: String = account
        .account_id
        .map_or_else(|| String::from("new"), |id| id.to_string());
    let reviewed_by: String = account
        .reviewed_by
        .map_or_else(|| String::from("none"), |id| id.to_string());
    let approved_at: String = account
        .approved_at
        .map_or_else(|| String::from("none"), |at| at.to_string());

    StateSnapshot::new(format!(
        "account_id={account_id},user={},status={},phone_number={},reviewed_by={reviewed_by},approved_at={approved_at}",
        account.username,
        account.status.as_str(),
        account.contact.phone_number,
    ))
}
