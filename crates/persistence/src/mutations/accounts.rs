// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Account mutations.

use brokerage_domain::{Account, AccountStatus};
use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::diesel_schema::accounts;
use crate::error::PersistenceError;
use crate::timestamps::{format_optional, format_timestamp};

/// Column values of an account row, formatted for storage.
#[derive(Insertable, AsChangeset)]
#[diesel(table_name = accounts)]
#[diesel(treat_none_as_null = true)]
struct AccountChangeset<'a> {
    user_id: i64,
    phone_number: &'a str,
    address: &'a str,
    status: &'a str,
    rejection_reason: Option<&'a str>,
    additional_docs_reason: Option<&'a str>,
    approved_at: Option<String>,
    reviewed_by: Option<i64>,
    reviewed_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl<'a> AccountChangeset<'a> {
    fn from_account(account: &'a Account) -> Result<Self, PersistenceError> {
        Ok(Self {
            user_id: account.user_id,
            phone_number: &account.contact.phone_number,
            address: &account.contact.address,
            status: account.status.as_str(),
            rejection_reason: account.rejection_reason.as_deref(),
            additional_docs_reason: account.additional_docs_reason.as_deref(),
            approved_at: format_optional(account.approved_at)?,
            reviewed_by: account.reviewed_by,
            reviewed_at: format_optional(account.reviewed_at)?,
            created_at: format_timestamp(account.created_at)?,
            updated_at: format_timestamp(account.updated_at)?,
        })
    }
}

/// Inserts a new account.
///
/// # Errors
///
/// Returns `UniqueViolation` if the user already has an account
/// (`user`) or the phone number is taken (`phone_number`).
pub fn insert_account(
    conn: &mut SqliteConnection,
    account: &Account,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(accounts::table)
        .values(AccountChangeset::from_account(account)?)
        .execute(conn)?;

    let account_id: i64 = conn.get_last_insert_rowid()?;

    info!(account_id, user_id = account.user_id, "Account created");
    Ok(account_id)
}

/// Overwrites an existing account row.
///
/// # Errors
///
/// Returns `AccountNotFound` if the account has no ID or no row matched,
/// or `UniqueViolation` if the phone number is taken.
pub fn update_account(conn: &mut SqliteConnection, account: &Account) -> Result<(), PersistenceError> {
    let account_id: i64 = account
        .account_id
        .ok_or_else(|| PersistenceError::Other(String::from("Cannot update an unsaved account")))?;

    let rows_affected: usize = diesel::update(accounts::table)
        .filter(accounts::account_id.eq(account_id))
        .set(AccountChangeset::from_account(account)?)
        .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::AccountNotFound(account_id));
    }

    debug!(account_id, status = account.status.as_str(), "Account updated");
    Ok(())
}

/// Approves every listed account in a single `UPDATE`.
///
/// The reviewer and both timestamps are overwritten. Reasons are left
/// alone. Unknown IDs match nothing.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `account_ids` - The accounts to approve
/// * `reviewer_id` - The approving user, if any
/// * `now` - The approval time
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn approve_accounts(
    conn: &mut SqliteConnection,
    account_ids: &[i64],
    reviewer_id: Option<i64>,
    now: OffsetDateTime,
) -> Result<usize, PersistenceError> {
    let now: String = format_timestamp(now)?;

    let rows_affected: usize = diesel::update(accounts::table)
        .filter(accounts::account_id.eq_any(account_ids))
        .set((
            accounts::status.eq(AccountStatus::Approved.as_str()),
            accounts::approved_at.eq(Some(now.clone())),
            accounts::reviewed_by.eq(reviewer_id),
            accounts::reviewed_at.eq(Some(now.clone())),
            accounts::updated_at.eq(&now),
        ))
        .execute(conn)?;

    info!(rows_affected, ?reviewer_id, "Bulk approved accounts");
    Ok(rows_affected)
}
