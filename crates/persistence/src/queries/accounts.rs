// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Account queries.
//!
//! Accounts are always read joined to their owner so that the username
//! travels with the account.

use brokerage_domain::{Account, AccountStatus, ContactDetails};
use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use num_traits::ToPrimitive;
use tracing::debug;

use crate::data_models::{ACCOUNTS_PER_PAGE, AccountFilter, AccountPage};
use crate::diesel_schema::{accounts, users};
use crate::error::PersistenceError;
use crate::timestamps::{format_optional, parse_optional, parse_timestamp};

/// Diesel Queryable struct for account rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = accounts)]
struct AccountRow {
    account_id: i64,
    user_id: i64,
    phone_number: String,
    address: String,
    status: String,
    rejection_reason: Option<String>,
    additional_docs_reason: Option<String>,
    approved_at: Option<String>,
    reviewed_by: Option<i64>,
    reviewed_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl AccountRow {
    /// Rebuilds the domain account from a row and its owner's username.
    fn into_account(self, username: String) -> Result<Account, PersistenceError> {
        let status: AccountStatus = self
            .status
            .parse()
            .map_err(|e| PersistenceError::ReconstructionError(format!("{e}")))?;

        Ok(Account {
            account_id: Some(self.account_id),
            user_id: self.user_id,
            username,
            contact: ContactDetails {
                phone_number: self.phone_number,
                address: self.address,
            },
            status,
            rejection_reason: self.rejection_reason,
            additional_docs_reason: self.additional_docs_reason,
            approved_at: parse_optional(self.approved_at.as_deref())?,
            reviewed_by: self.reviewed_by,
            reviewed_at: parse_optional(self.reviewed_at.as_deref())?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn into_accounts(rows: Vec<(AccountRow, String)>) -> Result<Vec<Account>, PersistenceError> {
    rows.into_iter()
        .map(|(row, username)| row.into_account(username))
        .collect()
}

/// Retrieves an account by ID.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `account_id` - The account ID
///
/// # Errors
///
/// Returns an error if the query fails or the row cannot be reconstructed.
/// Returns `Ok(None)` if the account does not exist.
pub fn get_account_by_id(
    conn: &mut SqliteConnection,
    account_id: i64,
) -> Result<Option<Account>, PersistenceError> {
    debug!("Looking up account by ID: {}", account_id);

    let row: Option<(AccountRow, String)> = accounts::table
        .inner_join(users::table.on(users::user_id.eq(accounts::user_id)))
        .filter(accounts::account_id.eq(account_id))
        .select((AccountRow::as_select(), users::username))
        .first(conn)
        .optional()?;

    row.map(|(row, username)| row.into_account(username))
        .transpose()
}

/// Retrieves the account owned by a user. A user owns at most one.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `user_id` - The owning user's ID
///
/// # Errors
///
/// Returns an error if the query fails or the row cannot be reconstructed.
/// Returns `Ok(None)` if the user has no account.
pub fn get_account_for_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Option<Account>, PersistenceError> {
    debug!("Looking up account for user ID: {}", user_id);

    let row: Option<(AccountRow, String)> = accounts::table
        .inner_join(users::table.on(users::user_id.eq(accounts::user_id)))
        .filter(accounts::user_id.eq(user_id))
        .select((AccountRow::as_select(), users::username))
        .first(conn)
        .optional()?;

    row.map(|(row, username)| row.into_account(username))
        .transpose()
}

/// Retrieves every account whose ID is in `account_ids`. Unknown IDs are
/// skipped.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn get_accounts_by_ids(
    conn: &mut SqliteConnection,
    account_ids: &[i64],
) -> Result<Vec<Account>, PersistenceError> {
    let rows: Vec<(AccountRow, String)> = accounts::table
        .inner_join(users::table.on(users::user_id.eq(accounts::user_id)))
        .filter(accounts::account_id.eq_any(account_ids))
        .select((AccountRow::as_select(), users::username))
        .order_by(accounts::account_id.asc())
        .load(conn)?;

    into_accounts(rows)
}

/// Escapes `LIKE` wildcards so the search text matches literally.
fn escape_like(search: &str) -> String {
    let mut escaped: String = String::with_capacity(search.len());
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Lists one page of accounts for reviewers.
///
/// Accounts are ordered newest first, ties broken by ID.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `filter` - Status, reviewer, search, creation window and page filters
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_accounts(
    conn: &mut SqliteConnection,
    filter: &AccountFilter,
) -> Result<AccountPage, PersistenceError> {
    debug!(?filter, "Listing accounts");

    let created_after: Option<String> = format_optional(filter.created_after)?;
    let created_before: Option<String> = format_optional(filter.created_before)?;

    let filtered = || {
        let mut query = accounts::table
            .inner_join(users::table.on(users::user_id.eq(accounts::user_id)))
            .into_boxed::<Sqlite>();

        if let Some(status) = filter.status {
            query = query.filter(accounts::status.eq(status.as_str()));
        }
        if let Some(reviewer_id) = filter.reviewed_by {
            query = query.filter(accounts::reviewed_by.eq(reviewer_id));
        }
        if let Some(after) = created_after.clone() {
            query = query.filter(accounts::created_at.ge(after));
        }
        if let Some(before) = created_before.clone() {
            query = query.filter(accounts::created_at.lt(before));
        }
        if let Some(search) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let pattern: String = format!("%{}%", escape_like(search));
            query = query.filter(
                users::username
                    .like(pattern.clone())
                    .escape('\\')
                    .or(users::email.like(pattern.clone()).escape('\\'))
                    .or(accounts::phone_number.like(pattern).escape('\\')),
            );
        }
        query
    };

    let total: i64 = filtered().count().get_result(conn)?;

    let page: usize = filter.page.max(1);
    let offset: i64 = (page - 1)
        .checked_mul(ACCOUNTS_PER_PAGE)
        .and_then(|offset| offset.to_i64())
        .ok_or_else(|| PersistenceError::QueryFailed(String::from("Page out of range")))?;
    let limit: i64 = ACCOUNTS_PER_PAGE
        .to_i64()
        .ok_or_else(|| PersistenceError::QueryFailed(String::from("Page size out of range")))?;

    let rows: Vec<(AccountRow, String)> = filtered()
        .select((AccountRow::as_select(), users::username))
        .order_by((accounts::created_at.desc(), accounts::account_id.desc()))
        .limit(limit)
        .offset(offset)
        .load(conn)?;

    Ok(AccountPage {
        accounts: into_accounts(rows)?,
        total: total
            .to_usize()
            .ok_or_else(|| PersistenceError::ReconstructionError(String::from("Negative count")))?,
        page,
        per_page: ACCOUNTS_PER_PAGE,
    })
}
