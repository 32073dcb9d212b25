// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for brokerage account applications.
//!
//! This crate stores users, sessions, accounts and audit events in `SQLite`
//! through Diesel. Schema migrations are embedded and applied when a
//! database is opened.
//!
//! ## Save path
//!
//! Every account write goes through [`Persistence::save_account`] or
//! [`Persistence::register_user_with_account`], which load the persisted
//! state, run `brokerage::prepare_save` and write inside one transaction.
//! Audit events are recorded after the transaction commits.
//!
//! [`Persistence::bulk_approve`] is the one deliberate exception: it issues
//! a single `UPDATE` and does not run the per-account save hook.
//!
//! ## Testing
//!
//! [`Persistence::new_in_memory`] gives every caller its own shared-cache
//! in-memory database, so tests never see each other's rows.

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

use brokerage::{
    BulkApproveResult, TransitionResult, account_snapshot, prepare_bulk_approve, prepare_save,
};
use brokerage_audit::{Actor, AuditEvent, Cause, StateSnapshot};
use brokerage_domain::{Account, AccountOwner};
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use tracing::info;

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;
mod timestamps;

#[cfg(test)]
mod tests;

pub use data_models::{
    ACCOUNTS_PER_PAGE, AccountFilter, AccountPage, NewRegistration, NewUser, SessionData, UserData,
};
pub use error::PersistenceError;
pub use queries::users::verify_password;
pub use timestamps::{format_timestamp, parse_timestamp};

use backend::PersistenceBackend;

/// Atomic counter for generating unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence adapter for users, sessions, accounts and audit events.
pub struct Persistence {
    conn: SqliteConnection,
    password_cost: u32,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_test_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        conn.verify_foreign_key_enforcement()?;

        Ok(Self {
            conn,
            password_cost: bcrypt::DEFAULT_COST,
        })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        conn.verify_foreign_key_enforcement()?;

        Ok(Self {
            conn,
            password_cost: bcrypt::DEFAULT_COST,
        })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        self.conn.verify_foreign_key_enforcement()
    }

    /// Sets the bcrypt cost used for new password hashes.
    ///
    /// Tests lower this; production keeps `bcrypt::DEFAULT_COST`.
    pub const fn set_password_cost(&mut self, cost: u32) {
        self.password_cost = cost;
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Creates a user, hashing the password with bcrypt.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation { field: "username" }` if the username is taken.
    pub fn create_user(&mut self, user: &NewUser) -> Result<i64, PersistenceError> {
        let password_hash: String =
            mutations::users::hash_password(&user.password, self.password_cost)?;
        mutations::users::insert_user(&mut self.conn, user, &password_hash)
    }

    /// Retrieves a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<UserData>, PersistenceError> {
        queries::users::get_user_by_username(&mut self.conn, username)
    }

    /// Retrieves a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_id(&mut self, user_id: i64) -> Result<Option<UserData>, PersistenceError> {
        queries::users::get_user_by_id(&mut self.conn, user_id)
    }

    /// Records a successful login.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn update_last_login(
        &mut self,
        user_id: i64,
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::users::update_last_login(&mut self.conn, user_id, now)
    }

    /// Deletes a user together with their account and sessions.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user does not exist.
    pub fn delete_user(&mut self, user_id: i64) -> Result<(), PersistenceError> {
        mutations::users::delete_user(&mut self.conn, user_id)
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Creates a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be created.
    pub fn create_session(
        &mut self,
        session_token: &str,
        user_id: i64,
        expires_at: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::sessions::create_session(&mut self.conn, session_token, user_id, expires_at)
    }

    /// Retrieves a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_session_by_token(
        &mut self,
        session_token: &str,
    ) -> Result<Option<SessionData>, PersistenceError> {
        queries::sessions::get_session_by_token(&mut self.conn, session_token)
    }

    /// Updates the last activity timestamp for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn update_session_activity(
        &mut self,
        session_id: i64,
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        mutations::sessions::update_session_activity(&mut self.conn, session_id, now)
    }

    /// Deletes a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_session(&mut self, session_token: &str) -> Result<(), PersistenceError> {
        mutations::sessions::delete_session(&mut self.conn, session_token)
    }

    /// Deletes all sessions that expired before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_expired_sessions(&mut self, now: OffsetDateTime) -> Result<usize, PersistenceError> {
        mutations::sessions::delete_expired_sessions(&mut self.conn, now)
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Retrieves an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_account_by_id(&mut self, account_id: i64) -> Result<Option<Account>, PersistenceError> {
        queries::accounts::get_account_by_id(&mut self.conn, account_id)
    }

    /// Retrieves the account owned by a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_account_for_user(&mut self, user_id: i64) -> Result<Option<Account>, PersistenceError> {
        queries::accounts::get_account_for_user(&mut self.conn, user_id)
    }

    /// Lists one page of accounts for reviewers.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_accounts(&mut self, filter: &AccountFilter) -> Result<AccountPage, PersistenceError> {
        queries::accounts::list_accounts(&mut self.conn, filter)
    }

    /// Saves an account through the save hook.
    ///
    /// Inside one transaction the persisted state is loaded, the save hook
    /// stamps and validates the candidate, and the row is inserted or
    /// updated. Audit events are recorded after commit.
    ///
    /// # Arguments
    ///
    /// * `candidate` - The account to write; `account_id` selects update vs insert
    /// * `actor` - The user performing the save
    /// * `cause` - Why the save is happening
    /// * `now` - The time of the save
    ///
    /// # Returns
    ///
    /// The account as written.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The save hook rejects the account (`ValidationFailed`)
    /// - The phone number or owner is already taken (`UniqueViolation`)
    /// - The account to update no longer exists
    pub fn save_account(
        &mut self,
        candidate: Account,
        actor: &Actor,
        cause: &Cause,
        now: OffsetDateTime,
    ) -> Result<Account, PersistenceError> {
        let result: TransitionResult =
            self.conn.transaction::<_, PersistenceError, _>(|conn| {
                let before: Option<Account> = match candidate.account_id {
                    Some(account_id) => Some(
                        queries::accounts::get_account_by_id(conn, account_id)?
                            .ok_or(PersistenceError::AccountNotFound(account_id))?,
                    ),
                    None => None,
                };

                let result: TransitionResult =
                    prepare_save(before.as_ref(), candidate, actor, cause, now)?;
                write_account(conn, result)
            })?;

        mutations::audit::record_audit_events(&mut self.conn, &result.audit_events);
        Ok(result.new_account)
    }

    /// Creates a user and their pending application atomically.
    ///
    /// If either row cannot be written, neither is.
    ///
    /// # Arguments
    ///
    /// * `registration` - The new user and their contact details
    /// * `now` - The registration time
    ///
    /// # Returns
    ///
    /// The new account, which carries the new user's ID.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` for a taken username or phone number, or
    /// `ValidationFailed` if the application breaks a domain rule.
    pub fn register_user_with_account(
        &mut self,
        registration: &NewRegistration,
        now: OffsetDateTime,
    ) -> Result<Account, PersistenceError> {
        let password_hash: String =
            mutations::users::hash_password(&registration.user.password, self.password_cost)?;

        let result: TransitionResult =
            self.conn.transaction::<_, PersistenceError, _>(|conn| {
                let user_id: i64 =
                    mutations::users::insert_user(conn, &registration.user, &password_hash)?;
                let username: &str = &registration.user.username;

                let owner: AccountOwner = AccountOwner::new(user_id, username);
                let candidate: Account =
                    Account::new_application(&owner, registration.contact.clone(), now);
                let actor: Actor = Actor::with_user(user_id, username, "user");
                let cause: Cause = Cause::new(
                    format!("register-{user_id}"),
                    String::from("Self-service registration"),
                );

                let result: TransitionResult = prepare_save(None, candidate, &actor, &cause, now)?;
                write_account(conn, result)
            })?;

        info!(
            user_id = result.new_account.user_id,
            username = %result.new_account.username,
            "Registered user with pending application"
        );

        mutations::audit::record_audit_events(&mut self.conn, &result.audit_events);
        Ok(result.new_account)
    }

    /// Approves every listed account in one `UPDATE`.
    ///
    /// The per-account save hook is not run. Every matched row becomes
    /// approved with `actor` as reviewer and `now` as both the review and
    /// approval time. Unknown IDs are ignored.
    ///
    /// # Returns
    ///
    /// The number of rows updated.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if an approved row would still be invalid,
    /// or an error if the update fails. Nothing is written in either case.
    pub fn bulk_approve(
        &mut self,
        account_ids: &[i64],
        actor: &Actor,
        cause: &Cause,
        now: OffsetDateTime,
    ) -> Result<usize, PersistenceError> {
        let (updated, result): (usize, BulkApproveResult) =
            self.conn.transaction::<_, PersistenceError, _>(|conn| {
                let selected: Vec<Account> =
                    queries::accounts::get_accounts_by_ids(conn, account_ids)?;
                let result: BulkApproveResult = prepare_bulk_approve(&selected, actor, cause, now)?;
                let updated: usize =
                    mutations::accounts::approve_accounts(conn, account_ids, actor.user_id, now)?;
                Ok((updated, result))
            })?;

        mutations::audit::record_audit_events(&mut self.conn, &result.audit_events);
        Ok(updated)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Persists an audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn persist_audit_event(&mut self, event: &AuditEvent) -> Result<i64, PersistenceError> {
        mutations::audit::persist_audit_event(&mut self.conn, event)
    }

    /// Retrieves an audit event by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the event is not found or cannot be deserialized.
    pub fn get_audit_event(&mut self, event_id: i64) -> Result<AuditEvent, PersistenceError> {
        queries::audit::get_audit_event(&mut self.conn, event_id)
    }

    /// Retrieves the audit timeline of an account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if events cannot be retrieved or deserialized.
    pub fn get_audit_events_for_account(
        &mut self,
        account_id: i64,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::get_audit_events_for_account(&mut self.conn, account_id)
    }
}

/// Writes a prepared account and scopes creation events to the new row.
///
/// Creation snapshots are re-rendered once the insert assigns the ID.
fn write_account(
    conn: &mut SqliteConnection,
    mut result: TransitionResult,
) -> Result<TransitionResult, PersistenceError> {
    if result.new_account.account_id.is_some() {
        mutations::accounts::update_account(conn, &result.new_account)?;
        return Ok(result);
    }

    let account_id: i64 = mutations::accounts::insert_account(conn, &result.new_account)?;
    result.new_account.account_id = Some(account_id);
    let after: StateSnapshot = account_snapshot(&result.new_account);
    result.audit_events = result
        .audit_events
        .into_iter()
        .map(|mut event| {
            event.after = after.clone();
            event.for_account(account_id)
        })
        .collect();
    Ok(result)
}
