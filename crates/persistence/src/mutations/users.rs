// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::data_models::NewUser;
use crate::diesel_schema::users;
use crate::error::PersistenceError;
use crate::timestamps::format_timestamp;

/// Hashes a plain-text password with bcrypt.
///
/// # Errors
///
/// Returns an error if hashing fails, for example for an invalid cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String, PersistenceError> {
    bcrypt::hash(password, cost)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))
}

/// Creates a new user from an already hashed password.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `user` - The user to create; its plain-text password is ignored
/// * `password_hash` - The bcrypt hash to store
///
/// # Errors
///
/// Returns `UniqueViolation { field: "username" }` if the username is
/// taken, or another error if the insert fails.
pub fn insert_user(
    conn: &mut SqliteConnection,
    user: &NewUser,
    password_hash: &str,
) -> Result<i64, PersistenceError> {
    info!(
        username = %user.username,
        is_staff = user.is_staff,
        is_superuser = user.is_superuser,
        "Creating user"
    );

    diesel::insert_into(users::table)
        .values((
            users::username.eq(&user.username),
            users::email.eq(&user.email),
            users::first_name.eq(&user.first_name),
            users::last_name.eq(&user.last_name),
            users::password_hash.eq(password_hash),
            users::is_staff.eq(i32::from(user.is_staff)),
            users::is_superuser.eq(i32::from(user.is_superuser)),
        ))
        .execute(conn)?;

    let user_id: i64 = conn.get_last_insert_rowid()?;

    info!(user_id, "User created");
    Ok(user_id)
}

/// Records a successful login.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_last_login(
    conn: &mut SqliteConnection,
    user_id: i64,
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    debug!("Updating last_login_at for user ID: {}", user_id);

    diesel::update(users::table)
        .filter(users::user_id.eq(user_id))
        .set(users::last_login_at.eq(Some(format_timestamp(now)?)))
        .execute(conn)?;

    Ok(())
}

/// Deletes a user.
///
/// The user's account and sessions are removed by cascade; accounts the
/// user reviewed keep their history with `reviewed_by` cleared.
///
/// # Errors
///
/// Returns `UserNotFound` if no such user exists.
pub fn delete_user(conn: &mut SqliteConnection, user_id: i64) -> Result<(), PersistenceError> {
    info!("Deleting user ID: {}", user_id);

    let rows_affected: usize = diesel::delete(users::table)
        .filter(users::user_id.eq(user_id))
        .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::UserNotFound(format!(
            "User with ID {user_id} not found"
        )));
    }

    Ok(())
}
