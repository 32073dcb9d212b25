// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use brokerage::CoreError;
use diesel::result::DatabaseErrorKind;

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Query execution failed.
    QueryFailed(String),
    /// A stored row could not be turned back into a domain value.
    ReconstructionError(String),
    /// Serialization/deserialization error.
    SerializationError(String),
    /// Initialization error.
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
    /// The save hook rejected the account. Nothing was written.
    ValidationFailed(CoreError),
    /// A unique constraint was violated.
    UniqueViolation {
        /// The form field the constraint belongs to.
        field: String,
    },
    /// The requested user was not found.
    UserNotFound(String),
    /// The requested account was not found.
    AccountNotFound(i64),
    /// The requested resource was not found.
    NotFound(String),
    /// A general error occurred.
    Other(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            Self::ReconstructionError(msg) => write!(f, "Reconstruction error: {msg}"),
            Self::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::ValidationFailed(err) => write!(f, "Validation failed: {err}"),
            Self::UniqueViolation { field } => {
                write!(f, "Unique constraint violated on {field}")
            }
            Self::UserNotFound(msg) => write!(f, "User not found: {msg}"),
            Self::AccountNotFound(id) => write!(f, "Account not found: {id}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound("Record not found".to_string()),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::UniqueViolation {
                    field: unique_violation_field(info.message()),
                }
            }
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<CoreError> for PersistenceError {
    fn from(err: CoreError) -> Self {
        Self::ValidationFailed(err)
    }
}

/// Maps a `SQLite` unique constraint message to the form field it guards.
///
/// `SQLite` reports `UNIQUE constraint failed: accounts.phone_number`.
fn unique_violation_field(message: &str) -> String {
    let column: &str = message
        .rsplit('.')
        .next()
        .map_or(message, str::trim);

    match column {
        "user_id" => String::from("user"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::unique_violation_field;

    #[test]
    fn test_unique_violation_field_names_form_fields() {
        assert_eq!(
            unique_violation_field("UNIQUE constraint failed: accounts.phone_number"),
            "phone_number"
        );
        assert_eq!(
            unique_violation_field("UNIQUE constraint failed: accounts.user_id"),
            "user"
        );
        assert_eq!(
            unique_violation_field("UNIQUE constraint failed: users.username"),
            "username"
        );
    }
}
