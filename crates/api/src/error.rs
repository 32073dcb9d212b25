// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use std::collections::BTreeMap;

use crate::password_policy::PasswordPolicyError;
use brokerage::CoreError;
use brokerage_domain::{AccountStatus, DomainError};
use brokerage_persistence::PersistenceError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
/// Validation failures are always scoped to a field so they can be shown
/// next to the form input that caused them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the user does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A workflow rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A user-visible description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A user-visible description of the error.
        message: String,
    },
    /// One or more form fields failed validation.
    FormInvalid {
        /// Messages keyed by field name.
        errors: BTreeMap<String, Vec<String>>,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
    /// Password policy violation.
    PasswordPolicyViolation {
        /// A human-readable description of the policy violation.
        message: String,
    },
}

impl ApiError {
    /// Builds a form error carrying a single message for one field.
    #[must_use]
    pub fn form_error(field: &str, message: &str) -> Self {
        let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        Self::FormInvalid { errors }
    }

    /// Returns the field-scoped messages carried by this error.
    ///
    /// Errors that are not tied to a form field return an empty map.
    #[must_use]
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        match self {
            Self::FormInvalid { errors } => errors.clone(),
            Self::InvalidInput { field, message } => {
                BTreeMap::from([(field.clone(), vec![message.clone()])])
            }
            Self::PasswordPolicyViolation { message } => {
                BTreeMap::from([(String::from("password2"), vec![message.clone()])])
            }
            _ => BTreeMap::new(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::DomainRuleViolation { message, .. } => write!(f, "{message}"),
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::FormInvalid { errors } => {
                let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
                write!(f, "Please correct the errors in: {}", fields.join(", "))
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
            Self::PasswordPolicyViolation { message } => {
                write!(f, "Password policy violation: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::PasswordPolicyViolation {
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
///
/// Every domain error is a validation failure on a known form field.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let field: &str = err.field().unwrap_or("__all__");
    ApiError::InvalidInput {
        field: field.to_string(),
        message: err.to_string(),
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::ResubmissionBlocked { status } => ApiError::DomainRuleViolation {
            rule: match status {
                AccountStatus::Rejected => String::from("rejected_application_is_final"),
                _ => String::from("application_under_review"),
            },
            message: err.to_string(),
        },
        CoreError::AlreadyApproved => ApiError::DomainRuleViolation {
            rule: String::from("account_already_approved"),
            message: err.to_string(),
        },
        CoreError::AccountNotFound => ApiError::ResourceNotFound {
            resource_type: String::from("Account"),
            message: String::from("No account exists for this user"),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// Unique constraint violations become form errors on the offending field.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::ValidationFailed(core_err) => translate_core_error(core_err),
        PersistenceError::UniqueViolation { field } => match field.as_str() {
            "username" => ApiError::form_error("username", "A user with that username already exists."),
            "phone_number" => ApiError::form_error(
                "phone_number",
                "Account with this Phone number already exists.",
            ),
            "user" => ApiError::form_error("user", "Account with this User already exists."),
            other => ApiError::form_error(other, "This value is already in use."),
        },
        PersistenceError::AccountNotFound(account_id) => ApiError::ResourceNotFound {
            resource_type: String::from("Account"),
            message: format!("Account {account_id} does not exist"),
        },
        PersistenceError::UserNotFound(user) => ApiError::ResourceNotFound {
            resource_type: String::from("User"),
            message: format!("User {user} does not exist"),
        },
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}
