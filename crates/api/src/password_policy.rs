// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Password policy validation.
//!
//! This module enforces password requirements for self-service registration
//! and provisioned staff accounts.

use thiserror::Error;

/// Password policy errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    /// Password is too short.
    #[error("This password is too short. It must contain at least {min_length} characters.")]
    TooShort { min_length: usize },

    /// Password is made up only of digits.
    #[error("This password is entirely numeric.")]
    EntirelyNumeric,

    /// Password matches one of the user's own attributes.
    #[error("The password is too similar to the {field}.")]
    TooSimilar { field: String },

    /// Password and confirmation do not match.
    #[error("The two password fields didn't match.")]
    ConfirmationMismatch,
}

/// The user attributes a password must not repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordIdentity<'a> {
    /// Login name.
    pub username: &'a str,
    /// Email address.
    pub email: &'a str,
    /// Given name.
    pub first_name: &'a str,
    /// Family name.
    pub last_name: &'a str,
}

impl PasswordIdentity<'_> {
    fn attributes(&self) -> [(&'static str, &str); 4] {
        [
            ("username", self.username),
            ("email address", self.email),
            ("first name", self.first_name),
            ("last name", self.last_name),
        ]
    }
}

/// Password policy configuration.
pub struct PasswordPolicy {
    /// Minimum password length.
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PasswordPolicy {
    /// Validates a password against the policy.
    ///
    /// # Arguments
    ///
    /// * `password` - The password to validate
    /// * `confirmation` - The password confirmation
    /// * `identity` - The user attributes the password must not match
    ///
    /// # Errors
    ///
    /// Returns the first `PasswordPolicyError` found.
    pub fn validate(
        &self,
        password: &str,
        confirmation: &str,
        identity: &PasswordIdentity<'_>,
    ) -> Result<(), PasswordPolicyError> {
        self.violations(password, confirmation, identity)
            .into_iter()
            .next()
            .map_or(Ok(()), Err)
    }

    /// Returns every rule the password breaks, confirmation first.
    ///
    /// When the confirmation does not match, the password itself is not
    /// checked further.
    #[must_use]
    pub fn violations(
        &self,
        password: &str,
        confirmation: &str,
        identity: &PasswordIdentity<'_>,
    ) -> Vec<PasswordPolicyError> {
        if password != confirmation {
            return vec![PasswordPolicyError::ConfirmationMismatch];
        }

        let mut violations: Vec<PasswordPolicyError> = Vec::new();

        // Attribute comparison is case-insensitive
        let password_lower: String = password.to_lowercase();
        if let Some((field, _)) = identity
            .attributes()
            .into_iter()
            .find(|(_, value)| !value.is_empty() && value.to_lowercase() == password_lower)
        {
            violations.push(PasswordPolicyError::TooSimilar {
                field: field.to_string(),
            });
        }

        if password.chars().count() < self.min_length {
            violations.push(PasswordPolicyError::TooShort {
                min_length: self.min_length,
            });
        }

        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            violations.push(PasswordPolicyError::EntirelyNumeric);
        }

        violations
    }
}
