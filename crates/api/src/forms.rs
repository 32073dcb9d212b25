// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Submitted forms and their field validation.
//!
//! Field rules are declared with `validator`. A failed form reports every
//! failing field at once through [`ApiError::FormInvalid`].

use std::borrow::Cow;
use std::collections::BTreeMap;

use brokerage_domain::{ContactDetails, validate_phone_number};
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::ApiError;

/// Self-service registration: a new user plus their first application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct RegistrationRequest {
    /// Login name.
    #[validate(
        length(max = 150, message = "Ensure this value has at most 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: String,
    /// Given name.
    #[validate(
        length(max = 30, message = "Ensure this value has at most 30 characters."),
        custom(function = "validate_required")
    )]
    pub first_name: String,
    /// Family name.
    #[validate(
        length(max = 30, message = "Ensure this value has at most 30 characters."),
        custom(function = "validate_required")
    )]
    pub last_name: String,
    /// Email address.
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    /// Password.
    #[validate(custom(function = "validate_required"))]
    pub password1: String,
    /// Password confirmation.
    #[validate(custom(function = "validate_required"))]
    pub password2: String,
    /// Contact phone number.
    #[validate(custom(function = "validate_phone_field"))]
    pub phone_number: String,
    /// Postal address.
    #[validate(custom(function = "validate_required"))]
    pub address: String,
}

impl RegistrationRequest {
    /// Returns the contact details entered on the form.
    #[must_use]
    pub fn contact(&self) -> ContactDetails {
        ContactDetails::new(self.phone_number.trim(), self.address.trim())
    }
}

/// The applicant's application form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct ApplicationRequest {
    /// Contact phone number.
    #[validate(custom(function = "validate_phone_field"))]
    pub phone_number: String,
    /// Postal address.
    #[validate(custom(function = "validate_required"))]
    pub address: String,
}

impl ApplicationRequest {
    /// Returns the contact details entered on the form.
    #[must_use]
    pub fn contact(&self) -> ContactDetails {
        ContactDetails::new(self.phone_number.trim(), self.address.trim())
    }
}

/// Validates a form and collects every failing field.
///
/// # Errors
///
/// Returns `ApiError::FormInvalid` listing each failing field's messages.
pub fn validate_form<T: Validate>(form: &T) -> Result<(), ApiError> {
    form.validate().map_err(|errors| ApiError::FormInvalid {
        errors: collect_field_errors(&errors),
    })
}

/// Flattens `validator` errors into messages keyed by field.
#[must_use]
pub fn collect_field_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut collected: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map_or_else(|| e.code.to_string(), ToString::to_string)
            })
            .collect();
        collected.entry(field.to_string()).or_default().extend(messages);
    }
    collected
}

/// Merges extra field messages into an error map.
pub fn merge_field_errors(
    target: &mut BTreeMap<String, Vec<String>>,
    field: &str,
    messages: impl IntoIterator<Item = String>,
) {
    target.entry(field.to_string()).or_default().extend(messages);
}

fn validation_error(code: &'static str, message: String) -> ValidationError {
    let mut err: ValidationError = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(validation_error(
            "required",
            String::from("This field is required."),
        ));
    }
    Ok(())
}

fn validate_username(value: &str) -> Result<(), ValidationError> {
    validate_required(value)?;

    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if value.chars().all(allowed) {
        Ok(())
    } else {
        Err(validation_error(
            "invalid_username",
            String::from(
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            ),
        ))
    }
}

fn validate_phone_field(value: &str) -> Result<(), ValidationError> {
    validate_phone_number(value.trim()).map_err(|e| validation_error("phone_number", e.to_string()))
}
