// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::account_status::AccountStatus;
use crate::error::DomainError;
use crate::types::{Account, ContactDetails};

/// Maximum stored width of a phone number.
pub const PHONE_NUMBER_MAX_LENGTH: usize = 20;

/// Characters accepted as phone number separators.
const PHONE_SEPARATORS: [char; 5] = ['-', ' ', '(', ')', '+'];

/// Validates the cross-field rules an account must satisfy before any write.
///
/// This runs on every save, regardless of who performs it.
///
/// # Arguments
///
/// * `account` - The account about to be written
///
/// # Errors
///
/// Returns an error if:
/// - The phone number is empty or longer than 20 characters
/// - The address is blank
/// - The status is `rejected` without a rejection reason
/// - The status is `additional_docs_required` without a request text
pub fn validate_account(account: &Account) -> Result<(), DomainError> {
    validate_phone_number_length(&account.contact.phone_number)?;

    if account.contact.address.trim().is_empty() {
        return Err(DomainError::MissingAddress);
    }

    match account.status {
        AccountStatus::Rejected if is_blank(account.rejection_reason.as_deref()) => {
            Err(DomainError::MissingRejectionReason)
        }
        AccountStatus::AdditionalDocsRequired
            if is_blank(account.additional_docs_reason.as_deref()) =>
        {
            Err(DomainError::MissingAdditionalDocsReason)
        }
        _ => Ok(()),
    }
}

/// Validates a phone number as entered on a form.
///
/// Separators (`-`, space, `(`, `)`, `+`) are ignored; everything else
/// must be an ASCII digit.
///
/// # Errors
///
/// Returns an error if the number is empty, too long, or contains
/// anything other than digits and separators.
pub fn validate_phone_number(phone_number: &str) -> Result<(), DomainError> {
    validate_phone_number_length(phone_number)?;

    let digits: String = phone_number
        .chars()
        .filter(|c| !PHONE_SEPARATORS.contains(c))
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::InvalidPhoneNumber);
    }

    Ok(())
}

/// Validates contact details as entered on a form.
///
/// # Errors
///
/// Returns the first phone number or address error found.
pub fn validate_contact_details(contact: &ContactDetails) -> Result<(), DomainError> {
    validate_phone_number(&contact.phone_number)?;
    if contact.address.trim().is_empty() {
        return Err(DomainError::MissingAddress);
    }
    Ok(())
}

fn validate_phone_number_length(phone_number: &str) -> Result<(), DomainError> {
    if phone_number.is_empty() {
        return Err(DomainError::MissingPhoneNumber);
    }

    let actual: usize = phone_number.chars().count();
    if actual > PHONE_NUMBER_MAX_LENGTH {
        return Err(DomainError::PhoneNumberTooLong {
            max: PHONE_NUMBER_MAX_LENGTH,
            actual,
        });
    }
    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
