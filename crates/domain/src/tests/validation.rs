// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::create_test_account;
use crate::{
    Account, AccountStatus, ContactDetails, DomainError, validate_account,
    validate_contact_details, validate_phone_number,
};

#[test]
fn test_validate_account_accepts_pending_account() {
    let account: Account = create_test_account();
    assert!(validate_account(&account).is_ok());
}

#[test]
fn test_rejected_without_reason_fails() {
    let mut account: Account = create_test_account();
    account.status = AccountStatus::Rejected;

    let result: Result<(), DomainError> = validate_account(&account);
    assert_eq!(result, Err(DomainError::MissingRejectionReason));
}

#[test]
fn test_rejected_with_blank_reason_fails() {
    let mut account: Account = create_test_account();
    account.status = AccountStatus::Rejected;
    account.rejection_reason = Some(String::from("   "));

    let result: Result<(), DomainError> = validate_account(&account);
    assert_eq!(result, Err(DomainError::MissingRejectionReason));
}

#[test]
fn test_rejected_with_reason_succeeds() {
    let mut account: Account = create_test_account();
    account.status = AccountStatus::Rejected;
    account.rejection_reason = Some(String::from("incomplete docs"));

    assert!(validate_account(&account).is_ok());
}

#[test]
fn test_additional_docs_without_reason_fails() {
    let mut account: Account = create_test_account();
    account.status = AccountStatus::AdditionalDocsRequired;
    // A rejection reason does not satisfy the additional documents rule
    account.rejection_reason = Some(String::from("irrelevant"));

    let result: Result<(), DomainError> = validate_account(&account);
    assert_eq!(result, Err(DomainError::MissingAdditionalDocsReason));
}

#[test]
fn test_additional_docs_with_reason_succeeds() {
    let mut account: Account = create_test_account();
    account.status = AccountStatus::AdditionalDocsRequired;
    account.additional_docs_reason = Some(String::from("Need ID"));

    assert!(validate_account(&account).is_ok());
}

#[test]
fn test_approved_needs_no_reason() {
    let mut account: Account = create_test_account();
    account.status = AccountStatus::Approved;

    assert!(validate_account(&account).is_ok());
}

#[test]
fn test_validate_account_rejects_blank_address() {
    let mut account: Account = create_test_account();
    account.contact.address = String::from("  ");

    assert_eq!(validate_account(&account), Err(DomainError::MissingAddress));
}

#[test]
fn test_validate_account_rejects_overlong_phone() {
    let mut account: Account = create_test_account();
    account.contact.phone_number = String::from("123456789012345678901");

    assert_eq!(
        validate_account(&account),
        Err(DomainError::PhoneNumberTooLong { max: 20, actual: 21 })
    );
}

#[test]
fn test_validate_phone_number_accepts_common_formats() {
    assert!(validate_phone_number("123-456-7890").is_ok());
    assert!(validate_phone_number("(555) 123 4567").is_ok());
    assert!(validate_phone_number("+1 555 123 4567").is_ok());
    assert!(validate_phone_number("5551234567").is_ok());
}

#[test]
fn test_validate_phone_number_rejects_letters() {
    assert_eq!(
        validate_phone_number("invalid-phone"),
        Err(DomainError::InvalidPhoneNumber)
    );
}

#[test]
fn test_validate_phone_number_rejects_separators_only() {
    assert_eq!(
        validate_phone_number("--()"),
        Err(DomainError::InvalidPhoneNumber)
    );
}

#[test]
fn test_validate_phone_number_rejects_empty() {
    assert_eq!(
        validate_phone_number(""),
        Err(DomainError::MissingPhoneNumber)
    );
}

#[test]
fn test_validate_contact_details() {
    let valid: ContactDetails =
        ContactDetails::new("123-456-7890", "123 Test St, Test City, TC 12345");
    assert!(validate_contact_details(&valid).is_ok());

    let invalid_phone: ContactDetails = ContactDetails::new("invalid-phone", "123 Test St");
    assert_eq!(
        validate_contact_details(&invalid_phone),
        Err(DomainError::InvalidPhoneNumber)
    );

    let missing_address: ContactDetails = ContactDetails::new("123-456-7890", "");
    assert_eq!(
        validate_contact_details(&missing_address),
        Err(DomainError::MissingAddress)
    );
}
