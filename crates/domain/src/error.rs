// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Status is `rejected` but no rejection reason was supplied.
    MissingRejectionReason,
    /// Status is `additional_docs_required` but no request text was supplied.
    MissingAdditionalDocsReason,
    /// Phone number contains characters other than digits and separators.
    InvalidPhoneNumber,
    /// Phone number is empty.
    MissingPhoneNumber,
    /// Phone number exceeds the stored column width.
    PhoneNumberTooLong {
        /// The maximum number of characters allowed.
        max: usize,
        /// The number of characters supplied.
        actual: usize,
    },
    /// Address is empty.
    MissingAddress,
    /// Status string does not name a known status.
    InvalidAccountStatus {
        /// The rejected status value.
        status: String,
    },
}

impl DomainError {
    /// Returns the form field this error is scoped to, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingRejectionReason => Some("rejection_reason"),
            Self::MissingAdditionalDocsReason => Some("additional_docs_reason"),
            Self::InvalidPhoneNumber | Self::MissingPhoneNumber | Self::PhoneNumberTooLong { .. } => {
                Some("phone_number")
            }
            Self::MissingAddress => Some("address"),
            Self::InvalidAccountStatus { .. } => Some("status"),
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRejectionReason => {
                write!(f, "Rejection reason is required when status is rejected")
            }
            Self::MissingAdditionalDocsReason => write!(
                f,
                "Additional documents reason is required when status is additional documents required."
            ),
            Self::InvalidPhoneNumber => write!(f, "Please enter a valid phone number"),
            Self::MissingPhoneNumber | Self::MissingAddress => {
                write!(f, "This field is required.")
            }
            Self::PhoneNumberTooLong { max, actual } => write!(
                f,
                "Ensure this value has at most {max} characters (it has {actual})."
            ),
            Self::InvalidAccountStatus { status } => {
                write!(f, "'{status}' is not a valid account status")
            }
        }
    }
}

impl std::error::Error for DomainError {}
