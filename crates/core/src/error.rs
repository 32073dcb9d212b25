// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use brokerage_domain::{AccountStatus, DomainError};

/// Errors that can occur during state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The owner tried to resubmit while the status does not allow it.
    ResubmissionBlocked {
        /// The status that blocked the resubmission.
        status: AccountStatus,
    },
    /// The account is already approved.
    AlreadyApproved,
    /// The command needs an existing account and there is none.
    AccountNotFound,
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::ResubmissionBlocked {
                status: AccountStatus::Rejected,
            } => write!(
                f,
                "Your application was rejected and cannot be resubmitted."
            ),
            Self::ResubmissionBlocked { .. } => write!(
                f,
                "Your application is pending review and cannot be changed."
            ),
            Self::AlreadyApproved => write!(f, "Your account is already approved."),
            Self::AccountNotFound => write!(f, "Account not found"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
