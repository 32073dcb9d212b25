// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Account status tracking.
//!
//! An account moves between four states. Reviewers drive every transition
//! except the owner's resubmission after additional documents were requested.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle state of a brokerage account application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Submitted and waiting for a reviewer
    #[default]
    Pending,
    /// Approved by a reviewer
    Approved,
    /// Rejected by a reviewer; carries a rejection reason
    Rejected,
    /// Reviewer asked for more documents; carries the request text
    AdditionalDocsRequired,
}

impl AccountStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::AdditionalDocsRequired,
    ];

    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::AdditionalDocsRequired => "additional_docs_required",
        }
    }

    /// Returns the human readable label shown to users and reviewers.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::AdditionalDocsRequired => "Additional Documents Required",
        }
    }

    /// Returns the guidance text shown on the status page for this status.
    #[must_use]
    pub const fn guidance(&self) -> &'static str {
        match self {
            Self::Pending => {
                "Your application is under review. We will notify you once a decision has been made."
            }
            Self::Approved => "Your account has been approved. You can now start trading.",
            Self::Rejected => {
                "Your application was not approved. Please review the reason provided below."
            }
            Self::AdditionalDocsRequired => {
                "We need more information to finish reviewing your application. Please update your application with the requested documents."
            }
        }
    }

    /// Returns true if the owner may resubmit contact details in this status.
    #[must_use]
    pub const fn allows_owner_submission(&self) -> bool {
        matches!(self, Self::AdditionalDocsRequired)
    }

    /// Parses a status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAccountStatus` if the string is not a valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "additional_docs_required" => Ok(Self::AdditionalDocsRequired),
            _ => Err(DomainError::InvalidAccountStatus {
                status: s.to_string(),
            }),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
