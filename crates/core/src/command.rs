// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use brokerage_domain::{AccountStatus, ContactDetails};

/// A command represents user or reviewer intent as data only.
///
/// Commands are turned into candidate accounts by `apply`; the candidate
/// then passes through the save hook before it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit a new application, or resubmit one that needs more documents.
    SubmitApplication {
        /// The contact details entered by the owner.
        contact: ContactDetails,
    },
    /// A reviewer's change to an existing account.
    ReviewAccount {
        /// The new status.
        status: AccountStatus,
        /// The rejection reason, required when rejecting.
        rejection_reason: Option<String>,
        /// The additional documents request, required when requesting documents.
        additional_docs_reason: Option<String>,
        /// Corrected contact details, if the reviewer edited them.
        contact: Option<ContactDetails>,
    },
}
