// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod account_status;
mod error;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use account_status::AccountStatus;
pub use error::DomainError;
pub use types::{Account, AccountOwner, ContactDetails};
pub use validation::{
    PHONE_NUMBER_MAX_LENGTH, validate_account, validate_contact_details, validate_phone_number,
};
