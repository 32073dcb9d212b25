// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod validation;

use time::OffsetDateTime;
use time::macros::datetime;

use crate::{Account, AccountOwner, ContactDetails};

pub fn test_now() -> OffsetDateTime {
    datetime!(2026-03-02 09:30 UTC)
}

pub fn create_test_account() -> Account {
    Account::new_application(
        &AccountOwner::new(1, "testuser"),
        ContactDetails::new("123-456-7890", "123 Test St"),
        test_now(),
    )
}
