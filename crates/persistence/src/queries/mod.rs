// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! - `accounts`: account lookups and the filtered review list
//! - `audit`: audit timelines
//! - `sessions`: session lookups
//! - `users`: user lookups and password verification

pub mod accounts;
pub mod audit;
pub mod sessions;
pub mod users;
