// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! - `accounts`: account inserts, updates and the bulk approval update
//! - `audit`: audit event persistence and best-effort recording
//! - `sessions`: session lifecycle
//! - `users`: user lifecycle
//!
//! Functions here write rows as given. Account rows must already have passed
//! the save hook in `brokerage::prepare_save`; the `Persistence` adapter is
//! responsible for that ordering.

pub mod accounts;
pub mod audit;
pub mod sessions;
pub mod users;
