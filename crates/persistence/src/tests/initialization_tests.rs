// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::{create_test_persistence, new_user};
use crate::{AccountFilter, AccountPage, Persistence, PersistenceError};

#[test]
fn test_persistence_initialization() {
    let result: Result<Persistence, PersistenceError> = Persistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_foreign_keys_enforced() {
    let mut persistence: Persistence = create_test_persistence();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let mut db1: Persistence = create_test_persistence();
    let mut db2: Persistence = create_test_persistence();

    db1.create_user(&new_user("alice")).unwrap();

    assert!(db1.get_user_by_username("alice").unwrap().is_some());
    assert!(
        db2.get_user_by_username("alice").unwrap().is_none(),
        "db2 should not see rows from db1"
    );
}

#[test]
fn test_migrations_applied_on_initialization() {
    let mut persistence: Persistence = create_test_persistence();

    let page: AccountPage = persistence
        .list_accounts(&AccountFilter::default())
        .expect("accounts table must exist");

    assert_eq!(page.total, 0);
    assert!(page.accounts.is_empty());
}
