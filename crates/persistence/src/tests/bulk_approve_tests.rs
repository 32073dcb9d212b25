// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::{
    create_reviewer, create_test_cause, create_test_persistence, register_applicant, review_time,
};
use crate::Persistence;
use brokerage_audit::{Actor, AuditEvent};
use brokerage_domain::{Account, AccountStatus};
use time::{Duration, OffsetDateTime};

#[test]
fn test_bulk_approve_two_pending_accounts() {
    let mut persistence: Persistence = create_test_persistence();
    let alice: Account = register_applicant(&mut persistence, "alice", "555-000-0001");
    let bob: Account = register_applicant(&mut persistence, "bob", "555-000-0002");
    let reviewer: Actor = create_reviewer(&mut persistence, "reviewer");
    let ids: Vec<i64> = vec![alice.account_id.unwrap(), bob.account_id.unwrap()];

    let updated: usize = persistence
        .bulk_approve(&ids, &reviewer, &create_test_cause(), review_time())
        .unwrap();

    assert_eq!(updated, 2);
    for id in ids {
        let account: Account = persistence.get_account_by_id(id).unwrap().unwrap();
        assert_eq!(account.status, AccountStatus::Approved);
        assert_eq!(account.reviewed_by, reviewer.user_id);
        assert_eq!(account.reviewed_at, Some(review_time()));
        assert_eq!(account.approved_at, Some(review_time()));
    }
}

#[test]
fn test_bulk_approve_overwrites_earlier_reviewer() {
    let mut persistence: Persistence = create_test_persistence();
    let alice: Account = register_applicant(&mut persistence, "alice", "555-000-0001");
    let first: Actor = create_reviewer(&mut persistence, "first");
    let second: Actor = create_reviewer(&mut persistence, "second");

    let mut candidate: Account = alice;
    candidate.status = AccountStatus::Rejected;
    candidate.rejection_reason = Some(String::from("Incomplete"));
    let rejected: Account = persistence
        .save_account(candidate, &first, &create_test_cause(), review_time())
        .unwrap();

    let later: OffsetDateTime = review_time() + Duration::days(1);
    persistence
        .bulk_approve(
            &[rejected.account_id.unwrap()],
            &second,
            &create_test_cause(),
            later,
        )
        .unwrap();

    let account: Account = persistence
        .get_account_by_id(rejected.account_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(account.reviewed_by, second.user_id);
    assert_eq!(account.reviewed_at, Some(later));
    assert_eq!(account.rejection_reason.as_deref(), Some("Incomplete"));
}

#[test]
fn test_bulk_approve_ignores_unknown_ids() {
    let mut persistence: Persistence = create_test_persistence();
    let alice: Account = register_applicant(&mut persistence, "alice", "555-000-0001");
    let reviewer: Actor = create_reviewer(&mut persistence, "reviewer");

    let updated: usize = persistence
        .bulk_approve(
            &[alice.account_id.unwrap(), 9_999],
            &reviewer,
            &create_test_cause(),
            review_time(),
        )
        .unwrap();

    assert_eq!(updated, 1);
}

#[test]
fn test_bulk_approve_records_events_for_changed_accounts() {
    let mut persistence: Persistence = create_test_persistence();
    let alice: Account = register_applicant(&mut persistence, "alice", "555-000-0001");
    let reviewer: Actor = create_reviewer(&mut persistence, "reviewer");
    let id: i64 = alice.account_id.unwrap();

    persistence
        .bulk_approve(&[id], &reviewer, &create_test_cause(), review_time())
        .unwrap();
    persistence
        .bulk_approve(&[id], &reviewer, &create_test_cause(), review_time())
        .unwrap();

    let events: Vec<AuditEvent> = persistence.get_audit_events_for_account(id).unwrap();
    let bulk_events: Vec<&AuditEvent> = events
        .iter()
        .filter(|e| e.action.name == "BulkApprove")
        .collect();
    assert_eq!(bulk_events.len(), 1);
    assert!(bulk_events[0].after.data.contains("status=approved"));
}
