// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event persistence.
//!
//! Audit recording is observability, not a correctness mechanism: callers
//! record events only after the write they describe has committed, and a
//! failure to record never changes the outcome of that write.

use brokerage_audit::AuditEvent;
use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::{info, warn};

use crate::backend::PersistenceBackend;
use crate::data_models::{ActionData, ActorData, CauseData, StateSnapshotData};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Persists an audit event.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `event` - The audit event to persist
///
/// # Returns
///
/// The event ID assigned by the database.
///
/// # Errors
///
/// Returns an error if persistence or serialization fails.
pub fn persist_audit_event(
    conn: &mut SqliteConnection,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    let actor_data: ActorData = ActorData {
        id: event.actor.id.clone(),
        actor_type: event.actor.actor_type.clone(),
        user_id: event.actor.user_id,
        username: event.actor.username.clone(),
    };

    let cause_data: CauseData = CauseData {
        id: event.cause.id.clone(),
        description: event.cause.description.clone(),
    };

    let action_data: ActionData = ActionData {
        name: event.action.name.clone(),
        details: event.action.details.clone(),
    };

    let before_data: StateSnapshotData = StateSnapshotData {
        data: event.before.data.clone(),
    };

    let after_data: StateSnapshotData = StateSnapshotData {
        data: event.after.data.clone(),
    };

    let actor_json: String = serde_json::to_string(&actor_data)?;
    let cause_json: String = serde_json::to_string(&cause_data)?;
    let action_json: String = serde_json::to_string(&action_data)?;
    let before_json: String = serde_json::to_string(&before_data)?;
    let after_json: String = serde_json::to_string(&after_data)?;

    diesel::insert_into(audit_events::table)
        .values((
            audit_events::account_id.eq(event.account_id),
            audit_events::actor_user_id.eq(event.actor.user_id),
            audit_events::actor_username.eq(event.actor.username.clone()),
            audit_events::actor_json.eq(actor_json),
            audit_events::cause_json.eq(cause_json),
            audit_events::action_json.eq(action_json),
            audit_events::before_snapshot_json.eq(before_json),
            audit_events::after_snapshot_json.eq(after_json),
        ))
        .execute(conn)?;

    conn.get_last_insert_rowid()
}

/// Emits and stores audit events, swallowing failures.
///
/// Each event is logged on the `audit` tracing target and then written to
/// `audit_events`. A failed write is logged with `warn!`.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `events` - Events describing a write that has already committed
pub fn record_audit_events(conn: &mut SqliteConnection, events: &[AuditEvent]) {
    for event in events {
        info!(
            target: "audit",
            action = %event.action.name,
            account_id = ?event.account_id,
            actor = %event.actor.display_name(),
            cause = %event.cause.id,
            details = event.action.details.as_deref().unwrap_or(""),
            "{}",
            event.action.name
        );

        if let Err(err) = persist_audit_event(conn, event) {
            warn!(
                action = %event.action.name,
                account_id = ?event.account_id,
                error = %err,
                "Failed to record audit event"
            );
        }
    }
}
