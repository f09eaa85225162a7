//! Audit history of status transitions.
//!
//! History entries are strictly append-only. The entries of one message,
//! newest first, are the authoritative record of every status it has held.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Status;

/// Actor recorded when the caller does not name one.
pub const DEFAULT_ACTOR: &str = "Admin";

/// One immutable record of a status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
  pub id:              Uuid,
  pub message_id:      Uuid,
  pub previous_status: Status,
  pub new_status:      Status,
  pub actor:           String,
  pub note:            String,
  /// Server-assigned; never changes after the entry is written.
  pub occurred_at:     DateTime<Utc>,
}

/// Input to [`crate::store::InboxStore::append_history`] for entries written
/// outside a transition, where both ends are already known.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
  pub message_id:      Uuid,
  pub previous_status: Status,
  pub new_status:      Status,
  pub actor:           String,
  pub note:            String,
}

/// Check that `entries` (newest first, as returned by the store) form one
/// connected chain of transitions ending in `current`.
///
/// Returns `true` for an empty history only if `current` is still
/// [`Status::Received`].
pub fn is_consistent(entries: &[HistoryEntry], current: Status) -> bool {
  let Some(newest) = entries.first() else {
    return current == Status::Received;
  };
  if newest.new_status != current {
    return false;
  }
  let ordered = entries
    .windows(2)
    .all(|pair| pair[0].occurred_at >= pair[1].occurred_at);
  let connected = entries
    .windows(2)
    .all(|pair| pair[0].previous_status == pair[1].new_status);
  ordered && connected
}
