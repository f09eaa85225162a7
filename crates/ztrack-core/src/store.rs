//! The `InboxStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `ztrack-store-sqlite`).
//! It covers both the message table and the history ledger because the
//! lifecycle's atomic operations span the two.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  history::{HistoryEntry, NewHistoryEntry},
  message::{ContactMessage, NewMessage, Status},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`InboxStore::query_messages`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageQuery {
  /// Restrict to one status; `None` matches every message.
  pub status: Option<Status>,
  pub offset: u64,
  pub limit:  u64,
}

/// Number of messages in each status, plus the overall count.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct StatusCounts {
  pub total:       u64,
  pub received:    u64,
  pub in_progress: u64,
  pub answered:    u64,
  pub closed:      u64,
}

impl StatusCounts {
  /// Add `count` messages in `status` to the matching bucket and the total.
  pub fn add(&mut self, status: Status, count: u64) {
    let bucket = match status {
      Status::Received => &mut self.received,
      Status::InProgress => &mut self.in_progress,
      Status::Answered => &mut self.answered,
      Status::Closed => &mut self.closed,
    };
    *bucket += count;
    self.total += count;
  }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// Response fields written alongside a transition into `answered`.
#[derive(Debug, Clone)]
pub struct ResponseInput {
  pub text:         String,
  pub responded_by: String,
}

/// A status change to apply atomically with its history entry.
#[derive(Debug, Clone)]
pub struct Transition {
  pub message_id: Uuid,
  pub to:         Status,
  pub actor:      String,
  pub note:       String,
  /// If set, the message's response fields are (re)written and
  /// `responded_at` is set to the commit time.
  pub response:   Option<ResponseInput>,
}

/// Result of [`InboxStore::commit_transition`].
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
  /// No message with the given id; nothing was written.
  Missing,
  /// [`Status::can_transition_to`] refused the edge; nothing was written.
  Rejected { from: Status },
  /// The message update and its history entry were committed together.
  Committed {
    message: ContactMessage,
    entry:   HistoryEntry,
  },
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a contact inbox backend.
///
/// Only the lifecycle service should call the writing methods: it is the sole
/// owner of message status and history.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait InboxStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Messages ──────────────────────────────────────────────────────────

  /// Persist a new message in [`Status::Received`]. The id and timestamps
  /// are assigned by the store.
  fn insert_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<ContactMessage, Self::Error>> + Send + '_;

  /// Retrieve a message by id. Returns `None` if not found.
  fn get_message(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ContactMessage>, Self::Error>> + Send + '_;

  /// One page of messages, newest first, plus the number of messages that
  /// match the filter regardless of paging.
  fn query_messages(
    &self,
    query: MessageQuery,
  ) -> impl Future<Output = Result<(Vec<ContactMessage>, u64), Self::Error>>
  + Send
  + '_;

  /// Count messages per status over the whole store, at call time.
  fn count_by_status(
    &self,
  ) -> impl Future<Output = Result<StatusCounts, Self::Error>> + Send + '_;

  // ── Transitions ───────────────────────────────────────────────────────

  /// In a single transaction: read the current status, check it against
  /// [`Status::can_transition_to`], update the message, and append a history
  /// entry from the status read to `transition.to`.
  ///
  /// Either both writes become visible or neither does.
  fn commit_transition(
    &self,
    transition: Transition,
  ) -> impl Future<Output = Result<TransitionOutcome, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// Append a standalone history entry. The `occurred_at` timestamp is set by
  /// the store.
  fn append_history(
    &self,
    entry: NewHistoryEntry,
  ) -> impl Future<Output = Result<HistoryEntry, Self::Error>> + Send + '_;

  /// All history entries for a message, newest first. Empty if none.
  fn list_history(
    &self,
    message_id: Uuid,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>, Self::Error>> + Send + '_;
}
