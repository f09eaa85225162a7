//! Contact messages: the unit of work in the admin inbox.
//!
//! A message is created by the public contact form and then moves through the
//! statuses below. Its submitter-provided fields never change after creation;
//! only the lifecycle service mutates `status` and the response fields.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where a message is in its handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  Received,
  InProgress,
  Answered,
  Closed,
}

impl Status {
  pub const ALL: [Status; 4] =
    [Self::Received, Self::InProgress, Self::Answered, Self::Closed];

  /// The wire and database spelling; matches the serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Received => "received",
      Self::InProgress => "in_progress",
      Self::Answered => "answered",
      Self::Closed => "closed",
    }
  }

  /// Whether the lifecycle service may move a message from `self` to `next`.
  ///
  /// Operators may correct a status by hand, so every edge is allowed,
  /// including `next == self`. Tightening the workflow only touches this
  /// function.
  pub fn can_transition_to(self, _next: Status) -> bool { true }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Status {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Status::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| Error::Validation(format!("unknown status: {s:?}")))
  }
}

/// A list filter: either every status or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
  #[default]
  All,
  Only(Status),
}

impl StatusFilter {
  pub fn status(self) -> Option<Status> {
    match self {
      Self::All => None,
      Self::Only(status) => Some(status),
    }
  }
}

impl FromStr for StatusFilter {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "all" => Ok(Self::All),
      other => other.parse().map(Self::Only),
    }
  }
}

// ─── Response ────────────────────────────────────────────────────────────────

/// An operator's answer. The three fields are only ever set together, which
/// is why they share one `Option` on [`ContactMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
  #[serde(rename = "response")]
  pub text:         String,
  pub responded_by: String,
  pub responded_at: DateTime<Utc>,
}

// ─── ContactMessage ──────────────────────────────────────────────────────────

/// A single contact-form submission and its current handling state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  pub body:       String,
  pub status:     Status,
  /// Present once the message has been answered; never cleared afterwards.
  #[serde(flatten)]
  pub response:   Option<Response>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::InboxStore::insert_message`]. Identifiers,
/// timestamps and the initial status are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewMessage {
  pub name:  String,
  pub email: String,
  pub body:  String,
}
