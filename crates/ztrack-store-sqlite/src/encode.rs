//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed number of
//! fractional digits, so that ordering the text orders the instants. UUIDs
//! are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;
use ztrack_core::{
  history::HistoryEntry,
  message::{ContactMessage, Response, Status},
};

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The current instant, truncated to what [`encode_dt`] keeps so that values
/// handed back to callers equal what a later read returns.
pub fn now() -> DateTime<Utc> {
  let now = Utc::now();
  decode_dt(&encode_dt(now)).unwrap_or(now)
}

// ─── Status ───────────────────────────────────────────────────────────────────

pub fn encode_status(s: Status) -> &'static str { s.as_str() }

pub fn decode_status(column: &'static str, s: &str) -> Result<Status> {
  s.parse().map_err(|_| Error::Decode { column, value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawMessage::from_row`].
pub const MESSAGE_COLUMNS: &str = "message_id, name, email, body, status, \
   response, responded_by, responded_at, created_at, updated_at";

/// Raw strings read directly from a `messages` row.
pub struct RawMessage {
  pub message_id:   String,
  pub name:         String,
  pub email:        String,
  pub body:         String,
  pub status:       String,
  pub response:     Option<String>,
  pub responded_by: Option<String>,
  pub responded_at: Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id:   row.get(0)?,
      name:         row.get(1)?,
      email:        row.get(2)?,
      body:         row.get(3)?,
      status:       row.get(4)?,
      response:     row.get(5)?,
      responded_by: row.get(6)?,
      responded_at: row.get(7)?,
      created_at:   row.get(8)?,
      updated_at:   row.get(9)?,
    })
  }

  pub fn into_message(self) -> Result<ContactMessage> {
    let response = match (self.response, self.responded_by, self.responded_at)
    {
      (Some(text), Some(responded_by), Some(at)) => Some(Response {
        text,
        responded_by,
        responded_at: decode_dt(&at)?,
      }),
      (None, None, None) => None,
      (text, _, _) => {
        return Err(Error::Decode {
          column: "response",
          value:  text.unwrap_or_default(),
        });
      }
    };

    Ok(ContactMessage {
      id: decode_uuid(&self.message_id)?,
      name: self.name,
      email: self.email,
      body: self.body,
      status: decode_status("status", &self.status)?,
      response,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawHistoryEntry::from_row`].
pub const HISTORY_COLUMNS: &str =
  "entry_id, message_id, previous_status, new_status, actor, note, occurred_at";

/// Raw strings read directly from a `history` row.
pub struct RawHistoryEntry {
  pub entry_id:        String,
  pub message_id:      String,
  pub previous_status: String,
  pub new_status:      String,
  pub actor:           String,
  pub note:            String,
  pub occurred_at:     String,
}

impl RawHistoryEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:        row.get(0)?,
      message_id:      row.get(1)?,
      previous_status: row.get(2)?,
      new_status:      row.get(3)?,
      actor:           row.get(4)?,
      note:            row.get(5)?,
      occurred_at:     row.get(6)?,
    })
  }

  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      id:              decode_uuid(&self.entry_id)?,
      message_id:      decode_uuid(&self.message_id)?,
      previous_status: decode_status("previous_status", &self.previous_status)?,
      new_status:      decode_status("new_status", &self.new_status)?,
      actor:           self.actor,
      note:            self.note,
      occurred_at:     decode_dt(&self.occurred_at)?,
    })
  }
}
