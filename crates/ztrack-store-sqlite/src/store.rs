//! [`SqliteStore`], the SQLite implementation of [`InboxStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use ztrack_core::{
  history::{HistoryEntry, NewHistoryEntry},
  message::{ContactMessage, NewMessage, Status},
  store::{
    InboxStore, MessageQuery, StatusCounts, Transition, TransitionOutcome,
  },
};

use crate::{
  Error, Result,
  encode::{
    HISTORY_COLUMNS, MESSAGE_COLUMNS, RawHistoryEntry, RawMessage, decode_status,
    encode_dt, encode_status, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A contact inbox backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What happened inside the transition transaction. Timestamps are taken on
/// the connection thread so their order matches commit order.
enum TxStep {
  Missing,
  Rejected(Status),
  Undecodable(String),
  Committed { from: Status, raw: RawMessage, at: DateTime<Utc> },
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── InboxStore impl ─────────────────────────────────────────────────────────

impl InboxStore for SqliteStore {
  type Error = Error;

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn insert_message(&self, input: NewMessage) -> Result<ContactMessage> {
    let id = Uuid::new_v4();

    let id_str     = encode_uuid(id);
    let name       = input.name.clone();
    let email      = input.email.clone();
    let body       = input.body.clone();
    let status_str = encode_status(Status::Received);

    let created = self
      .conn
      .call(move |conn| {
        let created = now();
        let at_str = encode_dt(created);
        conn.execute(
          "INSERT INTO messages (
             message_id, name, email, body, status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![id_str, name, email, body, status_str, at_str],
        )?;
        Ok(created)
      })
      .await?;

    Ok(ContactMessage {
      id,
      name: input.name,
      email: input.email,
      body: input.body,
      status: Status::Received,
      response: None,
      created_at: created,
      updated_at: created,
    })
  }

  async fn get_message(&self, id: Uuid) -> Result<Option<ContactMessage>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMessage> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_id = ?1"
              ),
              rusqlite::params![id_str],
              RawMessage::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMessage::into_message).transpose()
  }

  async fn query_messages(
    &self,
    query: MessageQuery,
  ) -> Result<(Vec<ContactMessage>, u64)> {
    let status_str = query.status.map(encode_status);
    let limit_val  = i64::try_from(query.limit).unwrap_or(i64::MAX);
    let offset_val = i64::try_from(query.offset).unwrap_or(i64::MAX);

    let (raws, total): (Vec<RawMessage>, i64) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          "SELECT COUNT(*) FROM messages WHERE ?1 IS NULL OR status = ?1",
          rusqlite::params![status_str],
          |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS}
           FROM messages
           WHERE ?1 IS NULL OR status = ?1
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![status_str, limit_val, offset_val],
            RawMessage::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
      })
      .await?;

    let messages = raws
      .into_iter()
      .map(RawMessage::into_message)
      .collect::<Result<_>>()?;
    Ok((messages, total.max(0) as u64))
  }

  async fn count_by_status(&self) -> Result<StatusCounts> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT status, COUNT(*) FROM messages GROUP BY status")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut counts = StatusCounts::default();
    for (status, count) in rows {
      counts.add(decode_status("status", &status)?, count.max(0) as u64);
    }
    Ok(counts)
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  async fn commit_transition(
    &self,
    transition: Transition,
  ) -> Result<TransitionOutcome> {
    let Transition { message_id, to, actor, note, response } = transition;

    let entry_id = Uuid::new_v4();

    let id_str     = encode_uuid(message_id);
    let entry_str  = encode_uuid(entry_id);
    let to_str     = encode_status(to);
    let actor_col  = actor.clone();
    let note_col   = note.clone();

    let step = self
      .conn
      .call(move |conn| {
        // Dropping `tx` without commit rolls both writes back.
        let tx = conn.transaction()?;

        let current: Option<String> = tx
          .query_row(
            "SELECT status FROM messages WHERE message_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;
        let Some(current) = current else {
          return Ok(TxStep::Missing);
        };
        let Ok(from) = current.parse::<Status>() else {
          return Ok(TxStep::Undecodable(current));
        };
        if !from.can_transition_to(to) {
          return Ok(TxStep::Rejected(from));
        }

        let at = now();
        let at_str = encode_dt(at);

        match &response {
          Some(r) => tx.execute(
            "UPDATE messages
             SET status = ?1, updated_at = ?2,
                 response = ?3, responded_by = ?4, responded_at = ?2
             WHERE message_id = ?5",
            rusqlite::params![to_str, at_str, r.text, r.responded_by, id_str],
          )?,
          None => tx.execute(
            "UPDATE messages SET status = ?1, updated_at = ?2
             WHERE message_id = ?3",
            rusqlite::params![to_str, at_str, id_str],
          )?,
        };

        tx.execute(
          "INSERT INTO history (
             entry_id, message_id, previous_status, new_status,
             actor, note, occurred_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            entry_str,
            id_str,
            encode_status(from),
            to_str,
            actor_col,
            note_col,
            at_str,
          ],
        )?;

        let raw = tx.query_row(
          &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_id = ?1"),
          rusqlite::params![id_str],
          RawMessage::from_row,
        )?;

        tx.commit()?;
        Ok(TxStep::Committed { from, raw, at })
      })
      .await?;

    match step {
      TxStep::Missing => Ok(TransitionOutcome::Missing),
      TxStep::Rejected(from) => Ok(TransitionOutcome::Rejected { from }),
      TxStep::Undecodable(value) => {
        Err(Error::Decode { column: "status", value })
      }
      TxStep::Committed { from, raw, at } => Ok(TransitionOutcome::Committed {
        message: raw.into_message()?,
        entry:   HistoryEntry {
          id: entry_id,
          message_id,
          previous_status: from,
          new_status: to,
          actor,
          note,
          occurred_at: at,
        },
      }),
    }
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn append_history(&self, input: NewHistoryEntry) -> Result<HistoryEntry> {
    let id = Uuid::new_v4();

    let entry_str   = encode_uuid(id);
    let message_str = encode_uuid(input.message_id);
    let prev_str    = encode_status(input.previous_status);
    let new_str     = encode_status(input.new_status);
    let actor       = input.actor.clone();
    let note        = input.note.clone();

    let occurred_at = self
      .conn
      .call(move |conn| {
        let at = now();
        conn.execute(
          "INSERT INTO history (
             entry_id, message_id, previous_status, new_status,
             actor, note, occurred_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            entry_str,
            message_str,
            prev_str,
            new_str,
            actor,
            note,
            encode_dt(at),
          ],
        )?;
        Ok(at)
      })
      .await?;

    Ok(HistoryEntry {
      id,
      message_id: input.message_id,
      previous_status: input.previous_status,
      new_status: input.new_status,
      actor: input.actor,
      note: input.note,
      occurred_at,
    })
  }

  async fn list_history(&self, message_id: Uuid) -> Result<Vec<HistoryEntry>> {
    let id_str = encode_uuid(message_id);

    let raws: Vec<RawHistoryEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {HISTORY_COLUMNS}
           FROM history
           WHERE message_id = ?1
           ORDER BY occurred_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawHistoryEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistoryEntry::into_entry).collect()
  }
}
