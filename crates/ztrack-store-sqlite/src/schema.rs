//! SQL schema for the ZTRACK SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS messages (
    message_id    TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL,
    body          TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'received'
                  CHECK (status IN ('received', 'in_progress', 'answered', 'closed')),
    response      TEXT,
    responded_by  TEXT,
    responded_at  TEXT,             -- RFC 3339 UTC
    created_at    TEXT NOT NULL,    -- RFC 3339 UTC; server-assigned
    updated_at    TEXT NOT NULL,
    CHECK ((response IS NULL) = (responded_by IS NULL)
       AND (response IS NULL) = (responded_at IS NULL))
);

-- History is strictly append-only.
-- Rows only disappear through the cascade when their message is deleted.
CREATE TABLE IF NOT EXISTS history (
    entry_id        TEXT PRIMARY KEY,
    message_id      TEXT NOT NULL REFERENCES messages(message_id) ON DELETE CASCADE,
    previous_status TEXT NOT NULL,
    new_status      TEXT NOT NULL,
    actor           TEXT NOT NULL,
    note            TEXT NOT NULL,
    occurred_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS messages_created_idx ON messages(created_at);
CREATE INDEX IF NOT EXISTS messages_status_idx  ON messages(status, created_at);
CREATE INDEX IF NOT EXISTS history_message_idx  ON history(message_id, occurred_at);

PRAGMA user_version = 1;
";
