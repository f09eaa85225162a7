//! Handlers for the contact inbox endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/contact` | Body: `{"name","email","body"}`; public form entry point |
//! | `GET`  | `/contacts` | `?status=all\|<status>&page=1&pageSize=10` |
//! | `GET`  | `/contacts/stats` | Per-status counts |
//! | `PUT`  | `/contact/{id}` | Body: `{"status","actor"?,"note"?}` |
//! | `POST` | `/contact/{id}/respond` | Body: `{"responseText","respondedBy"?}`; emails the submitter |
//! | `GET`  | `/contact/{id}/history` | Newest first |
//!
//! Extractor rejections (malformed JSON, an id that is not a UUID, a
//! non-numeric `page`) are reported as 400 through [`ApiError`].

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use ztrack_core::{
  history::HistoryEntry,
  lifecycle::{Lifecycle, Page},
  message::{ContactMessage, NewMessage, Status, StatusFilter},
  notify::{Delivery, Notifier},
  store::{InboxStore, StatusCounts},
};

use crate::error::ApiError;

// ─── Submit ───────────────────────────────────────────────────────────────────

/// Missing fields deserialize as empty so they fail validation with a JSON
/// error body instead of an extractor rejection.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  #[serde(default)]
  pub name:  String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub body:  String,
}

/// `POST /contact`: returns 201 + `{"ok":true,"id":...}`.
pub async fn submit<S, N>(
  State(lifecycle): State<Arc<Lifecycle<S, N>>>,
  body: Result<Json<SubmitBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InboxStore,
  N: Notifier,
{
  let Json(body) = body?;
  let message = lifecycle
    .submit(NewMessage { name: body.name, email: body.email, body: body.body })
    .await?;
  Ok((StatusCode::CREATED, Json(json!({ "ok": true, "id": message.id }))))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  /// `all` or a single status. Defaults to `all`.
  pub status:    Option<String>,
  /// 1-based. Defaults to 1.
  pub page:      Option<u64>,
  /// Defaults to 10.
  pub page_size: Option<u64>,
}

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// `GET /contacts[?status=...][&page=...][&pageSize=...]`
pub async fn list<S, N>(
  State(lifecycle): State<Arc<Lifecycle<S, N>>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<ContactMessage>>, ApiError>
where
  S: InboxStore,
  N: Notifier,
{
  let Query(params) = params?;
  let filter = match params.status.as_deref() {
    Some(s) => s.parse::<StatusFilter>()?,
    None => StatusFilter::All,
  };
  let page = lifecycle
    .list(
      filter,
      params.page.unwrap_or(1),
      params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    )
    .await?;
  Ok(Json(page))
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /contacts/stats`
pub async fn stats<S, N>(
  State(lifecycle): State<Arc<Lifecycle<S, N>>>,
) -> Result<Json<StatusCounts>, ApiError>
where
  S: InboxStore,
  N: Notifier,
{
  Ok(Json(lifecycle.stats().await?))
}

// ─── Set status ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  /// Missing deserializes as empty, which fails to parse as a status.
  #[serde(default)]
  pub status: String,
  pub actor:  Option<String>,
  pub note:   Option<String>,
}

/// `PUT /contact/{id}`, body `{"status":"closed","actor":"Bea","note":"..."}`
pub async fn update_status<S, N>(
  State(lifecycle): State<Arc<Lifecycle<S, N>>>,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InboxStore,
  N: Notifier,
{
  let Path(id) = id?;
  let Json(body) = body?;
  let status = body.status.parse::<Status>()?;
  lifecycle
    .set_status(id, status, body.actor.as_deref(), body.note.as_deref())
    .await?;
  Ok(Json(json!({ "ok": true })))
}

// ─── Respond ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondBody {
  #[serde(default)]
  pub response_text: String,
  pub responded_by:  Option<String>,
}

/// Body of a successful `POST /contact/{id}/respond`. The response is stored
/// whenever `ok` is true; `emailSent` reports delivery on its own.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondReply {
  pub ok:         bool,
  pub email_sent: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:      Option<String>,
}

/// `POST /contact/{id}/respond`
pub async fn respond<S, N>(
  State(lifecycle): State<Arc<Lifecycle<S, N>>>,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<RespondBody>, JsonRejection>,
) -> Result<Json<RespondReply>, ApiError>
where
  S: InboxStore,
  N: Notifier,
{
  let Path(id) = id?;
  let Json(body) = body?;
  let outcome = lifecycle
    .respond(id, &body.response_text, body.responded_by.as_deref())
    .await?;

  let (message_id, error) = match outcome.delivery {
    Delivery::Sent { message_id } => (Some(message_id), None),
    Delivery::Failed { error } => (None, Some(error)),
  };
  Ok(Json(RespondReply {
    ok: true,
    email_sent: message_id.is_some(),
    message_id,
    error,
  }))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /contact/{id}/history`
pub async fn history<S, N>(
  State(lifecycle): State<Arc<Lifecycle<S, N>>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError>
where
  S: InboxStore,
  N: Notifier,
{
  let Path(id) = id?;
  Ok(Json(lifecycle.history(id).await?))
}
