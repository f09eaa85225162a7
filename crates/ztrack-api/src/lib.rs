//! JSON REST API for the ZTRACK contact inbox.
//!
//! Exposes an axum [`Router`] backed by a [`Lifecycle`] over any
//! [`InboxStore`] and [`Notifier`]. Auth, TLS, and transport concerns are the
//! caller's responsibility: `actor` and `respondedBy` are taken on trust.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ztrack_api::api_router(lifecycle.clone()))
//! ```

pub mod contacts;
pub mod error;
pub mod mail;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use ztrack_core::{lifecycle::Lifecycle, notify::Notifier, store::InboxStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `lifecycle`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(lifecycle: Arc<Lifecycle<S, N>>) -> Router<()>
where
  S: InboxStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    // Public form
    .route("/contact", post(contacts::submit::<S, N>))
    // Admin inbox
    .route("/contacts", get(contacts::list::<S, N>))
    .route("/contacts/stats", get(contacts::stats::<S, N>))
    .route("/contact/{id}", put(contacts::update_status::<S, N>))
    .route("/contact/{id}/respond", post(contacts::respond::<S, N>))
    .route("/contact/{id}/history", get(contacts::history::<S, N>))
    // Mail transport check
    .route("/test-email", post(mail::test_email::<S, N>))
    .with_state(lifecycle)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;
  use ztrack_core::{
    lifecycle::LifecycleConfig,
    notify::{Delivery, OutboundEmail},
  };
  use ztrack_store_sqlite::SqliteStore;

  use super::*;

  /// Succeeds or fails every delivery, as configured.
  struct Scripted {
    fail: bool,
  }

  impl Notifier for Scripted {
    async fn send(&self, email: OutboundEmail) -> Delivery {
      if self.fail {
        Delivery::Failed { error: format!("mailbox {} unavailable", email.to) }
      } else {
        Delivery::Sent { message_id: "<42@ztrack.test>".into() }
      }
    }
  }

  async fn app(fail: bool, admin_email: Option<&str>) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let lifecycle = Lifecycle::new(
      Arc::new(store),
      Arc::new(Scripted { fail }),
      LifecycleConfig {
        company_name:   "ZTRACK".into(),
        admin_email:    admin_email.map(str::to_owned),
        notify_timeout: Duration::from_secs(5),
      },
    );
    api_router(Arc::new(lifecycle))
  }

  async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn submit(app: &Router, name: &str) -> String {
    let resp = call(
      app,
      "POST",
      "/contact",
      Some(json!({ "name": name, "email": "a@x.com", "body": "hi" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["ok"], true);
    body["id"].as_str().unwrap().to_owned()
  }

  // ── POST /contact ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn submit_then_list_shows_received_message() {
    let app = app(false, None).await;
    let id = submit(&app, "Ana").await;

    let resp = call(&app, "GET", "/contacts", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = json_body(resp).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["page"], 1);
    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["items"][0]["id"], id.as_str());
    assert_eq!(page["items"][0]["status"], "received");
    assert_eq!(page["items"][0]["name"], "Ana");

    let history = json_body(
      call(&app, "GET", &format!("/contact/{id}/history"), None).await,
    )
    .await;
    assert_eq!(history, json!([]));
  }

  #[tokio::test]
  async fn submit_with_missing_field_is_400() {
    let app = app(false, None).await;
    let resp = call(
      &app,
      "POST",
      "/contact",
      Some(json!({ "name": "Ana", "email": "a@x.com" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("body"));
  }

  // ── GET /contacts ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_pages_past_the_end_are_empty() {
    let app = app(false, None).await;
    for name in ["A", "B", "C"] {
      submit(&app, name).await;
    }

    let page =
      json_body(call(&app, "GET", "/contacts?page=2&pageSize=2", None).await)
        .await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["totalPages"], 2);

    let page =
      json_body(call(&app, "GET", "/contacts?page=5&pageSize=2", None).await)
        .await;
    assert_eq!(page["items"], json!([]));
    assert_eq!(page["total"], 3);
    assert_eq!(page["totalPages"], 2);
  }

  #[tokio::test]
  async fn list_rejects_unknown_status_filter() {
    let app = app(false, None).await;
    let resp = call(&app, "GET", "/contacts?status=pendiente", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── PUT /contact/{id} ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn update_status_records_history() {
    let app = app(false, None).await;
    let id = submit(&app, "Ana").await;

    let resp = call(
      &app,
      "PUT",
      &format!("/contact/{id}"),
      Some(json!({ "status": "in_progress" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!({ "ok": true }));

    let resp = call(
      &app,
      "PUT",
      &format!("/contact/{id}"),
      Some(json!({ "status": "closed", "actor": "Bea", "note": "spam" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let history = json_body(
      call(&app, "GET", &format!("/contact/{id}/history"), None).await,
    )
    .await;
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["previousStatus"], "in_progress");
    assert_eq!(entries[0]["newStatus"], "closed");
    assert_eq!(entries[0]["actor"], "Bea");
    assert_eq!(entries[0]["note"], "spam");
    assert_eq!(entries[1]["actor"], "Admin");
  }

  #[tokio::test]
  async fn update_status_errors() {
    let app = app(false, None).await;
    let id = submit(&app, "Ana").await;

    let resp = call(
      &app,
      "PUT",
      &format!("/contact/{id}"),
      Some(json!({ "status": "archived" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = call(
      &app,
      "PUT",
      &format!("/contact/{}", Uuid::new_v4()),
      Some(json!({ "status": "closed" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["ok"], false);
  }

  /// Each request must come back as a 400 with the `{ok:false,error}` body.
  async fn assert_json_400(resp: Response) {
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()), "{body}");
  }

  #[tokio::test]
  async fn update_status_without_status_is_400() {
    let app = app(false, None).await;
    let id = submit(&app, "Ana").await;

    let resp =
      call(&app, "PUT", &format!("/contact/{id}"), Some(json!({}))).await;
    assert_json_400(resp).await;
    let history = json_body(
      call(&app, "GET", &format!("/contact/{id}/history"), None).await,
    )
    .await;
    assert_eq!(history, json!([]));
  }

  #[tokio::test]
  async fn malformed_id_is_400() {
    let app = app(false, None).await;

    let resp = call(
      &app,
      "PUT",
      "/contact/42",
      Some(json!({ "status": "closed" })),
    )
    .await;
    assert_json_400(resp).await;

    let resp = call(
      &app,
      "POST",
      "/contact/42/respond",
      Some(json!({ "responseText": "Thanks!" })),
    )
    .await;
    assert_json_400(resp).await;

    assert_json_400(call(&app, "GET", "/contact/42/history", None).await).await;
  }

  #[tokio::test]
  async fn non_numeric_page_is_400() {
    let app = app(false, None).await;
    assert_json_400(call(&app, "GET", "/contacts?page=abc", None).await).await;
    assert_json_400(call(&app, "GET", "/contacts?pageSize=-1", None).await)
      .await;
  }

  #[tokio::test]
  async fn unparseable_json_body_is_400() {
    let app = app(false, None).await;
    let resp = app
      .clone()
      .oneshot(
        Request::post("/contact")
          .header(header::CONTENT_TYPE, "application/json")
          .body(Body::from("{\"name\":"))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_json_400(resp).await;
  }

  // ── POST /contact/{id}/respond ──────────────────────────────────────────────

  #[tokio::test]
  async fn respond_with_working_mail_reports_message_id() {
    let app = app(false, None).await;
    let id = submit(&app, "Ana").await;

    let resp = call(
      &app,
      "POST",
      &format!("/contact/{id}/respond"),
      Some(json!({ "responseText": "Thanks!", "respondedBy": "Bea" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      json_body(resp).await,
      json!({ "ok": true, "emailSent": true, "messageId": "<42@ztrack.test>" }),
    );

    let page =
      json_body(call(&app, "GET", "/contacts?status=answered", None).await)
        .await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["response"], "Thanks!");
    assert_eq!(page["items"][0]["respondedBy"], "Bea");
  }

  #[tokio::test]
  async fn respond_with_failing_mail_still_persists() {
    let app = app(true, None).await;
    let id = submit(&app, "Ana").await;

    let resp = call(
      &app,
      "POST",
      &format!("/contact/{id}/respond"),
      Some(json!({ "responseText": "Thanks!" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["emailSent"], false);
    assert_eq!(body["error"], "mailbox a@x.com unavailable");
    assert!(body.get("messageId").is_none());

    let history = json_body(
      call(&app, "GET", &format!("/contact/{id}/history"), None).await,
    )
    .await;
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["previousStatus"], "answered");
    assert_eq!(entries[0]["newStatus"], "answered");
    assert_eq!(entries[1]["previousStatus"], "received");
    assert_eq!(entries[1]["newStatus"], "answered");

    let stats =
      json_body(call(&app, "GET", "/contacts/stats", None).await).await;
    assert_eq!(stats["answered"], 1);
  }

  #[tokio::test]
  async fn respond_to_unknown_message_is_404() {
    let app = app(false, None).await;
    let resp = call(
      &app,
      "POST",
      &format!("/contact/{}/respond", Uuid::new_v4()),
      Some(json!({ "responseText": "Thanks!" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["ok"], false);
    assert!(body["error"].is_string());
  }

  // ── GET /contacts/stats ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn stats_has_fixed_shape() {
    let app = app(false, None).await;
    let a = submit(&app, "A").await;
    submit(&app, "B").await;
    call(
      &app,
      "PUT",
      &format!("/contact/{a}"),
      Some(json!({ "status": "closed" })),
    )
    .await;

    let stats =
      json_body(call(&app, "GET", "/contacts/stats", None).await).await;
    assert_eq!(
      stats,
      json!({
        "total": 2,
        "received": 1,
        "in_progress": 0,
        "answered": 0,
        "closed": 1,
      }),
    );
  }

  // ── POST /test-email ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn test_email_reports_delivery() {
    let configured = app(false, Some("admin@ztrack.example")).await;
    let resp = call(&configured, "POST", "/test-email", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      json_body(resp).await,
      json!({ "success": true, "messageId": "<42@ztrack.test>" }),
    );

    let unconfigured = app(false, None).await;
    let resp = call(&unconfigured, "POST", "/test-email", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }
}
