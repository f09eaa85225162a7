//! The message lifecycle service.
//!
//! [`Lifecycle`] is the only writer of message status and the only creator of
//! history entries. Every status change is committed together with its
//! history entry; the answer email is sent afterwards and its outcome can
//! never undo the commit.

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  history::{DEFAULT_ACTOR, HistoryEntry, NewHistoryEntry},
  message::{ContactMessage, NewMessage, Status, StatusFilter},
  notify::{Delivery, Notifier, OutboundEmail},
  store::{
    InboxStore, MessageQuery, ResponseInput, StatusCounts, Transition,
    TransitionOutcome,
  },
  template::{self, DEFAULT_COMPANY_NAME},
  validate::{self, MAX_ACTOR_CHARS},
};

/// Number of response characters quoted in the history note.
pub const NOTE_PREVIEW_CHARS: usize = 100;

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
  /// Shown in email subjects and footers.
  pub company_name:   String,
  /// Recipient of [`Lifecycle::send_test_email`].
  pub admin_email:    Option<String>,
  /// Upper bound on one notifier call; exceeding it counts as a failure.
  pub notify_timeout: Duration,
}

impl Default for LifecycleConfig {
  fn default() -> Self {
    Self {
      company_name:   DEFAULT_COMPANY_NAME.to_owned(),
      admin_email:    None,
      notify_timeout: Duration::from_secs(20),
    }
  }
}

// ─── Result types ────────────────────────────────────────────────────────────

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub items:       Vec<T>,
  pub total:       u64,
  pub page:        u64,
  pub total_pages: u64,
}

/// What happened when a message was answered.
///
/// Getting one back at all means the response was persisted; `delivery`
/// reports the email independently.
#[derive(Debug, Clone)]
pub struct RespondOutcome {
  /// The message as committed.
  pub message:          ContactMessage,
  pub delivery:         Delivery,
  /// Whether the delivery failure made it into the history. Always `false`
  /// when the email was sent.
  pub failure_recorded: bool,
}

impl RespondOutcome {
  pub fn email_sent(&self) -> bool { self.delivery.is_sent() }
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct Lifecycle<S, N> {
  store:    Arc<S>,
  notifier: Arc<N>,
  config:   LifecycleConfig,
}

impl<S, N> Lifecycle<S, N>
where
  S: InboxStore,
  N: Notifier,
{
  pub fn new(store: Arc<S>, notifier: Arc<N>, config: LifecycleConfig) -> Self {
    Self { store, notifier, config }
  }

  pub fn config(&self) -> &LifecycleConfig { &self.config }

  /// Record a new contact-form submission in [`Status::Received`].
  ///
  /// No history entry is written: there is no prior status to move from.
  pub async fn submit(&self, input: NewMessage) -> Result<ContactMessage> {
    let input = validate::new_message(input)?;
    let message = self
      .store
      .insert_message(input)
      .await
      .map_err(Error::persistence)?;
    tracing::info!(id = %message.id, "contact message received");
    Ok(message)
  }

  /// Move a message to `status`, recording the change.
  ///
  /// `actor` defaults to [`DEFAULT_ACTOR`] and `note` to a description of
  /// the change. Setting the current status again is allowed and still
  /// recorded.
  pub async fn set_status(
    &self,
    id: Uuid,
    status: Status,
    actor: Option<&str>,
    note: Option<&str>,
  ) -> Result<HistoryEntry> {
    let actor = validate::optional("actor", actor, Some(MAX_ACTOR_CHARS))?
      .unwrap_or_else(|| DEFAULT_ACTOR.to_owned());
    let note = validate::optional("note", note, None)?
      .unwrap_or_else(|| format!("Status changed to {status}"));

    let (_, entry) = self
      .commit(Transition {
        message_id: id,
        to: status,
        actor,
        note,
        response: None,
      })
      .await?;

    tracing::info!(
      %id,
      from = %entry.previous_status,
      to = %entry.new_status,
      actor = %entry.actor,
      "status changed",
    );
    Ok(entry)
  }

  /// Answer a message and email the answer to its submitter.
  ///
  /// The response is committed first. Delivery is attempted afterwards; a
  /// failure is reported in the outcome and noted in the history, but the
  /// call still succeeds.
  pub async fn respond(
    &self,
    id: Uuid,
    response_text: &str,
    responded_by: Option<&str>,
  ) -> Result<RespondOutcome> {
    if response_text.trim().is_empty() {
      return Err(Error::Validation("response text is required".into()));
    }
    let responded_by =
      validate::optional("respondedBy", responded_by, Some(MAX_ACTOR_CHARS))?
        .unwrap_or_else(|| DEFAULT_ACTOR.to_owned());

    let (message, _) = self
      .commit(Transition {
        message_id: id,
        to:         Status::Answered,
        actor:      responded_by.clone(),
        note:       format!(
          "Response sent by email: {}",
          preview(response_text.trim()),
        ),
        response:   Some(ResponseInput {
          text: response_text.to_owned(),
          responded_by: responded_by.clone(),
        }),
      })
      .await?;
    tracing::info!(%id, responded_by = %responded_by, "message answered");

    let delivery = match template::render_response(&self.config.company_name, &message) {
      Some(email) => self.deliver(email).await,
      None => Delivery::Failed {
        error: "committed message carries no response".into(),
      },
    };

    let failure_recorded = match &delivery {
      Delivery::Sent { message_id } => {
        tracing::info!(%id, %message_id, "response email sent");
        false
      }
      Delivery::Failed { error } => {
        tracing::warn!(%id, %error, "response email not delivered");
        self.record_delivery_failure(id, &responded_by, error).await
      }
    };

    Ok(RespondOutcome { message, delivery, failure_recorded })
  }

  /// The audit trail of a message, newest first.
  pub async fn history(&self, id: Uuid) -> Result<Vec<HistoryEntry>> {
    self
      .store
      .list_history(id)
      .await
      .map_err(Error::persistence)
  }

  /// One page of messages, newest first. Pages are 1-based; a page past the
  /// end is empty but still reports the totals.
  pub async fn list(
    &self,
    filter: StatusFilter,
    page: u64,
    page_size: u64,
  ) -> Result<Page<ContactMessage>> {
    if page == 0 {
      return Err(Error::Validation("page must be at least 1".into()));
    }
    if page_size == 0 {
      return Err(Error::Validation("pageSize must be at least 1".into()));
    }

    let query = MessageQuery {
      status: filter.status(),
      offset: (page - 1).saturating_mul(page_size),
      limit:  page_size,
    };
    let (items, total) = self
      .store
      .query_messages(query)
      .await
      .map_err(Error::persistence)?;

    Ok(Page { items, total, page, total_pages: total.div_ceil(page_size) })
  }

  /// Per-status counts over every message.
  pub async fn stats(&self) -> Result<StatusCounts> {
    self
      .store
      .count_by_status()
      .await
      .map_err(Error::persistence)
  }

  /// Send a fixed email to the configured admin address.
  pub async fn send_test_email(&self) -> Result<Delivery> {
    let to = self
      .config
      .admin_email
      .as_deref()
      .ok_or_else(|| Error::Validation("no admin email configured".into()))?;
    let email = template::render_test(&self.config.company_name, to);
    Ok(self.deliver(email).await)
  }

  // ── Internals ─────────────────────────────────────────────────────────

  async fn commit(
    &self,
    transition: Transition,
  ) -> Result<(ContactMessage, HistoryEntry)> {
    let id = transition.message_id;
    let to = transition.to;
    match self
      .store
      .commit_transition(transition)
      .await
      .map_err(Error::persistence)?
    {
      TransitionOutcome::Committed { message, entry } => Ok((message, entry)),
      TransitionOutcome::Missing => Err(Error::NotFound(id)),
      TransitionOutcome::Rejected { from } => {
        Err(Error::IllegalTransition { from, to })
      }
    }
  }

  async fn deliver(&self, email: OutboundEmail) -> Delivery {
    let timeout = self.config.notify_timeout;
    match tokio::time::timeout(timeout, self.notifier.send(email)).await {
      Ok(delivery) => delivery,
      Err(_) => Delivery::Failed {
        error: format!("notifier timed out after {}s", timeout.as_secs_f32()),
      },
    }
  }

  /// Best effort: a failure here is logged and otherwise swallowed, since the
  /// response itself is already committed.
  async fn record_delivery_failure(
    &self,
    id: Uuid,
    actor: &str,
    error: &str,
  ) -> bool {
    let entry = NewHistoryEntry {
      message_id:      id,
      previous_status: Status::Answered,
      new_status:      Status::Answered,
      actor:           actor.to_owned(),
      note:            format!("Error sending email: {error}"),
    };
    match self.store.append_history(entry).await {
      Ok(_) => true,
      Err(e) => {
        tracing::error!(%id, error = %e, "could not record email failure");
        false
      }
    }
  }
}

/// The first [`NOTE_PREVIEW_CHARS`] characters of `text`, with an ellipsis
/// when something was cut.
fn preview(text: &str) -> String {
  let mut chars = text.chars();
  let head: String = chars.by_ref().take(NOTE_PREVIEW_CHARS).collect();
  if chars.next().is_some() { format!("{head}...") } else { head }
}
