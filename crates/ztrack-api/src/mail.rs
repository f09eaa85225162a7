//! Handler for `POST /test-email`: checks the mail transport end to end.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use ztrack_core::{
  lifecycle::Lifecycle,
  notify::{Delivery, Notifier},
  store::InboxStore,
};

use crate::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEmailReply {
  pub success:    bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:      Option<String>,
}

impl From<Delivery> for TestEmailReply {
  fn from(delivery: Delivery) -> Self {
    match delivery {
      Delivery::Sent { message_id } => Self {
        success:    true,
        message_id: Some(message_id),
        error:      None,
      },
      Delivery::Failed { error } => Self {
        success:    false,
        message_id: None,
        error:      Some(error),
      },
    }
  }
}

/// `POST /test-email` sends a fixed email to the configured admin address.
pub async fn test_email<S, N>(
  State(lifecycle): State<Arc<Lifecycle<S, N>>>,
) -> Result<Json<TestEmailReply>, ApiError>
where
  S: InboxStore,
  N: Notifier,
{
  let delivery = lifecycle.send_test_email().await?;
  Ok(Json(delivery.into()))
}
