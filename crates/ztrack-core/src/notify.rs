//! The `Notifier` trait: how the lifecycle reaches a submitter by email.

use std::future::Future;

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
  pub to:      String,
  pub subject: String,
  pub html:    String,
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
  Sent {
    /// Identifier assigned by the transport (e.g. the `Message-ID` header).
    message_id: String,
  },
  Failed {
    error: String,
  },
}

impl Delivery {
  pub fn is_sent(&self) -> bool { matches!(self, Self::Sent { .. }) }
}

/// An email transport.
///
/// Ordinary delivery problems (relay errors, rejected recipients, bad
/// addresses) are reported as [`Delivery::Failed`], never as a panic or an
/// error type, so the caller can record them.
pub trait Notifier: Send + Sync {
  fn send(
    &self,
    email: OutboundEmail,
  ) -> impl Future<Output = Delivery> + Send + '_;
}
