//! Mail transports for the [`Notifier`] trait.

use std::time::Duration;

use lettre::{
  Address, AsyncSmtpTransport, AsyncTransport as _, Message, Tokio1Executor,
  message::{Mailbox, header::ContentType},
  transport::smtp::authentication::Credentials,
};
use uuid::Uuid;
use ztrack_core::notify::{Delivery, Notifier, OutboundEmail};

use crate::{Result, SmtpConfig};

// ─── SMTP ─────────────────────────────────────────────────────────────────────

/// Delivers through an SMTP relay (e.g. `smtp.gmail.com` with an app
/// password).
pub struct SmtpNotifier {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
  /// Right-hand side of generated `Message-ID`s.
  domain:    String,
}

impl SmtpNotifier {
  /// Build the transport. No connection is made until the first send.
  pub fn new(
    config: &SmtpConfig,
    sender_name: &str,
    timeout: Duration,
  ) -> Result<Self> {
    let builder = if config.starttls {
      AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
    } else {
      AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
    };
    let mut builder = builder.port(config.port).timeout(Some(timeout));
    if let (Some(user), Some(pass)) = (&config.username, &config.password) {
      builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
    }

    let address: Address = config.from_address.parse()?;
    Ok(Self {
      transport: builder.build(),
      domain:    address.domain().to_owned(),
      from:      Mailbox::new(Some(sender_name.to_owned()), address),
    })
  }

  fn message(
    &self,
    email: OutboundEmail,
    message_id: &str,
  ) -> std::result::Result<Message, String> {
    let to: Mailbox = email
      .to
      .parse()
      .map_err(|e| format!("invalid recipient {:?}: {e}", email.to))?;
    Message::builder()
      .from(self.from.clone())
      .to(to)
      .subject(email.subject)
      .message_id(Some(message_id.to_owned()))
      .header(ContentType::TEXT_HTML)
      .body(email.html)
      .map_err(|e| format!("could not build message: {e}"))
  }
}

impl Notifier for SmtpNotifier {
  async fn send(&self, email: OutboundEmail) -> Delivery {
    let message_id = format!("<{}@{}>", Uuid::new_v4(), self.domain);
    let message = match self.message(email, &message_id) {
      Ok(m) => m,
      Err(error) => return Delivery::Failed { error },
    };
    match self.transport.send(message).await {
      Ok(_) => Delivery::Sent { message_id },
      Err(e) => Delivery::Failed { error: e.to_string() },
    }
  }
}

// ─── Log ──────────────────────────────────────────────────────────────────────

/// Used when no SMTP relay is configured: writes the email to the log and
/// reports it as delivered.
pub struct LogNotifier;

impl Notifier for LogNotifier {
  async fn send(&self, email: OutboundEmail) -> Delivery {
    let message_id = format!("<{}@localhost>", Uuid::new_v4());
    tracing::info!(
      to = %email.to,
      subject = %email.subject,
      %message_id,
      "smtp not configured; email logged instead of sent",
    );
    tracing::debug!(html = %email.html, "logged email body");
    Delivery::Sent { message_id }
  }
}

// ─── Selection ────────────────────────────────────────────────────────────────

/// The transport picked from configuration at startup.
pub enum Mailer {
  Smtp(SmtpNotifier),
  Log(LogNotifier),
}

impl Notifier for Mailer {
  async fn send(&self, email: OutboundEmail) -> Delivery {
    match self {
      Mailer::Smtp(n) => n.send(email).await,
      Mailer::Log(n) => n.send(email).await,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn smtp_config(from_address: &str) -> SmtpConfig {
    SmtpConfig {
      host:         "smtp.example.com".into(),
      port:         465,
      starttls:     false,
      username:     Some("user".into()),
      password:     Some("secret".into()),
      from_address: from_address.into(),
    }
  }

  fn email(to: &str) -> OutboundEmail {
    OutboundEmail {
      to:      to.into(),
      subject: "Response to your message - ZTRACK".into(),
      html:    "<p>Thanks!</p>".into(),
    }
  }

  #[tokio::test]
  async fn log_notifier_reports_delivery() {
    let delivery = LogNotifier.send(email("a@x.com")).await;
    assert!(delivery.is_sent());
  }

  #[tokio::test]
  async fn smtp_rejects_bad_recipient_without_connecting() {
    let notifier = SmtpNotifier::new(
      &smtp_config("inbox@ztrack.example"),
      "ZTRACK",
      Duration::from_secs(1),
    )
    .unwrap();
    let Delivery::Failed { error } = notifier.send(email("not an address")).await
    else {
      panic!("expected a failed delivery");
    };
    assert!(error.contains("invalid recipient"), "{error}");
  }

  #[test]
  fn smtp_requires_valid_sender() {
    assert!(
      SmtpNotifier::new(&smtp_config("nope"), "ZTRACK", Duration::from_secs(1))
        .is_err()
    );
  }

  #[tokio::test]
  async fn message_carries_generated_id_and_html() {
    let notifier = SmtpNotifier::new(
      &smtp_config("inbox@ztrack.example"),
      "ZTRACK",
      Duration::from_secs(1),
    )
    .unwrap();
    let message = notifier
      .message(email("a@x.com"), "<1@ztrack.example>")
      .unwrap();
    let raw = String::from_utf8(message.formatted()).unwrap();
    assert!(raw.contains("Message-ID: <1@ztrack.example>"), "{raw}");
    assert!(raw.contains("text/html"), "{raw}");
    assert!(raw.contains("ZTRACK <inbox@ztrack.example>"), "{raw}");
  }
}
