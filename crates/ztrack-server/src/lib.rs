//! Wiring for the ZTRACK server binary: configuration, mail transport
//! selection, and the outer HTTP layers around [`ztrack_api::api_router`].

pub mod notify;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::Router;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use ztrack_core::{
  lifecycle::{Lifecycle, LifecycleConfig},
  notify::Notifier,
  store::InboxStore,
  template::DEFAULT_COMPANY_NAME,
};

use notify::{LogNotifier, Mailer, SmtpNotifier};

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("smtp transport error: {0}")]
  Smtp(#[from] lettre::transport::smtp::Error),

  #[error("invalid sender address: {0}")]
  Address(#[from] lettre::address::AddressError),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ZTRACK_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  #[serde(default = "default_company_name")]
  pub company_name:        String,
  /// Recipient of `POST /test-email`.
  #[serde(default)]
  pub admin_email:         Option<String>,
  #[serde(default = "default_notify_timeout_secs")]
  pub notify_timeout_secs: u64,
  /// Without this section, outgoing email is only logged.
  #[serde(default)]
  pub smtp:                Option<SmtpConfig>,
}

#[derive(Deserialize, Clone)]
pub struct SmtpConfig {
  pub host:         String,
  #[serde(default = "default_smtp_port")]
  pub port:         u16,
  /// Upgrade a plain connection instead of connecting over TLS.
  #[serde(default)]
  pub starttls:     bool,
  #[serde(default)]
  pub username:     Option<String>,
  #[serde(default)]
  pub password:     Option<String>,
  pub from_address: String,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3000 }
fn default_store_path() -> PathBuf { "ztrack.sqlite3".into() }
fn default_company_name() -> String { DEFAULT_COMPANY_NAME.into() }
fn default_notify_timeout_secs() -> u64 { 20 }
fn default_smtp_port() -> u16 { 465 }

impl ServerConfig {
  /// Read `path` (if it exists), then overlay `ZTRACK_*` variables.
  /// Nested keys use a double underscore: `ZTRACK_SMTP__HOST`.
  pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.into()).required(false))
      .add_source(
        config::Environment::with_prefix("ZTRACK")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn notify_timeout(&self) -> Duration {
    Duration::from_secs(self.notify_timeout_secs)
  }

  pub fn lifecycle_config(&self) -> LifecycleConfig {
    LifecycleConfig {
      company_name:   self.company_name.clone(),
      admin_email:    self.admin_email.clone(),
      notify_timeout: self.notify_timeout(),
    }
  }

  /// SMTP when configured, otherwise the logging transport.
  pub fn mailer(&self) -> Result<Mailer> {
    match &self.smtp {
      Some(smtp) => Ok(Mailer::Smtp(SmtpNotifier::new(
        smtp,
        &self.company_name,
        self.notify_timeout(),
      )?)),
      None => Ok(Mailer::Log(LogNotifier)),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API routes with request tracing and permissive CORS for the browser
/// form and admin panel.
pub fn app<S, N>(lifecycle: Arc<Lifecycle<S, N>>) -> Router
where
  S: InboxStore + 'static,
  N: Notifier + 'static,
{
  ztrack_api::api_router(lifecycle)
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
}
