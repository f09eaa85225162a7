//! ztrack server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `ZTRACK_*`
//! environment overrides, opens the SQLite inbox, and serves the JSON API.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use ztrack_core::lifecycle::Lifecycle;
use ztrack_server::{ServerConfig, notify::Mailer};
use ztrack_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "ZTRACK contact inbox server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg =
    ServerConfig::load(cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let mailer = server_cfg
    .mailer()
    .context("failed to set up mail transport")?;
  if let Mailer::Log(_) = mailer {
    tracing::warn!("no [smtp] section configured; responses will only be logged");
  }

  let lifecycle = Lifecycle::new(
    Arc::new(store),
    Arc::new(mailer),
    server_cfg.lifecycle_config(),
  );

  let app = ztrack_server::app(Arc::new(lifecycle));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
