//! Tensei notifier binary.
//!
//! Reads `tensei.toml` (or the path given with `--config`), opens the SQLite
//! store, polls Twitch on a fixed interval, and posts live cards to Discord.
//! The operator API is served only when API credentials are configured.
//!
//! # Password hash generation
//!
//! ```
//! cargo run -p tensei-bot -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use tensei_bot::BotConfig;
use tensei_discord::DiscordGateway;
use tensei_engine::Monitor;
use tensei_store_sqlite::SqliteStore;
use tensei_twitch::HelixClient;
use tokio::{net::TcpListener, sync::watch};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Twitch live notifications for Discord")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tensei.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let cfg = BotConfig::load(&cli.config).context("failed to read configuration")?;
  cfg.validate()?;
  for warning in cfg.warnings() {
    warn!("{warning}");
  }

  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let helix = HelixClient::new(cfg.helix()).context("failed to build Twitch client")?;
  let discord = DiscordGateway::new(cfg.discord()).context("failed to build Discord client")?;

  let monitor = Arc::new(
    Monitor::load(store, helix, discord, cfg.monitor_settings())
      .await
      .context("failed to load tracked entities")?,
  );

  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let scheduler = tokio::spawn(monitor.clone().run(cfg.poll_interval(), shutdown_rx));

  if cfg.api.enabled() {
    let app = tensei_bot::router(monitor.clone(), cfg.api.auth());
    let address = format!("{}:{}", cfg.api.host, cfg.api.port);
    let listener = TcpListener::bind(&address)
      .await
      .with_context(|| format!("failed to bind {address}"))?;

    info!("operator API listening on http://{address}");
    axum::serve(listener, app)
      .with_graceful_shutdown(shutdown_signal())
      .await
      .context("server error")?;
  } else {
    shutdown_signal().await;
  }

  info!("shutting down");
  let _ = shutdown_tx.send(true);
  if let Err(e) = scheduler.await {
    warn!(error = %e, "poll scheduler did not stop cleanly");
  }

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(error = %e, "failed to listen for ctrl-c");
  }
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
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
