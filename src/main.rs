mod api;
mod app;
mod cache;
mod calc;
mod config;
mod routes;
mod session;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::cache::{MemoryStore, SqliteStore};
use crate::config::LogConfig;

#[derive(Parser, Debug)]
#[command(name = "zynk")]
#[command(about = "Intern management from the terminal: profiles, leaves and stipend invoices")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/zynk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend base URL, overrides the config file
  #[arg(long)]
  backend_url: Option<String>,

  /// Keep local state in memory for this run only
  #[arg(long)]
  ephemeral: bool,

  #[command(subcommand)]
  command: app::Command,
}

/// Logs go to stderr, or to a daily file when `log.dir` is set. The guard
/// must live until exit so buffered lines are flushed.
fn init_tracing(log: &LogConfig) -> Option<WorkerGuard> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

  match &log.dir {
    Some(dir) => {
      let appender = tracing_appender::rolling::daily(dir, "zynk.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
      Some(guard)
    }
    None => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
      None
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(url) = args.backend_url {
    config.backend.url = url;
  }

  let _guard = init_tracing(&config.log);

  let output = if args.ephemeral {
    let app = app::App::new(&config, MemoryStore::new())?;
    app.execute(args.command).await?
  } else {
    let store = SqliteStore::open(config.storage.path.as_deref())?;
    let app = app::App::new(&config, store)?;
    app.execute(args.command).await?
  };

  println!("{}", output);

  Ok(())
}
