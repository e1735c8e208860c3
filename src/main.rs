mod app;
mod cache;
mod catalog;
mod commands;
mod config;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::cache::{KeyValueStore, MemoryStore, SqliteStore};
use crate::commands::Command;

#[derive(Parser, Debug)]
#[command(name = "shopcache")]
#[command(about = "A product catalog client with a local cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/shopcache/config.yaml)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Keep the cache in memory for this run only
  #[arg(long, global = true)]
  ephemeral: bool,

  /// Write logs to this file instead of stderr
  #[arg(long, global = true)]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_tracing(args.log_file.as_deref())?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  if args.ephemeral {
    run(config, MemoryStore::new(), args.command).await
  } else {
    let storage = SqliteStore::open(&config.storage.resolved_path()?)?;
    run(config, storage, args.command).await
  }
}

async fn run<S: KeyValueStore>(config: config::Config, storage: S, command: Command) -> Result<()> {
  let mut app = app::App::new(config, storage)?;
  let output = app.run(command).await?;
  print!("{}", output);
  Ok(())
}

/// Without a log file, logs go to stderr so stdout stays clean for command output.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

  match log_file {
    Some(path) => {
      let dir = path.parent().unwrap_or_else(|| Path::new("."));
      let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
      let appender = tracing_appender::rolling::never(dir, file_name);
      let (writer, guard) = tracing_appender::non_blocking(appender);

      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
      Ok(Some(guard))
    }
    None => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
      Ok(None)
    }
  }
}
