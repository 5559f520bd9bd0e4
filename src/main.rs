mod api;
mod app;
mod commands;
mod config;
mod event;
mod logging;
mod query;
mod resources;
mod table;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "d9s")]
#[command(about = "A terminal admin console for donation-management backends, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/d9s/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend base URL, overriding the config file
  #[arg(short, long)]
  url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let _log_guard = logging::init()?;

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override backend URL if specified on command line
  if let Some(url) = args.url {
    config.api.base_url = url;
  }

  tracing::info!(url = %config.api.base_url, "starting d9s");

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
