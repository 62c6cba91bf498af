mod app;
mod commands;
mod event;
mod ui;

use clap::Parser;
use color_eyre::Result;
use jobdesk::config::Config;
use jobdesk::selection::{SelectionStore, SessionStorage, SqliteSessionStorage};
use jobdesk::vacancy::{vacancy_cache, MutationGateway, VacancyClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "jobdesk")]
#[command(about = "A terminal UI for triaging captured job vacancies")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/jobdesk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// GraphQL endpoint, overrides config and JOBDESK_ENDPOINT
  #[arg(short, long)]
  endpoint: Option<String>,

  /// Forget the selection persisted earlier in this session
  #[arg(long)]
  fresh_session: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(endpoint) = args.endpoint {
    config.remote.endpoint = endpoint;
  }

  let _log_guard = jobdesk::logging::init(&config.logging)?;
  info!(endpoint = %config.remote.endpoint, "starting jobdesk");

  let client = Arc::new(VacancyClient::new(&config.remote)?);
  let cache = vacancy_cache(Arc::clone(&client));
  let gateway = MutationGateway::new(client, cache.clone());

  let policy = config.selection.policy()?;
  let session_dir = config
    .selection
    .session_dir
    .clone()
    .unwrap_or_else(SqliteSessionStorage::default_dir);
  let storage = SqliteSessionStorage::open(&session_dir, &config.remote.endpoint)?;
  if args.fresh_session {
    match storage.clear() {
      Ok(()) => info!("session storage cleared"),
      Err(e) => warn!(error = %e, "could not clear session storage"),
    }
  }
  let selection = SelectionStore::hydrate(Arc::new(storage), policy);

  let mut app = app::App::new(config, cache, gateway, selection);
  app.run().await?;

  info!("exiting");

  Ok(())
}
