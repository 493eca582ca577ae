use crate::{
    commands::{Commands, StoreBackend},
    conn::{ConnectionPinger, redact_uri},
    env::EnvManager,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use connectors::adapter::Adapter;
use engine_config::{
    catalog::{bookstore::bookstore_catalog, loader::load_catalog},
    settings::{run::RunSettings, store::StoreSettings},
    validation::catalog_validator::CatalogValidator,
};
use engine_runtime::execution::executor;
use model::operation::catalog::Catalog;
use std::{path::Path, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod env;
mod error;
mod output;
mod shutdown;

const PING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(
    name = "docrun",
    version = "0.1.0",
    about = "Runs catalogs of document-store operations"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Initialize logger
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match execute(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            err.exit_code()
        }
    };

    std::process::exit(code.as_i32());
}

async fn execute(command: Commands) -> Result<ExitCode, CliError> {
    match command {
        Commands::Run {
            catalog,
            store,
            uri,
            database,
            collection,
            seed,
            deadline_secs,
            output,
            json,
            env_file,
        } => {
            let env = load_env(env_file.as_deref())?;
            let settings = env.store_settings().with_overrides(uri, database, collection);
            let catalog = resolve_catalog(catalog.as_deref())?;
            CatalogValidator::new(&catalog).validate()?;
            let run_settings = RunSettings::from_deadline_secs(deadline_secs)?;

            let mut adapter = build_adapter(store, &settings, seed.as_deref())?;
            info!(
                "Running catalog '{}' ({} operations) against {}",
                catalog.name,
                catalog.len(),
                redact_uri(&settings.uri)
            );

            let shutdown = ShutdownCoordinator::new(CancellationToken::new());
            shutdown.register_handlers();

            let report = executor::run(
                &catalog,
                adapter.as_store_mut(),
                &run_settings,
                shutdown.cancel_token(),
            )
            .await?;

            output::print_report(&report, json)?;
            if let Some(path) = output {
                output::write_report(&report, &path).await?;
                info!("Report written to {}", path.display());
            }

            Ok(ExitCode::for_report(
                &report,
                shutdown.is_shutdown_requested(),
            ))
        }
        Commands::Catalog { catalog } => {
            let catalog = resolve_catalog(catalog.as_deref())?;
            let findings = CatalogValidator::new(&catalog).findings();
            output::print_catalog(&catalog, &findings)?;

            if findings.iter().any(|f| f.is_error()) {
                Ok(ExitCode::Failure)
            } else {
                Ok(ExitCode::Success)
            }
        }
        Commands::TestConn { uri, env_file } => {
            let env = load_env(env_file.as_deref())?;
            let settings = env.store_settings().with_overrides(uri, None, None);
            info!("Testing connection to {}", redact_uri(&settings.uri));

            let mut adapter = Adapter::mongo(settings.mongo().with_connect_timeout(PING_TIMEOUT));
            adapter.ping().await?;
            Ok(ExitCode::Success)
        }
    }
}

fn load_env(env_file: Option<&Path>) -> Result<EnvManager, CliError> {
    let mut env = EnvManager::from_system();
    if let Some(path) = env_file {
        env.load_from_file(path)?;
    }
    Ok(env)
}

fn resolve_catalog(path: Option<&Path>) -> Result<Catalog, CliError> {
    match path {
        Some(path) => Ok(load_catalog(path)?),
        None => Ok(bookstore_catalog()),
    }
}

fn build_adapter(
    backend: StoreBackend,
    settings: &StoreSettings,
    seed: Option<&Path>,
) -> Result<Adapter, CliError> {
    match backend {
        StoreBackend::Mongo => {
            if seed.is_some() {
                warn!("--seed only applies to the memory store; ignoring it");
            }
            Ok(Adapter::mongo(settings.mongo()))
        }
        StoreBackend::Memory => Ok(Adapter::memory(&settings.namespace(), seed)?),
    }
}
