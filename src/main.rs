use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use zipapi::cli::{Cli, Commands, default_config};
use zipapi::config::{ConfigFile, check_config};
use zipapi::error::ZipApiError;
use zipapi::logging::init_otel_subscribers;
use zipapi::{db, loader, servers, web};

async fn run(command: Commands, config: ConfigFile) -> Result<(), ZipApiError> {
    match command {
        Commands::Server { .. } => {
            info!("Configuration: {config}");
            let pool = db::get_conn(&config).await?;
            db::start_db(&pool).await?;
            let router = web::build(pool.clone());
            servers::api_server(&config, router).await?;
            pool.close().await;
        }
        Commands::Seed {
            counties, cities, ..
        } => {
            let counties = counties.unwrap_or_else(|| config.counties_file.clone());
            let cities = cities.unwrap_or_else(|| config.cities_file.clone());
            let pool = db::get_conn(&config).await?;
            db::start_db(&pool).await?;
            loader::seed(&pool, &counties, &cities).await?;
            pool.close().await;
        }
        Commands::ConfigCheck { .. } => {
            info!("{config:#?}");
            info!("Checking config... [OK!]");
        }
        Commands::ExportConfig { .. } => default_config(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConfigFile::try_from_path(cli.config().as_deref()) {
        Ok(val) => val,
        Err(err) => {
            eprintln!("Failed to load config: {err}");
            return ExitCode::FAILURE;
        }
    };

    let provider = match init_otel_subscribers(
        config.otel_endpoint.clone(),
        &config.log_level,
        cli.debug(),
    ) {
        Ok(val) => val,
        Err(err) => {
            eprintln!("Failed to start logging: {err}");
            return ExitCode::FAILURE;
        }
    };

    // sometimes you just have to print some errors
    if let Err(errors) = check_config(&config) {
        for error in errors {
            error!("{error}");
        }
        error!("Shutting down!");
        return ExitCode::FAILURE;
    }

    let result = run(cli.command(), config).await;

    if let Some(provider) = provider {
        if let Err(err) = provider.shutdown() {
            eprintln!("Failed to flush traces: {err}");
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
