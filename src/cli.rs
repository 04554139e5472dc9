//! Code related to CLI things
//!

use std::path::PathBuf;

use clap::*;
use tracing::error;

use crate::config::ConfigFile;

#[derive(Parser, Clone, Debug, Default)]
pub struct SharedOpts {
    #[clap(short, long, help = "Configuration file")]
    config: Option<String>,
    #[clap(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the API server (the default)
    Server {
        #[clap(flatten)]
        sopt: SharedOpts,
    },
    /// Load counties then cities from CSV files
    Seed {
        #[clap(flatten)]
        sopt: SharedOpts,
        #[clap(long, help = "Counties CSV, defaults to counties_file from the config")]
        counties: Option<PathBuf>,
        #[clap(long, help = "Cities CSV, defaults to cities_file from the config")]
        cities: Option<PathBuf>,
    },
    ConfigCheck {
        #[clap(flatten)]
        sopt: SharedOpts,
    },
    ExportConfig {
        #[clap(flatten)]
        sopt: SharedOpts,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Server {
            sopt: SharedOpts::default(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(false), version)]
/// A small REST API for Hungarian postal codes, cities and counties.
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    fn sopt(&self) -> Option<&SharedOpts> {
        match &self.command {
            Some(Commands::Server { sopt })
            | Some(Commands::Seed { sopt, .. })
            | Some(Commands::ConfigCheck { sopt })
            | Some(Commands::ExportConfig { sopt }) => Some(sopt),
            None => None,
        }
    }

    pub fn config(&self) -> Option<String> {
        self.sopt().and_then(|sopt| sopt.config.clone())
    }

    pub fn debug(&self) -> bool {
        self.sopt().map(|sopt| sopt.debug).unwrap_or(false)
    }

    /// The subcommand to run, [Commands::Server] when none was given
    pub fn command(self) -> Commands {
        self.command.unwrap_or_default()
    }
}

/// Output a default configuration file, based on the [crate::config::ConfigFile] object.
pub fn default_config() {
    let output = match serde_json::to_string_pretty(&ConfigFile::default()) {
        Ok(value) => value,
        Err(_) => {
            error!("I don't know how, but we couldn't parse our own config file def.");
            "".to_string()
        }
    };
    println!("{output}");
}
