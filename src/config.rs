use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::ZipApiError;

/// Where we look for a config file when one isn't specified
static CONFIG_LOCATIONS: [&str; 2] = ["./zipapi.json", "~/.config/zipapi.json"];

#[derive(Deserialize, Debug, Eq, PartialEq, Clone, Serialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Listen address, default is 127.0.0.1
    pub address: String,
    /// API port, default is 8000
    pub api_port: u16,
    /// Default is "info"
    pub log_level: String,
    /// The location for the sqlite file
    pub sqlite_path: String,
    /// County names, one per line
    pub counties_file: PathBuf,
    /// `zip,name,county` rows
    pub cities_file: PathBuf,
    /// Certificate path, serves HTTPS when this and the key are both set
    pub api_tls_cert: Option<PathBuf>,
    /// TLS key path
    pub api_tls_key: Option<PathBuf>,
    /// OTLP/HTTP collector to send traces to
    pub otel_endpoint: Option<String>,
}

impl ConfigFile {
    /// get a string version of the listener address
    pub fn api_listener_address(&self) -> String {
        format!("{}:{}", self.address, self.api_port)
    }

    /// Whether or not we're serving HTTPS
    pub fn tls_enabled(&self) -> bool {
        self.api_tls_cert.is_some() && self.api_tls_key.is_some()
    }

    /// Loads the configuration from a given file or from some default locations.
    ///
    /// The default locations are `./zipapi.json` and `~/.config/zipapi.json`.
    /// Environment variables prefixed `ZIPAPI_` override the file.
    pub fn try_from_path(config_path: Option<&str>) -> Result<Self, ZipApiError> {
        let file_locations: Vec<String> = match config_path {
            Some(value) => vec![value.to_string()],
            None => CONFIG_LOCATIONS.iter().map(|x| x.to_string()).collect(),
        };

        for filepath in file_locations {
            let config_filename: String = shellexpand::tilde(&filepath).into_owned();
            let config_filepath = std::path::Path::new(&config_filename);
            if !config_filepath.exists() {
                if config_path.is_some() {
                    return Err(ZipApiError::Config(format!(
                        "Config file {config_filename} doesn't exist"
                    )));
                }
                debug!("Config file {config_filename} doesn't exist, skipping.");
                continue;
            }
            let config = Config::builder()
                .add_source(File::new(&config_filename, config::FileFormat::Json))
                .add_source(config::Environment::with_prefix("zipapi"))
                .build()?;
            info!("Successfully loaded config from: {config_filename}");
            return Ok(config.try_deserialize()?);
        }

        // no file, but the environment might still have things to say
        let config = Config::builder()
            .add_source(config::Environment::with_prefix("zipapi"))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// [Self::sqlite_path] with `~` and environment variables expanded
    pub fn sqlite_path_expanded(&self) -> Result<String, ZipApiError> {
        shellexpand::full(&self.sqlite_path)
            .map(|path| path.into_owned())
            .map_err(|err| ZipApiError::Config(format!("Failed to expand sqlite_path: {err}")))
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            api_port: 8000,
            log_level: "info".to_string(),
            sqlite_path: String::from("~/.cache/zipapi.sqlite"),
            counties_file: PathBuf::from("./storage/app/megyek.csv"),
            cities_file: PathBuf::from("./storage/app/iranyitoszamok.csv"),
            api_tls_cert: None,
            api_tls_key: None,
            otel_endpoint: None,
        }
    }
}

impl Display for ConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scheme = match self.tls_enabled() {
            true => "https",
            false => "http",
        };
        f.write_fmt(format_args!(
            "api_endpoint=\"{scheme}://{}\" sqlite_path=\"{}\" log_level={}",
            self.api_listener_address(),
            self.sqlite_path,
            self.log_level
        ))
    }
}

/// Returns every problem found, not just the first
pub fn check_config(config: &ConfigFile) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = vec![];

    match (&config.api_tls_cert, &config.api_tls_key) {
        (Some(cert), Some(key)) => {
            if !cert.exists() {
                errors.push(format!("Failed to find API TLS cert file: {cert:?}"));
            }
            if !key.exists() {
                errors.push(format!("Failed to find API TLS Key file: {key:?}"));
            }
        }
        (None, None) => {}
        _ => errors.push(
            "Both api_tls_cert and api_tls_key need to be set to enable TLS".to_string(),
        ),
    }

    if EnvFilter::builder().parse(&config.log_level).is_err() {
        errors.push(format!("Invalid log_level: {:?}", config.log_level));
    }

    if let Err(err) = config.sqlite_path_expanded() {
        errors.push(err.to_string());
    }

    match errors.is_empty() {
        true => Ok(()),
        false => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_check() {
        assert!(check_config(&ConfigFile::default()).is_ok());
    }

    #[test]
    fn test_check_config_half_tls() {
        let config = ConfigFile {
            api_tls_cert: Some(PathBuf::from("/tmp/cert.pem")),
            ..ConfigFile::default()
        };
        let errors = check_config(&config).expect_err("should have failed");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_check_config_collects_everything() {
        let config = ConfigFile {
            api_tls_cert: Some(PathBuf::from("/this/does/not/exist/cert.pem")),
            api_tls_key: Some(PathBuf::from("/this/does/not/exist/key.pem")),
            log_level: "zipapi=verbose".to_string(),
            ..ConfigFile::default()
        };
        let errors = check_config(&config).expect_err("should have failed");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("failed to make tempdir");
        let path = dir.path().join("zipapi.json");
        std::fs::write(&path, r#"{"api_port": 9123, "sqlite_path": ":memory:"}"#)
            .expect("failed to write config");

        let config = ConfigFile::try_from_path(path.to_str()).expect("failed to load config");
        assert_eq!(config.api_port, 9123);
        assert_eq!(config.sqlite_path, ":memory:");
        // untouched fields keep their defaults
        assert_eq!(config.address, ConfigFile::default().address);
    }

    #[test]
    fn test_missing_explicit_file() {
        assert!(ConfigFile::try_from_path(Some("/this/does/not/exist.json")).is_err());
    }

    #[test]
    fn test_export_roundtrips_through_serde() {
        let output = serde_json::to_string_pretty(&ConfigFile::default())
            .expect("failed to serialize config");
        let parsed: ConfigFile = serde_json::from_str(&output).expect("failed to parse config");
        assert_eq!(parsed, ConfigFile::default());
    }
}
