use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::debug;

use crate::executor::csv::catalog::{DEFAULT_DELIMITER, DEFAULT_EXTENSION};
use crate::store::CsvStore;
use crate::types::DatabaseError;

const DEFAULT_CONFIG_FILE: &str = "./fluentdb.toml";

/// Flat-file store configuration.
///
/// Priority: `FLUENTDB_*` environment variables > config file > defaults.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_data_dir() -> PathBuf { PathBuf::from("./data") }
fn default_extension() -> String { DEFAULT_EXTENSION.to_string() }
fn default_delimiter() -> char { DEFAULT_DELIMITER }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            extension: default_extension(),
            delimiter: default_delimiter(),
        }
    }
}

impl StoreConfig {
    /// Loads `path` when given (it must exist), otherwise `./fluentdb.toml`
    /// if present, then applies the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, DatabaseError> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).required(true));
                debug!("loading config from {}", path.display());
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
                debug!("loading config from {DEFAULT_CONFIG_FILE}");
            }
            None => {}
        }

        // FLUENTDB_DATA_DIR, FLUENTDB_EXTENSION, FLUENTDB_DELIMITER
        builder = builder.add_source(Environment::with_prefix("FLUENTDB"));

        Ok(builder.build()?.try_deserialize()?)
    }

    #[must_use]
    pub fn open_csv(&self) -> CsvStore {
        CsvStore::with_format(&self.data_dir, &self.extension, self.delimiter)
    }
}
