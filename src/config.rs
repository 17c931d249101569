use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = "database";
const DEFAULT_CATALOG: &str = "catalog.json";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Runtime settings shared by the CLI and the web server.
///
/// Precedence, lowest first: built-in defaults, TOML file, `LEARNTRACK_*`
/// environment variables, command-line flags (applied by the binaries).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the JSON progress database.
    pub data_dir: PathBuf,
    /// Curriculum catalog file.
    pub catalog_path: PathBuf,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            catalog_path: PathBuf::from(DEFAULT_CATALOG),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads `path` if given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml_str(&contents)?
            }
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("LEARNTRACK_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(catalog) = lookup("LEARNTRACK_CATALOG") {
            self.catalog_path = PathBuf::from(catalog);
        }
        if let Some(addr) = lookup("LEARNTRACK_BIND") {
            self.bind_addr = addr;
        }
    }
}
