//! Environments the console knows about.
//!
//! The config file is JSON:
//!
//! ```json
//! {
//!   "environments": [
//!     { "name": "Local", "host": "redis://127.0.0.1:6379",
//!       "instances": ["swap-mm-ethusd", "latency-mm"] }
//!   ]
//! }
//! ```
//!
//! Lookup order: `--config`, then `$LAMBDA_VIEW_CONFIG`, then
//! `<config dir>/lambda-view/config.json`. With none of these present the
//! built-in environments are used. Their hosts are the Redis broker the
//! strategies publish to, on port 10400; point elsewhere with a config
//! file or `--host`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConsoleError, Result};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "LAMBDA_VIEW_CONFIG";

/// A named deployment: one host and the instances running there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub host: String,
    #[serde(default)]
    pub instances: Vec<String>,
}

impl Environment {
    pub fn new(name: &str, host: &str, instances: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            host: host.to_string(),
            instances: instances.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub environments: Vec<Environment>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let instances = ["swap-mm-ethusd", "latency-mm"];
        Self {
            environments: vec![
                Environment::new("Local", "redis://localhost:10400", &instances),
                Environment::new("Tokyo", "redis://quant.roytang.me:10400", &instances),
            ],
        }
    }
}

impl ConsoleConfig {
    /// Read a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConsoleError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConsoleError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find and load the config, falling back to the built-in one.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::resolve_from(explicit, from_env.as_deref(), Self::default_path().as_deref())
    }

    /// Like [`resolve`](Self::resolve) with the candidate paths given.
    ///
    /// An explicit or environment path must exist; the default path is
    /// only used when present.
    pub fn resolve_from(
        explicit: Option<&Path>,
        from_env: Option<&Path>,
        default_path: Option<&Path>,
    ) -> Result<Self> {
        if let Some(path) = explicit.or(from_env) {
            debug!(path = %path.display(), "loading config");
            return Self::load(path);
        }
        match default_path {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "loading config");
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/lambda-view/config.json`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lambda-view").join("config.json"))
    }

    /// Look an environment up by name, ignoring case.
    pub fn environment(&self, name: &str) -> Result<&Environment> {
        self.environments
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ConsoleError::UnknownEnvironment {
                name: name.to_string(),
                known: self
                    .environments
                    .iter()
                    .map(|e| e.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
