//! `config.toml` loading.
//!
//! ```toml
//! database_url = "postgres://localhost/app"
//! dialect = "postgres"
//! table_prefix = "app_"
//! ```

use crate::error::{SqlError, SqlResult};
use crate::transpiler::Dialect;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub dialect: Option<Dialect>,
    #[serde(default)]
    pub table_prefix: String,
}

impl Config {
    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing default file yields the default config; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> SqlResult<Self> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// `<config dir>/sqlcraft/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sqlcraft").join("config.toml"))
    }

    pub fn parse(content: &str) -> SqlResult<Self> {
        toml::from_str(content).map_err(|e| SqlError::Config(e.to_string()))
    }

    fn read(path: &Path) -> SqlResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SqlError::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Dialect to compile for: explicit setting first, then the URL scheme.
    pub fn resolve_dialect(&self) -> SqlResult<Dialect> {
        if let Some(dialect) = self.dialect {
            return Ok(dialect);
        }
        match &self.database_url {
            Some(url) => Dialect::from_url(url),
            None => Ok(Dialect::default()),
        }
    }
}
