//! Manager configuration.
//!
//! Precedence for [`ManagerConfig::load`]: an explicit path, then the file named
//! by `NEXUS_COLUMN_CONFIG`, then `./nexus_column.toml`, then defaults. Environment
//! overrides (`NEXUS_COLUMN_MAX_RESULTS`, `NEXUS_COLUMN_SLOW_QUERY_MS`) apply last.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::DbError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Hard cap on rows returned by one select; 0 disables the cap.
    pub max_results: usize,
    /// Sort keys beyond this count are ignored (with a warning).
    pub max_sort_fields: usize,
    /// Selects slower than this are counted and logged as slow; 0 disables.
    pub slow_query_ms: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self { max_results: 10_000, max_sort_fields: 8, slow_query_ms: 500 }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

impl ManagerConfig {
    /// # Errors
    /// `Config` when the TOML is malformed.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        toml::from_str::<Self>(s).map_err(|e| DbError::Config(e.to_string()))
    }

    /// # Errors
    /// `Io` when the file cannot be read, `Config` when it cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, DbError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| DbError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&s)
    }

    /// Resolves the configuration from files and environment.
    ///
    /// # Errors
    /// An explicitly requested file that is missing or malformed is an error;
    /// the implicit candidates are skipped when absent.
    pub fn load(path: Option<&Path>) -> Result<Self, DbError> {
        let mut cfg = if let Some(p) = path {
            Self::from_file(p)?
        } else {
            let mut candidates: Vec<PathBuf> = Vec::new();
            if let Ok(p) = std::env::var("NEXUS_COLUMN_CONFIG") {
                candidates.push(PathBuf::from(p));
            }
            if let Ok(cur) = std::env::current_dir() {
                candidates.push(cur.join("nexus_column.toml"));
            }
            match candidates.into_iter().find(|p| p.exists()) {
                Some(p) => {
                    log::info!("loading manager config from {}", p.display());
                    Self::from_file(&p)?
                }
                None => Self::default(),
            }
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        if let Some(n) = env_parse::<usize>("NEXUS_COLUMN_MAX_RESULTS") {
            self.max_results = n;
        }
        if let Some(ms) = env_parse::<u64>("NEXUS_COLUMN_SLOW_QUERY_MS") {
            self.slow_query_ms = ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = ManagerConfig::from_toml_str("max_results = 25\n").unwrap();
        assert_eq!(cfg.max_results, 25);
        assert_eq!(cfg.max_sort_fields, ManagerConfig::default().max_sort_fields);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        assert!(matches!(
            ManagerConfig::from_toml_str("max_results = \"many\""),
            Err(DbError::Config(_))
        ));
    }

    #[test]
    fn explicit_path_is_read_or_reported() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "slow_query_ms = 5\nmax_sort_fields = 3").unwrap();
        let cfg = ManagerConfig::from_file(f.path()).unwrap();
        assert_eq!((cfg.slow_query_ms, cfg.max_sort_fields), (5, 3));
        let missing = std::env::temp_dir().join("nexus_column_missing_cfg.toml");
        assert!(matches!(ManagerConfig::load(Some(missing.as_path())), Err(DbError::Io(_))));
    }
}
