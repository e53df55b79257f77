//! Command-line and environment configuration.
//!
//! # Responsibility
//! - Resolve store location and logging settings for one process run.
//!
//! # Invariants
//! - Every flag has an environment fallback and a usable default.

use clap::Parser;
use personbook_core::{default_log_level, Database, DbResult};

const IN_MEMORY_DB: &str = ":memory:";

/// Interactive person profile manager.
#[derive(Debug, Clone, Parser)]
#[command(name = "personbook", version, about)]
pub struct CliConfig {
    /// SQLite database file, or `:memory:` for a throwaway store.
    #[arg(long, env = "PERSONBOOK_DB", default_value = "personbook.sqlite3")]
    pub db: String,

    /// One of trace|debug|info|warn|error. Defaults by build mode.
    #[arg(long, env = "PERSONBOOK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "PERSONBOOK_LOG_DIR")]
    pub log_dir: Option<String>,
}

impl CliConfig {
    /// Returns the configured level, or the build-mode default.
    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    /// Opens the configured store with migrations applied.
    pub fn open_database(&self) -> DbResult<Database> {
        if self.db == IN_MEMORY_DB {
            Database::open_in_memory()
        } else {
            Database::open(&self.db)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CliConfig;
    use clap::Parser;

    #[test]
    fn flags_override_defaults() {
        let config = CliConfig::parse_from([
            "personbook",
            "--db",
            ":memory:",
            "--log-level",
            "warn",
            "--log-dir",
            "/tmp/personbook-logs",
        ]);

        assert_eq!(config.db, ":memory:");
        assert_eq!(config.effective_log_level(), "warn");
        assert_eq!(config.log_dir.as_deref(), Some("/tmp/personbook-logs"));
        assert_eq!(config.open_database().unwrap().mode(), "memory");
    }

    #[test]
    fn parsed_config_without_level_uses_build_default() {
        let config = CliConfig::parse_from(["personbook", "--db", ":memory:"]);
        if config.log_level.is_none() {
            assert_eq!(
                config.effective_log_level(),
                personbook_core::default_log_level()
            );
        }
    }

    #[test]
    fn log_level_falls_back_to_build_default() {
        let config = CliConfig {
            db: ":memory:".to_string(),
            log_level: None,
            log_dir: None,
        };
        assert_eq!(
            config.effective_log_level(),
            personbook_core::default_log_level()
        );
    }
}
