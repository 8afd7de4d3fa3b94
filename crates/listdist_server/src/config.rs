//! Server configuration from flags, environment and `.env`.

use clap::Parser;
use listdist_core::{default_log_level, init_logging, init_stderr_logging};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "listdist_server")]
#[command(about = "HTTP backend for agent registration and contact-list distribution")]
pub struct ServerConfig {
    /// Socket address to listen on
    #[arg(long, env = "LISTDIST_BIND", default_value = "127.0.0.1:4000")]
    pub bind: SocketAddr,

    /// SQLite database file
    #[arg(long, env = "LISTDIST_DB_PATH", default_value = "listdist.sqlite3")]
    pub db_path: PathBuf,

    /// Directory for rolling log files; logs go to stderr when unset
    #[arg(long, env = "LISTDIST_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "LISTDIST_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Largest accepted request body in bytes
    #[arg(long, env = "LISTDIST_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    /// Starts file logging when a log dir is configured, stderr otherwise.
    pub fn init_logging(&self) -> Result<(), String> {
        match &self.log_dir {
            Some(dir) => {
                let dir = absolute_dir(dir)?;
                let dir = dir
                    .to_str()
                    .ok_or_else(|| format!("log dir `{}` is not valid UTF-8", dir.display()))?;
                init_logging(self.log_level(), dir).map_err(|err| err.to_string())
            }
            None => init_stderr_logging(self.log_level()).map_err(|err| err.to_string()),
        }
    }
}

fn absolute_dir(dir: &Path) -> Result<PathBuf, String> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(dir))
        .map_err(|err| format!("failed to resolve log dir `{}`: {err}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::{ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
    use clap::Parser;
    use listdist_core::default_log_level;

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "listdist_server",
            "--bind",
            "0.0.0.0:8080",
            "--db-path",
            "/tmp/lists.db",
            "--log-level",
            "warn",
            "--max-upload-bytes",
            "1024",
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.db_path.to_str(), Some("/tmp/lists.db"));
        assert_eq!(config.log_level(), "warn");
        assert_eq!(config.max_upload_bytes, 1024);
    }

    #[test]
    fn rejects_malformed_bind_address() {
        assert!(ServerConfig::try_parse_from(["listdist_server", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn unset_log_level_falls_back_to_build_default() {
        let config = ServerConfig::try_parse_from(["listdist_server"]).unwrap();
        if config.log_level.is_none() {
            assert_eq!(config.log_level(), default_log_level());
        }
    }

    #[test]
    fn default_upload_limit_is_ten_mebibytes() {
        assert_eq!(DEFAULT_MAX_UPLOAD_BYTES, 10_485_760);
    }
}
