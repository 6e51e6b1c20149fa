//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

pub const DEFAULT_API_URL: &str = "http://localhost:3001";
const APP_DIR: &str = "loan-wizard";

#[derive(Parser, Debug, Clone)]
#[command(name = "loan-wizard", version, about = "Step-by-step loan application in the terminal")]
pub struct Config {
    /// Base URL of the record store (entities are created under `<url>/entities`)
    #[arg(long, env = "LOAN_WIZARD_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Directory holding the in-progress session snapshot
    #[arg(long, env = "LOAN_WIZARD_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Seconds to wait for the record store before giving up on a step
    #[arg(long, env = "LOAN_WIZARD_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Log file (defaults to `loan-wizard.log` inside the data directory)
    #[arg(long, env = "LOAN_WIZARD_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
        })
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir().join("loan-wizard.log"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_arguments() {
        let config = Config::try_parse_from([
            "loan-wizard",
            "--api-url",
            "https://records.example.com/api",
            "--data-dir",
            "/tmp/wizard",
            "--timeout-secs",
            "3",
        ])
        .unwrap();

        assert_eq!(config.api_url, "https://records.example.com/api");
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/wizard"));
        assert_eq!(config.log_file(), PathBuf::from("/tmp/wizard/loan-wizard.log"));
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_log_file_override() {
        let config =
            Config::try_parse_from(["loan-wizard", "--data-dir", "/tmp/wizard", "--log-file", "/var/log/w.log"])
                .unwrap();
        assert_eq!(config.log_file(), PathBuf::from("/var/log/w.log"));
    }
}
