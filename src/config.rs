use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "taskers", version, about = "Terminal front end for a task REST API")]
pub struct Config {
    /// Base URL of the API serving the `tasks` collection
    #[arg(long, env = "TASKERS_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Seconds before an unanswered request is reported as failed
    #[arg(long, env = "TASKERS_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Where diagnostics are written while the UI owns the terminal
    #[arg(long, env = "TASKERS_LOG_FILE", default_value = "taskers.log")]
    pub log_file: PathBuf,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
