use clap::Parser;
use std::path::PathBuf;

/// mobile-review – announce a mobile build artifact to the review service
///
/// Build details are read from the environment: `app_name`, `artifact_url`,
/// `branch`, `commit_hash` and `SERVICE_AUTH_TOKEN`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Activate verbose logging on stderr (-v, -vv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit log lines as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Sets a custom endpoint config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Default log level for the given number of `-v` flags.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
