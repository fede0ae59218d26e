use anyhow::{bail, Context, Result};
use clap::Parser;
use course_studio_shared::Operation;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "course-studio",
    version,
    about = "Terminal client for the course content generation service"
)]
pub struct Cli {
    /// Base URL of the course generation backend
    #[arg(
        long,
        env = "COURSE_STUDIO_BACKEND_URL",
        default_value = "http://localhost:5000"
    )]
    pub backend_url: String,

    /// Give up on a request after this many seconds (no limit by default)
    #[arg(long, env = "COURSE_STUDIO_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Directory for the session history log
    #[arg(long, env = "COURSE_STUDIO_HISTORY_DIR", default_value = "history_logs")]
    pub history_dir: PathBuf,

    /// Do not write a session history log
    #[arg(long)]
    pub no_history_log: bool,

    /// Operation selected at startup, by label ("Generate MCQ") or endpoint ("generate_mcq")
    #[arg(long, env = "COURSE_STUDIO_OPERATION")]
    pub operation: Option<Operation>,

    /// Diagnostic log file; the terminal is owned by the UI
    #[arg(long, env = "COURSE_STUDIO_LOG_FILE", default_value = "course-studio.log")]
    pub log_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Url,
    pub timeout: Option<Duration>,
    pub history_dir: Option<PathBuf>,
    pub log_file: PathBuf,
    pub operation: Operation,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let backend_url = Url::parse(cli.backend_url.trim())
            .with_context(|| format!("invalid backend URL '{}'", cli.backend_url))?;
        if !matches!(backend_url.scheme(), "http" | "https") {
            bail!(
                "backend URL must use http or https, got '{}'",
                backend_url.scheme()
            );
        }
        if backend_url.cannot_be_a_base() {
            bail!("backend URL '{}' cannot be used as a base", backend_url);
        }

        Ok(Self {
            backend_url,
            timeout: cli.timeout_secs.map(Duration::from_secs),
            history_dir: (!cli.no_history_log).then_some(cli.history_dir),
            log_file: cli.log_file,
            operation: cli.operation.unwrap_or_default(),
        })
    }

    /// Loads `.env` if present, then parses flags and environment.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_cli(Cli::parse())
    }
}
