//! Scriptvisor daemon
//!
//! Runs one script under supervision until it is stopped or supervision gives up.
//!
//! Exit codes: `0` stopped on request, `1` supervision gave up, `2` invalid
//! arguments or runtime failure.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scriptvisor::{ConfigError, LogChannel, Supervisor, SupervisorConfig};

/// Keep a script alive: restart with backoff, rate limit, graceful shutdown.
#[derive(Parser, Debug)]
#[command(name = "scriptvisor", version)]
#[command(about = "Keep a long-running script alive", long_about = None)]
struct Args {
    /// Script to supervise
    #[arg(long)]
    file: PathBuf,

    /// Interpreter used to run the script (e.g. node, python3)
    #[arg(long)]
    interpreter: Option<PathBuf>,

    /// Working directory of the script
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Extra environment variable, KEY=VALUE (repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE")]
    env: Vec<String>,

    /// Total restarts allowed since the last stable run (-1 = unlimited)
    #[arg(long = "maxretries", default_value_t = -1, allow_negative_numbers = true)]
    max_retries: i64,

    /// Restarts allowed inside one rolling window
    #[arg(long = "maxrestarts", default_value_t = 5)]
    max_restarts: u32,

    /// Wait before the first restart, in seconds
    #[arg(long = "restartdelay", default_value_t = 1.0)]
    restart_delay: f64,

    /// Growth of the wait per consecutive failure, in [0, 1)
    #[arg(long = "grow", default_value_t = 0.25)]
    grow: f64,

    /// Rolling window for the rate limit and the stability reset, in seconds
    #[arg(long, default_value_t = 60.0)]
    window: f64,

    /// Stop supervising when the script exits with an error
    #[arg(long = "abortonerror")]
    abort_on_error: bool,

    /// On shutdown, ask the script to exit (stdin message) instead of killing it
    #[arg(long = "stopparentfirst")]
    stop_parent_first: bool,

    /// Line written to the script's stdin on a graceful shutdown
    #[arg(long, default_value = "shutdown")]
    shutdown_message: String,

    /// Force-kill after this many seconds if the script ignores the shutdown message
    #[arg(long)]
    shutdown_grace: Option<f64>,

    /// Log source name (defaults to the script file stem)
    #[arg(long)]
    log: Option<String>,

    /// Log channel
    #[arg(long = "eventlog", default_value = "application")]
    event_log: LogChannel,

    /// Arguments passed to the script
    #[arg(last = true)]
    script_args: Vec<OsString>,
}

impl Args {
    fn into_config(self) -> Result<SupervisorConfig, ConfigError> {
        let mut cfg = SupervisorConfig::new(self.file);
        cfg.interpreter = self.interpreter;
        cfg.cwd = self.cwd;
        cfg.args = self.script_args;
        cfg.env = self
            .env
            .iter()
            .map(|entry| SupervisorConfig::parse_env(entry))
            .collect::<Result<_, _>>()?;

        cfg.max_retries = SupervisorConfig::max_retries_from_signed(self.max_retries)?;
        cfg.max_restarts = self.max_restarts;
        cfg.restart_delay = SupervisorConfig::duration_from_secs(self.restart_delay)?;
        cfg.restart_delay_growth = self.grow;
        cfg.restart_window = SupervisorConfig::duration_from_secs(self.window)?;
        cfg.abort_on_error = self.abort_on_error;

        cfg.stop_parent_first = self.stop_parent_first;
        cfg.shutdown_message = self.shutdown_message;
        cfg.shutdown_grace = self
            .shutdown_grace
            .map(SupervisorConfig::duration_from_secs)
            .transpose()?;

        cfg.log_source = self.log;
        cfg.log_channel = self.event_log;
        Ok(cfg)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scriptvisor=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let cfg = match args.into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(label = e.as_label(), "{e}");
            return ExitCode::from(2);
        }
    };

    let sup = match Supervisor::builder(cfg).build() {
        Ok(sup) => sup,
        Err(e) => {
            error!(label = e.as_label(), "{e}");
            return ExitCode::from(2);
        }
    };

    match sup.start().await {
        Ok(outcome) => {
            info!(outcome = outcome.as_label(), "{outcome}");
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            error!(label = e.as_label(), "{e}");
            ExitCode::from(2)
        }
    }
}
