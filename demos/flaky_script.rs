//! # Example: flaky_script
//!
//! Supervises a shell script that crashes shortly after every start and shows
//! how restart waits grow until the retry budget runs out.
//!
//! ## Flow
//! ```text
//! Supervisor::start()
//!   ├─► launch #0 → "starting sh"
//!   ├─► exit(code 1) → RestartScheduled{delay=200ms}
//!   ├─► restart #1 → "restarted after ~200 ms; attempts = 1"
//!   ├─► exit(code 1) → RestartScheduled{delay≈300ms}
//!   ├─► restart #2 → "restarted after ~300 ms; attempts = 2"
//!   ├─► ...
//!   └─► attempts = 4 > max_retries = 3 → RetriesExhausted
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example flaky_script
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scriptvisor::{
    Event, EventKind, JitterPolicy, LogSink, Subscribe, Supervisor, SupervisorConfig,
};

/// Prints log lines to stdout instead of `tracing`.
struct StdoutSink;

impl LogSink for StdoutSink {
    fn info(&self, message: &str, code: u32) {
        println!("[info  {code}] {message}");
    }

    fn warn(&self, message: &str, code: u32) {
        println!("[warn  {code}] {message}");
    }

    fn error(&self, message: &str, code: u32) {
        println!("[error {code}] {message}");
    }
}

/// Shows the scheduled waits, which the sink does not log.
struct WaitPrinter;

#[async_trait]
impl Subscribe for WaitPrinter {
    async fn on_event(&self, ev: &Event) {
        if let EventKind::RestartScheduled = ev.kind {
            println!(
                "[waits] attempt {} in {} ms",
                ev.attempt.unwrap_or(0),
                ev.delay_ms.unwrap_or(0)
            );
        }
    }

    fn name(&self) -> &'static str {
        "wait-printer"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. A script that always crashes after 100ms.
    let mut cfg = SupervisorConfig::new("sh");
    cfg.args = vec![
        "-c".into(),
        "echo '[flaky] running'; sleep 0.1; exit 1".into(),
    ];

    // 2. Retry budget and backoff: 200ms, then ×1.5 per failure, with equal jitter.
    cfg.max_retries = Some(3);
    cfg.restart_delay = Duration::from_millis(200);
    cfg.restart_delay_growth = 0.5;
    cfg.jitter = JitterPolicy::Equal;

    // 3. Build the supervisor with a stdout sink and an extra subscriber.
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(WaitPrinter)];
    let sup = Supervisor::builder(cfg)
        .with_sink(Arc::new(StdoutSink))
        .with_subscribers(subs)
        .build()?;

    // 4. Run until supervision gives up (or Ctrl-C).
    let outcome = sup.start().await?;

    println!("[main] done: {outcome}");
    Ok(())
}
