//! An interactive terminal front end of `toolwright`.
//!
//! Settings come from the `TOOLWRIGHT_*` environment variables, see
//! [`Settings::from_env`]. With `TOOLWRIGHT_SERVE_ADDR` set, the orchestrator
//! is served over HTTP instead.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::net::TcpListener;
use tokio::select;
use tokio::time::sleep;
use toolwright::core::trace::JsonlTraceStore;
use toolwright::core::{RunOutcome, RunStatus};
use toolwright::{SessionBuilder, Settings, server};

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = Settings::from_env();
    info!("starting with {settings:?}");
    let trace_store = JsonlTraceStore::new(&settings.trace_path);

    if let Some(addr) = settings.serve_addr {
        let orchestrator = SessionBuilder::with_settings(settings)
            .with_trace_sink(Arc::new(trace_store))
            .build_orchestrator();
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                error!(%addr, "bind failed: {err}");
                return;
            }
        };
        if let Err(err) = server::serve(listener, Arc::new(orchestrator)).await
        {
            error!("server error: {err}");
        }
        return;
    }

    println!(
        "{} {:?} mode, {:?} backend at {}",
        "toolwright".bright_white().bold(),
        settings.mode,
        settings.backend,
        settings.base_url
    );

    let mut session = SessionBuilder::with_settings(settings)
        .with_trace_sink(Arc::new(trace_store))
        .with_session_id("cli")
        .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message("🤔 Thinking...");

        let fut = session.send_message(line);
        tokio::pin!(fut);
        let result = loop {
            select! {
                result = &mut fut => break result,
                _ = sleep(Duration::from_millis(100)) => {
                    progress_bar.inc(1);
                }
            }
        };

        // Finish the progress bar before printing anything else.
        progress_bar.finish_and_clear();

        match result {
            Ok(outcome) => print_outcome(&outcome),
            Err(err) => {
                println!("{}❌ {}", BAR_CHAR.bright_red(), err.bright_red());
            }
        }
    }
}

fn print_outcome(outcome: &RunOutcome) {
    for entry in &outcome.trace {
        let bar = BAR_CHAR.bright_black();
        println!(
            "{bar}🔧 {} {}",
            entry.tool.bright_white().bold(),
            entry.arguments.bright_black()
        );
        println!("{bar}   {}", entry.result.bright_black());
    }
    match outcome.status {
        RunStatus::Success => println!(
            "{}🤖 {}",
            BAR_CHAR.bright_cyan(),
            outcome.answer.bright_white()
        ),
        RunStatus::Error => println!(
            "{}⚠️  {}",
            BAR_CHAR.bright_yellow(),
            outcome.answer.bright_yellow()
        ),
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
