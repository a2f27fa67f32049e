//! talkline entry point.
//!
//! Thin setup around the duplex loop: parse and validate arguments, open
//! the endpoints, capture the terminal, run. This is also the single
//! top-level failure handler - every fatal error propagates here, cleanup
//! happens on the way (terminal restore via the guard), and the exit code
//! is decided in exactly one place: 0 after an interrupt shutdown, 1 for
//! usage, validation, or runtime failures.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use talkline_cli::{Runtime, RuntimeError, TermError, TermGuard, TransportError, transport};
use talkline_core::{Config, ConfigError};

/// Bidirectional UDP terminal chat endpoint
#[derive(Parser, Debug)]
#[command(name = "talkline")]
#[command(about = "Bidirectional UDP terminal chat endpoint")]
#[command(version)]
struct Args {
    /// Peer IPv4 address to chat with
    peer_ip: String,

    /// Destination port on the peer [default: 12345]
    send_port: Option<String>,

    /// Local port to listen on [default: 12345]
    listen_port: Option<String>,
}

/// Everything fatal after argument validation.
#[derive(Debug, Error)]
enum FatalError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Term(#[from] TermError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

// One cooperative task is the whole concurrency model; suspension happens
// only at the multiplex wait.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // clap would exit 2 on its own; usage errors here are exit 1.
            let _ = e.print();
            return ExitCode::FAILURE;
        },
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let config = match Config::from_args(
        &args.peer_ip,
        args.send_port.as_deref(),
        args.listen_port.as_deref(),
    ) {
        Ok(config) => config,
        Err(e) => return report_validation_error(&e),
    };

    prompt("Talkline is starting...");

    match run(config).await {
        Ok(()) => {
            prompt("Exiting...");
            ExitCode::SUCCESS
        },
        Err(e) => {
            tracing::error!(error = %e, "fatal failure");
            ExitCode::FAILURE
        },
    }
}

/// Open endpoints, take over the terminal, and run the loop until
/// interrupted.
async fn run(config: Config) -> Result<(), FatalError> {
    let endpoints = transport::open(&config).await?;
    tracing::info!(
        peer = %config.peer_addr(),
        listen = %config.listen_addr(),
        "endpoints open"
    );

    let term = TermGuard::capture()?;
    prompt("Ctrl + C to exit.");

    Runtime::new(endpoints, term)?.run().await?;
    Ok(())
}

/// Report a rejected argument with the usage text, stderr, exit 1.
fn report_validation_error(error: &ConfigError) -> ExitCode {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "Error: {error}");
    let _ = writeln!(stderr, "{}", Args::command().render_usage());
    ExitCode::FAILURE
}

/// Best-effort prompt line on stdout; chat content owns that stream.
fn prompt(line: &str) {
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{line}");
    let _ = stdout.flush();
}
