//! Derrick CLI - status aggregation for multi-agent work orchestration.

use clap::Parser;
use derrick::aggregate::Aggregator;
use derrick::cli::Cli;
use derrick::commands;
use derrick::config::Config;
use derrick::sources::SystemRunner;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let human = cli.human_readable;

    // Workdir: --workdir flag > DK_WORKDIR env (clap) > cwd
    let workdir = match cli.workdir {
        Some(path) => path,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let config = match Config::load(&workdir, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_error(&e, human),
    };

    let runner: Arc<dyn derrick::sources::CommandRunner> = Arc::new(SystemRunner);
    let fetch_timeout = config.fetch_timeout();
    let aggregator = Aggregator::new(config, workdir, runner.clone());

    match commands::run(cli.command, &aggregator, runner, fetch_timeout).await {
        Ok(value) => {
            if human {
                println!("{}", commands::render_human(&value));
            } else {
                match serde_json::to_string_pretty(&value) {
                    Ok(json) => println!("{}", json),
                    Err(e) => exit_error(&derrick::Error::Json(e), human),
                }
            }
        }
        Err(e) => exit_error(&e, human),
    }
}

/// Print a structured error and exit non-zero.
///
/// JSON mode emits an error object with an empty-array fallback body so
/// pollers always receive a well-formed document.
fn exit_error(error: &derrick::Error, human: bool) -> ! {
    if human {
        eprintln!("Error: {}", error);
    } else {
        let body = serde_json::json!({ "error": error.to_string(), "data": [] });
        eprintln!("{}", body);
    }
    process::exit(1);
}
