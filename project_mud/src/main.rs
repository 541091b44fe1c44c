mod config;
mod console;
mod shutdown;

use std::sync::Arc;

use player_db::SqliteGateway;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::parse_cli_args;
use crate::console::{Console, ConsoleOutcome};

#[tokio::main]
async fn main() {
    observability::init_logging();

    let config = match parse_cli_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("MUD Server starting...");

    let gateway = match SqliteGateway::open(&config.database.path) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            tracing::error!(
                path = %config.database.path,
                error = %e,
                "Failed to open account database"
            );
            std::process::exit(1);
        }
    };
    tracing::info!(path = %config.database.path, "Account database opened");

    let (shutdown_tx, _) = session::shutdown_channel();
    let autoload = config.world.autoload;
    let mut console = Console::new(config, gateway, shutdown_tx);

    let startup = if autoload {
        console.autoload().await
    } else {
        match console.execute("list").await {
            ConsoleOutcome::Continue(lines) => lines,
            ConsoleOutcome::Exit => Vec::new(),
        }
    };
    for line in startup {
        println!("{line}");
    }
    match console.local_addr() {
        Some(addr) => tracing::info!(%addr, "Accepting connections"),
        None => tracing::info!("No world loaded; use 'load' to start listening"),
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let signal = shutdown::wait_for_signal();
    tokio::pin!(signal);
    loop {
        tokio::select! {
            _ = &mut signal => {
                tracing::info!("Shutdown signal received, stopping server...");
                break;
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match console.execute(&line).await {
                    ConsoleOutcome::Continue(lines) => {
                        for line in lines {
                            println!("{line}");
                        }
                    }
                    ConsoleOutcome::Exit => break,
                },
                Ok(None) => {
                    tracing::info!("Console input closed; waiting for a signal to stop");
                    stdin_open = false;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Console read failed");
                    stdin_open = false;
                }
            },
        }
    }

    console.shutdown().await;
    println!("Shutting down MudServer.");
    tracing::info!("Server stopped.");
}
