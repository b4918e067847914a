//! metafield-audit - entrypoint.
//!
//! `serve` runs the HTTP server and the weekly scheduler; `scan` runs a single
//! scan and prints its result.

#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mfa_shopify::scheduler::{ScanGuard, WeeklySchedule, run_schedule};
use mfa_shopify::server::{AppState, serve};
use mfa_shopify::{AuditConfig, Scanner, logging};
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "metafield-audit", version, about = "Audit Shopify metafields and email the gaps")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP endpoints and run the weekly schedule (default).
    Serve {
        /// Listen port (overrides PORT).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run one scan now and print the result as JSON.
    Scan,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AuditConfig::from_env().context("loading configuration")?;
    logging::init(config.log_format)?;

    let scanner = Arc::new(Scanner::from_config(&config).context("building scanner")?);

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Scan => {
            let result = scanner.run().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Serve { port } => {
            let schedule = WeeklySchedule::from_config(&config.schedule)?;
            let guard = ScanGuard::new();
            tokio::spawn(run_schedule(schedule, Arc::clone(&scanner), guard.clone()));

            let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.server.port)));
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            serve(listener, AppState { scanner, guard }).await?;
        }
    }

    Ok(())
}
