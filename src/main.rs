//! travel-rag command line
//!
//! One-shot retrieval, chat sessions and health checks against the
//! configured stores.

#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use travel_rag::utils::format_duration;
use travel_rag::utils::logging::init_logging;
use travel_rag::{AppServices, Config, Result, build_info};

#[derive(Parser)]
#[command(name = "travel-rag")]
#[command(about = "Hotel retrieval and chat for travel queries")]
#[command(version)]
struct Cli {
    /// YAML configuration file; environment variables override it
    #[arg(short, long, env = "TRAVEL_RAG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Retrieve hotels for a query
    Query {
        /// Query text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Maximum number of hotels
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print pipeline counters afterwards
        #[arg(long)]
        stats: bool,
    },
    /// Send a chat message, or read messages from stdin when none is given
    Chat {
        /// Conversation id
        #[arg(short, long, default_value = "cli")]
        session: String,

        /// Message text
        #[arg(num_args = 0..)]
        message: Vec<String>,
    },
    /// Check the durable tier and the vector index
    Health,
    /// Print the effective configuration with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).await?;
    init_logging(&config.logging)?;
    let build = build_info();
    debug!("{} {} ({})", travel_rag::NAME, build.version, build.git_hash);

    if let Command::Config = cli.command {
        print!("{}", config.redacted().to_yaml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let services = AppServices::from_config(&config).await?;

    match cli.command {
        Command::Query { text, top_k, stats } => {
            let started = Instant::now();
            let response = services
                .orchestrator()
                .retrieve(&text.join(" "), top_k)
                .await?;
            info!(
                "Retrieved {} hotels from {:?} in {}",
                response.hotels().len(),
                response.result.source,
                format_duration(started.elapsed().as_millis() as u64)
            );
            print_json(&response)?;
            if stats {
                print_json(&services.stats())?;
            }
        }
        Command::Chat { session, message } => {
            if message.is_empty() {
                chat_loop(&services, &session).await?;
            } else {
                let reply = services.chat().respond(&session, &message.join(" ")).await?;
                print_json(&reply)?;
            }
        }
        Command::Health => {
            let health = services.health_check().await;
            print_json(&health)?;
            if !health.is_healthy() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Config => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// One reply per stdin line until EOF
async fn chat_loop(services: &AppServices, session: &str) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = services.chat().respond(session, line).await?;
        println!("{}\n", reply.reply);
    }
    info!("Chat ended: {:?}", services.chat().stats());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
