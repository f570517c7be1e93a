mod client;
mod demo;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sandbox_core::{Difficulty, TimestampMode};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    client::NodeClient,
    demo::DemoOptions,
    render::{audit_summary, chain_table},
};

#[derive(Parser, Debug)]
#[command(name = "sandbox-cli")]
#[command(about = "CLI client for the chain sandbox node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a new session and print its id
    Session,
    /// Mine a block onto a session's chain
    Mine {
        #[arg(long)]
        session: String,
        /// Block payload
        #[arg(long)]
        data: String,
        /// Leading zeros (1-4); the node's default when omitted
        #[arg(long)]
        difficulty: Option<i64>,
        /// Block until the block is appended instead of returning the job id
        #[arg(long)]
        wait: bool,
    },
    /// Show the mining status of a session
    Status {
        #[arg(long)]
        session: String,
    },
    /// Cancel the session's mining job, if any
    Cancel {
        #[arg(long)]
        session: String,
    },
    /// Reset a session's chain to its genesis block
    Reset {
        #[arg(long)]
        session: String,
    },
    /// Print the session's chain as a table
    List {
        #[arg(long)]
        session: String,
    },
    /// Print the hash-link graph (dot, text or json)
    Graph {
        #[arg(long)]
        session: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Recompute hashes and links of the session's chain
    Audit {
        #[arg(long)]
        session: String,
    },
    /// Rewrite one block's payload on a copy of the chain and audit it
    Tamper {
        #[arg(long)]
        session: String,
        #[arg(long)]
        index: u64,
        #[arg(long)]
        data: String,
    },
    /// Run the sandbox walkthrough in-process, no node required
    Demo {
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(i64).range(1..=4))]
        difficulty: i64,
        /// Payloads to mine, in order
        #[arg(long = "block", default_values_t = [
            "Alice pays Bob 10".to_string(),
            "Bob pays Carol 5".to_string(),
        ])]
        blocks: Vec<String>,
        #[arg(long, default_value_t = TimestampMode::Committed)]
        timestamp_mode: TimestampMode,
    },
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = NodeClient::new(cli.node);
    match cli.cmd {
        Command::Session => {
            let id = client.create_session().await?;
            println!("{id}");
        }
        Command::Mine {
            session,
            data,
            difficulty,
            wait,
        } => {
            let body = client.mine(&session, &data, difficulty, wait).await?;
            print_json(&body)?;
        }
        Command::Status { session } => print_json(&client.status(&session).await?)?,
        Command::Cancel { session } => print_json(&client.cancel(&session).await?)?,
        Command::Reset { session } => {
            let rows = client.reset(&session).await?;
            print!("{}", chain_table(&rows));
        }
        Command::List { session } => {
            let rows = client.chain(&session).await?;
            print!("{}", chain_table(&rows));
        }
        Command::Graph { session, format } => {
            println!("{}", client.graph(&session, &format).await?);
        }
        Command::Audit { session } => {
            println!("{}", audit_summary(&client.audit(&session).await?));
        }
        Command::Tamper {
            session,
            index,
            data,
        } => print_json(&client.tamper(&session, index, &data).await?)?,
        Command::Demo {
            difficulty,
            blocks,
            timestamp_mode,
        } => {
            let out = demo::run(DemoOptions {
                difficulty: Difficulty::new(difficulty)?,
                payloads: blocks,
                timestamp_mode,
            })
            .await?;
            print!("{out}");
        }
    }
    Ok(())
}
