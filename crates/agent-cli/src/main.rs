//! Command-line interface for the stock advisor
//!
//! # Usage
//!
//! ```bash
//! export GROQ_API_KEY="..."
//!
//! # One question
//! cargo run -p agent-cli -- ask "Should I buy Infosys now?"
//!
//! # Interactive session
//! cargo run -p agent-cli -- chat
//! ```

use agent_advisor::{AdvisorConfig, AskRequest, ChatRole, StockAdvisor};
use agent_utils::{LoggingConfig, init_tracing, load_dotenv, load_dotenv_from};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "agent-cli")]
#[command(about = "Ask questions about stocks and business news", long_about = None)]
struct Args {
    /// Env file to load instead of searching for `.env`
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a single question
    Ask {
        /// The question
        query: String,

        /// Session token; a fresh one is generated when omitted
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Interactive session; `/history` prints the conversation, `/exit` quits
    Chat {
        /// Session token; a fresh one is generated when omitted
        #[arg(short, long)]
        session: Option<String>,
    },
}

fn session_token(session: Option<String>) -> String {
    session.unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let env_file = match &args.env_file {
        Some(path) => load_dotenv_from(path),
        None => load_dotenv(),
    };
    init_tracing(&LoggingConfig::from_env());
    match env_file {
        Some(path) => debug!("Loaded environment from {}", path.display()),
        None => debug!("No env file loaded"),
    }

    let config = AdvisorConfig::from_env()?;
    info!("Using model {} at {}", config.llm_model, config.llm_api_base);
    let advisor = StockAdvisor::from_config(config)?;

    match args.command {
        Command::Ask { query, session } => {
            let response = advisor
                .ask(AskRequest::new(query, session_token(session)))
                .await?;
            println!("{}", response.final_result);
        }
        Command::Chat { session } => chat(&advisor, session_token(session)).await?,
    }

    Ok(())
}

async fn chat(advisor: &StockAdvisor, token: String) -> anyhow::Result<()> {
    println!("Stock advisor (session {token})");
    println!("Ask about a stock, the markets, or anything else. /history shows the conversation, /exit quits.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!("\nGoodbye!");
            break;
        };

        match line.trim() {
            "" => {}
            "/exit" | "/quit" => {
                println!("Goodbye!");
                break;
            }
            "/history" => print_history(advisor, &token).await?,
            query => match advisor.ask(AskRequest::new(query, token.as_str())).await {
                Ok(response) => println!("{}\n", response.final_result),
                // The session stays usable after a failed turn
                Err(e) => eprintln!("Error: {e}\n"),
            },
        }
    }

    Ok(())
}

async fn print_history(advisor: &StockAdvisor, token: &str) -> anyhow::Result<()> {
    let history = advisor.history(token).await?;
    if history.is_empty() {
        println!("(no messages yet)\n");
        return Ok(());
    }
    for message in history {
        let who = match message.role {
            ChatRole::User => "you",
            ChatRole::Assistant => "advisor",
        };
        println!("[{}] {who}: {}", message.at.format("%H:%M:%S"), message.content);
    }
    println!();
    Ok(())
}
