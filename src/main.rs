mod chatbot_client;
mod cli;

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::chatbot_client::ChatbotClient;
use crate::cli::chat::ChatContext;
use crate::cli::chat::conductor::SessionConductor;
use crate::cli::chat::display::{DEFAULT_TYPING_DELAY, PlainRenderer, ReplyRenderer, TypingRenderer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    chat: ChatArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a chat session
    Chat(ChatArgs),
}

#[derive(Args)]
struct ChatArgs {
    /// Send a single message and exit
    #[arg(short, long)]
    input: Option<String>,

    /// Base URL of the chatbot backend (overrides ENDPOINT_URL)
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Delay between words while printing replies, 0 disables the effect
    #[arg(long, default_value_t = DEFAULT_TYPING_DELAY.as_millis() as u64)]
    typing_delay_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();
    let args = match cli.command {
        Some(Commands::Chat(args)) => args,
        None => cli.chat,
    };

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Subatomic Chat CLI");

    let client = match args.endpoint_url {
        Some(url) => ChatbotClient::new(url),
        None => ChatbotClient::from_env(),
    };
    info!("Using chatbot endpoint {}", client.chatbot_url());

    let delay = Duration::from_millis(args.typing_delay_ms);
    let renderer: Box<dyn ReplyRenderer> = if args.input.is_some() || delay.is_zero() {
        Box::new(PlainRenderer::new(io::stdout()))
    } else {
        Box::new(TypingRenderer::new(io::stdout(), delay))
    };

    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        args.input,
        true,
        SessionConductor::new(client),
        renderer,
    );
    chat_context.run().await
}
