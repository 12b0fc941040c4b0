use clap::Parser;

use bodhi::core::config::Config;
use bodhi::core::pacer::TypingSpeed;
use bodhi::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "bodhi")]
#[command(about = "A terminal chat interface for the Bodhi AI assistant")]
#[command(
    long_about = "Bodhi is a full-screen terminal chat client that streams responses \
from a remote chat-completions service, pacing them character by character with \
structured rendering for code, tables, and math.\n\n\
Environment Variables:\n\
  BODHI_API_KEY          API key for the service (required)\n\
  BODHI_BASE_URL         Service base URL (required)\n\
  BODHI_FAST_MODEL       Model for classification and templates (optional)\n\
  BODHI_REASONING_MODEL  Model for full generation (optional)\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Up/Down           Scroll through chat history\n\
  Ctrl+T            Cycle typing speed\n\
  Esc               Cancel the current response\n\
  Ctrl+L            Clear the conversation\n\
  Ctrl+C            Quit"
)]
struct Args {
    /// Override the fast model used for classification and templates
    #[arg(long, value_name = "MODEL")]
    fast_model: Option<String>,

    /// Override the reasoning model used for full generation
    #[arg(long, value_name = "MODEL")]
    reasoning_model: Option<String>,

    /// Initial typing speed (very-fast, fast, normal, slow, very-slow)
    #[arg(short, long, default_value = "normal")]
    speed: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Diagnostics go to stderr, gated by BODHI_LOG; the terminal UI owns
    // stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("BODHI_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let speed = TypingSpeed::from_label(&args.speed)
        .ok_or_else(|| format!("unknown typing speed: {}", args.speed))?;

    let mut config = Config::from_env()?;
    config.apply_overrides(args.fast_model, args.reasoning_model);

    run_chat(config, speed).await
}
