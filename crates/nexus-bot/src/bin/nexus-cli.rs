//! Nexus command console
//!
//! Runs the same dispatcher the webhook server uses, reading commands from
//! stdin instead of LINE. Useful for trying handlers without a channel.
//!
//! # Usage
//!
//! ```bash
//! export GEMINI_API_KEY="..."
//!
//! # Interactive
//! cargo run --bin nexus-cli -p nexus-bot
//!
//! # One-shot
//! cargo run --bin nexus-cli -p nexus-bot -- --command "/price 2330"
//! ```

use clap::Parser;
use nexus_bot::{BotConfig, CommandDispatcher};
use nexus_utils::{LogConfig, init_tracing_with};
use std::io::{self, BufRead, Write};

#[derive(Parser)]
#[command(name = "nexus-cli")]
#[command(about = "Run Nexus bot commands from the terminal", long_about = None)]
struct Args {
    /// Dispatch a single message and exit
    #[arg(short, long)]
    command: Option<String>,
}

fn print_banner(commands: &[&str]) {
    println!("Nexus console");
    println!("  Commands: {}", commands.join("  "));
    println!("  /exit or /quit to leave; anything else is echoed back");
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _guards = init_tracing_with(&LogConfig {
        default_filter: "warn,nexus_bot=info".to_string(),
        ..LogConfig::from_env()
    });

    let config = BotConfig::from_env()?;
    let dispatcher = CommandDispatcher::from_config(&config)?;

    if let Some(command) = args.command {
        println!("{}", dispatcher.dispatch(&command).await);
        return Ok(());
    }

    print_banner(&dispatcher.commands());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("nexus> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "/exit" | "/quit") {
            println!("Goodbye!");
            break;
        }

        println!("{}\n", dispatcher.dispatch(input).await);
    }

    Ok(())
}
