// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Levo - conversational memory and context assembly service.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod chat;
mod serve;

use clap::{Parser, Subcommand};
use levo_config::model::LevoConfig;

/// Placeholder printed instead of secrets.
const REDACTED: &str = "<redacted>";

/// Levo - chat proxy with per-user conversational memory.
#[derive(Parser, Debug)]
#[command(name = "levo", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Run a single conversation turn and print the reply.
    Chat {
        /// User whose history the turn reads and extends.
        #[arg(long, default_value = "anonymous")]
        user: String,
        /// Print the reply as it is generated.
        #[arg(long)]
        stream: bool,
        /// The message to send.
        prompt: String,
    },
    /// Print a user's stored history, oldest first.
    History {
        /// User id to look up.
        user_id: String,
    },
    /// Print the effective configuration with secrets redacted.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match levo_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            levo_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let Some(command) = cli.command else {
        println!("levo: use --help for available commands");
        return;
    };

    if !matches!(command, Commands::Config) {
        serve::init_tracing(&config.agent.log_level);
    }

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Chat {
            user,
            stream,
            prompt,
        } => chat::run_chat(config, &user, &prompt, stream).await,
        Commands::History { user_id } => chat::run_history(config, &user_id).await,
        Commands::Config => {
            match toml::to_string_pretty(&redacted(config)) {
                Ok(rendered) => print!("{rendered}"),
                Err(e) => {
                    eprintln!("error: failed to render configuration: {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// The configuration with every secret replaced by [`REDACTED`].
fn redacted(mut config: LevoConfig) -> LevoConfig {
    if config.completion.api_key.is_some() {
        config.completion.api_key = Some(REDACTED.to_string());
    }
    if config.search.api_key.is_some() {
        config.search.api_key = Some(REDACTED.to_string());
    }
    config
}
