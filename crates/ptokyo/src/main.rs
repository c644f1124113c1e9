// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parallel Tokyo - a shared night-city canvas in the terminal.
//!
//! This is the binary entry point for the client.

mod app;
mod command;
mod render;
mod session;
mod shell;
mod view;

use clap::{Parser, Subcommand};
use colored::Colorize;

use ptokyo_config::PtokyoConfig;

/// Parallel Tokyo - a shared night-city canvas in the terminal.
#[derive(Parser, Debug)]
#[command(name = "ptokyo", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch the interactive client (default).
    Shell,
    /// Print one urban legend and exit.
    Legend,
    /// Print a release message for a worry and exit.
    Purify {
        /// The worry to release.
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Manage configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate configuration and report where credentials come from.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ptokyo_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            ptokyo_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.client.log_level);

    let result = match cli.command {
        None | Some(Commands::Shell) => shell::run_shell(config).await,
        Some(Commands::Legend) => {
            let oracle = app::build_oracle(&config);
            println!("{}", app::urban_legend(oracle.as_ref()).await);
            Ok(())
        }
        Some(Commands::Purify { text }) => {
            let oracle = app::build_oracle(&config);
            println!("{}", app::purification(oracle.as_ref(), &text.join(" ")).await);
            Ok(())
        }
        Some(Commands::Config {
            action: ConfigCommand::Check,
        }) => {
            config_check(&config);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Where a secret would come from, without prompting for it.
fn key_source(configured: Option<&str>, env_var: &str) -> Option<String> {
    if configured.is_some_and(|v| !v.trim().is_empty()) {
        return Some("config file".to_string());
    }
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|_| format!("${env_var}"))
}

fn config_check(config: &PtokyoConfig) {
    use ptokyo_config::credentials::{
        GEMINI_KEY_ENV_VAR, OPENAI_KEY_ENV_VAR, SUPABASE_ANON_KEY_ENV_VAR,
    };

    println!("{} configuration is valid", "ok".green());
    println!("  backend    {}", config.supabase.url);
    println!("  generation {}", config.generation.provider);

    let generation_key = match config.generation.provider.as_str() {
        "gemini" => ("gemini.api_key", config.gemini.api_key.as_deref(), GEMINI_KEY_ENV_VAR),
        _ => ("openai.api_key", config.openai.api_key.as_deref(), OPENAI_KEY_ENV_VAR),
    };
    let keys = [
        (
            "supabase.anon_key",
            config.supabase.anon_key.as_deref(),
            SUPABASE_ANON_KEY_ENV_VAR,
        ),
        generation_key,
    ];
    for (name, configured, env_var) in keys {
        match key_source(configured, env_var) {
            Some(source) => println!("  {} {name} from {source}", "found".green()),
            None => println!("  {} {name}: will be prompted for", "missing".yellow()),
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ptokyo={log_level},warn")));

    // Logs share the terminal with the REPL, so they go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
