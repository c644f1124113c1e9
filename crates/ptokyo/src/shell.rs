// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ptokyo shell` command implementation.
//!
//! Interactive REPL over the connected store. A background task prints a
//! one-line notice whenever remote changes reshape the mounted view.

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::debug;

use ptokyo_config::PtokyoConfig;
use ptokyo_core::{Credentials, PtokyoError};
use ptokyo_store::Store;

use crate::app::App;
use crate::command::{self, Command};
use crate::render;
use crate::view::View;

/// Print a notice for every store change until the store goes away.
fn spawn_notices(store: Store) -> JoinHandle<()> {
    let mut events = store.subscribe();
    tokio::spawn(async move {
        let mut notices = render::Notices::default();
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = notices.line(&store.snapshot(), event) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "notices lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn credentials(email: String) -> Result<Credentials, PtokyoError> {
    let password = rpassword::prompt_password("password: ")
        .map_err(|e| PtokyoError::InvalidInput(format!("cannot read password: {e}")))?;
    if password.is_empty() {
        return Err(PtokyoError::InvalidInput("password must not be empty".to_string()));
    }
    Ok(Credentials { email, password })
}

/// Runs the `ptokyo shell` interactive REPL.
pub async fn run_shell(config: PtokyoConfig) -> Result<(), PtokyoError> {
    let mut app = App::connect(&config)?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| PtokyoError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "parallel tokyo".bold().magenta());
    println!(
        "Type {} for commands, {} to leave. Plain text burns a worry.\n",
        "/help".yellow(),
        "/quit".yellow()
    );

    if let Err(e) = app.mount(View::Canvas).await {
        eprintln!("{}: {e}", "error".red());
    }
    let notices = spawn_notices(app.store().clone());

    loop {
        let label = match app.mounted_view() {
            Some(View::Canvas) => "canvas",
            Some(View::Presence) => "presence",
            None => "offline",
        };
        let prompt = format!("{}> ", label.magenta());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            // Ctrl+C or Ctrl+D
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(&line);

        let command = match command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e.to_string().yellow());
                continue;
            }
        };

        let result = match command {
            Command::Quit => break,
            Command::SignIn { email } => match credentials(email) {
                Ok(creds) => app.sign_in(&creds).await.map(Some),
                Err(e) => Err(e),
            },
            Command::SignUp { email } => match credentials(email) {
                Ok(creds) => app.sign_up(&creds).await.map(Some),
                Err(e) => Err(e),
            },
            other => app.execute(other).await,
        };

        match result {
            Ok(Some(text)) => println!("{}", text.trim_end()),
            Ok(None) => {}
            Err(PtokyoError::Auth { message }) => eprintln!("{}", message.red()),
            Err(e @ (PtokyoError::InvalidInput(_) | PtokyoError::NotAuthenticated)) => {
                eprintln!("{}", e.to_string().yellow());
            }
            Err(e) => eprintln!("{}: {e}", "error".red()),
        }
    }

    notices.abort();
    println!("{}", "goodbye".dimmed());
    Ok(())
}
