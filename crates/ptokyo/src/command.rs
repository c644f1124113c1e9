// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of REPL input lines into commands.

use ptokyo_core::{ItemKind, MoodStatus, PtokyoError};

/// One REPL command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SignIn { email: String },
    SignUp { email: String },
    SignOut,
    Canvas,
    Presence,
    Add {
        kind: ItemKind,
        content: String,
        position: Option<(f64, f64)>,
    },
    Move { id: String, x: f64, y: f64 },
    Status(MoodStatus),
    Burn(String),
    Legend,
    Purify(String),
    Organize,
    Mode,
    Zoom(f64),
    Pan(f64, f64),
    Show,
    Scan,
    Help,
    Quit,
}

fn usage(text: &str) -> PtokyoError {
    PtokyoError::InvalidInput(format!("usage: {text}"))
}

fn number(token: &str, what: &str) -> Result<f64, PtokyoError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PtokyoError::InvalidInput(format!("{what} must be a number, got {token:?}")))
}

/// Text after the command word, trimmed.
fn rest_of<'a>(line: &'a str, word: &str) -> &'a str {
    line[word.len()..].trim()
}

/// Parse one input line. A line without a leading `/` burns its text.
pub fn parse(line: &str) -> Result<Command, PtokyoError> {
    let line = line.trim();
    let Some(word) = line.split_whitespace().next() else {
        return Err(usage("/help"));
    };
    if !word.starts_with('/') {
        return Ok(Command::Burn(line.to_string()));
    }
    let args: Vec<&str> = line.split_whitespace().skip(1).collect();
    let text = rest_of(line, word);

    match word {
        "/signin" | "/signup" => {
            let [email] = args.as_slice() else {
                return Err(usage(&format!("{word} <email>")));
            };
            let email = email.to_string();
            Ok(if word == "/signin" {
                Command::SignIn { email }
            } else {
                Command::SignUp { email }
            })
        }
        "/signout" => Ok(Command::SignOut),
        "/canvas" => Ok(Command::Canvas),
        "/presence" => Ok(Command::Presence),
        "/add" => parse_add(&args),
        "/move" => {
            let [id, x, y] = args.as_slice() else {
                return Err(usage("/move <id> <x> <y>"));
            };
            Ok(Command::Move {
                id: id.to_string(),
                x: number(x, "x")?,
                y: number(y, "y")?,
            })
        }
        "/status" => {
            let [mood] = args.as_slice() else {
                return Err(usage("/status <tired|melancholy|calm|anxious|neutral>"));
            };
            mood.to_lowercase()
                .parse::<MoodStatus>()
                .map(Command::Status)
                .map_err(|_| PtokyoError::InvalidInput(format!("unknown mood {mood:?}")))
        }
        "/burn" if !text.is_empty() => Ok(Command::Burn(text.to_string())),
        "/burn" => Err(usage("/burn <worry>")),
        "/legend" => Ok(Command::Legend),
        "/purify" if !text.is_empty() => Ok(Command::Purify(text.to_string())),
        "/purify" => Err(usage("/purify <worry>")),
        "/organize" => Ok(Command::Organize),
        "/mode" => Ok(Command::Mode),
        "/zoom" => {
            let [scale] = args.as_slice() else {
                return Err(usage("/zoom <scale>"));
            };
            Ok(Command::Zoom(number(scale, "scale")?))
        }
        "/pan" => {
            let [x, y] = args.as_slice() else {
                return Err(usage("/pan <x> <y>"));
            };
            Ok(Command::Pan(number(x, "x")?, number(y, "y")?))
        }
        "/show" => Ok(Command::Show),
        "/scan" => Ok(Command::Scan),
        "/help" | "/?" => Ok(Command::Help),
        "/quit" | "/exit" => Ok(Command::Quit),
        other => Err(PtokyoError::InvalidInput(format!(
            "unknown command {other}, try /help"
        ))),
    }
}

/// `/add <kind> <content...> [x y]`: two trailing numbers after at least one
/// content word are a position.
fn parse_add(args: &[&str]) -> Result<Command, PtokyoError> {
    const USAGE: &str = "/add <text|image|link> <content> [x y]";
    let [kind, rest @ ..] = args else {
        return Err(usage(USAGE));
    };
    if rest.is_empty() {
        return Err(usage(USAGE));
    }
    let kind = kind
        .to_lowercase()
        .parse::<ItemKind>()
        .map_err(|_| PtokyoError::InvalidInput(format!("unknown item kind {kind:?}")))?;

    let (content, position) = match rest {
        [content @ .., x, y] if !content.is_empty() => {
            match (x.parse::<f64>(), y.parse::<f64>()) {
                (Ok(x), Ok(y)) if x.is_finite() && y.is_finite() => (content, Some((x, y))),
                _ => (rest, None),
            }
        }
        _ => (rest, None),
    };
    Ok(Command::Add {
        kind,
        content: content.join(" "),
        position,
    })
}
