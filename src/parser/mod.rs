mod ast;
mod combinators;
mod expand;

pub use ast::{Command, Pipeline};
pub use expand::expand_variables;

use ast::Token;
use combinators::tokenize;

use crate::error::{Result, ShellError};

/// Most stages one pipeline may have.
pub const MAX_COMMANDS: usize = 32;
/// Bound on argv length; a command may carry `MAX_ARGS - 1` words.
pub const MAX_ARGS: usize = 128;

// ── Public API ────────────────────────────────────────────────────────────

/// Parse one (already expanded) line into a [`Pipeline`].
///
/// Returns `Ok(None)` if the line is blank or a comment.
pub fn parse_pipeline(line: &str) -> Result<Option<Pipeline>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut commands: Vec<Command> = Vec::new();
    let mut current = Command::default();
    let mut background = false;
    let mut tokens = tokenize(trimmed).into_iter();

    while let Some(token) = tokens.next() {
        match token {
            Token::Word(word) => {
                if current.argv.len() >= MAX_ARGS - 1 {
                    return Err(ShellError::TooManyArgs);
                }
                current.argv.push(word);
            }
            Token::Pipe => {
                if current.argv.is_empty() {
                    return Err(ShellError::EmptyCommand);
                }
                commands.push(std::mem::take(&mut current));
                if commands.len() >= MAX_COMMANDS {
                    return Err(ShellError::TooManyCommands);
                }
            }
            Token::Input => current.input = Some(redirect_target(&mut tokens, "<")?),
            Token::Output => {
                current.output = Some(redirect_target(&mut tokens, ">")?);
                current.append = false;
            }
            Token::Append => {
                current.output = Some(redirect_target(&mut tokens, ">>")?);
                current.append = true;
            }
            // `&` anywhere marks the whole pipeline as background.
            Token::Background => background = true,
        }
    }

    if current.argv.is_empty() {
        return Err(ShellError::EmptyCommand);
    }
    commands.push(current);

    Ok(Some(Pipeline {
        commands,
        background,
        text: trimmed.to_string(),
    }))
}

fn redirect_target(
    tokens: &mut impl Iterator<Item = Token>,
    operator: &'static str,
) -> Result<String> {
    match tokens.next() {
        Some(Token::Word(path)) => Ok(path),
        _ => Err(ShellError::MissingRedirectTarget(operator)),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
