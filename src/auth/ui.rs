//! Line-based prompts for tokens, names and confirmations.

use std::fmt;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationChoice {
    Yes,
    No,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct UiError {
    message: String,
}

impl UiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UiError {}

impl From<io::Error> for UiError {
    fn from(err: io::Error) -> Self {
        UiError::new(err.to_string())
    }
}

/// Print `prompt` and read one line from `input`. `None` at end of input.
pub fn read_line_from<R: BufRead>(
    input: &mut R,
    output: &mut impl Write,
    prompt: &str,
) -> Result<Option<String>, UiError> {
    write!(output, "{prompt}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

pub fn prompt_line(prompt: &str) -> Result<Option<String>, UiError> {
    read_line_from(&mut io::stdin().lock(), &mut io::stdout(), prompt)
}

pub fn prompt_access_token(server_url: &str) -> Result<String, UiError> {
    println!("Backend: {server_url}");
    let token = prompt_line("Paste your access token: ")?
        .map(|token| token.trim().to_string())
        .unwrap_or_default();
    if token.is_empty() {
        return Err(UiError::new("Token cannot be empty"));
    }
    Ok(token)
}

pub fn parse_confirmation(input: &str) -> Result<ConfirmationChoice, UiError> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() {
        return Ok(ConfirmationChoice::No);
    }
    match trimmed.as_str() {
        "y" | "yes" => Ok(ConfirmationChoice::Yes),
        "n" | "no" => Ok(ConfirmationChoice::No),
        "c" | "cancel" => Ok(ConfirmationChoice::Cancel),
        _ => Err(UiError::new("Invalid confirmation response")),
    }
}

/// Ask a yes/no question until the answer parses. End of input means no.
pub fn confirm_with<R: BufRead>(
    input: &mut R,
    output: &mut impl Write,
    question: &str,
) -> Result<bool, UiError> {
    loop {
        let Some(answer) = read_line_from(input, output, &format!("{question} [y/N] "))? else {
            return Ok(false);
        };
        match parse_confirmation(&answer) {
            Ok(ConfirmationChoice::Yes) => return Ok(true),
            Ok(ConfirmationChoice::No | ConfirmationChoice::Cancel) => return Ok(false),
            Err(err) => writeln!(output, "{err}")?,
        }
    }
}

pub fn confirm(question: &str) -> Result<bool, UiError> {
    confirm_with(&mut io::stdin().lock(), &mut io::stdout(), question)
}
