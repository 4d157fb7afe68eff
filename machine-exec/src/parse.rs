use std::collections::HashMap;

use crate::types::RawOutput;

/// Converts one command's captured output into a typed value.
///
/// One implementation per output shape; the operation that owns the shape
/// picks the parser at the call site. Implementations are pure functions
/// over the captured text and run only after a zero exit.
pub trait ResponseParser {
    type Output;

    fn parse(&self, raw: &RawOutput) -> Result<Self::Output, ParseError>;
}

/// Output from a zero-exit run that does not match the expected shape.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("expected a value on the first output line, got empty output")]
    EmptyOutput,

    #[error("malformed {shape}: {detail}")]
    Malformed { shape: &'static str, detail: String },
}

/// The trimmed first line of stdout. Later lines are ignored; empty
/// output is a failure, since callers of single-valued queries cannot
/// act on an absent value.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleLine;

impl ResponseParser for SingleLine {
    type Output = String;

    fn parse(&self, raw: &RawOutput) -> Result<String, ParseError> {
        raw.stdout_lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .ok_or(ParseError::EmptyOutput)
    }
}

/// Entire stdout verbatim, for output meant to be read rather than
/// interpreted (create and lifecycle progress logs).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogText;

impl ResponseParser for LogText {
    type Output = String;

    fn parse(&self, raw: &RawOutput) -> Result<String, ParseError> {
        Ok(raw.stdout.clone())
    }
}

/// Line-oriented `KEY=value` dump as printed by an `env`-style command.
///
/// Blank lines and `#` comments are skipped, a leading `export ` prefix
/// is dropped, and one layer of matching quotes is stripped from values.
/// Lines that do not fit the pattern are skipped rather than fatal, so
/// an empty dump parses to an empty map.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvLines;

impl ResponseParser for EnvLines {
    type Output = HashMap<String, String>;

    fn parse(&self, raw: &RawOutput) -> Result<Self::Output, ParseError> {
        let mut vars = HashMap::new();
        for line in raw.stdout_lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                continue;
            }
            vars.insert(key.to_owned(), unquote(value.trim()).to_owned());
        }
        Ok(vars)
    }
}

/// Strip one layer of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
