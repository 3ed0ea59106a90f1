//! Request argument handling.
//!
//! MPD arguments are either bare words or double-quoted strings in which `\"`
//! and `\\` are escaped. Command patterns embed [`arg`] fragments for each
//! argument; the captured text is unquoted before handlers see it.

use crate::error::{ProtocolError, Result};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::ops::Range;
use std::str::FromStr;

/// Regex fragment matching one quoted or bare argument.
pub const ARG: &str = r#""(?:[^"\\]|\\.)*"|[^"\s]+"#;

/// Named capture group matching one argument.
pub fn arg(name: &str) -> String {
    format!("(?P<{}>{})", name, ARG)
}

/// First whitespace-delimited token of a request.
pub fn command_name(request: &str) -> &str {
    request.split_whitespace().next().unwrap_or("")
}

/// Strips surrounding quotes and resolves escapes. Bare words are returned
/// as they are.
pub fn unquote(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return raw.to_string();
    };

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(escaped);
            }
        } else {
            value.push(c);
        }
    }
    value
}

/// Splits an argument string into unquoted values.
///
/// # Errors
///
/// `InvalidArgument` on an unterminated quoted string.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(first) = chars.next() else {
            return Ok(tokens);
        };

        let mut token = String::new();
        if first == '"' {
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            token.push(escaped);
                        }
                    }
                    other => token.push(other),
                }
            }
            if !closed {
                return Err(ProtocolError::InvalidArgument(
                    "Missing closing '\"'".to_string(),
                ));
            }
        } else {
            token.push(first);
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                token.push(c);
            }
        }
        tokens.push(token);
    }
}

/// Named arguments extracted from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    values: HashMap<String, String>,
}

impl Args {
    pub(crate) fn from_captures(regex: &Regex, captures: &Captures<'_>) -> Self {
        let values = regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|m| (name.to_string(), unquote(m.as_str())))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn required(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| ProtocolError::InvalidArgument(format!("missing argument {}", name)))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Optional integer argument.
    pub fn int<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        self.get(name).map(parse_int).transpose()
    }

    pub fn required_int<T: FromStr>(&self, name: &str) -> Result<T> {
        parse_int(self.required(name)?)
    }

    /// Optional `0`/`1` argument.
    pub fn bool(&self, name: &str) -> Result<Option<bool>> {
        self.get(name)
            .map(|value| match value {
                "0" => Ok(false),
                "1" => Ok(true),
                other => Err(ProtocolError::InvalidArgument(format!(
                    "Boolean (0/1) expected: {}",
                    other
                ))),
            })
            .transpose()
    }

    /// Optional `POS` or `START:END` argument. An open `START:` runs to
    /// `len`.
    pub fn range(&self, name: &str, len: usize) -> Result<Option<Range<usize>>> {
        self.get(name).map(|value| parse_range(value, len)).transpose()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn parse_int<T: FromStr>(value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ProtocolError::InvalidArgument(format!("Integer expected: {}", value)))
}

fn parse_range(value: &str, len: usize) -> Result<Range<usize>> {
    let bad = || ProtocolError::InvalidArgument(format!("Bad song index: {}", value));
    match value.split_once(':') {
        Some((start, "")) => {
            let start: usize = parse_int(start)?;
            Ok(start..len.max(start))
        }
        Some((start, end)) => {
            let start: usize = parse_int(start)?;
            let end: usize = parse_int(end)?;
            if end < start {
                return Err(bad());
            }
            Ok(start..end)
        }
        None => {
            let pos: usize = parse_int(value)?;
            let end = pos.checked_add(1).ok_or_else(bad)?;
            Ok(pos..end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_bare_and_quoted_words() {
        let tokens = tokenize(r#"artist "The \"Band\"" album  Blue"#).unwrap();
        assert_eq!(tokens, vec!["artist", "The \"Band\"", "album", "Blue"]);
        assert!(tokenize(r#"artist "open"#).is_err());
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn unquotes_captured_values() {
        assert_eq!(unquote(r#""a b""#), "a b");
        assert_eq!(unquote(r#""a\\b""#), r"a\b");
        assert_eq!(unquote("bare"), "bare");
    }

    #[test]
    fn parses_ranges() {
        let args: Args = [("r", "2:4"), ("p", "3"), ("o", "1:"), ("bad", "4:2")]
            .into_iter()
            .collect();
        assert_eq!(args.range("r", 10).unwrap(), Some(2..4));
        assert_eq!(args.range("p", 10).unwrap(), Some(3..4));
        assert_eq!(args.range("o", 10).unwrap(), Some(1..10));
        assert!(args.range("bad", 10).is_err());
        assert_eq!(args.range("missing", 10).unwrap(), None);
    }

    #[test]
    fn largest_position_is_a_bad_index() {
        let max = usize::MAX.to_string();
        let args: Args = [("p", max.as_str())].into_iter().collect();
        assert!(matches!(
            args.range("p", 10),
            Err(ProtocolError::InvalidArgument(message)) if message.starts_with("Bad song index")
        ));
    }

    #[test]
    fn validates_numbers_and_booleans() {
        let args: Args = [("n", "x"), ("b", "2"), ("ok", "1")].into_iter().collect();
        assert!(matches!(
            args.int::<i64>("n"),
            Err(ProtocolError::InvalidArgument(_))
        ));
        assert!(args.bool("b").is_err());
        assert_eq!(args.bool("ok").unwrap(), Some(true));
    }
}
