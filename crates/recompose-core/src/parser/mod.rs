//! Command-line parsing for `docker run` invocations.
//!
//! [`lexer`] splits the invocation into words, [`FlagStream`] pairs each
//! flag with its value, and [`mount`]/[`ulimit`] parse composite values.

pub mod lexer;
pub mod mount;
pub mod ulimit;

use std::collections::VecDeque;

use recompose_common::error::{RecomposeError, Result};

use crate::registry::{FlagRegistry, ValueKind};

use self::lexer::strip_quotes;

/// A flag paired with its raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFlag {
    /// Flag name without leading dashes, as written (may be a shorthand).
    pub name: String,
    /// Value with one layer of surrounding quotes removed.
    pub value: String,
}

/// Parses a boolean literal the way Go's `strconv.ParseBool` does, which is
/// what the docker CLI accepts.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// A token left behind by a `\` line continuation.
fn is_continuation(token: &str) -> bool {
    token.starts_with('\\')
}

fn is_flag_shaped(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

/// Sequential reader of flags from a token list.
///
/// Flag parsing stops at the first token that is not flag-shaped (the
/// image) or at a bare `--`; [`FlagStream::into_remaining`] then yields the
/// image and its arguments.
#[derive(Debug)]
pub struct FlagStream<'r> {
    tokens: VecDeque<String>,
    registry: &'r FlagRegistry,
}

impl<'r> FlagStream<'r> {
    /// Creates a stream over `tokens`, using `registry` to recognize
    /// boolean flags.
    pub fn new(tokens: Vec<String>, registry: &'r FlagRegistry) -> Self {
        Self {
            tokens: tokens.into(),
            registry,
        }
    }

    /// Returns the next flag and its value, or `None` once flags end.
    ///
    /// # Errors
    ///
    /// Returns [`RecomposeError::MissingFlagArgument`] when a value-taking
    /// flag is the last token, and [`RecomposeError::InvalidFlagValue`] for
    /// a flag token with an empty name.
    pub fn next_flag(&mut self) -> Result<Option<ParsedFlag>> {
        self.skip_continuations();
        let Some(front) = self.tokens.front() else {
            return Ok(None);
        };
        if !is_flag_shaped(front) {
            return Ok(None);
        }
        let Some(token) = self.tokens.pop_front() else {
            return Ok(None);
        };
        if token == "--" {
            return Ok(None);
        }

        let (name, attached) = self.split_flag(&token);
        if name.is_empty() {
            return Err(RecomposeError::InvalidFlagValue {
                flag: token,
                value: String::new(),
                reason: "flag name is empty".into(),
            });
        }

        let value = match attached {
            Some(value) => value,
            None if self.is_boolean(&name) => self.boolean_lookahead(),
            None => self.take_value(&name)?,
        };
        let value = strip_quotes(&value).to_owned();

        tracing::trace!(flag = %name, value = %value, "resolved flag");
        Ok(Some(ParsedFlag { name, value }))
    }

    /// Consumes the stream, returning the tokens after the last flag.
    pub fn into_remaining(self) -> Vec<String> {
        self.tokens.into()
    }

    /// Splits a flag token into its name and attached value.
    ///
    /// Shorthand groups such as `-itp8080:80` put the remainder back on the
    /// stream as a new shorthand token while the leading flag is boolean;
    /// for a value-taking shorthand the remainder is its value.
    fn split_flag(&mut self, token: &str) -> (String, Option<String>) {
        if let Some(long) = token.strip_prefix("--") {
            return match long.split_once('=') {
                Some((name, value)) => (name.to_owned(), Some(value.to_owned())),
                None => (long.to_owned(), None),
            };
        }

        let short = &token[1..];
        let mut chars = short.chars();
        let Some(first) = chars.next() else {
            return (String::new(), None);
        };
        let name = first.to_string();
        let rest = chars.as_str();

        if rest.is_empty() {
            (name, None)
        } else if let Some(value) = rest.strip_prefix('=') {
            (name, Some(value.to_owned()))
        } else if self.is_boolean(&name) {
            self.tokens.push_front(format!("-{rest}"));
            (name, None)
        } else {
            (name, Some(rest.to_owned()))
        }
    }

    fn is_boolean(&self, name: &str) -> bool {
        self.registry.value_kind_of(name) == Some(ValueKind::Boolean)
    }

    /// Decides the value of a boolean flag written without one.
    ///
    /// A following boolean literal is consumed only if another token comes
    /// after it, so the final token is always left for the image: with
    /// `-t false` the image is `false`, with `-t false false` the flag is
    /// `false` and so is the image.
    fn boolean_lookahead(&mut self) -> String {
        let consumed = {
            let mut upcoming = self
                .tokens
                .iter()
                .enumerate()
                .filter(|(_, token)| !is_continuation(token));
            match (upcoming.next(), upcoming.next()) {
                (Some((index, next)), Some(_)) if !is_flag_shaped(next) => {
                    parse_bool(next).map(|value| (index, value))
                }
                _ => None,
            }
        };

        match consumed {
            Some((index, value)) => {
                let _ = self.tokens.remove(index);
                value.to_string()
            }
            None => "true".to_owned(),
        }
    }

    fn take_value(&mut self, name: &str) -> Result<String> {
        self.skip_continuations();
        self.tokens
            .pop_front()
            .ok_or_else(|| RecomposeError::MissingFlagArgument { flag: name.to_owned() })
    }

    fn skip_continuations(&mut self) {
        while self.tokens.front().is_some_and(|token| is_continuation(token)) {
            let _ = self.tokens.pop_front();
        }
    }
}
