//! Shell-style word splitting of a run invocation using `nom`.
//!
//! Produces the argument tokens of an invocation without ever invoking a
//! shell. Whitespace separates words; any Unicode quotation mark opens a
//! quoted region that lasts until the same character recurs. Quote
//! characters are stripped and there is no backslash escaping.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_till, take_till1, take_while},
    character::complete::{char, satisfy},
    combinator::cut,
    multi::fold_many1,
};
use recompose_common::error::{RecomposeError, Result};

/// Characters of the Unicode `Quotation_Mark` property.
const QUOTATION_MARKS: &[char] = &[
    '"', '\'', '\u{ab}', '\u{bb}', '\u{2018}', '\u{2019}', '\u{201a}', '\u{201b}', '\u{201c}',
    '\u{201d}', '\u{201e}', '\u{201f}', '\u{2039}', '\u{203a}', '\u{2e42}', '\u{300c}',
    '\u{300d}', '\u{300e}', '\u{300f}', '\u{301d}', '\u{301e}', '\u{301f}', '\u{fe41}',
    '\u{fe42}', '\u{fe43}', '\u{fe44}', '\u{ff02}', '\u{ff07}', '\u{ff62}', '\u{ff63}',
];

/// Returns `true` for any Unicode quotation mark, straight or typographic.
pub fn is_quote(c: char) -> bool {
    QUOTATION_MARKS.contains(&c)
}

/// Parses a quoted region; the closing quote must be the opening character.
fn quoted(input: &str) -> IResult<&str, &str> {
    let (input, open) = satisfy(is_quote)(input)?;
    let (input, body) = take_till(|c: char| c == open)(input)?;
    let (input, _) = cut(char(open)).parse(input)?;
    Ok((input, body))
}

/// Parses a run of characters that are neither whitespace nor quotes.
fn bare(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace() || is_quote(c))(input)
}

/// Parses one word: adjacent bare and quoted pieces glued together.
fn word(input: &str) -> IResult<&str, String> {
    fold_many1(alt((quoted, bare)), String::new, |mut acc, piece| {
        acc.push_str(piece);
        acc
    })
    .parse(input)
}

fn skip_whitespace(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace)(input)
}

/// Splits an invocation into argument tokens.
///
/// An empty or all-whitespace input yields no tokens.
///
/// # Errors
///
/// Returns [`RecomposeError::UnterminatedQuote`] if a quoted region is
/// still open at the end of the input.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut remaining = input.trim();

    loop {
        let (rest, _) =
            skip_whitespace(remaining).map_err(|_| RecomposeError::UnterminatedQuote)?;
        remaining = rest;

        if remaining.is_empty() {
            break;
        }

        // A non-whitespace character always starts a bare or quoted piece, so
        // the only way `word` fails is a quote that never closes.
        let (rest, token) = word(remaining).map_err(|_| RecomposeError::UnterminatedQuote)?;
        tokens.push(token);
        remaining = rest;
    }

    Ok(tokens)
}

/// Removes one layer of surrounding quotation marks, if present.
pub fn strip_quotes(value: &str) -> &str {
    let mut chars = value.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if is_quote(first) && is_quote(last) => {
            &value[first.len_utf8()..value.len() - last.len_utf8()]
        }
        _ => value,
    }
}
