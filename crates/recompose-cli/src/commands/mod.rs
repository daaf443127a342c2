//! CLI command definitions and dispatch.

pub mod add_service;
pub mod convert;
pub mod flags;

use clap::{Parser, Subcommand};
use std::fmt::Write;

use recompose_core::parser::lexer::is_quote;

/// recompose: turn `docker run` commands into compose files.
#[derive(Parser, Debug)]
#[command(name = "recompose", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log as JSON lines instead of text.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Translate a docker run command into a new compose document.
    Convert(convert::ConvertArgs),
    /// Add a docker run command as a service to an existing compose file.
    AddService(add_service::AddServiceArgs),
    /// List the docker run flags that are understood.
    Flags(flags::FlagsArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Convert(args) => convert::execute(args),
        Command::AddService(args) => add_service::execute(args),
        Command::Flags(args) => flags::execute(&args),
    }
}

/// Rebuilds the invocation text from command-line words.
///
/// A single word is taken as the whole invocation, so
/// `recompose convert "docker run -e 'A=b c' alpine"` keeps its own quoting.
/// Several words were already split by the shell; any word that would be
/// split again is wrapped in quotes. A word holding both `"` and `'` is
/// written as adjacent quoted runs, which the tokenizer glues back together.
pub fn invocation_text(words: &[String]) -> String {
    if let [single] = words {
        return single.clone();
    }
    words
        .iter()
        .map(|word| requote(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn requote(word: &str) -> String {
    let needs_quotes =
        word.is_empty() || word.chars().any(|c| c.is_whitespace() || is_quote(c));
    if !needs_quotes {
        return word.to_owned();
    }

    let mut out = String::new();
    let mut rest = word;
    loop {
        let double = rest.find('"').unwrap_or(rest.len());
        let single = rest.find('\'').unwrap_or(rest.len());
        let (quote, end) = if double >= single {
            ('"', double)
        } else {
            ('\'', single)
        };
        let _ = write!(out, "{quote}{}{quote}", &rest[..end]);
        rest = &rest[end..];
        if rest.is_empty() {
            return out;
        }
    }
}

#[cfg(test)]
mod tests {
    use recompose_core::parser::lexer::tokenize;

    use super::*;

    fn words(input: &[&str]) -> Vec<String> {
        input.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn invocation_text_keeps_single_word_verbatim() {
        let text = invocation_text(&words(&["docker run -e 'A=b c' alpine"]));
        assert_eq!(text, "docker run -e 'A=b c' alpine");
    }

    #[test]
    fn invocation_text_joins_plain_words() {
        let text = invocation_text(&words(&["docker", "run", "-p", "80:80", "nginx"]));
        assert_eq!(text, "docker run -p 80:80 nginx");
    }

    #[test]
    fn invocation_text_requotes_split_words() {
        let text = invocation_text(&words(&[
            "docker",
            "run",
            "--health-cmd",
            "curl -f localhost",
            "-e",
            "MSG=say \"hi\"",
            "-l",
            "",
            "nginx",
        ]));
        assert_eq!(
            text,
            "docker run --health-cmd \"curl -f localhost\" -e 'MSG=say \"hi\"' -l \"\" nginx"
        );
    }

    #[test]
    fn invocation_text_splits_words_with_both_quotes() {
        let original = words(&["docker", "run", "-e", "A=it's \"x y\"", "-l", "'\"", "alpine"]);
        let text = invocation_text(&original);
        assert_eq!(
            text,
            "docker run -e \"A=it's \"'\"x y\"' -l \"'\"'\"' alpine"
        );
        assert_eq!(tokenize(&text).expect("should tokenize"), original);
    }

    #[test]
    fn cli_accepts_long_option_aliases() {
        let cli = Cli::try_parse_from([
            "recompose", "convert", "--out", "stack.yml", "--service-name", "web", "nginx",
        ])
        .expect("should parse");
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.output, std::path::PathBuf::from("stack.yml"));
        assert_eq!(args.service_name.as_deref(), Some("web"));

        let cli = Cli::try_parse_from([
            "recompose", "add-service", "--service-name", "cache", "redis",
        ])
        .expect("should parse");
        let Command::AddService(args) = cli.command else {
            panic!("expected add-service");
        };
        assert_eq!(args.service_name.as_deref(), Some("cache"));
    }

    #[test]
    fn cli_parses_invocation_with_hyphens() {
        let cli = Cli::try_parse_from([
            "recompose", "-v", "convert", "-n", "web", "docker", "run", "-it", "--rm", "nginx",
        ])
        .expect("should parse");
        assert!(cli.verbose);
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.service_name.as_deref(), Some("web"));
        assert_eq!(args.invocation, words(&["docker", "run", "-it", "--rm", "nginx"]));
    }

    #[test]
    fn cli_requires_an_invocation() {
        assert!(Cli::try_parse_from(["recompose", "convert"]).is_err());
    }
}
