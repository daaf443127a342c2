//! `recompose flags`: list the docker run flags the translator knows.

use clap::Args;
use recompose_core::registry::{FlagInfo, registry};

/// Arguments for the `flags` subcommand.
#[derive(Args, Debug)]
pub struct FlagsArgs {
    /// Print the table as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `flags` command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(args: &FlagsArgs) -> anyhow::Result<()> {
    let rows = registry().describe();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<24} {:<6} {:<15} TARGET", "FLAG", "SHORT", "KIND");
    for row in &rows {
        println!("{}", format_row(row));
    }
    Ok(())
}

fn format_row(row: &FlagInfo) -> String {
    let target = if row.target.is_empty() {
        "(ignored)"
    } else {
        row.target
    };
    format!(
        "{:<24} {:<6} {:<15} {}",
        format!("--{}", row.name),
        row.shorthand.map_or_else(|| "-".to_string(), |s| format!("-{s}")),
        row.kind.as_str(),
        target
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str) -> FlagInfo {
        registry()
            .describe()
            .into_iter()
            .find(|row| row.name == name)
            .expect("flag should be registered")
    }

    #[test]
    fn format_row_shows_shorthand_and_target() {
        let line = format_row(&row("publish"));
        assert!(line.starts_with("--publish "));
        assert!(line.contains(" -p "));
        assert!(line.contains("string_list"));
        assert!(line.ends_with("ports.$var"));
    }

    #[test]
    fn format_row_marks_ignored_flags() {
        let line = format_row(&row("rm"));
        assert!(line.ends_with("(ignored)"));
        assert!(line.contains(" - "));
    }

    #[test]
    fn json_rows_use_snake_case_kinds() {
        let value = serde_json::to_value(row("ulimit")).expect("serialize");
        assert_eq!(value["kind"], "limit_pair_map");
        assert_eq!(value["shorthand"], serde_json::Value::Null);
        assert_eq!(value["target"], "ulimits.$var");
    }
}
