//! `recompose add-service`: append a docker run command as a service to an
//! existing compose file.

use std::path::{Path, PathBuf};

use clap::Args;
use recompose_common::config::{OutputConfig, discover_compose_file};
use recompose_common::constants::DEFAULT_OUTPUT_FILE;
use recompose_core::Translator;

use crate::output;

/// Arguments for the `add-service` subcommand.
#[derive(Args, Debug)]
pub struct AddServiceArgs {
    /// Write the updated document back to the file instead of stdout.
    #[arg(short, long)]
    pub write: bool,

    /// Compose file to extend. Defaults to the first of
    /// docker-compose.yml, docker-compose.yaml, compose.yml, compose.yaml.
    #[arg(short, long, env = "RECOMPOSE_FILE")]
    pub file: Option<PathBuf>,

    /// Service name to use instead of the one derived from the image.
    #[arg(short = 'n', long = "name", alias = "service-name")]
    pub service_name: Option<String>,

    /// The docker run command, quoted as one argument or given as words.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub invocation: Vec<String>,
}

/// Executes the `add-service` command in the current directory.
///
/// # Errors
///
/// Returns an error if the compose file cannot be read or parsed, the
/// command cannot be translated, or the output cannot be written.
pub fn execute(args: AddServiceArgs) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    run(args, &cwd)
}

/// Picks the file to extend: the explicit one, a discovered one, or a new
/// `compose.yml`.
fn target_file(explicit: Option<PathBuf>, dir: &Path) -> PathBuf {
    match explicit {
        Some(path) => dir.join(path),
        None => discover_compose_file(dir).unwrap_or_else(|| dir.join(DEFAULT_OUTPUT_FILE)),
    }
}

fn run(args: AddServiceArgs, dir: &Path) -> anyhow::Result<()> {
    let path = target_file(args.file, dir);
    let invocation = super::invocation_text(&args.invocation);
    tracing::info!(path = %path.display(), invocation = %invocation, "adding service");

    let existing = output::read_existing(&path)?;
    let mut translator = Translator::append_service(&existing, &invocation)?;
    if let Some(name) = args.service_name {
        let _ = translator.set_service_name(name);
    }
    let compose = translator.parse_with(&mut output::log_diagnostic)?;

    let config = OutputConfig::new(path, args.write);
    output::emit(&config, compose.render())?;
    if config.write {
        println!(
            "Added service '{}' to {}",
            compose.service_name(),
            config.path.display()
        );
    }
    Ok(())
}
