//! `recompose convert`: translate one docker run command into a new
//! compose document.

use std::path::PathBuf;

use clap::Args;
use recompose_common::config::OutputConfig;
use recompose_common::constants::DEFAULT_OUTPUT_FILE;
use recompose_core::Translator;

use crate::output;

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Write the document to a file instead of stdout.
    #[arg(short, long)]
    pub write: bool,

    /// File written with `--write`.
    #[arg(
        short,
        long,
        alias = "out",
        env = "RECOMPOSE_OUT",
        default_value = DEFAULT_OUTPUT_FILE
    )]
    pub output: PathBuf,

    /// Service name to use instead of the one derived from the image.
    #[arg(short = 'n', long = "name", alias = "service-name")]
    pub service_name: Option<String>,

    /// The docker run command, quoted as one argument or given as words.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub invocation: Vec<String>,
}

/// Executes the `convert` command.
///
/// # Errors
///
/// Returns an error if the command cannot be translated or the output
/// cannot be written.
pub fn execute(args: ConvertArgs) -> anyhow::Result<()> {
    let invocation = super::invocation_text(&args.invocation);
    tracing::info!(invocation = %invocation, "converting docker run command");

    let mut translator = Translator::new(&invocation)?;
    if let Some(name) = args.service_name {
        let _ = translator.set_service_name(name);
    }
    let compose = translator.parse_with(&mut output::log_diagnostic)?;

    let config = OutputConfig::new(args.output, args.write);
    output::emit(&config, compose.render())?;
    if config.write {
        println!(
            "Wrote service '{}' to {}",
            compose.service_name(),
            config.path.display()
        );
    }
    Ok(())
}
