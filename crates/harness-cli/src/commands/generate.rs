use super::common::{offline_builder, report_failure, AppOptions};
use crate::cli::HarnessConfig;
use eyre::WrapErr;
use std::path::PathBuf;

#[derive(Debug)]
pub struct GenerateArgs {
    pub app: AppOptions,
    /// Write the program here instead of stdout
    pub output: Option<PathBuf>,
    pub json_errors: bool,
}

/// Generates the entry point without building it.
pub fn generate_command(args: GenerateArgs, config: &HarnessConfig) -> eyre::Result<bool> {
    let build_config = args
        .app
        .resolve(config)
        .wrap_err("Failed to resolve build configuration")?;
    let builder = offline_builder(build_config, config);

    let program = match builder.analyze().and_then(|info| builder.generate(&info)) {
        Ok(program) => program,
        Err(error) => {
            report_failure(error, args.json_errors)?;
            return Ok(false);
        }
    };

    match args.output {
        Some(path) => std::fs::write(&path, program)
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?,
        None => print!("{program}"),
    }
    Ok(true)
}
