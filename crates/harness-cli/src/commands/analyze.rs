use super::common::{offline_builder, report_failure, AppOptions};
use crate::cli::HarnessConfig;
use eyre::WrapErr;

#[derive(Debug)]
pub struct AnalyzeArgs {
    pub app: AppOptions,
    pub json_errors: bool,
}

/// Prints the analysis result as JSON.
pub fn analyze_command(args: AnalyzeArgs, config: &HarnessConfig) -> eyre::Result<bool> {
    let build_config = args
        .app
        .resolve(config)
        .wrap_err("Failed to resolve build configuration")?;
    let builder = offline_builder(build_config, config);

    match builder.analyze() {
        Ok(info) => {
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(true)
        }
        Err(error) => {
            report_failure(error, args.json_errors)?;
            Ok(false)
        }
    }
}
