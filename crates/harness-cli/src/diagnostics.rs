//! Toolchain output parsing and terminal error reporting

use crate::Result;
use harness_core::CompileError;
use miette::{Diagnostic, NamedSource, SourceSpan};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use thiserror::Error;

/// Description used when no line of the output names a source location.
pub const UNPARSED_DESCRIPTION: &str = "See console output for the build error.";

static COMPILE_ERROR_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([^:#]+):(\d+):(\d+:)? (.*)$").expect("compile error pattern is valid")
});

/// Translates the combined output of a failed build into a [`CompileError`].
///
/// Only the first `path:line[:col]: message` line is used. The path is kept as
/// the toolchain wrote it, and resolved against `work_dir` to read the source.
pub fn parse_compile_output(output: &str, work_dir: &Path) -> CompileError {
    let Some(captures) = COMPILE_ERROR_LINE.captures(output) else {
        return CompileError::go(UNPARSED_DESCRIPTION);
    };

    let path = &captures[1];
    let line = captures[2].parse().unwrap_or(0);
    let description = captures[4].trim_end();

    let absolute = work_dir.join(path);
    CompileError::go(description)
        .at(path, line)
        .with_source_from(&absolute)
}

/// Set up enhanced error reporting with miette
pub fn setup_error_reporting() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .map_err(|e| crate::CliError::Config(format!("Failed to setup error reporting: {}", e)))?;

    Ok(())
}

/// Terminal rendering of a [`CompileError`].
#[derive(Error, Debug, Diagnostic)]
#[error("{title}: {description}")]
#[diagnostic(code(revel_harness::compile_error))]
pub struct BuildDiagnostic {
    title: String,
    description: String,
    #[source_code]
    src: Option<NamedSource<String>>,
    #[label("error occurred here")]
    span: Option<SourceSpan>,
    #[help]
    help: Option<String>,
}

impl From<&CompileError> for BuildDiagnostic {
    fn from(error: &CompileError) -> Self {
        let located = error
            .error_line()
            .map(|_| line_span(&error.source_lines, error.line));
        let (src, span) = match located {
            Some(span) => (
                Some(NamedSource::new(
                    error.path.clone(),
                    error.source_lines.join("\n"),
                )),
                Some(span),
            ),
            None => (None, None),
        };
        let help = match (&error.meta_error, error.is_localized()) {
            (Some(meta), _) => Some(format!("source unavailable: {meta}")),
            (None, true) if span.is_none() => Some(format!("at {}:{}", error.path, error.line)),
            _ => None,
        };

        Self {
            title: error.title.clone(),
            description: error.description.clone(),
            src,
            span,
            help,
        }
    }
}

/// Byte span of the 1-based `line` within `lines` joined by newlines.
fn line_span(lines: &[String], line: u32) -> SourceSpan {
    let index = (line as usize).saturating_sub(1);
    let offset: usize = lines.iter().take(index).map(|text| text.len() + 1).sum();
    let length = lines.get(index).map(String::len).unwrap_or(0);
    (offset, length).into()
}

/// Renders `error` the way miette prints reports.
pub fn render_compile_error(error: &CompileError) -> String {
    format!("{:?}", miette::Report::new(BuildDiagnostic::from(error)))
}
