//! Revel build harness
//!
//! Turns a tree of application sources into a runnable binary: analyse the
//! sources, generate the entry point, run the Go toolchain and translate its
//! failures into a [`CompileError`](harness_core::CompileError).

pub mod app;
pub mod builder;
pub mod cli;
pub mod commands;
pub mod diagnostics;
pub mod observer;
pub mod toolchain;

pub use app::{App, AppArgs};
pub use builder::{BuildConfig, BuildError, Builder};
pub use observer::{BuildEvent, BuildObserver, TracingObserver};
pub use toolchain::{GoToolchain, MissingImportMatcher, ToolOutput, Toolchain};

// CLI-specific error handling
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum CliError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Invalid input: {0}")]
        InvalidInput(String),
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};
