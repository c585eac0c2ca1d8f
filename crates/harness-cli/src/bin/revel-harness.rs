//! Revel build harness binary
//!
//! Analyses a Revel application, generates its entry point and builds it with
//! the Go toolchain.
//!
//! # Usage
//!
//! ```bash
//! # Build the application in the current directory
//! revel-harness build --import-path github.com/me/myapp
//!
//! # Print what the analyzer found
//! revel-harness analyze --source-path ~/go/src/github.com/me/myapp
//!
//! # Write the generated main.go somewhere else
//! revel-harness generate --output /tmp/main.go
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use harness_cli::{
    cli::HarnessConfig,
    commands::{
        self, analyze::AnalyzeArgs, build::BuildArgs, common::AppOptions, generate::GenerateArgs,
    },
    diagnostics::setup_error_reporting,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "revel-harness",
    version = env!("CARGO_PKG_VERSION"),
    about = "Build harness for Revel applications",
    long_about = r#"
Discovers controllers, test suites and validation keys in a Revel application,
generates the program entry point and builds it with the Go toolchain, fetching
missing packages once before giving up.

EXAMPLES:
    revel-harness build --import-path github.com/me/myapp
    revel-harness analyze
    revel-harness generate --output main.go
    "#
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, global = true, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Args, Debug)]
struct AppArgs {
    /// Application base directory
    #[arg(long)]
    source_path: Option<PathBuf>,

    /// Go import path of the application
    #[arg(long)]
    import_path: Option<String>,

    /// Build tags passed to `go build`
    #[arg(long)]
    tags: Option<String>,

    /// Print errors as JSON
    #[arg(long)]
    json: bool,
}

impl AppArgs {
    fn options(&self) -> AppOptions {
        AppOptions {
            source_path: self.source_path.clone(),
            import_path: self.import_path.clone(),
            tags: self.tags.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse, generate and build the application binary
    Build {
        #[command(flatten)]
        app: AppArgs,
    },

    /// Print the analysed application structure as JSON
    Analyze {
        #[command(flatten)]
        app: AppArgs,
    },

    /// Print or write the generated entry point
    Generate {
        #[command(flatten)]
        app: AppArgs,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    // Set up error reporting
    setup_error_reporting()?;

    // Configure logging
    setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format)?;

    // Change working directory if specified
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir).map_err(harness_cli::CliError::Io)?;
    }

    // Load configuration
    let config = HarnessConfig::load(cli.config.as_deref())?;

    // Execute command
    let result = match cli.command {
        Commands::Build { app } => commands::build_command(
            BuildArgs {
                app: app.options(),
                json: app.json,
            },
            &config,
        ),
        Commands::Analyze { app } => commands::analyze_command(
            AnalyzeArgs {
                app: app.options(),
                json_errors: app.json,
            },
            &config,
        ),
        Commands::Generate { app, output } => commands::generate_command(
            GenerateArgs {
                app: app.options(),
                output,
                json_errors: app.json,
            },
            &config,
        ),
    };

    match result {
        Ok(true) => {
            if cli.verbose > 0 {
                info!("Command completed successfully");
            }
            Ok(())
        }
        Ok(false) => std::process::exit(1),
        Err(e) => {
            use tracing::error;
            error!("{:#}", e);
            if cli.verbose > 0 {
                error!(?e, "detailed error context");
            }
            std::process::exit(1);
        }
    }
}

fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<LogLevel>,
    log_format: LogFormat,
) -> harness_cli::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(formatter)
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(formatter.json())
                .with(filter)
                .init();
        }
    }

    Ok(())
}
