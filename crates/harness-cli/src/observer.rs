//! Build progress reporting.

use harness_core::CompileError;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Milestones of one build attempt.
#[derive(Debug, Clone, Copy)]
pub enum BuildEvent<'a> {
    Analyzed {
        controllers: usize,
        test_suites: usize,
    },
    Generated {
        path: &'a Path,
    },
    Invoking {
        attempt: usize,
        package: &'a str,
    },
    Fetching {
        package: &'a str,
    },
    FetchFailed {
        package: &'a str,
        output: &'a str,
    },
    AlreadyFetched {
        package: &'a str,
    },
    UnparsedOutput {
        output: &'a str,
    },
    Built {
        binary: &'a Path,
    },
    Failed {
        error: &'a CompileError,
    },
}

/// Receives build events; injected into the builder instead of a global sink.
pub trait BuildObserver {
    fn on_event(&self, event: &BuildEvent<'_>);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl BuildObserver for TracingObserver {
    fn on_event(&self, event: &BuildEvent<'_>) {
        match *event {
            BuildEvent::Analyzed {
                controllers,
                test_suites,
            } => info!("Found {controllers} controllers and {test_suites} test suites"),
            BuildEvent::Generated { path } => debug!("Wrote {}", path.display()),
            BuildEvent::Invoking { attempt, package } => {
                info!("Building {package} (attempt {attempt})")
            }
            BuildEvent::Fetching { package } => info!("Fetching missing package {package}"),
            BuildEvent::FetchFailed { package, output } => {
                error!("Failed to fetch {package}:\n{output}")
            }
            BuildEvent::AlreadyFetched { package } => {
                warn!("Package {package} is still missing after fetching it")
            }
            BuildEvent::UnparsedOutput { output } => {
                error!("Failed to parse build errors:\n{output}")
            }
            BuildEvent::Built { binary } => info!("Built {}", binary.display()),
            BuildEvent::Failed { error } => debug!(?error, "build failed"),
        }
    }
}

impl<O: BuildObserver + ?Sized> BuildObserver for &O {
    fn on_event(&self, event: &BuildEvent<'_>) {
        (**self).on_event(event)
    }
}
