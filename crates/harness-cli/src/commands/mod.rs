//! Command implementations for the harness CLI

pub mod analyze;
pub mod build;
pub mod common;
pub mod generate;

// Re-export command functions
pub use analyze::analyze_command;
pub use build::build_command;
pub use generate::generate_command;
