//! Shared data model for the Revel build harness.
//!
//! The analyzer produces a [`SourceInfo`], the generator consumes it, and every
//! failure that reaches the caller is shaped as a [`CompileError`].

pub mod compile_error;
pub mod error;
pub mod framework;
pub mod model;

// Re-export commonly used items for convenience
pub use tracing;

pub use compile_error::{read_lines, CompileError};
pub use framework::FrameworkSpec;
pub use model::{MethodArg, MethodSpec, SourceInfo, SourceRoot, TypeExpr, TypeInfo};

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
