//! Go front end for the Revel build harness.

pub mod analyzer;
pub mod imports;
pub mod parser;
pub mod serializer;

pub use analyzer::{AnalysisError, SourceAnalyzer};
pub use imports::ImportAliases;
pub use parser::GoParser;
pub use serializer::{MainSerializer, ENTRY_FLAGS, ENTRY_TEMPLATE_VERSION};
