//! Transcoder between workbooks and generated test projects
pub mod exporter;
pub mod importer;
pub mod manifest;
pub mod metadata;
pub mod project;
pub mod source_parser;

pub use exporter::*;
pub use importer::*;
pub use manifest::*;
pub use metadata::*;
pub use project::*;
pub use source_parser::*;
