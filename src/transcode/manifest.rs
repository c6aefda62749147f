//! Project manifest
//!
//! `index.ts` lists top-level units as side-effect imports, in workbook order,
//! and carries workbook-level fields in a metadata block.
use super::metadata::{MetadataRecord, WorkbookMetadata};
use super::project::TESTS_DIRECTORY;
use super::source_parser::{MetadataOutcome, ParsedUnit, SourceParser};
use crate::{MetadataError, ParseError};

/// Unit ordering and workbook-level fields read from the manifest unit
#[derive(Debug)]
pub struct ProjectManifest {
    /// Unit paths relative to the project root, in workbook order
    pub units: Vec<String>,
    /// Workbook-level fields, if a block was present
    pub metadata: Result<WorkbookMetadata, MetadataError>,
}

impl ProjectManifest {
    /// Parse manifest text
    pub fn parse(
        parser: &SourceParser,
        file_name: &str,
        text: &str,
    ) -> Result<ProjectManifest, ParseError> {
        let unit = parser.parse_unit(file_name, text)?;
        Ok(ProjectManifest::from_unit(unit))
    }

    /// Build a manifest from an already parsed manifest unit
    pub fn from_unit(unit: ParsedUnit) -> ProjectManifest {
        let units = unit
            .imports
            .iter()
            .filter_map(|module| unit_path(module))
            .collect();

        let metadata = match unit.metadata {
            MetadataOutcome::Present(MetadataRecord::Workbook(workbook)) => Ok(workbook),
            MetadataOutcome::Present(record) => Err(MetadataError::Malformed {
                position: None,
                description: format!("expected workbook metadata, found {}", record.kind()),
            }),
            MetadataOutcome::Missing => Err(MetadataError::Missing),
            MetadataOutcome::Invalid(err) => Err(err),
        };

        ProjectManifest { units, metadata }
    }

    /// An empty manifest, used when the project has no manifest unit
    pub fn empty() -> ProjectManifest {
        ProjectManifest {
            units: vec![],
            metadata: Err(MetadataError::Missing),
        }
    }
}

/// Convert an import specifier such as `./tests/001-users.spec` to a unit
/// path; returns None for modules outside the tests directory
fn unit_path(module: &str) -> Option<String> {
    let relative = module.strip_prefix("./").unwrap_or(module);
    if !relative.starts_with(&format!("{TESTS_DIRECTORY}/")) {
        return None;
    }
    if relative.ends_with(".ts") {
        Some(relative.to_string())
    } else {
        Some(format!("{relative}.ts"))
    }
}
