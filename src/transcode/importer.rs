//! Importer
//!
//! Rebuilds a workbook from parsed project units.  Metadata blocks supply
//! every structured field; the surrounding code supplies nesting, order and
//! request test scripts.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::exporter::DispatchConfig;
use super::manifest::ProjectManifest;
use super::metadata::{MetadataRecord, WorkbookMetadata};
use super::project::{INDEX_FILE, ProjectSources};
use super::source_parser::{
    DeclaredName, ExtraneousContent, ExtraneousKind, MetadataOutcome, NodeIndex, NodeRole,
    ParsedNode, ParsedNodeFlags, ParsedUnit, ParserOptions, SourceParser,
};
use crate::{
    ApicizeError, Identifiable, MetadataError, Position, Request, RequestEntry, RequestGroup,
    Workbook, generate_uuid,
};

/// Import settings
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    #[serde(default)]
    pub parser: ParserOptions,
}

/// Conditions that do not prevent an import but may lose or invent data
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ImportWarningKind {
    /// A declaration had no metadata block; defaults were synthesized
    MissingMetadata,
    /// The manifest had no workbook metadata; defaults were used
    MissingWorkbookMetadata,
    /// The project has no manifest unit
    MissingManifest,
    /// A declaration name is not a string literal
    UnresolvableName,
    /// An id was already used by an earlier entry and was replaced
    DuplicateId,
    /// Unrecognized code was found and not imported
    ExtraneousCode,
    /// A unit is not listed by the manifest
    UnlistedUnit,
    /// A unit declares nothing
    EmptyUnit,
    /// Request settings could not be recovered from generated dispatch code
    UnrecoverableDispatch,
}

/// A warning tied to a location in the project
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportWarning {
    pub kind: ImportWarningKind,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    pub message: String,
}

/// Outcome of importing one unit
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UnitReport {
    pub file_name: String,
    /// Number of groups and requests imported from the unit
    pub entries: usize,
    pub warnings: Vec<ImportWarning>,
    pub errors: Vec<ApicizeError>,
    pub success: bool,
}

impl UnitReport {
    fn new(file_name: &str) -> UnitReport {
        UnitReport {
            file_name: file_name.to_string(),
            entries: 0,
            warnings: vec![],
            errors: vec![],
            success: true,
        }
    }

    fn warn(&mut self, kind: ImportWarningKind, position: Option<Position>, message: String) {
        debug!(unit = self.file_name.as_str(), ?kind, "{}", message);
        self.warnings.push(ImportWarning {
            kind,
            file_name: self.file_name.clone(),
            position,
            message,
        });
    }

    fn fail(&mut self, error: ApicizeError) {
        warn!(unit = self.file_name.as_str(), "{}", error);
        self.errors.push(error);
        self.success = false;
    }
}

/// Result of importing a project.  The workbook contains everything that
/// could be imported, even when some units failed.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub workbook: Workbook,
    /// Manifest report first, then one report per unit in workbook order
    pub units: Vec<UnitReport>,
    pub success: bool,
}

impl ImportReport {
    /// All warnings across units, in report order
    pub fn warnings(&self) -> impl Iterator<Item = &ImportWarning> {
        self.units.iter().flat_map(|u| u.warnings.iter())
    }

    /// All errors across units, in report order
    pub fn errors(&self) -> impl Iterator<Item = &ApicizeError> {
        self.units.iter().flat_map(|u| u.errors.iter())
    }
}

/// Import a project, parsing units one after another
pub fn import_project(sources: &ProjectSources, options: &ImportOptions) -> ImportReport {
    let parser = SourceParser::new(options.parser.clone());
    let plan = ImportPlan::new(&parser, sources);
    let parsed = plan
        .units
        .iter()
        .map(|unit| match sources.get(&unit.path) {
            Some(text) => parser.parse_unit(&unit.path, text).map_err(ApicizeError::from),
            None => Err(missing_unit(&unit.path)),
        })
        .collect();
    plan.assemble(parsed)
}

pub(crate) fn missing_unit(path: &str) -> ApicizeError {
    ApicizeError::Error {
        description: format!("unit {path} is listed by the manifest but was not found"),
    }
}

/// A unit to import, in workbook order
pub(crate) struct PlannedUnit {
    pub path: String,
    pub listed: bool,
}

/// Manifest and unit ordering, fixed before any unit is parsed
pub(crate) struct ImportPlan {
    manifest: ProjectManifest,
    manifest_report: UnitReport,
    pub units: Vec<PlannedUnit>,
}

impl ImportPlan {
    pub fn new(parser: &SourceParser, sources: &ProjectSources) -> ImportPlan {
        let mut manifest_report = UnitReport::new(INDEX_FILE);
        let manifest_present = sources.get(INDEX_FILE).is_some();
        let manifest = match sources.get(INDEX_FILE) {
            Some(text) => match ProjectManifest::parse(parser, INDEX_FILE, text) {
                Ok(manifest) => manifest,
                Err(err) => {
                    manifest_report.fail(err.into());
                    ProjectManifest::empty()
                }
            },
            None => {
                manifest_report.warn(
                    ImportWarningKind::MissingManifest,
                    None,
                    format!("{INDEX_FILE} not found; units are imported in path order"),
                );
                ProjectManifest::empty()
            }
        };

        let mut seen = HashSet::<&str>::new();
        let mut units = Vec::new();
        for path in &manifest.units {
            if seen.insert(path.as_str()) {
                units.push(PlannedUnit {
                    path: path.clone(),
                    listed: true,
                });
            }
        }
        for path in sources.unit_paths() {
            if seen.insert(path) {
                if manifest_present {
                    manifest_report.warn(
                        ImportWarningKind::UnlistedUnit,
                        None,
                        format!("{path} is not listed by {INDEX_FILE} and was appended"),
                    );
                }
                units.push(PlannedUnit {
                    path: path.to_string(),
                    listed: false,
                });
            }
        }

        ImportPlan {
            manifest,
            manifest_report,
            units,
        }
    }

    /// Combine parse results (one per planned unit, same order) into a workbook
    pub fn assemble(self, parsed: Vec<Result<ParsedUnit, ApicizeError>>) -> ImportReport {
        let ImportPlan {
            manifest,
            mut manifest_report,
            units,
        } = self;

        let mut workbook = Workbook::default();
        match manifest.metadata {
            Ok(metadata) => apply_workbook_metadata(&mut workbook, metadata),
            Err(MetadataError::Missing) => manifest_report.warn(
                ImportWarningKind::MissingWorkbookMetadata,
                None,
                "workbook metadata not found; workbook-level fields use defaults".to_string(),
            ),
            Err(err) => manifest_report.fail(ApicizeError::from_metadata(err, INDEX_FILE)),
        }

        let mut assembler = Assembler {
            ids: HashSet::new(),
        };
        let mut reports = vec![manifest_report];
        for (planned, result) in units.iter().zip(parsed) {
            let mut report = UnitReport::new(&planned.path);
            match result {
                Ok(mut unit) => {
                    let entries = assembler.import_unit(&mut unit, &mut report);
                    workbook.requests.extend(entries);
                }
                Err(err) => report.fail(err),
            }
            if !planned.listed {
                debug!(unit = planned.path.as_str(), "Imported unlisted unit");
            }
            reports.push(report);
        }

        let success = reports.iter().all(|r| r.success);
        let (groups, requests) = workbook.count_entries();
        info!(groups, requests, units = units.len(), success, "Imported project");
        ImportReport {
            workbook,
            units: reports,
            success,
        }
    }
}

fn apply_workbook_metadata(workbook: &mut Workbook, metadata: WorkbookMetadata) {
    workbook.version = metadata.version;
    workbook.scenarios = metadata.scenarios;
    workbook.authorizations = metadata.authorizations;
    workbook.certificates = metadata.certificates;
    workbook.proxies = metadata.proxies;
    workbook.data = metadata.data;
    workbook.defaults = metadata.defaults;
}

struct Assembler {
    ids: HashSet<String>,
}

impl Assembler {
    fn import_unit(&mut self, unit: &mut ParsedUnit, report: &mut UnitReport) -> Vec<RequestEntry> {
        warn_extraneous(report, &unit.extraneous, "top level");
        if unit.top_level.is_empty() {
            report.warn(
                ImportWarningKind::EmptyUnit,
                None,
                "unit declares no groups or requests".to_string(),
            );
        }
        let top_level = unit.top_level.clone();
        top_level
            .into_iter()
            .filter_map(|index| self.build_entry(unit, index, report))
            .collect()
    }

    /// Build the entry for a node and its subtree; None when its metadata is unusable
    fn build_entry(
        &mut self,
        unit: &mut ParsedUnit,
        index: NodeIndex,
        report: &mut UnitReport,
    ) -> Option<RequestEntry> {
        let metadata = std::mem::replace(&mut unit.nodes[index].metadata, MetadataOutcome::Missing);
        let node = &unit.nodes[index];
        let literal = match &node.name {
            DeclaredName::Literal(name) => Some(name.as_str()),
            DeclaredName::Unresolvable(raw) => {
                report.warn(
                    ImportWarningKind::UnresolvableName,
                    Some(node.position),
                    format!("name {raw} is not a string literal"),
                );
                None
            }
        };

        let mut entry = match metadata {
            MetadataOutcome::Invalid(err) => {
                let context = format!(
                    "{}:{} \"{}\"",
                    unit.file_name,
                    node.position,
                    node.name.as_str()
                );
                report.fail(ApicizeError::from_metadata(err, &context));
                return None;
            }
            MetadataOutcome::Present(MetadataRecord::Group(mut group)) => {
                group.name = resolve_name(&group.name, literal);
                RequestEntry::Group(group)
            }
            MetadataOutcome::Present(MetadataRecord::Request(mut request)) => {
                request.name = resolve_name(&request.name, literal);
                request.test = node.body.clone();
                RequestEntry::Request(request)
            }
            // Workbook records on declarations are rejected by the parser
            MetadataOutcome::Present(MetadataRecord::Workbook(_)) | MetadataOutcome::Missing => {
                report.warn(
                    ImportWarningKind::MissingMetadata,
                    Some(node.position),
                    format!("\"{}\" has no metadata; defaults were used", node.name.as_str()),
                );
                synthesize(node, report)
            }
        };

        if node.flags.contains(ParsedNodeFlags::SKIPPED) {
            debug!(name = entry.get_name(), "Imported skipped declaration");
        }

        let id = entry.get_id().to_string();
        if !self.ids.insert(id.clone()) {
            let replacement = generate_uuid();
            report.warn(
                ImportWarningKind::DuplicateId,
                Some(node.position),
                format!(
                    "id {id} is already in use; \"{}\" was assigned {replacement}",
                    entry.get_name()
                ),
            );
            self.ids.insert(replacement.clone());
            match &mut entry {
                RequestEntry::Request(request) => request.id = replacement,
                RequestEntry::Group(group) => group.id = replacement,
            }
        }
        report.entries += 1;

        if let RequestEntry::Group(group) = &mut entry {
            warn_extraneous(report, &node.extraneous, &format!("\"{}\"", group.name));
            let children = node.children.clone();
            group.children = children
                .into_iter()
                .filter_map(|child| self.build_entry(unit, child, report))
                .collect();
        }
        Some(entry)
    }
}

/// Create an entry for a declaration without metadata
fn synthesize(node: &ParsedNode, report: &mut UnitReport) -> RequestEntry {
    let name = node.name.as_str().to_string();
    match node.role {
        NodeRole::Group => RequestEntry::Group(RequestGroup {
            name,
            ..Default::default()
        }),
        NodeRole::Request => {
            let mut request = Request {
                name,
                test: node.body.clone(),
                ..Default::default()
            };
            let dispatch = node
                .dispatch
                .as_deref()
                .filter(|_| node.flags.contains(ParsedNodeFlags::HAS_DISPATCH))
                .map(serde_json::from_str::<DispatchConfig>);
            match dispatch {
                Some(Ok(config)) => apply_dispatch(&mut request, config),
                Some(Err(err)) => report.warn(
                    ImportWarningKind::UnrecoverableDispatch,
                    Some(node.position),
                    format!("request settings of \"{}\" could not be read: {err}", request.name),
                ),
                None => report.warn(
                    ImportWarningKind::UnrecoverableDispatch,
                    Some(node.position),
                    format!("\"{}\" has no dispatch call; url and method use defaults", request.name),
                ),
            }
            if let Some(timeout) = node.config.get("timeout").and_then(|t| t.as_u64()) {
                request.timeout = u32::try_from(timeout).ok();
            }
            RequestEntry::Request(request)
        }
    }
}

fn apply_dispatch(request: &mut Request, config: DispatchConfig) {
    request.method = Some(config.method);
    request.url = config.url;
    request.headers = if config.headers.is_empty() {
        None
    } else {
        Some(config.headers)
    };
    request.query_string_params = if config.query_string_params.is_empty() {
        None
    } else {
        Some(config.query_string_params)
    };
    request.body = config.body;
    request.timeout = config.timeout;
}

/// Keep the metadata name unless the code name was edited to something that
/// is not the name itself or its sibling-disambiguated form
fn resolve_name(metadata_name: &str, literal: Option<&str>) -> String {
    match literal {
        Some(literal) if literal != metadata_name && !is_disambiguated(metadata_name, literal) => {
            literal.to_string()
        }
        _ => metadata_name.to_string(),
    }
}

fn is_disambiguated(name: &str, candidate: &str) -> bool {
    candidate
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix(" ("))
        .and_then(|rest| rest.strip_suffix(')'))
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

fn warn_extraneous(report: &mut UnitReport, content: &[ExtraneousContent], owner: &str) {
    for item in content.iter().filter(|c| c.kind == ExtraneousKind::Code) {
        let snippet = item.text.lines().next().unwrap_or_default();
        report.warn(
            ImportWarningKind::ExtraneousCode,
            Some(item.position),
            format!("unrecognized code in {owner} was not imported: {snippet}"),
        );
    }
}
