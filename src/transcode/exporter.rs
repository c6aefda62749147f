//! Exporter
//!
//! Renders a workbook as a TypeScript test project.  Output is a pure function
//! of the workbook and options, so exporting twice yields identical bytes.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::metadata::{MetadataRecord, WorkbookMetadata};
use super::project::{ExportedProject, GeneratedFile, INDEX_FILE, RUNTIME_FILE, TESTS_DIRECTORY};
use super::source_parser::template_continuation_lines;
use crate::{
    ApicizeError, Identifiable, NameValuePair, Request, RequestBody, RequestEntry, RequestGroup,
    RequestMethod, Workbook, indent_lines, slugify, to_single_quoted,
};

/// Name of the runtime context binding in generated units
pub const RUNTIME_BINDING: &str = "runtime";

fn default_indent() -> usize {
    4
}

fn default_runtime_package() -> String {
    "@apicize/testing".to_string()
}

fn default_header() -> Option<String> {
    Some("Generated by Apicize. Edit test code freely; keep @apicize-metadata blocks intact.".to_string())
}

/// Options controlling generated code layout
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Spaces per nesting level
    #[serde(default = "default_indent")]
    pub indent: usize,
    /// Package the runtime context shim re-exports from
    #[serde(default = "default_runtime_package")]
    pub runtime_package: String,
    /// Optional line comment written at the top of each unit
    #[serde(default = "default_header")]
    pub header: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            runtime_package: default_runtime_package(),
            header: default_header(),
        }
    }
}

/// Request settings passed to `runtime.execute` by generated code
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    pub method: RequestMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<NameValuePair>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_string_params: Vec<NameValuePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

impl DispatchConfig {
    pub fn from_request(request: &Request) -> DispatchConfig {
        DispatchConfig {
            method: request.method.clone().unwrap_or(RequestMethod::Get),
            url: request.url.clone(),
            headers: request.headers.clone().unwrap_or_default(),
            query_string_params: request.query_string_params.clone().unwrap_or_default(),
            body: request.body.clone(),
            timeout: request.timeout,
        }
    }
}

/// Export `workbook` as a project
pub fn export_workbook(
    workbook: &Workbook,
    options: &ExportOptions,
) -> Result<ExportedProject, ApicizeError> {
    let mut files = Vec::with_capacity(workbook.requests.len() + 2);
    let unit_paths = unit_paths(&workbook.requests);

    files.push(GeneratedFile {
        path: INDEX_FILE.to_string(),
        content: render_index(workbook, &unit_paths, options)?,
    });
    files.push(GeneratedFile {
        path: RUNTIME_FILE.to_string(),
        content: render_runtime(options),
    });

    for (entry, path) in workbook.requests.iter().zip(unit_paths.iter()) {
        debug!(unit = path.as_str(), entry = entry.get_id(), "Exporting unit");
        files.push(GeneratedFile {
            path: path.clone(),
            content: render_unit(entry, options)?,
        });
    }

    Ok(ExportedProject { files })
}

/// Relative unit paths for each top-level entry, e.g. `tests/001-users.spec.ts`
pub fn unit_paths(entries: &[RequestEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            format!(
                "{TESTS_DIRECTORY}/{:03}-{}.spec.ts",
                index + 1,
                slugify(entry.get_name())
            )
        })
        .collect()
}

/// Display names for siblings; duplicates after the first occurrence receive
/// a ` (n)` suffix numbered by occurrence, skipping names already in use
pub fn disambiguate_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let names = names.into_iter().collect::<Vec<&str>>();
    let mut taken = names.iter().copied().map(String::from).collect::<HashSet<String>>();
    let mut seen = HashSet::<&str>::new();
    let mut result = Vec::with_capacity(names.len());
    for name in names {
        if seen.insert(name) {
            result.push(name.to_string());
            continue;
        }
        let mut occurrence = 2;
        let mut candidate = format!("{name} ({occurrence})");
        while taken.contains(&candidate) {
            occurrence += 1;
            candidate = format!("{name} ({occurrence})");
        }
        taken.insert(candidate.clone());
        result.push(candidate);
    }
    result
}

fn render_index(
    workbook: &Workbook,
    unit_paths: &[String],
    options: &ExportOptions,
) -> Result<String, ApicizeError> {
    let mut content = String::new();
    write_header(&mut content, options);
    for path in unit_paths {
        let module = path.strip_suffix(".ts").unwrap_or(path);
        content.push_str(&format!("import {};\n", to_single_quoted(&format!("./{module}"))));
    }
    if !unit_paths.is_empty() {
        content.push('\n');
    }

    let record = MetadataRecord::Workbook(WorkbookMetadata {
        version: workbook.version,
        scenarios: workbook.scenarios.clone(),
        authorizations: workbook.authorizations.clone(),
        certificates: workbook.certificates.clone(),
        proxies: workbook.proxies.clone(),
        data: workbook.data.clone(),
        defaults: workbook.defaults.clone(),
    });
    let block = record
        .encode("")
        .map_err(|err| ApicizeError::from_metadata(err, INDEX_FILE))?;
    content.push_str(&block);
    content.push('\n');
    Ok(content)
}

fn render_runtime(options: &ExportOptions) -> String {
    let mut content = String::new();
    write_header(&mut content, options);
    content.push_str(&format!(
        "export {{ execute, substituteVariables, output }} from {};\n",
        to_single_quoted(&options.runtime_package)
    ));
    content
}

fn render_unit(entry: &RequestEntry, options: &ExportOptions) -> Result<String, ApicizeError> {
    let mut content = String::new();
    write_header(&mut content, options);
    content.push_str(&format!(
        "import * as {RUNTIME_BINDING} from {};\n\n",
        to_single_quoted("../runtime/context")
    ));
    let mut renderer = UnitRenderer { options, content };
    renderer.render_entry(entry, entry.get_name(), 0)?;
    Ok(renderer.content)
}

fn write_header(content: &mut String, options: &ExportOptions) {
    if let Some(header) = &options.header {
        for line in header.lines() {
            content.push_str("// ");
            content.push_str(line);
            content.push('\n');
        }
    }
}

struct UnitRenderer<'a> {
    options: &'a ExportOptions,
    content: String,
}

impl UnitRenderer<'_> {
    fn indent(&self, depth: usize) -> String {
        " ".repeat(self.options.indent * depth)
    }

    fn render_entry(
        &mut self,
        entry: &RequestEntry,
        display_name: &str,
        depth: usize,
    ) -> Result<(), ApicizeError> {
        match entry {
            RequestEntry::Group(group) => self.render_group(group, display_name, depth),
            RequestEntry::Request(request) => self.render_request(request, display_name, depth),
        }
    }

    fn render_group(
        &mut self,
        group: &RequestGroup,
        display_name: &str,
        depth: usize,
    ) -> Result<(), ApicizeError> {
        let outer = self.indent(depth);
        let inner = self.indent(depth + 1);

        self.content.push_str(&format!(
            "{outer}describe({}, function () {{\n",
            to_single_quoted(display_name)
        ));

        let block = MetadataRecord::Group(group.clone())
            .encode(&inner)
            .map_err(|err| ApicizeError::from_metadata(err, &group.get_title()))?;
        self.content.push_str(&inner);
        self.content.push_str(&block);
        self.content.push('\n');

        let child_names = disambiguate_names(group.children.iter().map(|c| c.get_name()));
        for (child, child_name) in group.children.iter().zip(child_names.iter()) {
            self.content.push('\n');
            self.render_entry(child, child_name, depth + 1)?;
        }

        self.content.push_str(&format!("{outer}}});\n"));
        Ok(())
    }

    fn render_request(
        &mut self,
        request: &Request,
        display_name: &str,
        depth: usize,
    ) -> Result<(), ApicizeError> {
        let outer = self.indent(depth);
        let inner = self.indent(depth + 1);

        let config = match request.timeout {
            Some(timeout) => format!("{{ timeout: {timeout} }}, "),
            None => String::new(),
        };
        self.content.push_str(&format!(
            "{outer}it({}, {config}async function () {{\n",
            to_single_quoted(display_name)
        ));

        let block = MetadataRecord::Request(request.clone())
            .encode(&inner)
            .map_err(|err| ApicizeError::from_metadata(err, &request.get_title()))?;
        self.content.push_str(&inner);
        self.content.push_str(&block);
        self.content.push('\n');

        let dispatch = serde_json::to_string(&DispatchConfig::from_request(request))
            .map_err(|err| ApicizeError::from_serde(err, &request.get_title()))?;
        self.content.push_str(&format!(
            "{inner}const response = await {RUNTIME_BINDING}.execute({dispatch});\n"
        ));

        if let Some(test) = &request.test
            && !test.is_empty()
        {
            // continuation lines of template literals keep their exact text
            let verbatim = template_continuation_lines(test);
            self.content.push_str(&indent_lines(test, &inner, &verbatim));
            self.content.push('\n');
        }

        self.content.push_str(&format!("{outer}}});\n"));
        Ok(())
    }
}
