//! Generated project layout
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Manifest unit listing top-level units in order
pub const INDEX_FILE: &str = "index.ts";

/// Runtime context shim imported by every unit
pub const RUNTIME_FILE: &str = "runtime/context.ts";

/// Directory holding one unit per top-level entry
pub const TESTS_DIRECTORY: &str = "tests";

/// A single generated file
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct GeneratedFile {
    /// Path relative to the project root, `/`-separated
    pub path: String,
    /// File content
    pub content: String,
}

/// Output of exporting one workbook, files in generation order
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct ExportedProject {
    pub files: Vec<GeneratedFile>,
}

impl ExportedProject {
    /// Return the content of the file at `path`
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.content.as_str())
    }

    /// Convert generated files into importable sources
    pub fn to_sources(&self) -> ProjectSources {
        let mut sources = ProjectSources::default();
        for file in &self.files {
            sources.insert(file.path.clone(), file.content.clone());
        }
        sources
    }
}

/// Source text of a (possibly edited) project, keyed by relative path
#[derive(PartialEq, Clone, Debug, Default)]
pub struct ProjectSources {
    files: IndexMap<String, String>,
}

impl ProjectSources {
    /// Add or replace the text of a file
    pub fn insert(&mut self, path: String, text: String) {
        self.files.insert(path, text);
    }

    /// Text of the file at `path`
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(|s| s.as_str())
    }

    /// Mutable text of the file at `path`
    pub fn get_mut(&mut self, path: &str) -> Option<&mut String> {
        self.files.get_mut(path)
    }

    /// Paths of units below the tests directory, in path order
    pub fn unit_paths(&self) -> Vec<&str> {
        let prefix = format!("{TESTS_DIRECTORY}/");
        let mut paths = self
            .files
            .keys()
            .filter(|p| p.starts_with(&prefix) && p.ends_with(".ts"))
            .map(|p| p.as_str())
            .collect::<Vec<&str>>();
        paths.sort();
        paths
    }

    /// Order files by path
    pub fn sort(&mut self) {
        self.files.sort_keys();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
