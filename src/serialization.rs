//! Serialization submodule
//!
//! File and directory I/O for workbooks, settings and generated projects
use serde::{Serialize, de::DeserializeOwned};
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use std::{
    fs::{self, File},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use crate::{ApicizeError, ExportedProject, ProjectSources, TESTS_DIRECTORY};

/// Information on open success, including data
pub struct SerializationOpenSuccess<T> {
    /// Name of file that was opened
    pub file_name: String,
    /// Data
    pub data: T,
}

/// Information on save success
#[derive(Debug)]
pub struct SerializationSaveSuccess {
    /// Name of file that was saved
    pub file_name: String,
    /// File operation
    pub operation: SerializationOperation,
}

/// Information about I/O failure
#[derive(Debug)]
pub struct SerializationFailure {
    /// Name of file that was opened or saved
    pub file_name: String,
    /// Error on serialization/deserialization
    pub error: SerializationError,
}

/// File operation
#[derive(Debug, PartialEq)]
pub enum SerializationOperation {
    /// File saved
    Save,
    /// File already had the requested content
    Unchanged,
    /// File was removed
    Delete,
}

/// Represents errors occurring during Workbook serialization and deserialization
#[derive(Error, Debug)]
pub enum SerializationError {
    /// File system error
    #[error(transparent)]
    IO(#[from] io::Error),
    /// JSON parsing error
    #[error(transparent)]
    JSON(#[from] serde_json::Error),
}

impl From<SerializationFailure> for ApicizeError {
    fn from(value: SerializationFailure) -> Self {
        ApicizeError::Serialization {
            file_name: value.file_name,
            error: value.error,
        }
    }
}

fn failure(file_name: &str, error: impl Into<SerializationError>) -> SerializationFailure {
    SerializationFailure {
        file_name: file_name.to_string(),
        error: error.into(),
    }
}

/// Open the specified data file as text
pub fn open_data_text(
    input_file_name: &Path,
) -> Result<SerializationOpenSuccess<String>, SerializationFailure> {
    let file_name = String::from(input_file_name.to_string_lossy());
    let mut text = String::new();
    match File::open(input_file_name) {
        Ok(mut f) => match f.read_to_string(&mut text) {
            Ok(_) => Ok(SerializationOpenSuccess {
                file_name,
                data: text,
            }),
            Err(err) => Err(failure(&file_name, err)),
        },
        Err(err) => Err(failure(&file_name, err)),
    }
}

/// Open the specified data file
pub fn open_data_file<T: DeserializeOwned>(
    input_file_name: &Path,
) -> Result<SerializationOpenSuccess<T>, SerializationFailure> {
    let opened = open_data_text(input_file_name)?;
    match serde_json::from_str::<T>(&opened.data) {
        Ok(data) => Ok(SerializationOpenSuccess {
            file_name: opened.file_name,
            data,
        }),
        Err(err) => Err(failure(&opened.file_name, err)),
    }
}

/// Save the specified data file, using four space indentation
pub fn save_data_file<T: Serialize>(
    output_file_name: &Path,
    data: &T,
) -> Result<SerializationSaveSuccess, SerializationFailure> {
    let file_name = String::from(output_file_name.to_string_lossy());
    let formatter = PrettyFormatter::with_indent(b"    ");

    let mut buffer = Vec::<u8>::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    data.serialize(&mut ser)
        .map_err(|err| failure(&file_name, err))?;
    buffer.push(b'\n');

    let mut writer = File::create(output_file_name).map_err(|err| failure(&file_name, err))?;
    writer
        .write_all(&buffer)
        .map_err(|err| failure(&file_name, err))?;
    Ok(SerializationSaveSuccess {
        file_name,
        operation: SerializationOperation::Save,
    })
}

/// Write each generated file below `directory`, leaving files whose content is unchanged untouched.
/// Units directly under `tests/` that the project no longer generates are deleted.
pub fn write_project(
    directory: &Path,
    project: &ExportedProject,
) -> Result<Vec<SerializationSaveSuccess>, SerializationFailure> {
    let mut results = Vec::with_capacity(project.files.len());
    for file in &project.files {
        let full_path = file
            .path
            .split('/')
            .fold(PathBuf::from(directory), |path, part| path.join(part));
        let file_name = String::from(full_path.to_string_lossy());

        if let Ok(existing) = fs::read_to_string(&full_path)
            && existing == file.content
        {
            results.push(SerializationSaveSuccess {
                file_name,
                operation: SerializationOperation::Unchanged,
            });
            continue;
        }

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|err| failure(&file_name, err))?;
        }
        fs::write(&full_path, &file.content).map_err(|err| failure(&file_name, err))?;
        results.push(SerializationSaveSuccess {
            file_name,
            operation: SerializationOperation::Save,
        });
    }

    for path in stale_units(directory, project)? {
        let file_name = String::from(path.to_string_lossy());
        fs::remove_file(&path).map_err(|err| failure(&file_name, err))?;
        results.push(SerializationSaveSuccess {
            file_name,
            operation: SerializationOperation::Delete,
        });
    }
    Ok(results)
}

/// `.ts` files directly under the tests directory that `project` does not contain
fn stale_units(
    directory: &Path,
    project: &ExportedProject,
) -> Result<Vec<PathBuf>, SerializationFailure> {
    let tests_directory = directory.join(TESTS_DIRECTORY);
    if !tests_directory.is_dir() {
        return Ok(vec![]);
    }
    let tests_name = String::from(tests_directory.to_string_lossy());
    let entries = fs::read_dir(&tests_directory).map_err(|err| failure(&tests_name, err))?;

    let mut stale = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| failure(&tests_name, err))?;
        let path = entry.path();
        if !path.is_file() || !path.extension().is_some_and(|ext| ext == "ts") {
            continue;
        }
        let relative = format!("{TESTS_DIRECTORY}/{}", entry.file_name().to_string_lossy());
        if project.get(&relative).is_none() {
            stale.push(path);
        }
    }
    stale.sort();
    Ok(stale)
}

/// Read every TypeScript file below `directory` into project sources, keyed by
/// `/`-separated relative path
pub fn read_project(directory: &Path) -> Result<ProjectSources, SerializationFailure> {
    let mut sources = ProjectSources::default();
    let mut pending = vec![PathBuf::from(directory)];
    while let Some(current) = pending.pop() {
        let current_name = String::from(current.to_string_lossy());
        let entries = fs::read_dir(&current).map_err(|err| failure(&current_name, err))?;
        for entry in entries {
            let entry = entry.map_err(|err| failure(&current_name, err))?;
            let path = entry.path();
            if path.is_dir() {
                if entry.file_name() != "node_modules" {
                    pending.push(path);
                }
            } else if path.extension().is_some_and(|ext| ext == "ts") {
                let opened = open_data_text(&path)?;
                let relative = path
                    .strip_prefix(directory)
                    .unwrap_or(&path)
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect::<Vec<String>>()
                    .join("/");
                sources.insert(relative, opened.data);
            }
        }
    }
    sources.sort();
    Ok(sources)
}
