//! Workbook models submodule
//!
//! Storage of workbooks (requests and public parameters)
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    Authorization, Certificate, DataSet, Proxy, RequestEntry, Scenario, WorkbookDefaultParameters,
};
use crate::{
    ApicizeError, SerializationSaveSuccess, StructuralError, open_data_text, save_data_file,
    validate_workbook_value,
};

/// Workbook format version written by this library
pub const CURRENT_WORKBOOK_VERSION: f64 = 1.0;

/// Workbook format versions this library can read
pub const SUPPORTED_WORKBOOK_VERSIONS: [f64; 1] = [1.0];

/// Persisted Apicize requests and scenario definitions
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct Workbook {
    /// Version of workbook format (should not be changed manually)
    pub version: f64,
    /// List of requests/request groups
    pub requests: Vec<RequestEntry>,
    /// List of scenarios
    pub scenarios: Vec<Scenario>,
    /// Workbook Authorizations
    pub authorizations: Vec<Authorization>,
    /// Workbook certificates
    pub certificates: Vec<Certificate>,
    /// Workbook proxy servers
    pub proxies: Vec<Proxy>,
    /// External data
    pub data: Vec<DataSet>,
    /// Workbook defaults
    pub defaults: WorkbookDefaultParameters,
}

impl Default for Workbook {
    fn default() -> Self {
        Self {
            version: CURRENT_WORKBOOK_VERSION,
            requests: Default::default(),
            scenarios: Default::default(),
            authorizations: Default::default(),
            certificates: Default::default(),
            proxies: Default::default(),
            data: Default::default(),
            defaults: Default::default(),
        }
    }
}

impl Workbook {
    /// Parse workbook JSON text, validating its structure before deserializing it
    pub fn from_json(name: &str, text: &str) -> Result<Workbook, ApicizeError> {
        let value = serde_json::from_str::<serde_json::Value>(text)
            .map_err(|err| ApicizeError::from_serde(err, name))?;
        let violations = validate_workbook_value(&value);
        if !violations.is_empty() {
            return Err(ApicizeError::Structural(StructuralError { violations }));
        }
        serde_json::from_value::<Workbook>(value).map_err(|err| ApicizeError::from_serde(err, name))
    }

    /// Open and validate the specified workbook file
    pub fn open(file_name: &Path) -> Result<Workbook, ApicizeError> {
        let opened = open_data_text(file_name)?;
        Workbook::from_json(&opened.file_name, &opened.data)
    }

    /// Save workbook information to the specified file
    pub fn save(&self, file_name: &Path) -> Result<SerializationSaveSuccess, ApicizeError> {
        save_data_file(file_name, self).map_err(ApicizeError::from)
    }

    /// Count groups and requests across the whole request tree
    pub fn count_entries(&self) -> (usize, usize) {
        let mut groups = 0;
        let mut requests = 0;
        let mut pending: Vec<&RequestEntry> = self.requests.iter().collect();
        while let Some(entry) = pending.pop() {
            match entry {
                RequestEntry::Request(_) => requests += 1,
                RequestEntry::Group(group) => {
                    groups += 1;
                    pending.extend(group.children.iter());
                }
            }
        }
        (groups, requests)
    }
}
