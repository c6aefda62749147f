use serde::{Deserialize, Serialize};

use super::Identifiable;
use crate::utility::*;

#[derive(Serialize, Deserialize, PartialEq, Clone, Default, Debug)]
pub enum DataSourceType {
    #[default]
    JSON,
    #[serde(rename = "FILE-JSON")]
    FileJSON,
    #[serde(rename = "FILE-CSV")]
    FileCSV,
}

/// Data that may be sourced from JSON, a JSON File or a CSV file
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct DataSet {
    /// Uniquely identifies external data
    #[serde(default = "generate_uuid")]
    pub id: String,
    /// Names external data
    pub name: String,
    /// Source type of the data set
    #[serde(rename = "type")]
    pub source_type: DataSourceType,
    /// Source of the data set (JSON text or file name)
    pub source: String,
}

impl Default for DataSet {
    fn default() -> Self {
        Self {
            id: generate_uuid(),
            name: String::default(),
            source_type: DataSourceType::JSON,
            source: String::default(),
        }
    }
}

impl Identifiable for DataSet {
    fn get_id(&self) -> &str {
        &self.id
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}
