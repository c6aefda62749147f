use serde::{Deserialize, Serialize};

/// Where a scenario variable's value comes from
#[derive(Serialize, Deserialize, PartialEq, Clone, Default, Debug)]
pub enum VariableSourceType {
    #[default]
    #[serde(rename = "TEXT")]
    Text,
    JSON,
    #[serde(rename = "FILE-JSON")]
    FileJSON,
    #[serde(rename = "FILE-CSV")]
    FileCSV,
}

impl VariableSourceType {
    fn is_default(&self) -> bool {
        *self == VariableSourceType::Text
    }
}

/// Data that may be sourced from text, JSON, a JSON File or a CSV file
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct Variable {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "VariableSourceType::is_default")]
    pub source_type: VariableSourceType,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}
