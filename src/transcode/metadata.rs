//! Metadata codec
//!
//! Workbook fields that have no natural representation in generated code are
//! carried in inert block comments:
//!
//! ```text
//! /* @apicize-metadata
//! { ...JSON... }
//! @apicize-metadata-end */
//! ```
//!
//! Decoding searches for the markers anywhere in the text, so reindenting or
//! moving code around the block does not affect it.
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    Authorization, Certificate, DataSet, MetadataError, Position, Proxy, Request, RequestGroup,
    Scenario, WorkbookDefaultParameters,
};

/// Opens a metadata block
pub const METADATA_START: &str = "/* @apicize-metadata";

/// Closes a metadata block
pub const METADATA_END: &str = "@apicize-metadata-end */";

const KIND_KEY: &str = "kind";

/// Serialize `record` into a delimited block
pub fn encode_block<T: Serialize>(record: &T) -> Result<String, MetadataError> {
    encode_block_indented(record, "")
}

/// Serialize `record` into a delimited block, prefixing each line after the
/// first with `indent`
pub fn encode_block_indented<T: Serialize>(
    record: &T,
    indent: &str,
) -> Result<String, MetadataError> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut buffer = Vec::<u8>::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    record.serialize(&mut ser).map_err(MetadataError::Encode)?;
    // serde_json only writes valid UTF-8
    let json = String::from_utf8_lossy(&buffer).replace("*/", "*\\/");

    let mut block = String::with_capacity(json.len() + 64);
    block.push_str(METADATA_START);
    for line in json.lines() {
        block.push('\n');
        block.push_str(indent);
        block.push_str(line);
    }
    block.push('\n');
    block.push_str(indent);
    block.push_str(METADATA_END);
    Ok(block)
}

/// True if `text` contains a metadata start marker
pub fn contains_block(text: &str) -> bool {
    text.contains(METADATA_START)
}

/// Decode the first metadata block in `text` as raw JSON
pub fn decode_value(text: &str) -> Result<Value, MetadataError> {
    let payload = locate_payload(text)?;
    serde_json::from_str::<Value>(payload).map_err(MetadataError::from_payload)
}

/// Decode the first metadata block in `text` into a record
pub fn decode_block<T: DeserializeOwned>(text: &str) -> Result<T, MetadataError> {
    let payload = locate_payload(text)?;
    serde_json::from_str::<T>(payload).map_err(MetadataError::from_payload)
}

fn locate_payload(text: &str) -> Result<&str, MetadataError> {
    let Some(start) = text.find(METADATA_START) else {
        return Err(MetadataError::Missing);
    };
    let payload_start = start + METADATA_START.len();
    match text[payload_start..].find(METADATA_END) {
        Some(length) => Ok(&text[payload_start..payload_start + length]),
        None => Err(MetadataError::Unterminated {
            start: position_of(text, start),
        }),
    }
}

fn position_of(text: &str, offset: usize) -> Position {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = offset - before.rfind('\n').map(|i| i + 1).unwrap_or(0) + 1;
    Position { line, column }
}

/// Workbook-level fields carried by the manifest unit
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct WorkbookMetadata {
    pub version: f64,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub authorizations: Vec<Authorization>,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
    #[serde(default)]
    pub proxies: Vec<Proxy>,
    #[serde(default)]
    pub data: Vec<DataSet>,
    #[serde(default)]
    pub defaults: WorkbookDefaultParameters,
}

/// A decoded metadata record.  Groups omit their children and requests omit
/// their test script; both are represented by the surrounding code.
#[derive(PartialEq, Clone, Debug)]
pub enum MetadataRecord {
    Workbook(WorkbookMetadata),
    Group(RequestGroup),
    Request(Request),
}

impl MetadataRecord {
    /// Name of the record kind, as written to the `kind` key
    pub fn kind(&self) -> &'static str {
        match self {
            MetadataRecord::Workbook(_) => "workbook",
            MetadataRecord::Group(_) => "group",
            MetadataRecord::Request(_) => "request",
        }
    }

    /// Render the record as a JSON object with a leading `kind` key
    pub fn to_value(&self) -> Result<Value, MetadataError> {
        let value = match self {
            MetadataRecord::Workbook(workbook) => serde_json::to_value(workbook),
            MetadataRecord::Group(group) => serde_json::to_value(group),
            MetadataRecord::Request(request) => serde_json::to_value(request),
        }
        .map_err(MetadataError::Encode)?;

        let mut record = Map::new();
        record.insert(KIND_KEY.to_string(), Value::String(self.kind().to_string()));
        if let Value::Object(fields) = value {
            for (key, field) in fields {
                let omitted = match self {
                    MetadataRecord::Group(_) => key == "children",
                    MetadataRecord::Request(_) => key == "test",
                    MetadataRecord::Workbook(_) => false,
                };
                if !omitted {
                    record.insert(key, field);
                }
            }
        }
        Ok(Value::Object(record))
    }

    /// Build a record from decoded JSON
    pub fn from_value(value: Value) -> Result<MetadataRecord, MetadataError> {
        let Value::Object(mut fields) = value else {
            return Err(malformed("metadata must be a JSON object"));
        };
        let kind = match fields.remove(KIND_KEY) {
            Some(Value::String(kind)) => kind,
            Some(_) => return Err(malformed("metadata kind must be a string")),
            None => return Err(malformed("metadata kind is missing")),
        };
        match kind.as_str() {
            "workbook" => serde_json::from_value(Value::Object(fields))
                .map(MetadataRecord::Workbook)
                .map_err(MetadataError::from_payload),
            "group" => {
                fields.insert("children".to_string(), Value::Array(vec![]));
                serde_json::from_value(Value::Object(fields))
                    .map(MetadataRecord::Group)
                    .map_err(MetadataError::from_payload)
            }
            "request" => {
                fields.remove("test");
                serde_json::from_value(Value::Object(fields))
                    .map(MetadataRecord::Request)
                    .map_err(MetadataError::from_payload)
            }
            other => Err(malformed(&format!("unknown metadata kind \"{other}\""))),
        }
    }

    /// Encode as a block, indenting continuation lines
    pub fn encode(&self, indent: &str) -> Result<String, MetadataError> {
        encode_block_indented(&self.to_value()?, indent)
    }

    /// Decode the first block in `text`
    pub fn decode(text: &str) -> Result<MetadataRecord, MetadataError> {
        MetadataRecord::from_value(decode_value(text)?)
    }
}

fn malformed(description: &str) -> MetadataError {
    MetadataError::Malformed {
        position: None,
        description: description.to_string(),
    }
}
