//! Validator submodule
//!
//! Structural checks on raw workbook JSON.  Validation works on untyped values
//! so that every problem in a document is reported, in document order, rather
//! than only the first deserialization failure.
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{SUPPORTED_WORKBOOK_VERSIONS, Workbook};

static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.:-]{0,127}$").expect("id pattern is valid")
});

const COLLECTIONS: [&str; 6] = [
    "requests",
    "scenarios",
    "authorizations",
    "certificates",
    "proxies",
    "data",
];

const REQUIRED_KEYS: [&str; 8] = [
    "version",
    "requests",
    "scenarios",
    "authorizations",
    "certificates",
    "proxies",
    "data",
    "defaults",
];

const METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

const CONCURRENCY: [&str; 2] = ["SEQUENTIAL", "CONCURRENT"];

const SELECTIONS: [&str; 5] = [
    "selectedScenario",
    "selectedAuthorization",
    "selectedCertificate",
    "selectedProxy",
    "selectedData",
];

/// Structural rule a workbook violated
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    JsonSyntax,
    RootType,
    RequiredKey,
    CollectionType,
    ElementShape,
    VersionRecognized,
    IdRequired,
    IdSyntax,
    IdUnique,
    NodeShape,
    BodyType,
    BodyShape,
    FieldType,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::JsonSyntax => "json-syntax",
            Rule::RootType => "root-type",
            Rule::RequiredKey => "required-key",
            Rule::CollectionType => "collection-type",
            Rule::ElementShape => "element-shape",
            Rule::VersionRecognized => "version-recognized",
            Rule::IdRequired => "id-required",
            Rule::IdSyntax => "id-syntax",
            Rule::IdUnique => "id-unique",
            Rule::NodeShape => "node-shape",
            Rule::BodyType => "body-type",
            Rule::BodyShape => "body-shape",
            Rule::FieldType => "field-type",
        }
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single structural problem
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Violation {
    /// Location, e.g. `requests[0].children[1].id`; empty for the document root
    pub path: String,
    pub rule: Rule,
    pub message: String,
}

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.path.is_empty() {
            "(root)"
        } else {
            &self.path
        };
        write!(f, "{path}: [{}] {}", self.rule, self.message)
    }
}

/// Validate workbook JSON text
pub fn validate_workbook_text(text: &str) -> Vec<Violation> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => validate_workbook_value(&value),
        Err(err) => vec![Violation {
            path: String::new(),
            rule: Rule::JsonSyntax,
            message: format!("invalid JSON at {}:{}: {}", err.line(), err.column(), err),
        }],
    }
}

/// Validate an in-memory workbook
pub fn validate_workbook(workbook: &Workbook) -> Vec<Violation> {
    match serde_json::to_value(workbook) {
        Ok(value) => validate_workbook_value(&value),
        Err(err) => vec![Violation {
            path: String::new(),
            rule: Rule::JsonSyntax,
            message: format!("workbook cannot be represented as JSON: {err}"),
        }],
    }
}

/// Validate parsed workbook JSON
pub fn validate_workbook_value(value: &Value) -> Vec<Violation> {
    let mut validator = Validator::default();
    validator.validate(value);
    validator.violations
}

#[derive(Default)]
struct Validator<'a> {
    violations: Vec<Violation>,
    ids: HashMap<&'a str, String>,
}

fn key_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn index_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<'a> Validator<'a> {
    fn report(&mut self, path: String, rule: Rule, message: String) {
        self.violations.push(Violation {
            path,
            rule,
            message,
        });
    }

    fn validate(&mut self, value: &'a Value) {
        let Value::Object(root) = value else {
            self.report(
                String::new(),
                Rule::RootType,
                format!("workbook must be an object, found {}", type_name(value)),
            );
            return;
        };

        for key in REQUIRED_KEYS {
            if !root.contains_key(key) {
                self.report(key.to_string(), Rule::RequiredKey, format!("\"{key}\" is required"));
            }
        }

        if let Some(version) = root.get("version") {
            match version.as_f64() {
                Some(v) if SUPPORTED_WORKBOOK_VERSIONS.contains(&v) => {}
                Some(v) => self.report(
                    "version".to_string(),
                    Rule::VersionRecognized,
                    format!("workbook version {v} is not supported"),
                ),
                None => self.report(
                    "version".to_string(),
                    Rule::FieldType,
                    format!("version must be a number, found {}", type_name(version)),
                ),
            }
        }

        for collection in COLLECTIONS {
            let Some(value) = root.get(collection) else {
                continue;
            };
            let Value::Array(elements) = value else {
                self.report(
                    collection.to_string(),
                    Rule::CollectionType,
                    format!("\"{collection}\" must be an array, found {}", type_name(value)),
                );
                continue;
            };
            if collection == "requests" {
                self.validate_entries(collection, elements);
                continue;
            }
            for (index, element) in elements.iter().enumerate() {
                let path = index_path(collection, index);
                let Value::Object(fields) = element else {
                    self.report(
                        path,
                        Rule::ElementShape,
                        format!("element must be an object, found {}", type_name(element)),
                    );
                    continue;
                };
                self.validate_id(&path, fields);
                self.expect_string(&path, fields, "name", false);
                if collection == "scenarios" {
                    self.validate_variables(&path, fields);
                }
            }
        }

        if let Some(defaults) = root.get("defaults") {
            match defaults {
                Value::Object(fields) => self.validate_selections("defaults", fields),
                _ => self.report(
                    "defaults".to_string(),
                    Rule::FieldType,
                    format!("defaults must be an object, found {}", type_name(defaults)),
                ),
            }
        }
    }

    /// Walk the request tree in document order
    fn validate_entries(&mut self, path: &str, entries: &'a [Value]) {
        let mut pending = entries
            .iter()
            .enumerate()
            .rev()
            .map(|(index, entry)| (index_path(path, index), entry))
            .collect::<Vec<(String, &Value)>>();

        while let Some((path, entry)) = pending.pop() {
            let Value::Object(fields) = entry else {
                self.report(
                    path,
                    Rule::ElementShape,
                    format!("request entry must be an object, found {}", type_name(entry)),
                );
                continue;
            };
            self.validate_id(&path, fields);
            self.expect_string(&path, fields, "name", false);
            self.expect_integer(&path, fields, "runs");
            self.expect_enum(&path, fields, "multiRunExecution", &CONCURRENCY);
            self.validate_selections(&path, fields);

            match fields.get("children") {
                Some(Value::Array(children)) => {
                    for key in ["url", "method", "body", "test"] {
                        if fields.contains_key(key) {
                            self.report(
                                key_path(&path, key),
                                Rule::NodeShape,
                                format!("group cannot have \"{key}\""),
                            );
                        }
                    }
                    self.expect_enum(&path, fields, "execution", &CONCURRENCY);
                    let children_path = key_path(&path, "children");
                    for (index, child) in children.iter().enumerate().rev() {
                        pending.push((index_path(&children_path, index), child));
                    }
                }
                Some(other) => self.report(
                    key_path(&path, "children"),
                    Rule::NodeShape,
                    format!("children must be an array, found {}", type_name(other)),
                ),
                None => self.validate_request(&path, fields),
            }
        }
    }

    fn validate_request(&mut self, path: &str, fields: &Map<String, Value>) {
        self.expect_string(path, fields, "url", false);
        self.expect_enum(path, fields, "method", &METHODS);
        self.expect_integer(path, fields, "timeout");
        self.expect_integer(path, fields, "numberOfRedirects");
        self.expect_string(path, fields, "test", true);
        for key in ["keepAlive", "acceptInvalidCerts"] {
            if let Some(value) = fields.get(key)
                && !value.is_boolean()
            {
                self.report(
                    key_path(path, key),
                    Rule::FieldType,
                    format!("{key} must be a boolean, found {}", type_name(value)),
                );
            }
        }
        for key in ["headers", "queryStringParams"] {
            if let Some(value) = fields.get(key)
                && !value.is_null()
            {
                self.validate_pairs(&key_path(path, key), value, Rule::FieldType);
            }
        }
        if let Some(body) = fields.get("body")
            && !body.is_null()
        {
            self.validate_body(&key_path(path, "body"), body);
        }
    }

    fn validate_body(&mut self, path: &str, body: &Value) {
        let Value::Object(fields) = body else {
            self.report(
                path.to_string(),
                Rule::BodyShape,
                format!("body must be an object, found {}", type_name(body)),
            );
            return;
        };
        let Some(body_type) = fields.get("type").and_then(Value::as_str) else {
            self.report(
                key_path(path, "type"),
                Rule::BodyType,
                "body type must be a string".to_string(),
            );
            return;
        };
        let data_path = key_path(path, "data");
        let data = fields.get("data");
        match body_type {
            "None" => {}
            "Text" | "XML" | "Raw" => {
                if !data.is_some_and(Value::is_string) {
                    self.report(
                        data_path,
                        Rule::BodyShape,
                        format!("{body_type} body data must be a string"),
                    );
                }
            }
            "JSON" => {
                if data.is_none() {
                    self.report(data_path, Rule::BodyShape, "JSON body requires data".to_string());
                }
            }
            "Form" => match data {
                Some(data) => self.validate_pairs(&data_path, data, Rule::BodyShape),
                None => self.report(data_path, Rule::BodyShape, "Form body requires data".to_string()),
            },
            other => self.report(
                key_path(path, "type"),
                Rule::BodyType,
                format!("unknown body type \"{other}\""),
            ),
        }
    }

    fn validate_pairs(&mut self, path: &str, value: &Value, rule: Rule) {
        let Value::Array(pairs) = value else {
            self.report(
                path.to_string(),
                rule,
                format!("expected an array of name/value pairs, found {}", type_name(value)),
            );
            return;
        };
        for (index, pair) in pairs.iter().enumerate() {
            let valid = pair.get("name").is_some_and(Value::is_string)
                && pair.get("value").is_some_and(Value::is_string);
            if !valid {
                self.report(
                    index_path(path, index),
                    rule,
                    "name/value pair requires string name and value".to_string(),
                );
            }
        }
    }

    fn validate_variables(&mut self, path: &str, fields: &Map<String, Value>) {
        match fields.get("variables") {
            None | Some(Value::Null) => {}
            Some(Value::Array(variables)) => {
                let variables_path = key_path(path, "variables");
                for (index, variable) in variables.iter().enumerate() {
                    if !variable.get("name").is_some_and(Value::is_string) {
                        self.report(
                            index_path(&variables_path, index),
                            Rule::FieldType,
                            "variable requires a string name".to_string(),
                        );
                    }
                }
            }
            Some(other) => self.report(
                key_path(path, "variables"),
                Rule::FieldType,
                format!("variables must be an array, found {}", type_name(other)),
            ),
        }
    }

    fn validate_selections(&mut self, path: &str, fields: &Map<String, Value>) {
        for key in SELECTIONS {
            match fields.get(key) {
                None | Some(Value::Null) => {}
                Some(Value::Object(selection)) if selection.get("id").is_some_and(Value::is_string) => {}
                Some(_) => self.report(
                    key_path(path, key),
                    Rule::FieldType,
                    format!("{key} must be an object with a string id"),
                ),
            }
        }
    }

    fn validate_id(&mut self, path: &str, fields: &'a Map<String, Value>) {
        let id_path = key_path(path, "id");
        let id = match fields.get("id") {
            Some(Value::String(id)) => id,
            Some(other) => {
                self.report(
                    id_path,
                    Rule::IdRequired,
                    format!("id must be a string, found {}", type_name(other)),
                );
                return;
            }
            None => {
                self.report(id_path, Rule::IdRequired, "id is required".to_string());
                return;
            }
        };
        if !ID_PATTERN.is_match(id) {
            self.report(
                id_path,
                Rule::IdSyntax,
                format!("id \"{id}\" must be 1-128 letters, digits, '_', '.', ':' or '-' and not start with '.', ':' or '-'"),
            );
            return;
        }
        if let Some(first) = self.ids.get(id.as_str()) {
            let message = format!("id \"{id}\" is already used at {first}");
            self.report(id_path, Rule::IdUnique, message);
        } else {
            self.ids.insert(id.as_str(), id_path);
        }
    }

    fn expect_string(&mut self, path: &str, fields: &Map<String, Value>, key: &str, nullable: bool) {
        match fields.get(key) {
            None | Some(Value::String(_)) => {}
            Some(Value::Null) if nullable => {}
            Some(other) => self.report(
                key_path(path, key),
                Rule::FieldType,
                format!("{key} must be a string, found {}", type_name(other)),
            ),
        }
    }

    fn expect_integer(&mut self, path: &str, fields: &Map<String, Value>, key: &str) {
        match fields.get(key) {
            None | Some(Value::Null) => {}
            Some(value) if value.is_u64() => {}
            Some(other) => self.report(
                key_path(path, key),
                Rule::FieldType,
                format!("{key} must be a non-negative integer, found {other}"),
            ),
        }
    }

    fn expect_enum(&mut self, path: &str, fields: &Map<String, Value>, key: &str, allowed: &[&str]) {
        match fields.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::String(value)) if allowed.contains(&value.as_str()) => {}
            Some(other) => self.report(
                key_path(path, key),
                Rule::FieldType,
                format!("{key} must be one of {}, found {other}", allowed.join(", ")),
            ),
        }
    }
}
