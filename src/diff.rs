//! Diff submodule
//!
//! Leaf-level comparison of two JSON documents, used to measure how faithfully
//! a workbook survives an export/import round trip.
use serde::Serialize;
use serde_json::Value;

use crate::{ApicizeError, Workbook};

/// Category of a difference
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DifferenceKind {
    /// Reference has a key the candidate lacks
    MissingKey,
    /// Candidate has a key the reference lacks
    ExtraKey,
    /// Values at the same path have different JSON types
    TypeMismatch,
    /// Scalars at the same path differ
    ValueMismatch,
    /// Arrays at the same path have different lengths
    LengthMismatch,
}

/// One difference between reference and candidate
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Difference {
    pub path: String,
    pub kind: DifferenceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<Value>,
}

/// Comparison result
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    /// Percentage of reference leaves matched by the candidate
    pub accuracy: f64,
    pub total_leaves: usize,
    pub matching_leaves: usize,
    /// Differences in document order
    pub differences: Vec<Difference>,
}

impl DiffReport {
    /// True if the candidate matches the reference exactly
    pub fn is_identical(&self) -> bool {
        self.differences.is_empty()
    }
}

/// Compare `candidate` against `reference`
pub fn compare(reference: &Value, candidate: &Value) -> DiffReport {
    let mut total_leaves = 0;
    let mut matching_leaves = 0;
    let mut differences = Vec::new();

    let mut pending = vec![(String::new(), reference, candidate)];
    while let Some((path, reference, candidate)) = pending.pop() {
        match (reference, candidate) {
            (Value::Object(reference_fields), Value::Object(candidate_fields)) => {
                let mut nested = Vec::new();
                for (key, reference_value) in reference_fields {
                    let field_path = key_path(&path, key);
                    match candidate_fields.get(key) {
                        Some(candidate_value) => {
                            nested.push((field_path, reference_value, candidate_value))
                        }
                        None => {
                            total_leaves += count_leaves(reference_value);
                            differences.push(Difference {
                                path: field_path,
                                kind: DifferenceKind::MissingKey,
                                reference: Some(reference_value.clone()),
                                candidate: None,
                            });
                        }
                    }
                }
                for (key, candidate_value) in candidate_fields {
                    if !reference_fields.contains_key(key) {
                        differences.push(Difference {
                            path: key_path(&path, key),
                            kind: DifferenceKind::ExtraKey,
                            reference: None,
                            candidate: Some(candidate_value.clone()),
                        });
                    }
                }
                pending.extend(nested.into_iter().rev());
            }
            (Value::Array(reference_items), Value::Array(candidate_items)) => {
                if reference_items.len() != candidate_items.len() {
                    differences.push(Difference {
                        path: path.clone(),
                        kind: DifferenceKind::LengthMismatch,
                        reference: Some(Value::from(reference_items.len())),
                        candidate: Some(Value::from(candidate_items.len())),
                    });
                }
                for item in reference_items.iter().skip(candidate_items.len()) {
                    total_leaves += count_leaves(item);
                }
                let nested = reference_items
                    .iter()
                    .zip(candidate_items.iter())
                    .enumerate()
                    .map(|(index, (r, c))| (format!("{path}[{index}]"), r, c))
                    .collect::<Vec<(String, &Value, &Value)>>();
                pending.extend(nested.into_iter().rev());
            }
            (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => {
                total_leaves += count_leaves(reference);
                differences.push(Difference {
                    path,
                    kind: DifferenceKind::TypeMismatch,
                    reference: Some(reference.clone()),
                    candidate: Some(candidate.clone()),
                });
            }
            _ => {
                total_leaves += 1;
                if !same_scalar_type(reference, candidate) {
                    differences.push(Difference {
                        path,
                        kind: DifferenceKind::TypeMismatch,
                        reference: Some(reference.clone()),
                        candidate: Some(candidate.clone()),
                    });
                } else if scalars_equal(reference, candidate) {
                    matching_leaves += 1;
                } else {
                    differences.push(Difference {
                        path,
                        kind: DifferenceKind::ValueMismatch,
                        reference: Some(reference.clone()),
                        candidate: Some(candidate.clone()),
                    });
                }
            }
        }
    }

    let accuracy = if total_leaves == 0 {
        100.0
    } else {
        matching_leaves as f64 / total_leaves as f64 * 100.0
    };

    DiffReport {
        accuracy,
        total_leaves,
        matching_leaves,
        differences,
    }
}

/// Compare two workbooks by their JSON representation
pub fn compare_workbooks(
    reference: &Workbook,
    candidate: &Workbook,
) -> Result<DiffReport, ApicizeError> {
    let reference = serde_json::to_value(reference)
        .map_err(|err| ApicizeError::from_serde(err, "reference"))?;
    let candidate = serde_json::to_value(candidate)
        .map_err(|err| ApicizeError::from_serde(err, "candidate"))?;
    Ok(compare(&reference, &candidate))
}

/// Number of scalar leaves in `value`; empty containers have none
pub fn count_leaves(value: &Value) -> usize {
    let mut count = 0;
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        match value {
            Value::Object(fields) => pending.extend(fields.values()),
            Value::Array(items) => pending.extend(items.iter()),
            _ => count += 1,
        }
    }
    count
}

fn key_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn same_scalar_type(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Null, Value::Null)
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
    )
}

fn scalars_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => a == b,
    }
}
