use serde::{Deserialize, Serialize};

use super::{Identifiable, Variable};
use crate::utility::*;

/// A set of variables that can be injected into templated values
/// when submitting an Apicize Request
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Uniquely identifies scenario
    #[serde(default = "generate_uuid")]
    pub id: String,
    /// Name of the scenario
    pub name: String,
    /// Variables to substitute, in declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<Variable>>,
}

impl Identifiable for Scenario {
    fn get_id(&self) -> &str {
        &self.id
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            id: generate_uuid(),
            name: Default::default(),
            variables: Default::default(),
        }
    }
}
