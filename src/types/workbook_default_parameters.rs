use serde::{Deserialize, Serialize};

use super::Selection;

/// Default parameters for the workbook
#[derive(Serialize, Deserialize, PartialEq, Clone, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookDefaultParameters {
    /// Selected scenario, if applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_scenario: Option<Selection>,
    /// Selected authorization, if applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_authorization: Option<Selection>,
    /// Selected certificate, if applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_certificate: Option<Selection>,
    /// Selected proxy, if applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_proxy: Option<Selection>,
    /// Selected external data, if applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_data: Option<Selection>,
}

