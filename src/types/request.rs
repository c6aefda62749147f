use std::fmt::Display;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use serde_with::base64::{Base64, Standard};
use serde_with::formats::Unpadded;
use serde_with::serde_as;

use super::{Identifiable, NameValuePair, Selection};
use crate::utility::*;

pub fn default_runs() -> usize {
    1
}

pub fn default_redirects() -> usize {
    10
}

/// Enumeration of HTTP methods
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
    /// HTTP PUT
    Put,
    /// HTTP DELETE
    Delete,
    /// HTTP PATCH
    Patch,
    /// HTTP HEAD
    Head,
    /// HTTP OPTIONS
    Options,
}

/// HTTP methods for Apicize Requests
impl RequestMethod {
    /// Returns Apicize Request method as string
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Head => "HEAD",
            RequestMethod::Options => "OPTIONS",
        }
    }
}

/// Apicize Request body, tagged by `type`
#[serde_as]
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(tag = "type")]
pub enum RequestBody {
    /// No body
    None,
    /// Text (UTF-8) body data
    Text {
        /// Text
        data: String,
    },
    /// JSON body data
    #[serde(rename = "JSON")]
    JSON {
        /// Parsed JSON
        data: Value,
    },
    /// XML body data
    #[serde(rename = "XML")]
    XML {
        /// Text
        data: String,
    },
    /// Form (not multipart) body data
    Form {
        /// Name/value pairs of form data
        data: Vec<NameValuePair>,
    },
    /// Binary body data serialized as Base64
    Raw {
        /// Base-64 encoded binary data
        #[serde_as(as = "Base64<Standard, Unpadded>")]
        data: Vec<u8>,
    },
}

/// Indicator on request execution order
#[derive(Serialize, Deserialize, PartialEq, Clone, Default, Debug)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionConcurrency {
    /// Requests are executed sequentially
    #[default]
    Sequential,
    /// Requests are executed concurrently
    Concurrent,
}

/// Information required to dispatch and test an Apicize Request
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Unique identifier (required to keep track of dispatches and test executions)
    #[serde(default = "generate_uuid")]
    pub id: String,
    /// Human-readable name describing the Apicize Request
    pub name: String,
    /// Optional identifier for the Apicize Request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// URL to dispatch the HTTP request to
    pub url: String,
    /// HTTP method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<RequestMethod>,
    /// Timeout, in milliseconds, to wait for a response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    /// HTTP headers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<NameValuePair>>,
    /// HTTP query string parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string_params: Option<Vec<NameValuePair>>,
    /// HTTP body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
    /// Keep HTTP connection alive
    #[serde(default = "bool::default", skip_serializing_if = "std::ops::Not::not")]
    pub keep_alive: bool,
    /// Allow invalid certificates (default is false)
    #[serde(default = "bool::default", skip_serializing_if = "std::ops::Not::not")]
    pub accept_invalid_certs: bool,
    /// Number redirects (default = 10)
    #[serde(default = "default_redirects")]
    pub number_of_redirects: usize,
    /// Number of runs for the request to execute
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Execution of multiple runs
    #[serde(default)]
    pub multi_run_execution: ExecutionConcurrency,
    /// Test to execute after dispatching request and receiving response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
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
    /// Selected external data, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_data: Option<Selection>,
}

/// A group of Apicize Requests
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RequestGroup {
    /// Uniquely identifies group of Apicize requests
    #[serde(default = "generate_uuid")]
    pub id: String,
    /// Human-readable name of the Apicize Group
    pub name: String,
    /// Optional identifier for the Apicize Group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Child items, in execution order
    #[serde(default)]
    pub children: Vec<RequestEntry>,
    /// Execution of children
    #[serde(default)]
    pub execution: ExecutionConcurrency,
    /// Number of runs for the group to execute
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Execution of multiple runs
    #[serde(default)]
    pub multi_run_execution: ExecutionConcurrency,
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
    /// Selected external data, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_data: Option<Selection>,
}

/// Apicize Request that is either a specific request to run
/// or a group of requests.  In JSON, an entry is a group if
/// and only if it has a `children` array.
#[derive(PartialEq, Clone, Debug)]
pub enum RequestEntry {
    /// Request to run
    Request(Request),
    /// Group of Apicize Requests
    Group(RequestGroup),
}

impl Serialize for RequestEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RequestEntry::Request(request) => request.serialize(serializer),
            RequestEntry::Group(group) => group.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for RequestEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if value.get("children").is_some_and(Value::is_array) {
            serde_json::from_value::<RequestGroup>(value)
                .map(RequestEntry::Group)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value::<Request>(value)
                .map(RequestEntry::Request)
                .map_err(D::Error::custom)
        }
    }
}

impl Default for Request {
    fn default() -> Self {
        Self {
            id: generate_uuid(),
            name: Default::default(),
            key: Default::default(),
            test: Some(
                r#"describe('status', () => {
    it('equals 200', () => {
        expect(response.status).to.equal(200)
    })
})"#
                .to_string(),
            ),
            url: Default::default(),
            method: Default::default(),
            timeout: Default::default(),
            headers: Default::default(),
            query_string_params: Default::default(),
            body: Default::default(),
            keep_alive: Default::default(),
            accept_invalid_certs: false,
            number_of_redirects: default_redirects(),
            runs: default_runs(),
            multi_run_execution: ExecutionConcurrency::Sequential,
            selected_scenario: Default::default(),
            selected_authorization: Default::default(),
            selected_certificate: Default::default(),
            selected_proxy: Default::default(),
            selected_data: Default::default(),
        }
    }
}

impl Default for RequestGroup {
    fn default() -> Self {
        Self {
            id: generate_uuid(),
            name: Default::default(),
            key: Default::default(),
            children: Default::default(),
            execution: ExecutionConcurrency::Sequential,
            runs: default_runs(),
            multi_run_execution: ExecutionConcurrency::Sequential,
            selected_scenario: Default::default(),
            selected_authorization: Default::default(),
            selected_certificate: Default::default(),
            selected_proxy: Default::default(),
            selected_data: Default::default(),
        }
    }
}

impl Identifiable for Request {
    fn get_id(&self) -> &str {
        &self.id
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}

impl Identifiable for RequestGroup {
    fn get_id(&self) -> &str {
        &self.id
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}

impl Identifiable for RequestEntry {
    fn get_id(&self) -> &str {
        match self {
            RequestEntry::Request(request) => request.get_id(),
            RequestEntry::Group(group) => group.get_id(),
        }
    }

    fn get_name(&self) -> &str {
        match self {
            RequestEntry::Request(request) => request.get_name(),
            RequestEntry::Group(group) => group.get_name(),
        }
    }
}

impl RequestEntry {
    /// Child entries (empty for requests)
    pub fn children(&self) -> &[RequestEntry] {
        match self {
            RequestEntry::Request(_) => &[],
            RequestEntry::Group(group) => &group.children,
        }
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Display for RequestGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Display for RequestEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestEntry::Request(i) => write!(f, "{}", i.name),
            RequestEntry::Group(g) => write!(f, "{}", g.name),
        }
    }
}
