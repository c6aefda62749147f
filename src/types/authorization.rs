use super::{Identifiable, Selection};
use crate::utility::*;
use serde::{Deserialize, Serialize};

/// Authorization information used when dispatching an Apicize Request
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(tag = "type")]
pub enum Authorization {
    /// Basic authentication (basic authorization header)
    #[serde(rename_all = "camelCase")]
    Basic {
        /// Uniquely identifies authorization configuration
        #[serde(default = "generate_uuid")]
        id: String,
        /// Human-readable name of authorization configuration
        name: String,
        /// User name
        username: String,
        /// Password
        password: String,
    },
    /// OAuth2 client flow (bearer authorization header)
    #[serde(rename_all = "camelCase")]
    OAuth2Client {
        /// Uniquely identifies authorization configuration
        #[serde(default = "generate_uuid")]
        id: String,
        /// Human-readable name of authorization configuration
        name: String,
        /// URL to retrieve access token from
        access_token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret (allowed to be blank)
        client_secret: String,
        /// Audience to add to token
        #[serde(skip_serializing_if = "Option::is_none")]
        audience: Option<String>,
        /// Scope to add to token (multiple scopes should be space-delimited)
        #[serde(skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
        /// Selected certificate, if applicable
        #[serde(skip_serializing_if = "Option::is_none")]
        selected_certificate: Option<Selection>,
        /// Selected proxy, if applicable
        #[serde(skip_serializing_if = "Option::is_none")]
        selected_proxy: Option<Selection>,
        #[serde(skip_serializing_if = "Option::is_none")]
        send_credentials_in_body: Option<bool>,
    },
    /// OAuth2 PKCE flow (note, this can only be used interactively)
    #[serde(rename_all = "camelCase")]
    OAuth2Pkce {
        /// Uniquely identifies authorization configuration
        #[serde(default = "generate_uuid")]
        id: String,
        /// Human-readable name of authorization configuration
        name: String,
        /// URL for authorization
        authorize_url: String,
        /// URL to retrieve access token from
        access_token_url: String,
        /// Client ID
        client_id: String,
        /// Scope to add to token (multiple scopes should be space-delimited)
        #[serde(skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        send_credentials_in_body: Option<bool>,
    },
    /// API key authentication (sent in HTTP header)
    #[serde(rename_all = "camelCase")]
    ApiKey {
        /// Uniquely identifies authorization configuration
        #[serde(default = "generate_uuid")]
        id: String,
        /// Human-readable name of authorization configuration
        name: String,
        /// Name of header (ex. "x-api-key")
        header: String,
        /// Value of key to include as header value
        value: String,
    },
}

impl Default for Authorization {
    fn default() -> Self {
        Authorization::ApiKey {
            id: generate_uuid(),
            name: String::default(),
            header: String::default(),
            value: String::default(),
        }
    }
}

impl Identifiable for Authorization {
    fn get_id(&self) -> &str {
        match self {
            Authorization::Basic { id, .. } => id,
            Authorization::OAuth2Client { id, .. } => id,
            Authorization::OAuth2Pkce { id, .. } => id,
            Authorization::ApiKey { id, .. } => id,
        }
    }

    fn get_name(&self) -> &str {
        match self {
            Authorization::Basic { name, .. } => name,
            Authorization::OAuth2Client { name, .. } => name,
            Authorization::OAuth2Pkce { name, .. } => name,
            Authorization::ApiKey { name, .. } => name,
        }
    }
}
