use serde::Deserialize;

use crate::payload::Payload;

/// Where the HTTP API listens.
///
/// The address always ends with a single `/` so action names can be appended
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct ApiConfig {
    api_address: String,
}

impl ApiConfig {
    pub fn new(api_address: impl Into<String>) -> Self {
        let api_address = api_address.into();
        let mut api_address = api_address.trim_end_matches('/').to_string();
        api_address.push('/');
        Self { api_address }
    }

    pub fn api_address(&self) -> &str {
        &self.api_address
    }

    pub fn url_for(&self, action: &str) -> String {
        format!("{}{}", self.api_address, action)
    }

    /// The URL a transport posts `A` to.
    pub fn action_url<A: Payload>(&self) -> String {
        self.url_for(A::NAME)
    }
}

impl From<String> for ApiConfig {
    fn from(api_address: String) -> Self {
        Self::new(api_address)
    }
}
