//! Contains the HTTP client used to look up products.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use skudrive_types::Sku;

use crate::error::{DriverError, Result};

/// User agent string used for outgoing lookups.
const USER_AGENT: &str = concat!("skudrive/", env!("CARGO_PKG_VERSION"));

/// The response to a single lookup, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response body, decoded as text.
    pub body: String,
}

/// A product lookup endpoint reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLookup {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpLookup {
    /// Creates a client for the given endpoint URL.
    ///
    /// `timeout` bounds each lookup from sending the request until the body has been read.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| DriverError::InvalidConfig(format!("invalid endpoint `{endpoint}`: {e}")))?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(DriverError::Client)?;

        Ok(Self { client, endpoint })
    }

    /// The endpoint lookups are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends `GET <endpoint>?sku=<sku>` and returns status and body.
    ///
    /// Any status code counts as a completed lookup. Only network failures, timeouts and bodies
    /// that cannot be read are errors.
    pub async fn lookup(&self, sku: &Sku) -> Result<LookupResponse, reqwest::Error> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("sku", sku.to_string())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok(LookupResponse { status, body })
    }
}
