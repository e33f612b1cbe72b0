//! `reqwest` implementation of the engine's [`Transport`] seam.
//!
//! Adds what the engine deliberately leaves out: HTTP basic authentication,
//! the optional `sap-client` URL parameter, the TLS policy and a request
//! timeout. Responses are handed back untouched, whatever their status.

use std::time::Duration;

use async_trait::async_trait;
use filestore_sync_core::contract::{HttpRequest, HttpResponse, Method, Transport, TransportError};
use filestore_sync_core::path::encode_component;

use crate::load_config::ConnectionConfig;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub struct ReqwestTransport {
    client: reqwest::Client,
    user: String,
    password: String,
    sap_client: Option<String>,
}

impl ReqwestTransport {
    pub fn new(connection: &ConnectionConfig) -> Result<Self, TransportError> {
        Self::with_timeout(connection, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(connection: &ConnectionConfig, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!connection.strict_ssl)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client");
                e
            })?;
        tracing::info!(
            server = %connection.server,
            strict_ssl = connection.strict_ssl,
            sap_client = connection.client.as_deref().unwrap_or("-"),
            "Initialised HTTP transport"
        );
        Ok(Self {
            client,
            user: connection.user.clone(),
            password: connection.password.clone(),
            sap_client: connection.client.clone(),
        })
    }

    /// Appends `sap-client` to the request URL when a client is configured.
    pub fn url_for(&self, url: &str) -> String {
        match &self.sap_client {
            Some(client) => {
                let separator = if url.contains('?') { '&' } else { '?' };
                format!("{url}{separator}sap-client={}", encode_component(client))
            }
            None => url.to_string(),
        }
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(&request.url);
        tracing::debug!(method = request.method.as_str(), url = %url, "Sending request");

        let mut builder = self
            .client
            .request(reqwest_method(request.method), url.as_str())
            .basic_auth(&self.user, Some(&self.password));
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = ?e, url = %url, "Request failed before a response arrived");
            e
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(status, url = %url, bytes = body.len(), "Received response");
        Ok(HttpResponse { status, headers, body })
    }
}
