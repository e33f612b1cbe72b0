//! # filestore: request builder for the UI5 repository filestore
//!
//! [`FileStore`] knows the URL layout, query parameters and headers of every
//! filestore operation and classifies the answers. It holds no mutable state:
//! the anti-forgery token and cookie live in a [`Credentials`] value owned by
//! the run's [`crate::session::Session`] and are passed into every mutating
//! call.
//!
//! ## Status handling
//! - 401 / 403 become [`SyncError::AuthRejected`].
//! - Any other non-2xx status and every transport failure become
//!   [`SyncError::RemoteUnavailable`].
//! - 404 on listing and metadata probes is returned as "absent" instead.
//! - Container creation answers other than 201 / 405 become
//!   [`SyncError::ProvisionFailed`].

use tracing::{debug, error, info};

use crate::atom::{parse_feed, FeedEntry};
use crate::config::FilestoreConfig;
use crate::contract::{HttpRequest, HttpResponse, Method, Transport};
use crate::error::{Result, SyncError};
use crate::path::{encode_component, split_parent};

const FILESTORE_BASE_PATH: &str = "/sap/bc/adt/filestore/ui5-bsp/objects";
const APP_INDEX_PATH: &str = "/sap/bc/adt/filestore/ui5-bsp/appindex";

const STATUS_OK: u16 = 200;
const STATUS_CREATED: u16 = 201;
const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_FORBIDDEN: u16 = 403;
const STATUS_NOT_FOUND: u16 = 404;
const STATUS_NOT_ALLOWED: u16 = 405;

/// Anti-forgery token and session cookie required by mutating calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub csrf_token: String,
    pub cookie: String,
}

/// Outcome of a container creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerCreation {
    Created,
    AlreadyExists,
}

pub struct FileStore<T: Transport> {
    config: FilestoreConfig,
    transport: T,
}

impl<T: Transport> FileStore<T> {
    pub fn new(config: FilestoreConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &FilestoreConfig {
        &self.config
    }

    pub fn container(&self) -> &str {
        &self.config.container
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn server(&self) -> &str {
        self.config.server.trim_end_matches('/')
    }

    fn base_url(&self) -> String {
        format!("{}{}", self.server(), FILESTORE_BASE_PATH)
    }

    /// `<base>/enc(container)enc(path)/content`, the address of an entity below the container.
    fn content_url(&self, path: &str) -> String {
        format!(
            "{}/{}{}/content",
            self.base_url(),
            encode_component(&self.config.container),
            encode_component(path)
        )
    }

    /// Appends encoded query parameters, plus `sap-language` when configured.
    fn with_query(&self, url: String, params: &[(&str, &str)]) -> String {
        let mut pairs: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, encode_component(value)))
            .collect();
        if let Some(language) = self.config.language.as_deref().filter(|l| !l.is_empty()) {
            pairs.push(format!(
                "sap-language={}",
                encode_component(&language.to_uppercase())
            ));
        }

        if pairs.is_empty() {
            url
        } else {
            format!("{}?{}", url, pairs.join("&"))
        }
    }

    fn transport_param(&self) -> Option<(&str, &str)> {
        self.config
            .transport
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| ("corrNr", t))
    }

    fn mutating_request(&self, method: Method, url: String, credentials: &Credentials) -> HttpRequest {
        HttpRequest::new(method, url)
            .header("X-CSRF-Token", credentials.csrf_token.clone())
            .header("Content-Type", "application/octet-stream")
            .header("Accept-Language", "en-EN")
            .header("Accept", "*/*")
            .header("Cookie", credentials.cookie.clone())
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method;
        let url = request.url.clone();
        debug!(method = method.as_str(), url = %url, "Sending filestore request");

        match self.transport.send(request).await {
            Ok(response) => {
                debug!(method = method.as_str(), url = %url, status = response.status, "Filestore response");
                Ok(response)
            }
            Err(e) => {
                error!(method = method.as_str(), url = %url, error = %e, "Transport failure");
                Err(SyncError::RemoteUnavailable(format!(
                    "{} {} failed: {}",
                    method.as_str(),
                    url,
                    e
                )))
            }
        }
    }

    /// Fetches a fresh anti-forgery token and the session cookie.
    pub async fn fetch_token(&self) -> Result<Credentials> {
        let url = self.with_query(self.base_url(), &[]);
        let request = HttpRequest::new(Method::Get, url.clone())
            .header("X-CSRF-Token", "Fetch")
            .header("Connection", "keep-alive")
            .header("Accept", "*/*");

        let response = self.send(request).await?;
        if response.status != STATUS_OK {
            return Err(classify(Method::Get, &url, &response));
        }

        let csrf_token = match response.header("x-csrf-token") {
            Some(token) if !token.is_empty() && !token.eq_ignore_ascii_case("required") => {
                token.to_string()
            }
            _ => {
                return Err(SyncError::AuthRejected {
                    url,
                    status: response.status,
                    message: "no anti-forgery token in response".to_string(),
                })
            }
        };
        let cookie = cookie_header(&response);

        info!("Fetched anti-forgery token");
        Ok(Credentials { csrf_token, cookie })
    }

    /// Probes the container's metadata. `false` means the container does not exist.
    pub async fn container_exists(&self) -> Result<bool> {
        let url = self.with_query(
            format!(
                "{}/{}",
                self.base_url(),
                encode_component(&self.config.container)
            ),
            &[],
        );
        let response = self.send(HttpRequest::new(Method::Get, url.clone())).await?;

        match response.status {
            STATUS_NOT_FOUND => Ok(false),
            _ if response.is_success() => Ok(true),
            _ => Err(classify(Method::Get, &url, &response)),
        }
    }

    /// Lists the direct children of a folder given its raw filestore id.
    ///
    /// Returns `None` when the folder does not exist.
    pub async fn list_folder(&self, raw_folder_id: &str) -> Result<Option<Vec<FeedEntry>>> {
        let url = self.with_query(
            format!("{}/{}/content", self.base_url(), encode_component(raw_folder_id)),
            &[],
        );
        let response = self.send(HttpRequest::new(Method::Get, url.clone())).await?;

        match response.status {
            STATUS_NOT_FOUND => Ok(None),
            STATUS_OK => Ok(Some(parse_feed(&response.text()))),
            _ => Err(classify(Method::Get, &url, &response)),
        }
    }

    /// Creates the root container. 405 means it already exists.
    pub async fn create_container(&self, credentials: &Credentials) -> Result<ContainerCreation> {
        let mut params = vec![
            ("type", "folder"),
            ("isBinary", "false"),
            ("name", self.config.container.as_str()),
            ("description", self.config.container_description.as_str()),
            ("devclass", self.config.package.as_str()),
        ];
        params.extend(self.transport_param());
        let url = self.with_query(format!("{}/%20/content", self.base_url()), &params);

        let request = self.mutating_request(Method::Post, url, credentials);
        let response = self.send(request).await?;

        match response.status {
            STATUS_CREATED => Ok(ContainerCreation::Created),
            STATUS_NOT_ALLOWED => Ok(ContainerCreation::AlreadyExists),
            status => Err(SyncError::ProvisionFailed {
                container: self.config.container.clone(),
                message: format!("status {}: {}", status, excerpt(&response)),
            }),
        }
    }

    pub async fn create_folder(&self, credentials: &Credentials, id: &str) -> Result<()> {
        let (parent, name) = split_parent(id);
        let mut params = vec![
            ("type", "folder"),
            ("isBinary", "false"),
            ("name", name),
            ("devclass", self.config.package.as_str()),
        ];
        params.extend(self.transport_param());
        let url = self.with_query(self.content_url(parent), &params);

        let request = self.mutating_request(Method::Post, url, credentials);
        self.expect_success(request).await
    }

    /// Deletes a folder together with everything below it.
    pub async fn delete_folder(&self, credentials: &Credentials, id: &str) -> Result<()> {
        let mut params = vec![("deleteChildren", "true")];
        params.extend(self.transport_param());
        let url = self.with_query(self.content_url(id), &params);

        let request = self
            .mutating_request(Method::Delete, url, credentials)
            .header("If-Match", "*");
        self.expect_success(request).await
    }

    pub async fn create_file(
        &self,
        credentials: &Credentials,
        id: &str,
        content: Vec<u8>,
        binary: bool,
    ) -> Result<()> {
        let (parent, name) = split_parent(id);
        let binary = binary.to_string();
        let mut params = vec![
            ("type", "file"),
            ("isBinary", binary.as_str()),
            ("name", name),
            ("devclass", self.config.package.as_str()),
            ("charset", "UTF-8"),
        ];
        params.extend(self.transport_param());
        let url = self.with_query(self.content_url(parent), &params);

        let request = self
            .mutating_request(Method::Post, url, credentials)
            .body(non_empty(content));
        self.expect_success(request).await
    }

    /// Replaces a file's content regardless of its current revision.
    pub async fn update_file(
        &self,
        credentials: &Credentials,
        id: &str,
        content: Vec<u8>,
        binary: bool,
    ) -> Result<()> {
        let binary = binary.to_string();
        let mut params = vec![("isBinary", binary.as_str()), ("charset", "UTF-8")];
        params.extend(self.transport_param());
        let url = self.with_query(self.content_url(id), &params);

        let request = self
            .mutating_request(Method::Put, url, credentials)
            .header("If-Match", "*")
            .body(non_empty(content));
        self.expect_success(request).await
    }

    pub async fn delete_file(&self, credentials: &Credentials, id: &str) -> Result<()> {
        let params: Vec<(&str, &str)> = self.transport_param().into_iter().collect();
        let url = self.with_query(self.content_url(id), &params);

        let request = self
            .mutating_request(Method::Delete, url, credentials)
            .header("If-Match", "*");
        self.expect_success(request).await
    }

    /// Asks the server to recalculate the application index of the container.
    pub async fn recalculate_index(&self, credentials: &Credentials) -> Result<()> {
        let url = self.with_query(
            format!(
                "{}{}/{}",
                self.server(),
                APP_INDEX_PATH,
                encode_component(&self.config.container)
            ),
            &[],
        );
        let request = self.mutating_request(Method::Post, url.clone(), credentials);
        let response = self.send(request).await?;

        if response.status == STATUS_OK {
            Ok(())
        } else {
            Err(classify(Method::Post, &url, &response))
        }
    }

    async fn expect_success(&self, request: HttpRequest) -> Result<()> {
        let method = request.method;
        let url = request.url.clone();
        let response = self.send(request).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(classify(method, &url, &response))
        }
    }
}

/// Maps a non-success response to the matching error kind.
fn classify(method: Method, url: &str, response: &HttpResponse) -> SyncError {
    match response.status {
        STATUS_UNAUTHORIZED | STATUS_FORBIDDEN => SyncError::AuthRejected {
            url: url.to_string(),
            status: response.status,
            message: excerpt(response),
        },
        status => SyncError::RemoteUnavailable(format!(
            "{} {} returned status {}: {}",
            method.as_str(),
            url,
            status,
            excerpt(response)
        )),
    }
}

fn excerpt(response: &HttpResponse) -> String {
    let text = response.text();
    let trimmed = text.trim();
    match trimmed.char_indices().nth(200) {
        Some((index, _)) => format!("{}...", &trimmed[..index]),
        None => trimmed.to_string(),
    }
}

/// Joins the `name=value` part of every `Set-Cookie` header into one `Cookie` value.
fn cookie_header(response: &HttpResponse) -> String {
    response
        .header_values("set-cookie")
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The filestore rejects empty payloads, so empty files are sent as a single space.
fn non_empty(content: Vec<u8>) -> Vec<u8> {
    if content.is_empty() {
        b" ".to_vec()
    } else {
        content
    }
}
