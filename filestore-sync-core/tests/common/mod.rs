#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use filestore_sync_core::artifact::{Artifact, ArtifactKind};
use filestore_sync_core::config::FilestoreConfig;
use filestore_sync_core::contract::{HttpRequest, HttpResponse, Method, Transport, TransportError};
use filestore_sync_core::filestore::FileStore;
use filestore_sync_core::path::{decode_component, encode_component};

pub const SERVER: &str = "http://filestore.test";
pub const BASE: &str = "http://filestore.test/sap/bc/adt/filestore/ui5-bsp/objects";
pub const TOKEN: &str = "fake-token";
pub const COOKIE: &str = "SAP_SESSIONID=abc";

pub fn filestore_config(container: &str) -> FilestoreConfig {
    FilestoreConfig {
        server: format!("{SERVER}/"),
        container: container.to_string(),
        container_description: "Test application".to_string(),
        package: "$TMP".to_string(),
        transport: None,
        language: None,
    }
}

#[derive(Default)]
struct FakeState {
    container_exists: bool,
    /// Entities below the container keyed by local id (`/sub/a.txt`).
    entities: BTreeMap<String, (ArtifactKind, Vec<u8>)>,
    requests: Vec<HttpRequest>,
    mutations: usize,
    fail_mutation: Option<usize>,
    token_fetches: usize,
    index_status: u16,
    container_create_status: Option<u16>,
}

/// In-memory filestore enforcing the real structural rules: parents must
/// exist before children are created and folders are removed with their
/// descendants only when `deleteChildren=true`.
#[derive(Clone)]
pub struct FakeFilestore {
    container: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeFilestore {
    pub fn new(container: &str) -> Self {
        let state = FakeState {
            index_status: 200,
            ..Default::default()
        };
        Self {
            container: container.to_string(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_container(self) -> Self {
        self.state.lock().unwrap().container_exists = true;
        self
    }

    pub fn with_folder(self, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .entities
            .insert(id.to_string(), (ArtifactKind::Folder, Vec::new()));
        self
    }

    pub fn with_file(self, id: &str, content: &[u8]) -> Self {
        self.state
            .lock()
            .unwrap()
            .entities
            .insert(id.to_string(), (ArtifactKind::File, content.to_vec()));
        self
    }

    /// Makes the n-th (1-based) entity mutation answer with a 500.
    pub fn fail_mutation(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_mutation = Some(n);
        self
    }

    /// Answers container creation with `status` instead of creating it.
    pub fn reject_container_creation(self, status: u16) -> Self {
        self.state.lock().unwrap().container_create_status = Some(status);
        self
    }

    pub fn index_status(self, status: u16) -> Self {
        self.state.lock().unwrap().index_status = status;
        self
    }

    pub fn store(&self) -> FileStore<FakeFilestore> {
        FileStore::new(filestore_config(&self.container), self.clone())
    }

    pub fn container_exists(&self) -> bool {
        self.state.lock().unwrap().container_exists
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.state
            .lock()
            .unwrap()
            .entities
            .iter()
            .map(|(id, (kind, _))| Artifact {
                kind: *kind,
                id: id.clone(),
            })
            .collect()
    }

    pub fn content(&self, id: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .entities
            .get(id)
            .map(|(_, content)| content.clone())
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn mutating_requests(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != Method::Get)
            .collect()
    }

    pub fn token_fetches(&self) -> usize {
        self.state.lock().unwrap().token_fetches
    }

    /// Raw id as the server reports it: lower-case escaped slashes between escaped segments.
    fn raw_id(&self, id: &str) -> String {
        let mut raw = encode_component(&self.container).replace("%2F", "%2f");
        for segment in id.split('/').filter(|s| !s.is_empty()) {
            raw.push_str("%2f");
            raw.push_str(&encode_component(segment));
        }
        raw
    }

    /// Local id addressed by a decoded `container + path` string, `""` for the container.
    fn local_id(&self, decoded: &str) -> Option<String> {
        decoded.strip_prefix(&self.container).map(|rest| rest.to_string())
    }

    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        let (path, query) = split_url(&request.url);
        let query = parse_query(query);

        if request.method == Method::Get {
            return self.handle_read(path, request);
        }

        if request.header_value("X-CSRF-Token") != Some(TOKEN)
            || request.header_value("Cookie") != Some(COOKIE)
        {
            return HttpResponse::new(403).with_body("CSRF token validation failed");
        }

        if let Some(rest) = path.strip_prefix(&format!("{SERVER}/sap/bc/adt/filestore/ui5-bsp/appindex/")) {
            if decode_component(rest) != self.container {
                return HttpResponse::new(404);
            }
            let status = self.state.lock().unwrap().index_status;
            return HttpResponse::new(status);
        }

        let entity = match path.strip_prefix(BASE).and_then(|p| p.strip_prefix('/')) {
            Some(entity) => entity,
            None => return HttpResponse::new(400),
        };

        if entity == "%20/content" {
            let mut state = self.state.lock().unwrap();
            if query.get("name").map(String::as_str) != Some(self.container.as_str()) {
                return HttpResponse::new(400);
            }
            if let Some(status) = state.container_create_status {
                return HttpResponse::new(status).with_body("creation rejected");
            }
            if state.container_exists {
                return HttpResponse::new(405);
            }
            state.container_exists = true;
            return HttpResponse::new(201);
        }

        let target = match entity.strip_suffix("/content") {
            Some(target) => decode_component(target),
            None => return HttpResponse::new(400),
        };
        let id = match self.local_id(&target) {
            Some(id) => id,
            None => return HttpResponse::new(404),
        };

        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        if state.fail_mutation == Some(state.mutations) {
            return HttpResponse::new(500).with_body("injected failure");
        }
        if !state.container_exists {
            return HttpResponse::new(404);
        }

        match request.method {
            Method::Post => {
                let name = match query.get("name") {
                    Some(name) => name.clone(),
                    None => return HttpResponse::new(400),
                };
                if !id.is_empty() && !matches!(state.entities.get(&id), Some((ArtifactKind::Folder, _))) {
                    return HttpResponse::new(404).with_body("parent folder missing");
                }
                let child = format!("{id}/{name}");
                if state.entities.contains_key(&child) {
                    return HttpResponse::new(405);
                }
                let kind = match query.get("type").map(String::as_str) {
                    Some("folder") => ArtifactKind::Folder,
                    Some("file") => ArtifactKind::File,
                    _ => return HttpResponse::new(400),
                };
                let body = request.body.clone().unwrap_or_default();
                if kind == ArtifactKind::File && body.is_empty() {
                    return HttpResponse::new(400).with_body("empty payload");
                }
                state.entities.insert(child, (kind, body));
                HttpResponse::new(201)
            }
            Method::Put => match state.entities.get_mut(&id) {
                Some((ArtifactKind::File, content)) => {
                    *content = request.body.clone().unwrap_or_default();
                    HttpResponse::new(200)
                }
                _ => HttpResponse::new(404),
            },
            Method::Delete => match state.entities.get(&id).map(|(kind, _)| *kind) {
                Some(ArtifactKind::File) => {
                    state.entities.remove(&id);
                    HttpResponse::new(200)
                }
                Some(ArtifactKind::Folder) => {
                    let prefix = format!("{id}/");
                    let has_children = state.entities.keys().any(|k| k.starts_with(&prefix));
                    if has_children && query.get("deleteChildren").map(String::as_str) != Some("true") {
                        return HttpResponse::new(400).with_body("folder not empty");
                    }
                    state.entities.retain(|k, _| k != &id && !k.starts_with(&prefix));
                    HttpResponse::new(200)
                }
                None => HttpResponse::new(404),
            },
            Method::Get => unreachable!(),
        }
    }

    fn handle_read(&self, path: &str, request: &HttpRequest) -> HttpResponse {
        if path == BASE {
            if request.header_value("X-CSRF-Token") == Some("Fetch") {
                self.state.lock().unwrap().token_fetches += 1;
                return HttpResponse::new(200)
                    .with_header("x-csrf-token", TOKEN)
                    .with_header("set-cookie", format!("{COOKIE}; path=/; secure"));
            }
            return HttpResponse::new(200);
        }

        let entity = match path.strip_prefix(BASE).and_then(|p| p.strip_prefix('/')) {
            Some(entity) => entity,
            None => return HttpResponse::new(400),
        };
        let state = self.state.lock().unwrap();

        match entity.strip_suffix("/content") {
            Some(folder) => {
                // The walker addresses folders by their raw id, encoded once more.
                let raw = decode_component(folder);
                if !state.container_exists {
                    return HttpResponse::new(404);
                }
                let id = if raw == self.container || raw == self.raw_id("") {
                    String::new()
                } else {
                    match state.entities.iter().find(|(id, _)| self.raw_id(id) == raw) {
                        Some((id, (ArtifactKind::Folder, _))) => id.clone(),
                        _ => return HttpResponse::new(404),
                    }
                };
                let prefix = format!("{id}/");
                let mut feed = String::from(
                    r#"<?xml version="1.0" encoding="utf-8"?><atom:feed xmlns:atom="http://www.w3.org/2005/Atom">"#,
                );
                for (child, (kind, _)) in state.entities.iter() {
                    let direct = child
                        .strip_prefix(&prefix)
                        .map(|rest| !rest.contains('/'))
                        .unwrap_or(false);
                    if !direct {
                        continue;
                    }
                    let term = match kind {
                        ArtifactKind::File => "file",
                        ArtifactKind::Folder => "folder",
                    };
                    feed.push_str(&format!(
                        r#"<atom:entry><atom:category term="{}"/><atom:id>{}</atom:id><atom:title>{}</atom:title></atom:entry>"#,
                        term,
                        self.raw_id(child),
                        child.rsplit('/').next().unwrap_or_default()
                    ));
                }
                feed.push_str("</atom:feed>");
                HttpResponse::new(200).with_body(feed)
            }
            None => {
                if decode_component(entity) == self.container && state.container_exists {
                    HttpResponse::new(200)
                } else {
                    HttpResponse::new(404)
                }
            }
        }
    }
}

#[async_trait]
impl Transport for FakeFilestore {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self.handle(&request);
        self.state.lock().unwrap().requests.push(request);
        Ok(response)
    }
}

fn split_url(url: &str) -> (&str, &str) {
    match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    }
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.to_string(), decode_component(value)))
        .collect()
}

/// Sorted copy, for order-insensitive comparisons.
pub fn sorted(mut artifacts: Vec<Artifact>) -> Vec<Artifact> {
    artifacts.sort();
    artifacts
}
