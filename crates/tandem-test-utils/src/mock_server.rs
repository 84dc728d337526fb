//! HTTP mock servers for the PyPI JSON API, the GitHub contents API and the
//! name-mapping table.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock PyPI JSON API.
///
/// Projects live under `/pypi/{name}/json`, files under `/files/{filename}`.
#[derive(Debug)]
pub struct MockPyPi {
    server: MockServer,
}

impl MockPyPi {
    /// Start a new mock index.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the JSON API, with a trailing slash.
    #[must_use]
    pub fn index_url(&self) -> String {
        format!("{}/pypi/", self.server.uri())
    }

    /// Download URL of a file.
    #[must_use]
    pub fn file_url(&self, filename: &str) -> String {
        format!("{}/files/{filename}", self.server.uri())
    }

    /// Underlying server, for custom mocks.
    #[must_use]
    pub const fn server(&self) -> &MockServer {
        &self.server
    }

    fn file_entry(&self, filename: &str) -> Value {
        json!({
            "filename": filename,
            "url": self.file_url(filename),
            "packagetype": if filename.ends_with(".whl") { "bdist_wheel" } else { "sdist" },
            "size": 1024 + filename.len(),
            "digests": { "sha256": format!("{:064x}", filename.len()) },
            "yanked": false
        })
    }

    /// Register a project.
    ///
    /// `releases` lists each version with its filenames, oldest first; the
    /// last one is reported as the latest version and carries `requires`.
    pub async fn register_project(
        &self,
        name: &str,
        releases: &[(&str, &[&str])],
        requires: &[&str],
    ) {
        let mut release_map = Map::new();
        for (version, files) in releases {
            let entries: Vec<Value> = files.iter().map(|f| self.file_entry(f)).collect();
            release_map.insert((*version).to_string(), Value::Array(entries));
        }
        let latest = releases.last().map_or("0", |(v, _)| *v);
        let body = json!({
            "info": {
                "name": name,
                "version": latest,
                "requires_dist": if requires.is_empty() { Value::Null } else { json!(requires) }
            },
            "releases": release_map
        });
        self.register_project_json(name, body).await;
    }

    /// Register a raw project document.
    pub async fn register_project_json(&self, name: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/pypi/{name}/json")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Register the `Requires-Dist` of a non-latest version.
    pub async fn register_version(&self, name: &str, version: &str, requires: &[&str]) {
        Mock::given(method("GET"))
            .and(path(format!("/pypi/{name}/{version}/json")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "info": {
                    "name": name,
                    "version": version,
                    "requires_dist": requires
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Register a 404 for a project.
    pub async fn register_not_found(&self, name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/pypi/{name}/json")))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found"
            })))
            .mount(&self.server)
            .await;
    }

    /// Register a persistent server error for a project.
    pub async fn register_server_error(&self, name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/pypi/{name}/json")))
            .respond_with(ResponseTemplate::new(503))
            .mount(&self.server)
            .await;
    }
}

/// Mock GitHub REST API.
#[derive(Debug)]
pub struct MockGitHub {
    server: MockServer,
}

impl MockGitHub {
    /// Start a new mock API.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// API base URL, with a trailing slash.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("{}/", self.server.uri())
    }

    /// Register repository metadata.
    pub async fn register_repository(&self, owner: &str, repo: &str, default_branch: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{owner}/{repo}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "full_name": format!("{owner}/{repo}"),
                "default_branch": default_branch
            })))
            .mount(&self.server)
            .await;
    }

    /// Register a file at a reference, base64 encoded the way the contents
    /// API serves it.
    pub async fn register_file(
        &self,
        owner: &str,
        repo: &str,
        file: &str,
        reference: &str,
        content: &str,
    ) {
        let encoded = STANDARD.encode(content.as_bytes());
        // The API wraps the payload every 60 characters.
        let wrapped = encoded
            .as_bytes()
            .chunks(60)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect::<Vec<_>>()
            .join("\n");

        Mock::given(method("GET"))
            .and(path(format!("/repos/{owner}/{repo}/contents/{file}")))
            .and(query_param("ref", reference))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": file,
                "path": file,
                "encoding": "base64",
                "content": wrapped
            })))
            .mount(&self.server)
            .await;
    }
}

/// Mock name-mapping table host.
#[derive(Debug)]
pub struct MockMapping {
    server: MockServer,
}

impl MockMapping {
    /// Start a server serving `entries` at `/compressed_mapping.json`.
    ///
    /// A `None` value stands for a conda package with no PyPI counterpart.
    pub async fn start(entries: &[(&str, Option<&str>)]) -> Self {
        let server = MockServer::start().await;
        let table: Map<String, Value> = entries
            .iter()
            .map(|(conda, pypi)| ((*conda).to_string(), pypi.map_or(Value::Null, |p| json!(p))))
            .collect();
        Mock::given(method("GET"))
            .and(path("/compressed_mapping.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Object(table)))
            .mount(&server)
            .await;
        Self { server }
    }

    /// URL of the table.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}/compressed_mapping.json", self.server.uri())
    }
}
