//! Metadata clients against mock servers.

use pretty_assertions::assert_eq;
use std::time::Duration;
use tandem_repository::{
    GitHubClient, GitHubConfig, HttpClientConfig, MappingClient, PyPiClient, PyPiConfig,
    RepositoryError,
};
use tandem_resolver::{
    FetchError, MappingSource, NameMapping, PackageFetcher, SourceFetcher, SourceReference,
};
use tandem_test_utils::fixtures::Fixtures;
use tandem_test_utils::mock_server::{MockGitHub, MockMapping, MockPyPi};

fn fast_http() -> HttpClientConfig {
    HttpClientConfig {
        max_retries: 2,
        retry_delay: Duration::from_millis(1),
        max_retry_delay: Duration::from_millis(5),
        rate_limit_per_host: 1000,
        ..HttpClientConfig::default()
    }
}

fn pypi_client(mock: &MockPyPi) -> PyPiClient {
    let mut config = PyPiConfig::new(&mock.index_url()).unwrap();
    config.http_config = fast_http();
    PyPiClient::with_config(config).unwrap()
}

fn github_client(mock: &MockGitHub) -> GitHubClient {
    let mut config = GitHubConfig::new(&mock.api_url(), None).unwrap();
    config.http_config = fast_http();
    GitHubClient::with_config(config).unwrap()
}

#[tokio::test]
async fn pypi_releases_skip_yanked_files() {
    let mock = MockPyPi::start().await;
    mock.register_project_json(
        "six",
        serde_json::json!({
            "info": {"name": "six", "version": "1.16.0", "requires_dist": null},
            "releases": {
                "1.15.0": [
                    {"filename": "six-1.15.0-py2.py3-none-any.whl", "url": "https://f/a.whl", "yanked": true}
                ],
                "1.16.0": [
                    {"filename": "six-1.16.0-py2.py3-none-any.whl", "url": "https://f/b.whl",
                     "size": 11053, "digests": {"sha256": "8abb"}, "yanked": false}
                ]
            }
        }),
    )
    .await;

    let client = pypi_client(&mock);
    let releases = client.fetch_releases("Six").await.unwrap();
    assert_eq!(releases.versions().collect::<Vec<_>>(), vec!["1.15.0", "1.16.0"]);
    assert!(releases.candidate("1.15.0").unwrap().artifacts.is_empty());
    let artifact = &releases.candidate("1.16.0").unwrap().artifacts[0];
    assert_eq!(artifact.sha256.as_deref(), Some("8abb"));
    assert_eq!(artifact.size, Some(11053));
    assert!(client.fetch_requires("six", "1.16.0").await.unwrap().is_empty());
}

#[tokio::test]
async fn pypi_requires_for_older_versions() {
    let mock = MockPyPi::start().await;
    mock.register_project(
        "requests",
        &[
            ("2.31.0", &["requests-2.31.0-py3-none-any.whl"]),
            ("2.32.3", &["requests-2.32.3-py3-none-any.whl"]),
        ],
        &["idna<4,>=2.5", "PySocks!=1.5.7,>=1.5.6; extra == 'socks'"],
    )
    .await;
    mock.register_version("requests", "2.31.0", &["idna<4,>=2.5", "urllib3<3,>=1.21.1"]).await;

    let client = pypi_client(&mock);
    let latest = client.fetch_requires("requests", "2.32.3").await.unwrap();
    assert_eq!(latest.len(), 2);
    let older = client.fetch_requires("requests", "2.31.0").await.unwrap();
    assert_eq!(older, vec!["idna<4,>=2.5", "urllib3<3,>=1.21.1"]);
}

#[tokio::test]
async fn pypi_not_found_is_structured() {
    let mock = MockPyPi::start().await;
    mock.register_not_found("nonexistent").await;
    let client = pypi_client(&mock);
    assert_eq!(
        client.fetch_releases("nonexistent").await.unwrap_err(),
        FetchError::NotFound {
            name: "nonexistent".into()
        }
    );
}

#[tokio::test]
async fn pypi_server_errors_are_transport_errors() {
    let mock = MockPyPi::start().await;
    mock.register_server_error("flaky").await;
    let client = pypi_client(&mock);
    let err = client.fetch_releases("flaky").await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }));
}

#[tokio::test]
async fn pypi_projects_are_cached() {
    let mock = MockPyPi::start().await;
    mock.register_project("idna", &[("3.7", &["idna-3.7-py3-none-any.whl"])], &[]).await;
    let client = pypi_client(&mock);
    client.fetch_releases("idna").await.unwrap();
    client.fetch_requires("idna", "3.7").await.unwrap();
    client.fetch_releases("IDNA").await.unwrap();
    let requests = mock.server().received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn github_source_uses_default_branch_and_pyproject() {
    let mock = MockGitHub::start().await;
    mock.register_repository("octo", "widgets", "main").await;
    mock.register_file(
        "octo",
        "widgets",
        "pyproject.toml",
        "main",
        &Fixtures::pyproject("widgets", Some("0.4.0"), &["attrs>=23"]),
    )
    .await;

    let client = github_client(&mock);
    let reference = SourceReference {
        owner: "octo".into(),
        repo: "widgets".into(),
        reference: None,
    };
    let meta = client.fetch_source(&reference).await.unwrap();
    assert_eq!(meta.name, "widgets");
    assert_eq!(meta.version, "0.4.0");
    assert_eq!(meta.requires, vec!["attrs>=23"]);
    assert_eq!(meta.filename, "widgets-main.tar.gz");
    assert_eq!(meta.url, "https://github.com/octo/widgets/archive/main.tar.gz");
}

#[tokio::test]
async fn github_falls_back_to_setup_cfg() {
    let mock = MockGitHub::start().await;
    mock.register_file(
        "dateutil",
        "dateutil",
        "setup.cfg",
        "v2.9.0",
        &Fixtures::setup_cfg("python-dateutil", "2.9.0", &["six >= 1.5"]),
    )
    .await;

    let client = github_client(&mock);
    let meta = client
        .resolve_source(&SourceReference {
            owner: "dateutil".into(),
            repo: "dateutil".into(),
            reference: Some("v2.9.0".into()),
        })
        .await
        .unwrap();
    assert_eq!(meta.name, "python-dateutil");
    assert_eq!(meta.version, "2.9.0");
    assert_eq!(meta.requires, vec!["six >= 1.5"]);
}

#[tokio::test]
async fn github_without_descriptor_fails() {
    let mock = MockGitHub::start().await;
    let client = github_client(&mock);
    let err = client.find_descriptor("octo", "empty", "main").await.unwrap_err();
    assert!(matches!(err, RepositoryError::NoDescriptor { .. }));
    assert!(err.to_string().contains("pyproject.toml, setup.cfg, setup.py"));
}

#[tokio::test]
async fn mapping_drops_null_entries() {
    let mock = MockMapping::start(&[
        ("pyyaml", Some("PyYAML")),
        ("libzlib", None),
        ("matplotlib-base", Some("matplotlib")),
    ])
    .await;
    let client = MappingClient::new(&mock.url(), fast_http()).unwrap();
    let table = client.fetch_mapping().await.unwrap();
    assert_eq!(table.len(), 2);

    let mapping = NameMapping::new();
    mapping.populate(&client).await;
    assert_eq!(mapping.secondary_name("matplotlib-base"), "matplotlib");
    assert_eq!(mapping.secondary_name("libzlib"), "libzlib");
}
