//! Integration tests for the fetch phase against a mock HTTP server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INDEX_HTML: &str = r#"
<html><body>
    <h2>General</h2>
    <a href="/docs/a.pdf">Document A</a>
    <h2>Safety</h2>
    <a href="/docs/missing.pdf">Missing Document</a>
</body></html>
"#;

#[tokio::test]
async fn fetch_all_records_success_and_failure_without_aborting() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200).set_body_string(INDEX_HTML))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/a.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 fake content".to_vec()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = reqwest::Client::new();
    let index_url = format!("{}/index", server.uri());

    let documents = unirag_ingest::fetcher::fetch_all(&client, &index_url, dir.path(), 0).await.unwrap();

    assert_eq!(documents.len(), 2);

    let ok_doc = documents.iter().find(|d| d.source_url.ends_with("a.pdf")).unwrap();
    assert!(ok_doc.downloaded);
    assert!(ok_doc.download_error.is_none());
    assert!(dir.path().join(&ok_doc.category.to_string()).join(&ok_doc.filename).exists());

    let failed_doc = documents.iter().find(|d| d.source_url.ends_with("missing.pdf")).unwrap();
    assert!(!failed_doc.downloaded);
    assert!(failed_doc.download_error.is_some());
}

#[tokio::test]
async fn fetch_all_skips_download_when_file_already_present() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200).set_body_string(INDEX_HTML))
        .mount(&server)
        .await;

    // The missing-document mock is intentionally absent: if a second
    // download were attempted for the already-present file, the test
    // server would 404 and the assertion below would fail.
    Mock::given(method("GET"))
        .and(path("/docs/a.pdf"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("general_operations")).unwrap();
    std::fs::write(dir.path().join("general_operations").join("Document A.pdf"), b"already here").unwrap();

    let client = reqwest::Client::new();
    let index_url = format!("{}/index", server.uri());

    let documents = unirag_ingest::fetcher::fetch_all(&client, &index_url, dir.path(), 0).await.unwrap();

    let doc_a = documents.iter().find(|d| d.source_url.ends_with("a.pdf")).unwrap();
    assert!(doc_a.downloaded);
    assert!(doc_a.download_error.is_none());
}
