//! Integration tests for the GitHub store against a mock HTTP server.
//!
//! These tests verify:
//! - Request shape (paths, query, headers, PUT body)
//! - Decoding of contents responses, including the blob fallback
//! - Mapping of HTTP statuses to store errors
//! - A full load, edit and publish through the pipeline

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tabledit::core::codec;
use tabledit::core::types::{RevisionMarker, StorePath};
use tabledit::dataset::Value;
use tabledit::pipeline::{PublishPipeline, PublishResult, RetryPolicy};
use tabledit::session::EditOperation;
use tabledit::store::github::GitHubStore;
use tabledit::store::{PushRequest, RemoteStore, StoreError};

const CONTENTS: &str = "/repos/acme/data/contents/data.csv";

fn store(server: &MockServer) -> GitHubStore {
    GitHubStore::new("acme", "data")
        .with_token("ghp_test_token")
        .with_branch("main")
        .with_api_base(server.uri())
}

fn data_path() -> StorePath {
    StorePath::new("data.csv").unwrap()
}

fn file_response(sha: &str, base64: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "type": "file",
        "name": "data.csv",
        "path": "data.csv",
        "sha": sha,
        "size": 17,
        "encoding": "base64",
        "content": base64,
    }))
}

fn put_response(sha: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "content": { "name": "data.csv", "sha": sha },
        "commit": {
            "sha": "c0ffee1234567890",
            "html_url": "https://github.com/acme/data/commit/c0ffee1234567890",
        },
    }))
}

fn push_request(expected: Option<&str>) -> PushRequest {
    PushRequest {
        path: data_path(),
        content: codec::encode(b"a\n1\n"),
        expected: expected.map(RevisionMarker::new),
        message: "Update data".to_string(),
    }
}

mod fetch {
    use super::*;

    #[tokio::test]
    async fn decodes_wrapped_content_and_uses_blob_sha() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CONTENTS))
            .and(query_param("ref", "main"))
            .and(header("authorization", "Bearer ghp_test_token"))
            .and(header("x-github-api-version", "2022-11-28"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(file_response("abc123", "aWQsdmFsCjEs\nMTAKMiwyMAo=\n"))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = store(&server).fetch(&data_path()).await.unwrap();
        assert_eq!(fetched.marker, RevisionMarker::new("abc123"));
        assert_eq!(
            codec::decode(&fetched.content).unwrap(),
            b"id,val\n1,10\n2,20\n"
        );
    }

    #[tokio::test]
    async fn anonymous_read_sends_no_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CONTENTS))
            .respond_with(file_response("abc123", "YQoxCg=="))
            .mount(&server)
            .await;

        let store = GitHubStore::new("acme", "data").with_api_base(server.uri());
        store.fetch(&data_path()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
        assert!(requests[0].url.query().is_none());
    }

    #[tokio::test]
    async fn large_file_falls_back_to_blob_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CONTENTS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "file",
                "sha": "big0001",
                "size": 2_000_000,
                "encoding": "none",
                "content": "",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/data/git/blobs/big0001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "big0001",
                "encoding": "base64",
                "content": "YQoxCg==",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = store(&server).fetch(&data_path()).await.unwrap();
        assert_eq!(fetched.marker.as_str(), "big0001");
        assert_eq!(codec::decode(&fetched.content).unwrap(), b"a\n1\n");
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CONTENTS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "dir",
                "sha": "d1r",
            })))
            .mount(&server)
            .await;

        let err = store(&server).fetch(&data_path()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn nested_paths_are_percent_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/data/contents/reports/q1%20sales.csv"))
            .respond_with(file_response("abc123", "YQoxCg=="))
            .expect(1)
            .mount(&server)
            .await;

        let nested = StorePath::new("reports/q1 sales.csv").unwrap();
        store(&server).fetch(&nested).await.unwrap();
    }
}

mod push {
    use super::*;

    #[tokio::test]
    async fn sends_sha_branch_and_content() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(CONTENTS))
            .and(header("authorization", "Bearer ghp_test_token"))
            .and(body_partial_json(json!({
                "message": "Update data",
                "content": "YQoxCg==",
                "sha": "abc123",
                "branch": "main",
            })))
            .respond_with(put_response("def456"))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = store(&server)
            .push(push_request(Some("abc123")))
            .await
            .unwrap();
        assert_eq!(receipt.marker, RevisionMarker::new("def456"));
        let commit = receipt.commit.unwrap();
        assert_eq!(commit.id, "c0ffee1234567890");
        assert!(commit.url.unwrap().ends_with("/commit/c0ffee1234567890"));
    }

    #[tokio::test]
    async fn create_only_push_omits_sha() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(CONTENTS))
            .respond_with(put_response("new001"))
            .mount(&server)
            .await;

        store(&server).push(push_request(None)).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("sha").is_none());
        assert_eq!(body["branch"], "main");
    }

    #[tokio::test]
    async fn requires_token() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(put_response("x"))
            .expect(0)
            .mount(&server)
            .await;

        let anonymous = GitHubStore::new("acme", "data").with_api_base(server.uri());
        let err = anonymous.push(push_request(Some("abc"))).await.unwrap_err();
        assert_eq!(err, StoreError::AuthRequired);
    }

    #[tokio::test]
    async fn stale_sha_is_a_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(CONTENTS))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": "data.csv does not match abc123",
            })))
            .mount(&server)
            .await;

        let err = store(&server)
            .push(push_request(Some("abc123")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(m) if m.contains("does not match")));
    }

    #[tokio::test]
    async fn create_over_existing_file_is_a_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(CONTENTS))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Invalid request.\n\n\"sha\" wasn't supplied.",
            })))
            .mount(&server)
            .await;

        let err = store(&server).push(push_request(None)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}

mod status_mapping {
    use super::*;

    async fn fetch_with(response: ResponseTemplate) -> StoreError {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CONTENTS))
            .respond_with(response)
            .mount(&server)
            .await;
        store(&server).fetch(&data_path()).await.unwrap_err()
    }

    #[tokio::test]
    async fn unauthorized() {
        let err = fetch_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
        )
        .await;
        assert!(matches!(err, StoreError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn forbidden_with_exhausted_quota_is_rate_limited() {
        let err = fetch_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .set_body_json(json!({"message": "API rate limit exceeded"})),
        )
        .await;
        assert_eq!(err, StoreError::RateLimited);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn forbidden_otherwise_names_required_permission() {
        let err = fetch_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "4999")
                .insert_header("x-accepted-github-permissions", "contents=read")
                .set_body_json(json!({"message": "Resource not accessible"})),
        )
        .await;
        match err {
            StoreError::PermissionDenied(message) => {
                assert!(message.contains("[required: contents=read]"));
            }
            other => panic!("expected PermissionDenied, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn not_found() {
        let err = fetch_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})),
        )
        .await;
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn too_many_requests() {
        let err = fetch_with(ResponseTemplate::new(429)).await;
        assert_eq!(err, StoreError::RateLimited);
    }

    #[tokio::test]
    async fn server_error_is_retryable_with_unknown_outcome() {
        let err = fetch_with(ResponseTemplate::new(502).set_body_string("bad gateway")).await;
        assert!(matches!(err, StoreError::Api { status: 502, .. }));
        assert!(err.is_retryable());
        assert!(err.outcome_unknown());
    }
}

#[tokio::test]
async fn pipeline_round_trip_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(file_response("sha-m1", "aWQsdmFsCjEsMTAKMiwyMAo="))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS))
        .and(body_partial_json(json!({
            "sha": "sha-m1",
            "content": "aWQsdmFsCjEsOTkKMiwyMAo=",
            "message": "Set val",
        })))
        .respond_with(put_response("sha-m2"))
        .expect(1)
        .mount(&server)
        .await;

    let mut pipeline = PublishPipeline::new(Arc::new(store(&server))).with_retry(RetryPolicy::none());
    pipeline.load(data_path()).await.unwrap();
    pipeline
        .apply(EditOperation::set_cell(0, "val", Value::Integer(99)))
        .unwrap();

    match pipeline.publish("Set val").await {
        PublishResult::Published(receipt) => {
            assert_eq!(receipt.marker.as_str(), "sha-m2");
            assert!(!receipt.reconciled);
        }
        other => panic!("expected Published, got {:?}", other),
    }
}

#[tokio::test]
async fn pipeline_retries_server_errors_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(file_response("sha-m1", "YQoxCg=="))
        .mount(&server)
        .await;

    let mut pipeline = PublishPipeline::new(Arc::new(store(&server))).with_retry(RetryPolicy {
        max_retries: 2,
        backoff_base_ms: 1,
    });
    pipeline.load(data_path()).await.unwrap();
    assert_eq!(pipeline.marker().unwrap().as_str(), "sha-m1");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
