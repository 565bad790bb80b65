//! Runway mock API integration tests.
//!
//! Drives `RunwayProvider` against a local mock server.

use runwayviz::{
    GenerationRequest, RunwayProvider, RunwayVizError, TaskStatus, TimeoutPolicy, VideoModel,
    VideoTaskProvider,
};
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "key_test";
const TASK_ID: &str = "17f20503-6c24-4c16-946b-35dbbce2af2f";
const VIDEO_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42fake-video";

fn provider(server: &MockServer) -> RunwayProvider {
    RunwayProvider::builder()
        .api_key(API_KEY)
        .base_url(server.uri())
        .poll_interval(Duration::from_millis(5))
        .build()
        .expect("Failed to build provider")
}

fn status_body(status: &str) -> serde_json::Value {
    json!({ "id": TASK_ID, "status": status })
}

async fn mount_download(server: &MockServer, expected: u64) -> String {
    Mock::given(method("GET"))
        .and(path("/files/video.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(VIDEO_BYTES, "video/mp4"))
        .expect(expected)
        .mount(server)
        .await;
    format!("{}/files/video.mp4", server.uri())
}

#[tokio::test]
async fn test_submit_sends_one_request_and_returns_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/image_to_video"))
        .and(header("authorization", "Bearer key_test"))
        .and(header("x-runway-version", "2024-11-06"))
        .and(body_json(json!({
            "model": "gen3a_turbo",
            "prompt_text": "A cat",
            "duration": 5,
            "ratio": "16:9",
            "resolution": "720p"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": TASK_ID })))
        .expect(1)
        .mount(&server)
        .await;

    let task_id = provider(&server)
        .submit(&GenerationRequest::new("A cat"))
        .await
        .expect("submit failed");

    assert_eq!(task_id, TASK_ID);
}

#[tokio::test]
async fn test_submit_includes_optional_fields_when_present() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/image_to_video"))
        .and(body_json(json!({
            "model": "gen4_turbo",
            "prompt_text": "Animate this",
            "duration": 10,
            "ratio": "16:9",
            "resolution": "720p",
            "prompt_image": "https://example.com/photo.jpg",
            "seed": 1234
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": TASK_ID })))
        .expect(1)
        .mount(&server)
        .await;

    let request = GenerationRequest::new("Animate this")
        .with_model(VideoModel::HighQuality)
        .with_duration(10)
        .with_source_image("https://example.com/photo.jpg")
        .with_seed(1234);
    let task_id = provider(&server).submit(&request).await.unwrap();
    assert_eq!(task_id, TASK_ID);
}

#[tokio::test]
async fn test_missing_credential_makes_no_network_call() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = RunwayProvider::builder()
        .api_key_env("RUNWAYVIZ_TEST_KEY_THAT_IS_NEVER_SET")
        .base_url(server.uri())
        .build()
        .unwrap();

    let err = provider
        .submit(&GenerationRequest::new("A cat"))
        .await
        .unwrap_err();
    assert!(matches!(err, RunwayVizError::Configuration(_)));
    assert!(err.to_string().contains("provider credential not configured"));

    let err = provider.await_completion(TASK_ID).await.unwrap_err();
    assert!(matches!(err, RunwayVizError::Configuration(_)));

    let err = provider.cancel(TASK_ID).await.unwrap_err();
    assert!(matches!(err, RunwayVizError::Configuration(_)));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_request_makes_no_network_call() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = provider(&server)
        .submit(&GenerationRequest::new("A cat").with_duration(7))
        .await
        .unwrap_err();
    assert!(matches!(err, RunwayVizError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_submit_provider_error_carries_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/image_to_video"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid prompt_text" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server)
        .submit(&GenerationRequest::new("A cat"))
        .await
        .unwrap_err();
    match err {
        RunwayVizError::Provider { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid prompt_text");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_submit_provider_error_falls_back_to_status_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/image_to_video"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = provider(&server)
        .submit(&GenerationRequest::new("A cat"))
        .await
        .unwrap_err();
    match err {
        RunwayVizError::Provider { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(RunwayVizError::Provider {
        status: 500,
        message: String::new()
    }
    .is_retryable());
}

#[tokio::test]
async fn test_succeeds_on_fifth_poll_with_one_download() {
    let server = MockServer::start().await;
    let video_url = mount_download(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .and(header("authorization", "Bearer key_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("RUNNING")))
        .up_to_n_times(4)
        .expect(4)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": TASK_ID,
            "status": "SUCCEEDED",
            "output": [video_url],
            "duration": 5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server);
    let result = provider.await_completion(TASK_ID).await.unwrap();

    assert_eq!(result.task_id, TASK_ID);
    assert_eq!(result.status, TaskStatus::Completed);
    assert!(result.is_success());
    assert_eq!(result.duration_secs, Some(5.0));
    assert!(result.error_message.is_none());

    let location = result.asset_location.expect("asset location");
    assert!(!location.as_str().is_empty());

    let asset = provider.assets().resolve(&location).expect("asset is live");
    assert_eq!(&*asset.data, VIDEO_BYTES);
    assert_eq!(asset.mime_type, "video/mp4");

    assert!(provider.assets().revoke(&location));
    assert!(provider.assets().resolve(&location).is_none());
}

#[tokio::test]
async fn test_waits_at_least_interval_between_polls() {
    let server = MockServer::start().await;
    let video_url = mount_download(&server, 1).await;
    let interval = Duration::from_millis(40);

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("PENDING")))
        .up_to_n_times(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCEEDED",
            "output": [video_url]
        })))
        .mount(&server)
        .await;

    let provider = RunwayProvider::builder()
        .api_key(API_KEY)
        .base_url(server.uri())
        .poll_interval(interval)
        .build()
        .unwrap();

    let start = Instant::now();
    let result = provider.await_completion(TASK_ID).await.unwrap();
    assert!(result.is_success());
    // Four polls, three gaps.
    assert!(start.elapsed() >= interval * 3);
}

#[tokio::test]
async fn test_always_running_times_out_after_100_polls() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("RUNNING")))
        .expect(100)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/tasks/{TASK_ID}/cancel")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = RunwayProvider::builder()
        .api_key(API_KEY)
        .base_url(server.uri())
        .poll_interval(Duration::from_millis(1))
        .build()
        .unwrap();

    let err = provider.await_completion(TASK_ID).await.unwrap_err();
    match err {
        RunwayVizError::Timeout { attempts, .. } => assert_eq!(attempts, 100),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(provider.assets().is_empty());
}

#[tokio::test]
async fn test_timeout_with_cancel_policy_cancels_task() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("RUNNING")))
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/tasks/{TASK_ID}/cancel")))
        .and(header("authorization", "Bearer key_test"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let provider = RunwayProvider::builder()
        .api_key(API_KEY)
        .base_url(server.uri())
        .poll_interval(Duration::from_millis(1))
        .max_attempts(3)
        .on_timeout(TimeoutPolicy::Cancel)
        .build()
        .unwrap();

    let err = provider.await_completion(TASK_ID).await.unwrap_err();
    assert!(matches!(err, RunwayVizError::Timeout { attempts: 3, .. }));
}

#[tokio::test]
async fn test_timeout_still_reported_when_cancel_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("RUNNING")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/tasks/{TASK_ID}/cancel")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let provider = RunwayProvider::builder()
        .api_key(API_KEY)
        .base_url(server.uri())
        .poll_interval(Duration::from_millis(1))
        .max_attempts(2)
        .on_timeout(TimeoutPolicy::Cancel)
        .build()
        .unwrap();

    let err = provider.await_completion(TASK_ID).await.unwrap_err();
    assert!(matches!(err, RunwayVizError::Timeout { attempts: 2, .. }));
}

#[tokio::test]
async fn test_failed_task_returns_failure_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": TASK_ID,
            "status": "FAILED",
            "failure": "bad prompt"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server);
    let result = provider.await_completion(TASK_ID).await.unwrap();

    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.error_message.as_deref(), Some("bad prompt"));
    assert!(result.asset_location.is_none());
    assert!(provider.assets().is_empty());
}

#[tokio::test]
async fn test_failed_task_without_reason_gets_generic_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("FAILED")))
        .mount(&server)
        .await;

    let result = provider(&server).await_completion(TASK_ID).await.unwrap();
    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(
        result.error_message.as_deref(),
        Some("video generation failed")
    );
}

#[tokio::test]
async fn test_poll_error_aborts_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(
            ResponseTemplate::new(502).set_body_json(json!({ "message": "upstream unavailable" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server).await_completion(TASK_ID).await.unwrap_err();
    match err {
        RunwayVizError::Provider { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_succeeded_without_output_is_unexpected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("SUCCEEDED")))
        .mount(&server)
        .await;

    let err = provider(&server).await_completion(TASK_ID).await.unwrap_err();
    assert!(matches!(err, RunwayVizError::UnexpectedResponse(_)));
}

#[tokio::test]
async fn test_download_failure_is_download_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/missing.mp4"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/files/missing.mp4", server.uri());
    let err = provider(&server).download_asset(&url).await.unwrap_err();
    match err {
        RunwayVizError::Download { status, .. } => assert_eq!(status, Some(404)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_download_asset_returns_bytes() {
    let server = MockServer::start().await;
    let url = mount_download(&server, 1).await;

    let data = provider(&server).download_asset(&url).await.unwrap();
    assert_eq!(data, VIDEO_BYTES);
}

#[tokio::test]
async fn test_cancel_posts_to_cancel_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/tasks/{TASK_ID}/cancel")))
        .and(header("x-runway-version", "2024-11-06"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    provider(&server).cancel(TASK_ID).await.unwrap();
}

#[tokio::test]
async fn test_cancel_failure_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/tasks/{TASK_ID}/cancel")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Task not found" })))
        .mount(&server)
        .await;

    let err = provider(&server).cancel(TASK_ID).await.unwrap_err();
    assert!(matches!(err, RunwayVizError::Provider { status: 404, .. }));
}

#[tokio::test]
async fn test_task_status_single_poll() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("RUNNING")))
        .expect(1)
        .mount(&server)
        .await;

    let task = provider(&server).task_status(TASK_ID).await.unwrap();
    assert_eq!(task.task_id, TASK_ID);
    assert_eq!(task.status, TaskStatus::Processing);
    assert_eq!(task.polls, 1);
}

#[tokio::test]
async fn test_generate_submits_polls_and_downloads() {
    let server = MockServer::start().await;
    let video_url = mount_download(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/image_to_video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": TASK_ID })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("PENDING")))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    // No reported duration: the request's duration is used.
    Mock::given(method("GET"))
        .and(path(format!("/tasks/{TASK_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCEEDED",
            "output": [video_url]
        })))
        .mount(&server)
        .await;

    let provider = provider(&server);
    let request = GenerationRequest::new("Ocean waves").with_duration(10);
    let result = provider.generate(&request).await.unwrap();

    assert!(result.is_success());
    assert_eq!(result.duration_secs, Some(10.0));
    assert_eq!(provider.assets().len(), 1);
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/organization"))
        .and(header("authorization", "Bearer key_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "creditBalance": 1000 })))
        .expect(1)
        .mount(&server)
        .await;

    provider(&server).health_check().await.unwrap();
}
