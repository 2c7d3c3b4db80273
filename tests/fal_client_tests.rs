//! Mock HTTP tests for FalClient.
//!
//! These tests cover:
//! - Request formatting (endpoint, auth header, payload)
//! - Queue polling and result extraction
//! - Error handling for vendor failures and timeouts

use std::time::Duration;

use longcat_studio::fal::{
    FalClient, FalError, FalSettings, GenerationStatus, QueueResponse, FAL_API_KEY_ENV,
};
use longcat_studio::generation::{FormInput, GenerationRequest, Upload};
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const T2V_PATH: &str = "/fal-ai/longcat-video/text-to-video/720p";
const I2V_PATH: &str = "/fal-ai/longcat-video/image-to-video/720p";
const STATUS_PATH: &str = "/fal-ai/longcat-video/requests/req-1/status";
const RESULT_PATH: &str = "/fal-ai/longcat-video/requests/req-1";

fn client(server: &MockServer) -> FalClient {
    FalClient::with_settings(
        "test-api-key".to_string(),
        FalSettings {
            base_url: server.uri(),
            poll_interval: Duration::from_millis(10),
            generation_timeout: Duration::from_secs(5),
            ..FalSettings::default()
        },
    )
    .unwrap()
}

fn text_request(prompt: &str) -> GenerationRequest {
    GenerationRequest::validate(&FormInput {
        prompt: prompt.to_string(),
        ..FormInput::default()
    })
    .unwrap()
}

async fn mount_queued(server: &MockServer, submit_path: &str) {
    Mock::given(method("POST"))
        .and(path(submit_path))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"request_id": "req-1"})),
        )
        .mount(server)
        .await;
}

async fn mount_completed(server: &MockServer, video_url: &str) {
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "COMPLETED"})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESULT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "video": {"url": video_url, "content_type": "video/mp4"},
            "seed": 42
        })))
        .mount(server)
        .await;
}

// === Client Creation Tests ===

#[test]
fn test_from_env_reads_fal_key() {
    let original = std::env::var(FAL_API_KEY_ENV).ok();

    std::env::set_var(FAL_API_KEY_ENV, "test-key-from-env");
    let client = FalClient::new().unwrap();
    assert_eq!(client.api_key(), "test-key-from-env");

    std::env::remove_var(FAL_API_KEY_ENV);
    let result = FalClient::new();
    assert!(
        matches!(result, Err(FalError::MissingApiKey)),
        "new() should fail with MissingApiKey when FAL_KEY is not set"
    );
    assert_eq!(
        FalError::MissingApiKey.to_string(),
        "Fal API key not found. Set the `FAL_KEY` environment variable."
    );

    if let Some(val) = original {
        std::env::set_var(FAL_API_KEY_ENV, val);
    }
}

// === Mock Server Tests ===

#[tokio::test]
async fn test_generate_text_to_video_sends_exact_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(T2V_PATH))
        .and(header("Authorization", "Key test-api-key"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(serde_json::json!({
            "prompt": "a red fox running through snow",
            "num_frames": 180,
            "guidance_scale": 4.0,
            "num_inference_steps": 40,
            "fps": 30
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"request_id": "req-1"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_completed(&mock_server, "https://fal.media/files/fox.mp4").await;

    let url = client(&mock_server)
        .generate(&text_request("a red fox running through snow"))
        .await
        .unwrap();

    assert_eq!(url, "https://fal.media/files/fox.mp4");
}

#[tokio::test]
async fn test_generate_includes_negative_prompt_when_set() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(T2V_PATH))
        .and(body_partial_json(serde_json::json!({
            "negative_prompt": "blurry, static",
            "num_frames": 300,
            "guidance_scale": 7.5,
            "num_inference_steps": 12
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"request_id": "req-1"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_completed(&mock_server, "https://fal.media/files/out.mp4").await;

    let request = GenerationRequest::validate(&FormInput {
        prompt: "waves".to_string(),
        negative_prompt: "blurry, static".to_string(),
        duration_secs: "10".to_string(),
        guidance_scale: "7.5".to_string(),
        num_inference_steps: "12".to_string(),
        ..FormInput::default()
    })
    .unwrap();

    assert!(client(&mock_server).generate(&request).await.is_ok());
}

#[tokio::test]
async fn test_generate_image_to_video_embeds_data_uri() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(I2V_PATH))
        .and(body_partial_json(serde_json::json!({
            "image_url": "data:image/jpeg;base64,AQID",
            "prompt": "the cat blinks"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"request_id": "req-1"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_completed(&mock_server, "https://fal.media/files/cat.mp4").await;

    let request = GenerationRequest::validate(&FormInput {
        mode: "image-to-video".to_string(),
        prompt: "the cat blinks".to_string(),
        image: Some(Upload::new("cat.jpg", vec![1, 2, 3])),
        ..FormInput::default()
    })
    .unwrap();

    let url = client(&mock_server).generate(&request).await.unwrap();
    assert_eq!(url, "https://fal.media/files/cat.mp4");
}

#[tokio::test]
async fn test_generate_waits_through_queue() {
    let mock_server = MockServer::start().await;
    mount_queued(&mock_server, T2V_PATH).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "IN_QUEUE", "queue_position": 3})),
        )
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "IN_PROGRESS"})),
        )
        .up_to_n_times(1)
        .with_priority(2)
        .mount(&mock_server)
        .await;
    mount_completed(&mock_server, "https://fal.media/files/late.mp4").await;

    let url = client(&mock_server)
        .generate(&text_request("slow one"))
        .await
        .unwrap();
    assert_eq!(url, "https://fal.media/files/late.mp4");

    let status_calls = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == STATUS_PATH)
        .count();
    assert_eq!(status_calls, 4);
}

#[tokio::test]
async fn test_generate_uses_returned_queue_urls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(T2V_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "request_id": "req-9",
            "status_url": format!("{}/custom/status", mock_server.uri()),
            "response_url": format!("{}/custom/result", mock_server.uri()),
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/custom/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "COMPLETED"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/custom/result"))
        .and(header("Authorization", "Key test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"video": {"url": "https://fal.media/files/wrapped.mp4"}}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = client(&mock_server)
        .generate(&text_request("x"))
        .await
        .unwrap();
    assert_eq!(url, "https://fal.media/files/wrapped.mp4");
}

#[tokio::test]
async fn test_submit_error_is_surfaced_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(T2V_PATH))
        .respond_with(
            ResponseTemplate::new(422).set_body_string(r#"{"detail":"prompt too long"}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .generate(&text_request("x"))
        .await
        .unwrap_err();

    match err {
        FalError::ApiError { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, r#"{"detail":"prompt too long"}"#);
        }
        other => panic!("Expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(T2V_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).generate(&text_request("x")).await;
    assert!(matches!(result, Err(FalError::ApiError { status: 503, .. })));
}

#[tokio::test]
async fn test_failed_status_returns_vendor_message() {
    let mock_server = MockServer::start().await;
    mount_queued(&mock_server, T2V_PATH).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "FAILED",
            "error": "GPU worker crashed"
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .generate(&text_request("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, FalError::GenerationFailed(ref m) if m == "GPU worker crashed"));
    assert_eq!(err.to_string(), "GPU worker crashed");
}

#[tokio::test]
async fn test_result_without_video_is_unexpected_response() {
    let mock_server = MockServer::start().await;
    mount_queued(&mock_server, T2V_PATH).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "COMPLETED"})),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESULT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"images": []})))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .generate(&text_request("x"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unexpected response format from fal API: missing video URL"
    );
}

#[tokio::test]
async fn test_result_error_status_is_api_error() {
    let mock_server = MockServer::start().await;
    mount_queued(&mock_server, T2V_PATH).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "COMPLETED"})),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESULT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("content filtered"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .generate(&text_request("x"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "API request failed with status 500: content filtered"
    );
}

#[tokio::test]
async fn test_generation_times_out() {
    let mock_server = MockServer::start().await;
    mount_queued(&mock_server, T2V_PATH).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "IN_PROGRESS"})),
        )
        .mount(&mock_server)
        .await;

    let client = FalClient::with_settings(
        "test-api-key".to_string(),
        FalSettings {
            base_url: mock_server.uri(),
            poll_interval: Duration::from_millis(10),
            generation_timeout: Duration::from_millis(50),
            ..FalSettings::default()
        },
    )
    .unwrap();

    let result = client.generate(&text_request("x")).await;
    assert!(matches!(result, Err(FalError::Timeout(_))));
}

#[tokio::test]
async fn test_poll_status_maps_vendor_states() {
    let mock_server = MockServer::start().await;
    let client = client(&mock_server);
    let queued = QueueResponse {
        request_id: "req-1".to_string(),
        status_url: None,
        response_url: None,
    };

    for (raw, expected) in [
        ("IN_QUEUE", GenerationStatus::Pending),
        ("IN_PROGRESS", GenerationStatus::InProgress),
        ("COMPLETED", GenerationStatus::Completed),
    ] {
        mock_server.reset().await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": raw})),
            )
            .mount(&mock_server)
            .await;

        let status = client
            .poll_status(longcat_studio::fal::TEXT_TO_VIDEO_ENDPOINT, &queued)
            .await
            .unwrap();
        assert_eq!(status, expected, "{raw}");
    }

    mock_server.reset().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "WEIRD"})))
        .mount(&mock_server)
        .await;
    let result = client
        .poll_status(longcat_studio::fal::TEXT_TO_VIDEO_ENDPOINT, &queued)
        .await;
    assert!(matches!(result, Err(FalError::UnexpectedResponse(_))));
}

#[tokio::test]
async fn test_connection_failure_is_http_error() {
    let client = FalClient::with_settings(
        "test-api-key".to_string(),
        FalSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            ..FalSettings::default()
        },
    )
    .unwrap();

    let result = client.generate(&text_request("x")).await;
    assert!(matches!(result, Err(FalError::HttpError(_))));
}
