//! End-to-end generation flow against mocked services.
//!
//! Uploads a reference image, submits a prompt using it, polls the queued
//! task to completion and writes the result back into a canvas session.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use easel_aigc::{
    spawn_task_poll, AspectRatio, ClientConfig, ClientError, GenerationOutcome,
    GenerationRequest, PollPolicy, TaskState, UploadFile,
};
use easel_core::{AssetCatalog, CanvasElement, CanvasSession};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRESIGN: &str = "/backend/aigc/common/cos/getPresignedUrl";
const PROMPT: &str = "/api/v2/image_generation/prompt";
const HISTORY: &str = "/api/v2/image_generation/history/p-77";

async fn mount_upload(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(PRESIGN))
        .and(query_param("bizType", "attachment"))
        .and(query_param("filename", "ref.png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "msg": "ok",
            "data": {
                "cosPath": "attachment/ref.png",
                "previewUrl": "https://cdn.local/attachment/ref.png",
                "uploadUrl": format!("{}/cos/attachment/ref.png?sign=1", server.uri())
            }
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/cos/attachment/ref.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_generation(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(PROMPT))
        .and(body_partial_json(json!({
            "taskId": 77,
            "nano_pro": {"imgUrls": ["https://cdn.local/attachment/ref.png"], "aspectRatio": "3:4"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "message": "queued",
            "prompt_id": "p-77"
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(HISTORY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "message": "ok",
            "data": {"taskId": 77, "promptId": "p-77", "status": 1, "progress": 30, "pendingNumbers": 1}
        })))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(HISTORY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "message": "ok",
            "data": {
                "taskId": 77,
                "promptId": "p-77",
                "status": 2,
                "progress": 100,
                "pendingNumbers": 0,
                "cosPath": "gen/77.png",
                "previewUrl": "https://cdn.local/gen/77.png"
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_upload_generate_poll_and_apply() {
    let server = MockServer::start().await;
    mount_upload(&server).await;
    mount_generation(&server).await;

    let (aigc, upload) = ClientConfig::new(server.uri(), server.uri())
        .with_request_timeout(Duration::from_secs(5))
        .clients()
        .expect("clients");

    // Upload and register the reference image.
    let uploaded = upload
        .upload_file("ref.png", UploadFile::for_filename("ref.png", vec![0x89, b'P', b'N', b'G']))
        .await
        .expect("upload");
    let mut catalog = AssetCatalog::demo();
    let asset = catalog.add_uploaded_image("ref.png", uploaded.preview_url.clone());
    assert!(asset.is_user_uploaded());

    // Place it on the canvas.
    let mut session = CanvasSession::new();
    let element_id = session
        .add(CanvasElement::from_asset(&asset.into(), 120.0, 80.0))
        .expect("add");

    // Generate from it.
    let request = GenerationRequest::builder(77, "same pose, watercolor")
        .reference_image(uploaded.preview_url)
        .aspect_ratio(AspectRatio::Portrait3x4)
        .build()
        .expect("request");
    let prompt_id = match aigc.generate_image(&request).await.expect("generate") {
        GenerationOutcome::Queued { prompt_id } => prompt_id,
        other => panic!("expected queued task, got {other:?}"),
    };

    let progress = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&progress);
    let handle = spawn_task_poll(
        aigc.clone(),
        prompt_id,
        PollPolicy::new(10, Duration::from_millis(5)),
        move |status| {
            if let Ok(mut seen) = seen.lock() {
                seen.push(status.progress);
            }
        },
    );
    let status = handle.join().await.expect("poll");
    assert_eq!(status.status, TaskState::Completed);
    assert_eq!(*progress.lock().expect("lock"), vec![30, 100]);

    let url = status.image_url().expect("image url");
    session
        .apply_generated_image(&element_id, url)
        .expect("apply");
    assert_eq!(
        session.get(&element_id).and_then(CanvasElement::image_source),
        Some("https://cdn.local/gen/77.png")
    );
}

#[tokio::test]
async fn test_failed_presign_skips_generation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRESIGN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 401,
            "msg": "token expired"
        })))
        .mount(&server)
        .await;

    let (_aigc, upload) = ClientConfig::new(server.uri(), server.uri())
        .clients()
        .expect("clients");
    let err = upload
        .upload_file("ref.png", UploadFile::for_filename("ref.png", vec![1, 2, 3]))
        .await
        .unwrap_err();

    assert!(!err.is_retryable());
    match err {
        ClientError::Rejected { code, message } => {
            assert_eq!(code, 401);
            assert_eq!(message, "token expired");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
