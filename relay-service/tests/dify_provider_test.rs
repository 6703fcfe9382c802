//! Runs the real Dify provider against a wiremock stand-in for the Dify API.

mod common;

use common::{dify_config, ideas_form, spawn_with_dify, JPEG_BYTES};
use relay_service::config::DifyConfig;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_upload(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/v1/files/upload"))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn round_trip_through_dify() {
    let server = MockServer::start().await;

    mount_upload(
        &server,
        ResponseTemplate::new(201).set_body_json(json!({
            "id": "f1",
            "name": "toy.jpg",
            "size": 20,
            "extension": "jpg",
            "mime_type": "image/jpeg"
        })),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/v1/workflows/run"))
        .and(header("authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({
            "inputs": {
                "age": "12",
                "toyimage": [{ "type": "image", "transfer_method": "local_file", "upload_file_id": "f1" }]
            },
            "response_mode": "blocking",
            "user": "my-app-user-123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "workflow_run_id": "run-1",
            "data": {
                "status": "succeeded",
                "outputs": {
                    "result": "[{\"id\":\"a1\",\"name\":\"Peekaboo\",\"ageInMonths\":12,\"steps\":[{\"mainStepChinese\":\"藏\",\"instructionEnglish\":\"Hide the toy\",\"instructionChinese\":\"把玩具藏起来\"}],\"goals\":[\"Object permanence\"],\"safetyTips\":[\"Supervise closely\"]}]"
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let port = spawn_with_dify(dify_config(&server.uri())).await;

    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/generate-ideas", port))
        .multipart(ideas_form(Some(JPEG_BYTES), Some("12")))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "activities": [{
                "id": "a1",
                "name": "Peekaboo",
                "ageInMonths": 12,
                "steps": [{
                    "mainStepChinese": "藏",
                    "instructionEnglish": "Hide the toy",
                    "instructionChinese": "把玩具藏起来"
                }],
                "goals": ["Object permanence"],
                "safetyTips": ["Supervise closely"],
                "isFavorited": false
            }]
        })
    );

    let requests = server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/v1/files/upload")
        .expect("upload request not received");
    let upload_body = String::from_utf8_lossy(&upload.body);
    assert!(upload_body.contains("name=\"user\""));
    assert!(upload_body.contains("my-app-user-123"));
    assert!(upload_body.contains("filename=\"toy.jpg\""));
}

#[tokio::test]
async fn upload_error_stops_before_workflow() {
    let server = MockServer::start().await;

    mount_upload(
        &server,
        ResponseTemplate::new(401).set_body_json(json!({
            "code": "unauthorized",
            "message": "Access token is invalid",
            "status": 401
        })),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/v1/workflows/run"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let port = spawn_with_dify(dify_config(&server.uri())).await;

    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/generate-ideas", port))
        .multipart(ideas_form(Some(JPEG_BYTES), Some("12")))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Failed to generate activities");
    assert_eq!(body["details"]["message"], "Access token is invalid");
}

#[tokio::test]
async fn plain_text_upstream_body_is_kept() {
    let server = MockServer::start().await;

    mount_upload(
        &server,
        ResponseTemplate::new(503).set_body_string("upstream unavailable"),
    )
    .await;

    let port = spawn_with_dify(dify_config(&server.uri())).await;

    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/generate-ideas", port))
        .multipart(ideas_form(Some(JPEG_BYTES), Some("12")))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 503);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["details"], "upstream unavailable");
}

#[tokio::test]
async fn missing_credentials_fail_without_calling_dify() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let port = spawn_with_dify(DifyConfig {
        base_url: Some(server.uri()),
        api_key: None,
        ..Default::default()
    })
    .await;

    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/generate-ideas", port))
        .multipart(ideas_form(Some(JPEG_BYTES), Some("12")))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Configuration error");
}
