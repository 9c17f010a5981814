#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use image_upload_sessions::config::UploadConfig;
use image_upload_sessions::utils::signature::{JPEG_TRAILER, PNG_SIGNATURE, PNG_TRAILER};
use image_upload_sessions::{AppState, create_app};
use serde_json::Value;
use tower::ServiceExt;

pub const BOUNDARY: &str = "---------------------------906281947316470359245";


pub fn test_app() -> Router {
    test_app_with(UploadConfig::development())
}

pub fn test_app_with(config: UploadConfig) -> Router {
    create_app(AppState::new(config))
}

/// Signature, four filler bytes and the IEND trailer: 20 bytes.
pub fn minimal_png() -> Vec<u8> {
    let mut data = PNG_SIGNATURE.to_vec();
    data.extend_from_slice(&[0, 0, 0, 0]);
    data.extend_from_slice(&PNG_TRAILER);
    data
}

pub fn minimal_jpeg() -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.extend_from_slice(&[0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01]);
    data.extend_from_slice(&JPEG_TRAILER);
    data
}

pub enum Part<'a> {
    File {
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: &Router, uri: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(parts)))
                .unwrap(),
        )
        .await
        .unwrap();

    into_json(response).await
}

pub async fn upload_png(app: &Router, session_id: Option<&str>) -> (StatusCode, Value) {
    let png = minimal_png();
    let mut parts = vec![Part::File {
        file_name: "photo.png",
        content_type: "image/png",
        data: &png,
    }];
    if let Some(id) = session_id {
        parts.push(Part::Text {
            name: "sessionId",
            value: id,
        });
    }
    post_multipart(app, "/upload", &parts).await
}

pub async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    into_json(response).await
}

pub async fn into_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!(
                "Non-JSON body with status {}: {:?}",
                status,
                String::from_utf8_lossy(&body)
            )
        })
    };
    (status, json)
}
