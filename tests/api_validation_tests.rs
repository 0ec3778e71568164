// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

async fn post(uri: &str, body: serde_json::Value) -> StatusCode {
    let (app, _) = common::create_test_app();
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
    .status()
}

#[tokio::test]
async fn test_empty_batch_rejected() {
    let status = post(
        "/api/sessions/s1/samples",
        json!({ "uid": "alice", "samples": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_batch_rejected() {
    let samples = common::drive_samples(37.4, 0, &[20.0; 601]);
    let status = post(
        "/api/sessions/s1/samples",
        json!({ "uid": "alice", "samples": samples }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_out_of_range_latitude_rejected() {
    let status = post(
        "/api/sessions/s1/samples",
        json!({
            "uid": "alice",
            "samples": [{ "latitude": 91.0, "longitude": 0.0, "speedKmh": 5.0, "timestampMs": 0 }]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_negative_speed_rejected() {
    let status = post(
        "/api/sessions/s1/samples",
        json!({
            "uid": "alice",
            "samples": [{ "latitude": 1.0, "longitude": 0.0, "speedKmh": -3.0, "timestampMs": 0 }]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_uid_rejected() {
    let samples = common::drive_samples(37.4, 0, &[20.0]);
    let status = post(
        "/api/sessions/s1/samples",
        json!({ "uid": "", "samples": samples }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zero_trip_limit_rejected() {
    let (app, _) = common::create_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/users/alice/trips?limit=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_favorite_rejected() {
    let status = post(
        "/api/users/alice/favorites",
        json!({ "name": "", "latitude": 37.0, "longitude": -122.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validation_error_body() {
    let (app, _) = common::create_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sessions/s1/samples")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "uid": "alice", "samples": [] }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "validation_failed");
    assert!(body["details"].as_str().unwrap().contains("samples"));
}
