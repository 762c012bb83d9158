use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::service::eligibility_router;

fn post_check(payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/eligibility")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn check_route_returns_report() {
    let router = eligibility_router(Arc::new(service()));

    let response = router
        .oneshot(post_check(json!({
            "username": "Veteran editor",
            "event": "test-election",
        })))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["outcome"], "pass");
    assert_eq!(body["label"], "eligible");
    assert_eq!(body["event"]["id"], "test-election");
    assert_eq!(body["trace"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["trace"][0]["status"], "evaluated");
}

#[tokio::test]
async fn check_route_reports_inconclusive_reason() {
    let router = eligibility_router(Arc::new(service()));

    let response = router
        .oneshot(post_check(json!({
            "username": "Nobody here",
            "event": "test-election",
        })))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["outcome"], "inconclusive");
    assert_eq!(body["reason"], "no_account");
}

#[tokio::test]
async fn check_route_returns_not_found_for_unknown_event() {
    let router = eligibility_router(Arc::new(service()));

    let response = router
        .oneshot(post_check(json!({
            "username": "Veteran editor",
            "event": "missing",
        })))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["event"], "missing");
}

#[tokio::test]
async fn check_route_returns_unprocessable_for_invalid_username() {
    let router = eligibility_router(Arc::new(service()));

    let response = router
        .oneshot(post_check(json!({
            "username": "   ",
            "event": "test-election",
        })))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn events_route_lists_catalog() {
    let router = eligibility_router(Arc::new(service()));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/events")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body[0]["id"], "test-election");
    assert_eq!(body[1]["required_source"], "enwiki");
}
