//! End-to-end behaviour of GET /aggregate against mock upstreams.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;

async fn get_json(url: String) -> (StatusCode, Value) {
    let res = common::client().get(url).send().await.expect("Gateway unreachable");
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn test_both_upstreams_ok() {
    let posts = common::start_mock_backend(r#"{"userId":1,"id":1,"title":"Hello"}"#).await;
    let users = common::start_mock_backend(r#"{"id":1,"name":"Alice"}"#).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(posts, users)).await;

    let (status, body) = get_json(format!("http://{}/aggregate", gateway)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"post_title": "Hello", "author_name": "Alice"}));
    shutdown.trigger();
}

#[tokio::test]
async fn test_user_upstream_error_degrades() {
    let posts = common::start_mock_backend(r#"{"title":"Hello"}"#).await;
    let users = common::start_programmable_backend(|| async { (500, "{}".to_string()) }).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(posts, users)).await;

    let (status, body) = get_json(format!("http://{}/aggregate", gateway)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"post_title": "Hello", "author_name": "N/A", "warning": "User data unavailable"})
    );
    shutdown.trigger();
}

#[tokio::test]
async fn test_post_upstream_unreachable_degrades() {
    let posts = common::closed_port().await;
    let users = common::start_mock_backend(r#"{"name":"Alice"}"#).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(posts, users)).await;

    let (status, body) = get_json(format!("http://{}/aggregate", gateway)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"post_title": "N/A", "author_name": "Alice", "warning": "Post data unavailable"})
    );
    shutdown.trigger();
}

#[tokio::test]
async fn test_both_upstreams_fail() {
    let posts = common::start_programmable_backend(|| async { (503, "{}".to_string()) }).await;
    let users = common::start_programmable_backend(|| async { (500, "{}".to_string()) }).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(posts, users)).await;

    let (status, body) = get_json(format!("http://{}/aggregate", gateway)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], true);
    assert_eq!(body["errorCode"], "POST_API_ERROR");
    assert_eq!(body["message"], "Failed to fetch post data");
    assert_eq!(body["statusCode"], 503);
    assert!(body["timestamp"].as_i64().unwrap() > 0);
    assert!(body.get("post_title").is_none());
    shutdown.trigger();
}

#[tokio::test]
async fn test_breaker_opens_and_stops_calling_upstream() {
    let posts = common::start_mock_backend(r#"{"title":"Hello"}"#).await;

    let user_hits = Arc::new(AtomicU32::new(0));
    let hits = user_hits.clone();
    let users = common::start_programmable_backend(move || {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            (500, "{}".to_string())
        }
    })
    .await;

    let mut config = common::gateway_config(posts, users);
    config.breaker.failure_threshold = 3;
    config.breaker.reset_timeout_ms = 60_000;
    let (gateway, shutdown) = common::start_gateway(config).await;

    for _ in 0..6 {
        let (status, body) = get_json(format!("http://{}/aggregate", gateway)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["post_title"], "Hello");
        assert_eq!(body["warning"], "User data unavailable");
    }
    assert_eq!(user_hits.load(Ordering::SeqCst), 3, "Open breaker must not call the upstream");

    let (_, breakers) = get_json(format!("http://{}/admin/breakers", gateway)).await;
    let state_of = |name: &str| {
        breakers
            .as_array()
            .unwrap()
            .iter()
            .find(|b| b["upstream"] == name)
            .map(|b| b["state"].clone())
            .unwrap()
    };
    assert_eq!(state_of("users"), "open");
    assert_eq!(state_of("posts"), "closed");
    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let posts = common::start_mock_backend(r#"{"title":"Hello"}"#).await;
    let users = common::start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (200, r#"{"name":"Alice"}"#.to_string())
    })
    .await;

    let mut config = common::gateway_config(posts, users);
    config.upstreams.users.timeout_ms = 200;
    let (gateway, shutdown) = common::start_gateway(config).await;

    let started = Instant::now();
    let (status, body) = get_json(format!("http://{}/aggregate", gateway)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["author_name"], "N/A");
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    shutdown.trigger();
}

#[tokio::test]
async fn test_tight_request_deadline_still_degrades() {
    let posts = common::start_mock_backend(r#"{"title":"Hello"}"#).await;
    let users = common::start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        (200, r#"{"name":"Alice"}"#.to_string())
    })
    .await;

    let mut config = common::gateway_config(posts, users);
    config.timeouts.request_secs = 1;
    config.upstreams.posts.timeout_ms = 500;
    config.upstreams.users.timeout_ms = 500;
    let (gateway, shutdown) = common::start_gateway(config).await;

    let (status, body) = get_json(format!("http://{}/aggregate", gateway)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"post_title": "Hello", "author_name": "N/A", "warning": "User data unavailable"})
    );
    shutdown.trigger();
}

#[tokio::test]
async fn test_upstreams_called_concurrently() {
    let slow = || async {
        tokio::time::sleep(Duration::from_millis(400)).await;
        (200, r#"{"title":"Hello","name":"Alice"}"#.to_string())
    };
    let posts = common::start_programmable_backend(slow).await;
    let users = common::start_programmable_backend(slow).await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(posts, users)).await;

    let started = Instant::now();
    let (status, _) = get_json(format!("http://{}/aggregate", gateway)).await;
    let elapsed = started.elapsed();

    assert_eq!(status, StatusCode::OK);
    assert!(elapsed >= Duration::from_millis(400));
    assert!(elapsed < Duration::from_millis(750), "took {:?}", elapsed);
    shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_echoed() {
    let posts = common::start_mock_backend("{}").await;
    let users = common::start_mock_backend("{}").await;
    let (gateway, shutdown) = common::start_gateway(common::gateway_config(posts, users)).await;

    let res = common::client()
        .get(format!("http://{}/aggregate", gateway))
        .header("x-request-id", "test-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "test-123");

    let res = common::client().get(format!("http://{}/health", gateway)).send().await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
    shutdown.trigger();
}
