use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use lantern_core::config::{Config, LogConfig};
use lantern_core::pipeline::Pipeline;
use lantern_core::sink::MemorySink;
use lantern_server::AppState;
use lantern_server::middleware::request_logging::RequestLoggingLayer;
use serde_json::Value;
use std::sync::Arc;
use tower::{Layer, Service, ServiceExt};

fn test_app() -> (Router, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::new(&LogConfig::default(), sink.clone()).unwrap();
    let app_logger = pipeline.logger("app");

    let router = Router::new()
        .route(
            "/ok",
            get(move || {
                let logger = app_logger.clone();
                async move {
                    logger.info("handled", &[]);
                    "ok"
                }
            }),
        )
        .route("/teapot", get(|| async { StatusCode::IM_A_TEAPOT }))
        .layer(RequestLoggingLayer::new(pipeline.logger("request")));
    (router, sink)
}

fn events(sink: &MemorySink) -> Vec<Value> {
    sink.lines()
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_one_start_one_completion_per_request() {
    let (router, sink) = test_app();
    let response = router.oneshot(get_request("/ok?page=1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = events(&sink);
    let started: Vec<_> = events
        .iter()
        .filter(|e| e["event"] == "request_started")
        .collect();
    let completed: Vec<_> = events
        .iter()
        .filter(|e| e["event"] == "request_completed")
        .collect();
    assert_eq!(started.len(), 1);
    assert_eq!(completed.len(), 1);
    assert_eq!(started[0]["method"], "GET");
    assert_eq!(started[0]["path"], "/ok");
    assert_eq!(started[0]["query"], "page=1");
    assert_eq!(completed[0]["status_code"], 200);
    assert!(completed[0]["duration_seconds"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_completion_reports_observed_status() {
    let (router, sink) = test_app();
    let response = router.oneshot(get_request("/teapot")).await.unwrap();
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);

    let events = events(&sink);
    let completed = events
        .iter()
        .find(|e| e["event"] == "request_completed")
        .unwrap();
    assert_eq!(completed["status_code"], 418);
}

#[tokio::test]
async fn test_inbound_header_propagates_to_all_events() {
    let (router, sink) = test_app();
    let request = Request::builder()
        .uri("/ok")
        .header("x-correlation-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    router.oneshot(request).await.unwrap();

    let events = events(&sink);
    assert_eq!(events.len(), 3);
    assert!(events.iter().any(|e| e["event"] == "handled"));
    for event in &events {
        assert_eq!(event["correlation_id"], "abc-123", "event: {event}");
    }
}

#[tokio::test]
async fn test_generated_id_shared_within_request_distinct_across() {
    let (router, sink) = test_app();
    router.clone().oneshot(get_request("/ok")).await.unwrap();
    router.oneshot(get_request("/ok")).await.unwrap();

    let events = events(&sink);
    assert_eq!(events.len(), 6);
    let id_of = |e: &Value| e["correlation_id"].as_str().unwrap().to_string();

    let first = id_of(&events[0]);
    assert!(!first.is_empty());
    for event in &events[..3] {
        assert_eq!(id_of(event), first);
    }
    let second = id_of(&events[3]);
    for event in &events[3..] {
        assert_eq!(id_of(event), second);
    }
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_handler_error_logged_and_reraised() {
    let sink = Arc::new(MemorySink::new());
    let pipeline = Pipeline::new(&LogConfig::default(), sink.clone()).unwrap();
    let failing = tower::service_fn(|_req: Request<Body>| async {
        Err::<axum::response::Response, std::io::Error>(std::io::Error::other("exploded"))
    });
    let mut service = RequestLoggingLayer::new(pipeline.logger("request")).layer(failing);

    let err = service
        .ready()
        .await
        .unwrap()
        .call(get_request("/fail"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "exploded");

    let events = events(&sink);
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["event"], "request_started");
    assert_eq!(events[1]["event"], "request_error");
    assert_eq!(events[1]["error"], "exploded");
    assert_eq!(events[1]["level"], "error");
    assert_eq!(events[2]["event"], "request_completed");
    assert_eq!(events[2]["status_code"], 500);
    assert!(events[2]["duration_seconds"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_upgrade_requests_pass_through_unlogged() {
    let (router, sink) = test_app();
    let request = Request::builder()
        .uri("/teapot")
        .header("upgrade", "websocket")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_health_route_is_logged() {
    let sink = Arc::new(MemorySink::new());
    let config = Config::default();
    let pipeline = Pipeline::new(&config.logging, sink.clone()).unwrap();
    let state = AppState {
        config: Arc::new(config),
        pipeline,
    };
    let router = lantern_server::build_router(state);

    let response = router.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = events(&sink);
    assert!(
        events
            .iter()
            .any(|e| e["event"] == "request_completed" && e["status_code"] == 200)
    );
}
