//! HTTP control surface over [`MonitorService`].

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::service::MonitorService;

pub mod error;
pub mod models;
pub mod routes;

pub use error::AppError;

pub struct AppState {
    pub service: Arc<MonitorService>,
}

pub fn create_router(service: Arc<MonitorService>) -> Router {
    let app_state = Arc::new(AppState { service });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/targets", routes::target_routes::create_target_router())
        .nest("/api/config", routes::config_routes::create_config_router())
        .nest("/api/monitor", routes::monitor_routes::create_monitor_router())
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::checker::fakes::ScriptedChecker;
    use crate::monitor::clock::SystemClock;
    use crate::monitor::models::Verdict;
    use crate::monitor::scheduler::SchedulerSettings;
    use crate::notifications::senders::fakes::RecordingSender;
    use crate::service::Collaborators;
    use crate::storage::MemoryKvStore;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(checker: Arc<ScriptedChecker>) -> Router {
        let service = MonitorService::new(
            Collaborators {
                kv: Arc::new(MemoryKvStore::new()),
                cipher: None,
                checker,
                sender: Arc::new(RecordingSender::new()),
                clock: Arc::new(SystemClock),
            },
            SchedulerSettings {
                interval: Duration::from_secs(30),
                inter_check_delay: Duration::ZERO,
            },
        )
        .unwrap();
        create_router(Arc::new(service))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_target_lifecycle() {
        let app = app(Arc::new(ScriptedChecker::new()));
        let create = json!({ "identity": "pkg.demo.app", "locator": "https://example.com/a" });

        let (status, _) = send(&app, Method::POST, "/api/targets", Some(create.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(&app, Method::POST, "/api/targets", Some(create)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("pkg.demo.app"));

        let insecure = json!({ "identity": "x", "locator": "http://example.com" });
        let (status, _) = send(&app, Method::POST, "/api/targets", Some(insecure)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::GET, "/api/targets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["currentStatus"], "unknown");

        let (status, _) = send(&app, Method::DELETE, "/api/targets/pkg.demo.app", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, "/api/targets/pkg.demo.app", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_batch_and_bulk_remove() {
        let app = app(Arc::new(ScriptedChecker::new()));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/targets/batch")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("a|https://example.com/a\nb|https://example.com/b\nbad line\n"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "addedCount": 2, "rejectedCount": 1 }));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/targets/remove",
            Some(json!({ "identities": ["b", "zzz"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], 1);

        let (_, summary) = send(&app, Method::GET, "/api/targets/summary", None).await;
        assert_eq!(summary["total"], 1);
    }

    #[tokio::test]
    async fn test_config_and_monitor_controls() {
        let checker = Arc::new(ScriptedChecker::new());
        let app = app(checker.clone());

        let (status, _) = send(&app, Method::POST, "/api/config/test", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/config",
            Some(json!({ "endpointToken": "123456:secret", "destinationId": "chat" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["configured"], true);
        assert!(!body["endpointToken"].as_str().unwrap().contains("123456"));

        let (status, _) = send(&app, Method::POST, "/api/config/test", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, Method::POST, "/api/monitor/pause", None).await;
        assert_eq!(body["state"], "paused");

        send(
            &app,
            Method::POST,
            "/api/targets",
            Some(json!({ "identity": "a", "locator": "https://example.com/a" })),
        )
        .await;
        checker.push("a", Ok(Verdict::Unavailable));
        let (status, body) = send(&app, Method::POST, "/api/targets/a/check", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notified"], true);
        assert_eq!(body["target"]["currentStatus"], "unavailable");

        let (_, body) = send(&app, Method::POST, "/api/monitor/trigger", None).await;
        assert_eq!(body["outcome"], "started");
        let status = loop {
            let (_, status) = send(&app, Method::GET, "/api/monitor/status", None).await;
            if status["sweeping"] == false {
                break status;
            }
            tokio::task::yield_now().await;
        };
        assert_eq!(status["lastReport"]["checked"], 1);

        let (_, body) = send(&app, Method::POST, "/api/monitor/resume", None).await;
        assert_eq!(body["state"], "running");
    }

    #[tokio::test]
    async fn test_identity_with_slash_is_addressable_when_encoded() {
        let app = app(Arc::new(ScriptedChecker::new()));
        let create = json!({ "identity": "store/pkg.demo.app", "locator": "https://example.com/a" });
        let (status, _) = send(&app, Method::POST, "/api/targets", Some(create)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, Method::POST, "/api/targets/store%2Fpkg.demo.app/check", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["target"]["identity"], "store/pkg.demo.app");

        let (status, _) = send(&app, Method::DELETE, "/api/targets/store%2Fpkg.demo.app", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(&app, Method::GET, "/api/targets", None).await;
        assert!(body.as_array().unwrap().is_empty());
    }
}
