use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

use super::models::{Verdict, WatchedTarget};

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Probe timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected response status: {0}")]
    UnexpectedStatus(u16),
    #[error("Failed to build probe client: {0}")]
    Client(String),
}

/// Decides whether a listing is still published.
///
/// Implementations must bound their own run time; the scheduler never cancels a probe.
#[async_trait]
pub trait AvailabilityChecker: Send + Sync {
    async fn probe(&self, target: &WatchedTarget) -> Result<Verdict, CheckError>;
}

/// Fetches the listing page: 2xx means published, 404/410 means removed.
pub struct HttpAvailabilityChecker {
    client: Client,
}

impl HttpAvailabilityChecker {
    pub fn new(timeout: Duration) -> Result<Self, CheckError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckError::Client(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    /// Uses a preconfigured client. It must carry its own timeout.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

pub fn verdict_for_status(status: StatusCode) -> Result<Verdict, CheckError> {
    if status.is_success() {
        Ok(Verdict::Available)
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        Ok(Verdict::Unavailable)
    } else {
        Err(CheckError::UnexpectedStatus(status.as_u16()))
    }
}

#[async_trait]
impl AvailabilityChecker for HttpAvailabilityChecker {
    async fn probe(&self, target: &WatchedTarget) -> Result<Verdict, CheckError> {
        let response = self
            .client
            .get(&target.locator)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CheckError::Timeout
                } else {
                    CheckError::Network(e.to_string())
                }
            })?;
        verdict_for_status(response.status())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};

    async fn spawn_listing_site() -> String {
        let app = Router::new()
            .route("/live", get(|| async { "listing page" }))
            .route("/removed", get(|| async { StatusCode::NOT_FOUND }))
            .route("/throttled", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .route(
                "/stalled",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "too late"
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn target(locator: String) -> WatchedTarget {
        WatchedTarget::new("pkg.demo.app", locator)
    }

    #[tokio::test]
    async fn test_probe_against_live_server() {
        let base = spawn_listing_site().await;
        let client = Client::builder()
            .timeout(Duration::from_millis(300))
            .no_proxy()
            .build()
            .unwrap();
        let checker = HttpAvailabilityChecker::with_client(client);

        let live = checker.probe(&target(format!("{base}/live"))).await;
        assert_eq!(live.unwrap(), Verdict::Available);
        let removed = checker.probe(&target(format!("{base}/removed"))).await;
        assert_eq!(removed.unwrap(), Verdict::Unavailable);
        assert!(matches!(
            checker.probe(&target(format!("{base}/throttled"))).await,
            Err(CheckError::UnexpectedStatus(503))
        ));
        assert!(matches!(
            checker.probe(&target(format!("{base}/stalled"))).await,
            Err(CheckError::Timeout)
        ));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(verdict_for_status(StatusCode::OK).unwrap(), Verdict::Available);
        assert_eq!(
            verdict_for_status(StatusCode::NOT_FOUND).unwrap(),
            Verdict::Unavailable
        );
        assert_eq!(verdict_for_status(StatusCode::GONE).unwrap(), Verdict::Unavailable);
        assert!(matches!(
            verdict_for_status(StatusCode::TOO_MANY_REQUESTS),
            Err(CheckError::UnexpectedStatus(429))
        ));
        assert!(matches!(
            verdict_for_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(CheckError::UnexpectedStatus(500))
        ));
    }
}
