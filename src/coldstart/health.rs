//! Readiness checks

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::ProbeError;

/// Asks whether the runtime listening on `port` is ready
///
/// Implementations return `false` for any failure; the caller bounds each
/// call with its own timeout.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self, port: u16) -> bool;
}

/// `GET http://127.0.0.1:{port}{path}`, ready on status 200
#[derive(Debug, Clone)]
pub struct HttpHealthCheck {
    client: Client,
    path: String,
}

impl HttpHealthCheck {
    pub fn new(path: impl Into<String>) -> Result<Self, ProbeError> {
        let client = Client::builder().no_proxy().build()?;
        Ok(Self {
            client,
            path: path.into(),
        })
    }

    pub fn url(&self, port: u16) -> String {
        format!("http://127.0.0.1:{}{}", port, self.path)
    }
}

#[async_trait]
impl HealthCheck for HttpHealthCheck {
    async fn check(&self, port: u16) -> bool {
        match self.client.get(self.url(port)).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(_) => false,
        }
    }
}
