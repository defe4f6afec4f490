//! Liveness probing of the inference service.

use std::time::Duration;

use tracing::trace;

use crate::supervisor::ServiceError;

/// A cheap "is the service answering?" check.
pub trait LivenessProbe: Send {
    /// Ok when the service answered within the probe's deadline.
    fn probe(&mut self) -> Result<(), ServiceError>;
}

/// `GET {host}/api/tags` with a short timeout. Any response that is not an
/// HTTP error counts as alive.
pub struct HttpProbe {
    http: reqwest::blocking::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(host: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Http(e.to_string()))?;
        Ok(Self {
            http,
            url: crate::config::join_url(host, "/api/tags"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl LivenessProbe for HttpProbe {
    fn probe(&mut self) -> Result<(), ServiceError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .map_err(|e| ServiceError::Http(e.to_string()))?;
        let status = response.status();
        trace!(url = %self.url, %status, "probe answered");
        if status.is_client_error() || status.is_server_error() {
            return Err(ServiceError::Http(format!("status {status}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_url() {
        let probe = HttpProbe::new("http://127.0.0.1:11434/", Duration::from_secs(2)).unwrap();
        assert_eq!(probe.url(), "http://127.0.0.1:11434/api/tags");
    }

    #[test]
    fn test_probe_fails_on_closed_port() {
        let mut probe = HttpProbe::new("http://127.0.0.1:9", Duration::from_millis(300)).unwrap();
        assert!(matches!(probe.probe(), Err(ServiceError::Http(_))));
    }
}
