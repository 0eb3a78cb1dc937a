//! Backend reachability probe consulted before a run starts.

use std::time::Duration;

use crate::foundation::error::{VitrineError, VitrineResult};

/// Connectivity/backend-reachability check.
pub trait ConnectivityProbe: Send + Sync {
    /// Ok when a generation run may start; a precondition error otherwise.
    fn check(&self) -> VitrineResult<()>;
}

/// Probe that always succeeds, for tests and fully-local setups.
pub struct AlwaysOnline;

impl ConnectivityProbe for AlwaysOnline {
    fn check(&self) -> VitrineResult<()> {
        Ok(())
    }
}

/// HEAD-request probe against the storefront backend.
pub struct HttpProbe {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> VitrineResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VitrineError::precondition(format!("http client init failed: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl ConnectivityProbe for HttpProbe {
    fn check(&self) -> VitrineResult<()> {
        self.client
            .head(&self.url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| VitrineError::precondition(format!("backend unreachable: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_online_passes() {
        assert!(AlwaysOnline.check().is_ok());
    }

    #[test]
    fn malformed_url_surfaces_as_precondition() {
        let probe = HttpProbe::new("not a url", Duration::from_millis(50)).unwrap();
        let err = probe.check().unwrap_err();
        assert!(matches!(err, VitrineError::Precondition(_)));
    }
}
