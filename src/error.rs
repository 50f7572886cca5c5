use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("browser init error: {0}")]
    BrowserInit(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("javascript error: {0}")]
    JavaScript(String),

    #[error("download error: {0}")]
    Download(String),

    #[error("no blob target appeared within {0} seconds")]
    DownloadTimeout(u64),

    #[error("file I/O error: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("account list parse error: {0}")]
    InvalidInput(#[from] csv::Error),

    #[error("base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl PortalError {
    /// The issuance flow retries the collection-document capture once when
    /// the blob target never appeared (the portal surfaced the due-date
    /// dialog instead). Only this variant triggers that branch.
    pub fn is_download_timeout(&self) -> bool {
        matches!(self, PortalError::DownloadTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_download_timeout_triggers_fallback() {
        assert!(PortalError::DownloadTimeout(30).is_download_timeout());
        assert!(!PortalError::Timeout("login".into()).is_download_timeout());
        assert!(!PortalError::Download("empty payload".into()).is_download_timeout());
    }
}
