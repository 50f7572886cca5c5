use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::account::Account;
use crate::batch::{BatchRunner, BatchSummary};
use crate::config::RunConfig;
use crate::error::PortalError;
use crate::traits::Robot;

/// One batch run: the parsed account list plus the run configuration.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub accounts: Vec<Account>,
    pub config: RunConfig,
}

impl BatchRequest {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts,
            config: RunConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }
}

/// tower::Service wrapper around the batch runner.
#[derive(Debug, Clone, Default)]
pub struct BatchService {
    // reserved for future state (rate limiting, shared browser reuse)
}

impl BatchService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<BatchRequest> for BatchService {
    type Response = BatchSummary;
    type Error = PortalError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: BatchRequest) -> Self::Future {
        info!("batch request received: {} accounts", req.accounts.len());

        Box::pin(async move {
            let mut robot = BatchRunner::new(req.config);
            let summary = robot.execute(&req.accounts).await?;

            info!(
                "batch request done: {}/{} accounts ok",
                summary.succeeded, summary.processed
            );
            Ok(summary)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatusFilter;

    #[test]
    fn test_batch_request_builder() {
        let req = BatchRequest::new(vec![]).with_config(
            RunConfig::new("contas.csv", "/tmp/saida").with_status_filter(StatusFilter::Open),
        );

        assert!(req.accounts.is_empty());
        assert_eq!(req.config.status_filter, StatusFilter::Open);
    }
}
