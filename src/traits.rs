use async_trait::async_trait;

use crate::account::Account;
use crate::batch::BatchSummary;
use crate::error::PortalError;

#[async_trait]
pub trait Robot: Send + Sync {
    /// Launch the browser and open the shared page.
    async fn initialize(&mut self) -> Result<(), PortalError>;

    /// Process every account, strictly in list order.
    async fn run(&mut self, accounts: &[Account]) -> Result<BatchSummary, PortalError>;

    /// Release the browser.
    async fn close(&mut self) -> Result<(), PortalError>;

    /// initialize → run → close.
    async fn execute(&mut self, accounts: &[Account]) -> Result<BatchSummary, PortalError> {
        self.initialize().await?;
        let summary = self.run(accounts).await?;
        self.close().await?;
        Ok(summary)
    }
}
