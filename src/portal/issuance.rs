//! Multi-stage document issuance: select all, print, issue, confirm.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use chromiumoxide::Page;
use tracing::info;

use crate::error::PortalError;
use crate::period::QueryPeriod;
use crate::portal::capture::ArtifactCapture;
use crate::portal::selectors;
use crate::portal::wait;
use crate::progress::Phase;

const MODAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Drives the issuance sequence for one period once the result panel has
/// shown pending documents. Produces two PDFs: the printed computed
/// assessment and the collection document (DAR).
pub struct DocumentIssuanceFlow<'a> {
    page: &'a Page,
    capture: &'a ArtifactCapture<'a>,
}

impl<'a> DocumentIssuanceFlow<'a> {
    pub fn new(page: &'a Page, capture: &'a ArtifactCapture<'a>) -> Self {
        Self { page, capture }
    }

    pub async fn execute(
        &self,
        out_dir: &Path,
        period: QueryPeriod,
        report: impl Fn(Phase),
    ) -> Result<(), PortalError> {
        // Select all documents
        wait::click(self.page, selectors::SELECT_ALL_CHECKBOX).await?;

        // Print the computed assessment
        report(Phase::Printing);
        info!("printing computed assessment for {}-{}", period.year, period.month);
        wait::click(self.page, selectors::PRINT_BUTTON).await?;
        self.capture
            .capture_pdf(&out_dir.join(period.assessment_name()))
            .await?;

        // Issue the collection document and confirm the modal
        report(Phase::Issuing);
        info!("issuing collection document for {}-{}", period.year, period.month);
        wait::click(self.page, selectors::ISSUE_BUTTON).await?;
        wait::wait_for_selector(self.page, selectors::CONFIRM_ISSUE_BUTTON, MODAL_TIMEOUT).await?;
        wait::click(self.page, selectors::CONFIRM_ISSUE_BUTTON).await?;

        // Collect the DAR. The portal has two branches here: either the
        // document downloads directly, or a due-date dialog appears first.
        // The branching indicator in the DOM is unreliable, so the branch is
        // chosen by observing which capture path succeeds.
        let dar_path = out_dir.join(period.collection_name());
        capture_with_due_date_fallback(
            || self.capture.capture_pdf(&dar_path),
            || wait::click(self.page, selectors::DUE_DATE_CONFIRM_BUTTON),
        )
        .await
    }
}

/// Run the collection-document capture, taking the due-date branch at most
/// once and only when the first attempt timed out waiting for the blob
/// target. A second failure propagates.
async fn capture_with_due_date_fallback<F, Fut, C, CFut>(
    mut capture: F,
    confirm_due_date: C,
) -> Result<(), PortalError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), PortalError>>,
    C: FnOnce() -> CFut,
    CFut: Future<Output = Result<(), PortalError>>,
{
    match capture().await {
        Ok(()) => Ok(()),
        Err(e) if e.is_download_timeout() => {
            info!("no direct download target, confirming due date and retrying");
            confirm_due_date().await?;
            capture().await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[tokio::test]
    async fn test_due_date_fallback_retries_once_after_timeout() {
        let attempts = Cell::new(0);
        let confirms = Cell::new(0);

        let result = capture_with_due_date_fallback(
            || {
                attempts.set(attempts.get() + 1);
                let n = attempts.get();
                async move {
                    if n == 1 {
                        Err(PortalError::DownloadTimeout(30))
                    } else {
                        Ok(())
                    }
                }
            },
            || {
                confirms.set(confirms.get() + 1);
                async { Ok(()) }
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(attempts.get(), 2);
        assert_eq!(confirms.get(), 1);
    }

    #[tokio::test]
    async fn test_due_date_fallback_gives_up_after_second_timeout() {
        let attempts = Cell::new(0);
        let confirms = Cell::new(0);

        let result = capture_with_due_date_fallback(
            || {
                attempts.set(attempts.get() + 1);
                async { Err(PortalError::DownloadTimeout(30)) }
            },
            || {
                confirms.set(confirms.get() + 1);
                async { Ok(()) }
            },
        )
        .await;

        assert!(matches!(result, Err(PortalError::DownloadTimeout(_))));
        // Exactly one retry, never more.
        assert_eq!(attempts.get(), 2);
        assert_eq!(confirms.get(), 1);
    }

    #[tokio::test]
    async fn test_other_errors_propagate_without_fallback() {
        let attempts = Cell::new(0);
        let confirms = Cell::new(0);

        let result = capture_with_due_date_fallback(
            || {
                attempts.set(attempts.get() + 1);
                async { Err(PortalError::Download("empty payload".into())) }
            },
            || {
                confirms.set(confirms.get() + 1);
                async { Ok(()) }
            },
        )
        .await;

        assert!(matches!(result, Err(PortalError::Download(_))));
        assert_eq!(attempts.get(), 1);
        assert_eq!(confirms.get(), 0);
    }
}
