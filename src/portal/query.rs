//! Date- and status-scoped antecipado query execution.

use std::time::Duration;

use chromiumoxide::Page;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::StatusFilter;
use crate::error::PortalError;
use crate::period::QueryPeriod;
use crate::portal::selectors;
use crate::portal::wait;

const PICKER_TIMEOUT: Duration = Duration::from_secs(15);
const DROPDOWN_TIMEOUT: Duration = Duration::from_secs(10);
const RESULT_TIMEOUT: Duration = Duration::from_secs(15);
/// The picker applies its state asynchronously; submitting too early races
/// the Angular form model.
const PRE_SUBMIT_DELAY_MS: u64 = 2500;

/// Geometry of the rendered result card, from `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundingRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Handle to the rendered result card of one executed query.
pub struct ResultPanel<'a> {
    page: &'a Page,
}

impl<'a> ResultPanel<'a> {
    pub async fn bounding_box(&self) -> Result<BoundingRect, PortalError> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (el === null) return null;
                const r = el.getBoundingClientRect();
                return JSON.stringify({{ x: r.x, y: r.y, width: r.width, height: r.height }});
            }})()
            "#,
            wait::js_string(selectors::RESULT_CARD)
        );
        let result = self
            .page
            .evaluate(script.as_str())
            .await
            .map_err(|e| PortalError::JavaScript(e.to_string()))?;
        let json = result
            .into_value::<Option<String>>()
            .ok()
            .flatten()
            .ok_or_else(|| PortalError::ElementNotFound(selectors::RESULT_CARD.to_string()))?;

        serde_json::from_str(&json).map_err(|e| PortalError::JavaScript(e.to_string()))
    }

    /// Whether the query surfaced assessed documents awaiting issuance,
    /// detected by the presence of the issuance action button.
    pub async fn has_pending_documents(&self) -> Result<bool, PortalError> {
        wait::selector_exists(self.page, selectors::PENDING_DOCS_BUTTON).await
    }
}

pub struct QueryExecutor<'a> {
    page: &'a Page,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self { page }
    }

    /// Select the period and status filter, submit the query, and wait for
    /// the result card to stabilize.
    pub async fn run(
        &self,
        period: QueryPeriod,
        status_filter: StatusFilter,
    ) -> Result<ResultPanel<'a>, PortalError> {
        info!("querying antecipado for {}-{}", period.year, period.month);

        let picker = selectors::month_picker(period.month);
        wait::wait_for_selector(self.page, &picker, PICKER_TIMEOUT).await?;
        wait::click(self.page, &picker).await?;

        self.apply_status_filter(status_filter).await?;

        sleep(Duration::from_millis(PRE_SUBMIT_DELAY_MS)).await;
        wait::click(self.page, selectors::SUBMIT_BUTTON).await?;

        wait::settle(self.page).await;
        wait::wait_for_selector(self.page, selectors::RESULT_CARD, RESULT_TIMEOUT).await?;
        debug!("result card ready for {}-{}", period.year, period.month);

        Ok(ResultPanel { page: self.page })
    }

    /// The status dropdown is an ng-select; it only opens after a bubbling
    /// `input` event on the host element.
    async fn apply_status_filter(&self, filter: StatusFilter) -> Result<(), PortalError> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (el === null) return false;
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            wait::js_string(selectors::STATUS_SELECT)
        );
        let result = self
            .page
            .evaluate(script.as_str())
            .await
            .map_err(|e| PortalError::JavaScript(e.to_string()))?;
        if !result.into_value::<bool>().unwrap_or(false) {
            return Err(PortalError::ElementNotFound(
                selectors::STATUS_SELECT.to_string(),
            ));
        }

        let option = filter.option_selector();
        wait::wait_for_selector(self.page, option, DROPDOWN_TIMEOUT).await?;
        wait::click(self.page, option).await?;
        debug!("status filter {:?} applied", filter);
        Ok(())
    }
}
