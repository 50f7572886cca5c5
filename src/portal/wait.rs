//! Bounded waits over the rendered page.
//!
//! The portal gives no structured signals, so every synchronization point is
//! a poll with an upper bound: selector appearance, a race between several
//! selectors, network quiescence, loading-overlay disappearance. Waits that
//! gate correctness return `Timeout`; settling waits degrade to a warning
//! and proceed.

use std::time::{Duration, Instant};

use chromiumoxide::Page;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::PortalError;

/// Poll interval for selector waits.
const POLL_INTERVAL_MS: u64 = 250;

/// Network idle wait bound and check interval.
const NETWORK_IDLE_TIMEOUT_MS: u64 = 30000;
const NETWORK_IDLE_CHECK_INTERVAL_MS: u64 = 500;

/// Loading-overlay disappearance bound.
const OVERLAY_TIMEOUT_MS: u64 = 15000;

/// Fixed settling delay after the waits above; the portal re-renders the
/// result listing slightly after the network goes quiet.
const SETTLE_DELAY_MS: u64 = 2500;

/// Escape a string as a JS string literal.
pub(crate) fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

async fn eval_bool(page: &Page, script: &str) -> Result<bool, PortalError> {
    let result = page
        .evaluate(script)
        .await
        .map_err(|e| PortalError::JavaScript(e.to_string()))?;
    Ok(result.into_value::<bool>().unwrap_or(false))
}

/// Whether the selector currently matches an element.
pub async fn selector_exists(page: &Page, selector: &str) -> Result<bool, PortalError> {
    let script = format!("document.querySelector({}) !== null", js_string(selector));
    eval_bool(page, &script).await
}

/// Wait until the selector matches an element.
pub async fn wait_for_selector(
    page: &Page,
    selector: &str,
    timeout: Duration,
) -> Result<(), PortalError> {
    let start = Instant::now();
    loop {
        if selector_exists(page, selector).await? {
            return Ok(());
        }
        if start.elapsed() > timeout {
            return Err(PortalError::Timeout(format!(
                "selector {} not found within {:?}",
                selector, timeout
            )));
        }
        sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
}

/// Wait for whichever of `candidates` appears first and return its index.
///
/// Used wherever the portal can resolve a step in more than one way (login
/// success vs. authentication error) and emits no event saying which.
pub async fn race_selectors(
    page: &Page,
    candidates: &[&str],
    timeout: Duration,
) -> Result<usize, PortalError> {
    let sels = serde_json::to_string(candidates)
        .map_err(|e| PortalError::JavaScript(e.to_string()))?;
    let script = format!(
        r#"
        (() => {{
            const sels = {sels};
            for (let i = 0; i < sels.length; i++) {{
                if (document.querySelector(sels[i]) !== null) return i;
            }}
            return -1;
        }})()
        "#
    );

    let start = Instant::now();
    loop {
        let result = page
            .evaluate(script.as_str())
            .await
            .map_err(|e| PortalError::JavaScript(e.to_string()))?;
        let index = result.into_value::<i64>().unwrap_or(-1);
        if index >= 0 {
            debug!("race resolved to {} after {:?}", candidates[index as usize], start.elapsed());
            return Ok(index as usize);
        }
        if start.elapsed() > timeout {
            return Err(PortalError::Timeout(format!(
                "none of {:?} appeared within {:?}",
                candidates, timeout
            )));
        }
        sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
}

/// Click an element through in-page JS. Several portal controls sit behind
/// Angular handlers that only fire on a DOM-level click.
pub async fn click(page: &Page, selector: &str) -> Result<(), PortalError> {
    let script = format!(
        r#"
        (() => {{
            const el = document.querySelector({});
            if (el === null) return false;
            el.click();
            return true;
        }})()
        "#,
        js_string(selector)
    );
    if eval_bool(page, &script).await? {
        Ok(())
    } else {
        Err(PortalError::ElementNotFound(selector.to_string()))
    }
}

/// Wait for network requests to go quiet. Degrades to a warning on expiry;
/// the fixed settle delay still applies afterwards.
pub async fn wait_request_idle(page: &Page) {
    let start = Instant::now();
    let timeout = Duration::from_millis(NETWORK_IDLE_TIMEOUT_MS);

    let mut idle_count = 0;
    const REQUIRED_IDLE_CHECKS: u32 = 3;

    while start.elapsed() < timeout {
        let result = page
            .evaluate(
                r#"
                (() => {
                    const entries = performance.getEntriesByType('resource');
                    const now = performance.now();
                    const recent = entries.filter(e => {
                        return (now - e.startTime) < 500 && e.duration === 0;
                    });
                    return recent.length === 0;
                })()
                "#,
            )
            .await;

        match result.map(|val| val.into_value::<bool>().unwrap_or(false)) {
            Ok(true) => {
                idle_count += 1;
                if idle_count >= REQUIRED_IDLE_CHECKS {
                    debug!("network idle after {:?}", start.elapsed());
                    return;
                }
            }
            Ok(false) => idle_count = 0,
            Err(e) => {
                debug!("network idle check error: {}", e);
                idle_count = 0;
            }
        }

        sleep(Duration::from_millis(NETWORK_IDLE_CHECK_INTERVAL_MS)).await;
    }

    warn!("network idle timeout after {:?}, proceeding anyway", start.elapsed());
}

/// Wait for visible loading overlays to disappear. Degrades to a warning on
/// expiry.
pub async fn wait_overlay_gone(page: &Page) {
    let start = Instant::now();
    let timeout = Duration::from_millis(OVERLAY_TIMEOUT_MS);

    while start.elapsed() < timeout {
        let result = page
            .evaluate(
                r#"
                (() => {
                    const overlays = document.querySelectorAll(
                        '[class*="loading"], [class*="spinner"], .overlay-backdrop'
                    );
                    const visible = [...overlays].filter(el => {
                        const style = window.getComputedStyle(el);
                        const rect = el.getBoundingClientRect();
                        return style.display !== 'none' &&
                               style.visibility !== 'hidden' &&
                               (rect.width > 0 || rect.height > 0);
                    });
                    return visible.length === 0;
                })()
                "#,
            )
            .await;

        match result.map(|val| val.into_value::<bool>().unwrap_or(false)) {
            Ok(true) => {
                debug!("no visible overlay after {:?}", start.elapsed());
                return;
            }
            Ok(false) => {}
            Err(e) => debug!("overlay check error: {}", e),
        }

        sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }

    warn!("overlay still visible after {:?}, proceeding anyway", start.elapsed());
}

/// Settling wait after a query submission: network quiescence, overlay
/// disappearance, then a fixed delay for the final re-render.
pub async fn settle(page: &Page) {
    wait_request_idle(page).await;
    wait_overlay_gone(page).await;
    sleep(Duration::from_millis(SETTLE_DELAY_MS)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string(".card"), "\".card\"");
        assert_eq!(
            js_string("button[type=\"submit\"]"),
            "\"button[type=\\\"submit\\\"]\""
        );
    }
}
