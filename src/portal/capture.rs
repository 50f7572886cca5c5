//! Artifact capture: clipped result-card screenshots and PDF downloads.
//!
//! The portal does not issue conventional file downloads. Each PDF opens a
//! new browser target whose URL is a `blob:` reference; the bytes are read
//! back through the originating page (fetch + FileReader into a `data:`
//! URL) and persisted here.

use std::path::Path;
use std::time::{Duration, Instant};

use base64::Engine;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport};
use chromiumoxide::cdp::browser_protocol::target::TargetId;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::PortalError;
use crate::portal::query::{BoundingRect, ResultPanel};

/// Wide, short viewport for result-card captures. The card is wider than a
/// default window; the clip below never exceeds this width.
const VIEWPORT_WIDTH: u32 = 1600;
const VIEWPORT_HEIGHT: u32 = 500;

const TARGET_POLL_INTERVAL_MS: u64 = 250;

pub struct ArtifactCapture<'a> {
    browser: &'a Browser,
    page: &'a Page,
    download_timeout: Duration,
}

impl<'a> ArtifactCapture<'a> {
    pub fn new(browser: &'a Browser, page: &'a Page, download_timeout: Duration) -> Self {
        Self {
            browser,
            page,
            download_timeout,
        }
    }

    /// Save a PNG of the result card, clipped to the card's bounding box
    /// but never wider than the capture viewport.
    pub async fn screenshot(
        &self,
        panel: &ResultPanel<'_>,
        output: &Path,
    ) -> Result<(), PortalError> {
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(VIEWPORT_WIDTH as i64)
            .height(VIEWPORT_HEIGHT as i64)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(|e| PortalError::Download(format!("viewport override: {}", e)))?;
        self.page
            .execute(metrics)
            .await
            .map_err(|e| PortalError::Download(format!("viewport override: {}", e)))?;

        let rect = panel.bounding_box().await?;
        let clip = clip_to_viewport(rect, VIEWPORT_WIDTH as f64);

        self.page
            .save_screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .clip(clip)
                    .build(),
                output,
            )
            .await
            .map_err(|e| PortalError::Download(format!("screenshot: {}", e)))?;

        info!("screenshot saved to {:?}", output);
        Ok(())
    }

    /// Block until the portal spawns a `blob:` target, read its payload
    /// through the originating page, close the target, and return the
    /// decoded bytes. Bounded: the target may never appear if the UI action
    /// silently failed.
    ///
    /// Only targets created after this call starts are accepted; a leftover
    /// `blob:` target from an earlier capture must never satisfy this one,
    /// or the previous document's bytes would be persisted under the new
    /// filename.
    pub async fn capture_download(&self) -> Result<Vec<u8>, PortalError> {
        let known = self.target_ids().await?;

        let start = Instant::now();
        let popup = loop {
            if let Some(page) = self.find_blob_target(&known).await? {
                break page;
            }
            if start.elapsed() > self.download_timeout {
                return Err(PortalError::DownloadTimeout(self.download_timeout.as_secs()));
            }
            sleep(Duration::from_millis(TARGET_POLL_INTERVAL_MS)).await;
        };

        let blob_url = popup
            .url()
            .await
            .map_err(|e| PortalError::Download(e.to_string()))?
            .ok_or_else(|| PortalError::Download("blob target has no URL".to_string()))?;
        debug!("blob target detected: {}", blob_url);

        // The blob is only resolvable from the page that created it, so the
        // read happens in the originating page context, not in the popup.
        let script = format!(
            r#"
            (async () => {{
                const response = await fetch({});
                const blob = await response.blob();
                const reader = new FileReader();
                return await new Promise(resolve => {{
                    reader.onloadend = () => resolve(reader.result);
                    reader.readAsDataURL(blob);
                }});
            }})()
            "#,
            crate::portal::wait::js_string(&blob_url)
        );
        let result = self
            .page
            .evaluate(script.as_str())
            .await
            .map_err(|e| PortalError::JavaScript(e.to_string()))?;
        let data_url = result
            .into_value::<String>()
            .map_err(|e| PortalError::JavaScript(e.to_string()))?;

        let bytes = decode_data_url(&data_url)?;

        // A target that cannot be closed would still be live on the next
        // capture; fail the account rather than leave it behind.
        popup
            .close()
            .await
            .map_err(|e| PortalError::Download(format!("closing blob target: {}", e)))?;

        Ok(bytes)
    }

    /// `capture_download` + write to disk.
    pub async fn capture_pdf(&self, output: &Path) -> Result<(), PortalError> {
        let bytes = self.capture_download().await?;
        std::fs::write(output, &bytes)?;
        info!("document saved to {:?} ({} bytes)", output, bytes.len());
        Ok(())
    }

    /// Ids of every target currently open, taken before a capture so stale
    /// targets can be told apart from the one the click spawns.
    async fn target_ids(&self) -> Result<Vec<TargetId>, PortalError> {
        let pages = self
            .browser
            .pages()
            .await
            .map_err(|e| PortalError::Download(e.to_string()))?;
        Ok(pages.iter().map(|p| p.target_id().clone()).collect())
    }

    async fn find_blob_target(&self, known: &[TargetId]) -> Result<Option<Page>, PortalError> {
        let pages = self
            .browser
            .pages()
            .await
            .map_err(|e| PortalError::Download(e.to_string()))?;
        for page in pages {
            let url = match page.url().await {
                Ok(url) => url,
                Err(_) => continue,
            };
            if is_new_blob_target(url.as_deref(), page.target_id(), known) {
                return Ok(Some(page));
            }
        }
        Ok(None)
    }
}

/// A target satisfies a capture only if it holds a `blob:` URL and did not
/// exist when the capture started.
fn is_new_blob_target<T: PartialEq>(url: Option<&str>, id: &T, known: &[T]) -> bool {
    matches!(url, Some(u) if u.starts_with("blob:")) && !known.contains(id)
}

/// Clip at the card origin, clamped to the viewport width. The card can be
/// wider than the viewport; anything beyond it is not rendered.
fn clip_to_viewport(rect: BoundingRect, viewport_width: f64) -> Viewport {
    Viewport {
        x: rect.x,
        y: rect.y,
        width: rect.width.min(viewport_width),
        height: rect.height,
        scale: 1.0,
    }
}

/// Extract the base64 payload of a `data:` URL produced by FileReader.
fn decode_data_url(data_url: &str) -> Result<Vec<u8>, PortalError> {
    let payload = data_url
        .split_once(',')
        .map(|(_, payload)| payload)
        .ok_or_else(|| PortalError::Download("malformed data URL payload".to_string()))?;
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(width: f64, height: f64) -> BoundingRect {
        BoundingRect {
            x: 10.0,
            y: 20.0,
            width,
            height,
        }
    }

    #[test]
    fn test_clip_wider_than_viewport_clamps() {
        let clip = clip_to_viewport(rect(2400.0, 300.0), 1600.0);
        assert_eq!(clip.width, 1600.0);
        assert_eq!(clip.height, 300.0);
        assert_eq!(clip.x, 10.0);
        assert_eq!(clip.y, 20.0);
    }

    #[test]
    fn test_clip_narrower_than_viewport_keeps_width() {
        let clip = clip_to_viewport(rect(900.0, 450.0), 1600.0);
        assert_eq!(clip.width, 900.0);
        assert_eq!(clip.height, 450.0);
    }

    #[test]
    fn test_decode_data_url() {
        let bytes = decode_data_url("data:application/pdf;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_decode_data_url_without_payload() {
        assert!(decode_data_url("not a data url").is_err());
    }

    #[test]
    fn test_blob_target_must_be_new() {
        let known = vec!["t1", "t2"];
        assert!(is_new_blob_target(Some("blob:https://x/abc"), &"t3", &known));
        // A leftover target from an earlier capture never matches again.
        assert!(!is_new_blob_target(Some("blob:https://x/abc"), &"t1", &known));
    }

    #[test]
    fn test_non_blob_target_never_matches() {
        let known: Vec<&str> = Vec::new();
        assert!(!is_new_blob_target(Some("https://x/page"), &"t1", &known));
        assert!(!is_new_blob_target(None, &"t1", &known));
    }
}
