//! Sign-in, sign-in outcome detection, and session reset.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use tracing::{debug, info, warn};

use crate::account::Account;
use crate::config::RunConfig;
use crate::error::PortalError;
use crate::portal::selectors;
use crate::portal::wait;

/// Bound on the pre-login selectors (entry button, credential inputs).
const LOGIN_FORM_TIMEOUT: Duration = Duration::from_secs(15);
/// Bound on the CNPJ banner after opening the query section.
const BANNER_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    Failure,
}

pub struct SessionController<'a> {
    page: &'a Page,
    config: &'a RunConfig,
}

impl<'a> SessionController<'a> {
    pub fn new(page: &'a Page, config: &'a RunConfig) -> Self {
        Self { page, config }
    }

    /// Submit the login form and race the logged-in banner against the
    /// authentication-error banner. The portal emits no structured signal
    /// for either outcome, so whichever selector appears first decides.
    pub async fn login(&self, account: &Account) -> Result<AuthOutcome, PortalError> {
        info!("signing in as {}", account.empresa);

        self.page
            .goto(selectors::PORTAL_URL)
            .await
            .map_err(|e| PortalError::Navigation(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| PortalError::Navigation(e.to_string()))?;

        wait::wait_for_selector(self.page, selectors::LOGIN_ENTRY_BUTTON, LOGIN_FORM_TIMEOUT)
            .await?;
        wait::click(self.page, selectors::LOGIN_ENTRY_BUTTON).await?;

        wait::wait_for_selector(self.page, selectors::USERNAME_INPUT, LOGIN_FORM_TIMEOUT).await?;
        wait::wait_for_selector(self.page, selectors::PASSWORD_INPUT, LOGIN_FORM_TIMEOUT).await?;

        self.page
            .find_element(selectors::USERNAME_INPUT)
            .await
            .map_err(|e| PortalError::ElementNotFound(format!("username input: {}", e)))?
            .type_str(&account.login)
            .await
            .map_err(|e| PortalError::Auth(format!("typing username: {}", e)))?;

        self.page
            .find_element(selectors::PASSWORD_INPUT)
            .await
            .map_err(|e| PortalError::ElementNotFound(format!("password input: {}", e)))?
            .type_str(&account.senha)
            .await
            .map_err(|e| PortalError::Auth(format!("typing password: {}", e)))?;

        wait::click(self.page, selectors::SUBMIT_BUTTON).await?;

        let winner = wait::race_selectors(
            self.page,
            &[selectors::LOGGED_IN_BANNER, selectors::AUTH_ERROR_BANNER],
            self.config.login_timeout,
        )
        .await?;

        if winner == 0 {
            debug!("logged-in banner detected");
            Ok(AuthOutcome::Success)
        } else {
            info!("authentication error banner detected for {}", account.empresa);
            Ok(AuthOutcome::Failure)
        }
    }

    /// Record a failed sign-in under `auth-error/<label>.png`.
    pub async fn capture_auth_failure(&self, label: &str) -> Result<PathBuf, PortalError> {
        let dir = self.config.auth_error_dir();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.png", label));

        self.page
            .save_screenshot(
                ScreenshotParams::builder().full_page(true).build(),
                &path,
            )
            .await
            .map_err(|e| PortalError::Download(format!("auth failure screenshot: {}", e)))?;

        info!("auth failure screenshot saved to {:?}", path);
        Ok(path)
    }

    /// Navigate to the antecipado query section and extract the account's
    /// CNPJ from the informational banner. A missing banner is fatal for
    /// the account.
    pub async fn open_query_section(&self) -> Result<String, PortalError> {
        self.page
            .goto(selectors::QUERY_URL)
            .await
            .map_err(|e| PortalError::Navigation(e.to_string()))?;

        wait::wait_for_selector(self.page, selectors::CNPJ_BANNER, BANNER_TIMEOUT).await?;

        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                return el === null ? null : el.textContent;
            }})()
            "#,
            wait::js_string(selectors::CNPJ_BANNER)
        );
        let result = self
            .page
            .evaluate(script.as_str())
            .await
            .map_err(|e| PortalError::JavaScript(e.to_string()))?;
        let text = result
            .into_value::<Option<String>>()
            .ok()
            .flatten()
            .ok_or_else(|| PortalError::ElementNotFound("CNPJ banner text".to_string()))?;

        let cnpj = strip_non_digits(&text);
        if cnpj.is_empty() {
            return Err(PortalError::ElementNotFound(
                "no CNPJ digits in banner".to_string(),
            ));
        }

        debug!("extracted CNPJ {}", cnpj);
        Ok(cnpj)
    }

    /// Clear client-side storage and navigate to a neutral page so nothing
    /// leaks into the next account's cycle. Never fails: both steps are
    /// attempted regardless, and problems are only logged.
    pub async fn reset(&self) {
        if let Err(e) = self
            .page
            .evaluate("localStorage.clear(); sessionStorage.clear();")
            .await
        {
            warn!("failed to clear client storage: {}", e);
        }

        if let Err(e) = self.page.goto("about:blank").await {
            warn!("failed to navigate away during reset: {}", e);
        }
    }
}

/// The banner renders the CNPJ with punctuation (`12.345.678/0001-95`).
pub(crate) fn strip_non_digits(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_non_digits() {
        assert_eq!(
            strip_non_digits("CNPJ: 12.345.678/0001-95"),
            "12345678000195"
        );
        assert_eq!(strip_non_digits("sem dígitos"), "");
    }
}
