use std::path::PathBuf;
use std::time::Duration;

/// Status filter applied to the antecipado query.
///
/// The portal renders these as positional entries of an ng-select dropdown;
/// the mapping to option positions lives in `portal::selectors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// "Em liquidado" — the default in production runs.
    #[default]
    Settled,
    /// Open (unsettled) assessments only.
    Open,
    /// No status restriction.
    All,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Semicolon-delimited account list (EMPRESA;LOGIN;SENHA;TIPO).
    pub input_path: PathBuf,
    /// Base directory for artifacts; per-account subdirectories are created
    /// under it, plus `auth-error/` for failed sign-ins.
    pub output_path: PathBuf,
    pub headless: bool,
    pub status_filter: StatusFilter,
    /// When enabled, SN (Simples Nacional) accounts also query the month
    /// before the primary period.
    pub include_previous_period: bool,
    /// Bound on the login success/error race.
    pub login_timeout: Duration,
    /// Bound on waiting for a blob download target.
    pub download_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("./input.csv"),
            output_path: PathBuf::from("./output"),
            headless: false,
            status_filter: StatusFilter::Settled,
            include_previous_period: true,
            login_timeout: Duration::from_secs(20),
            download_timeout: Duration::from_secs(30),
        }
    }
}

impl RunConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            ..Default::default()
        }
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_status_filter(mut self, filter: StatusFilter) -> Self {
        self.status_filter = filter;
        self
    }

    pub fn with_previous_period(mut self, enabled: bool) -> Self {
        self.include_previous_period = enabled;
        self
    }

    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Directory for login-failure screenshots.
    pub fn auth_error_dir(&self) -> PathBuf {
        self.output_path.join("auth-error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.status_filter, StatusFilter::Settled);
        assert!(config.include_previous_period);
        assert!(!config.headless);
        assert_eq!(config.login_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_config_builder() {
        let config = RunConfig::new("contas.csv", "/tmp/saida")
            .with_headless(true)
            .with_status_filter(StatusFilter::All)
            .with_previous_period(false)
            .with_download_timeout(Duration::from_secs(60));

        assert_eq!(config.input_path, PathBuf::from("contas.csv"));
        assert_eq!(config.output_path, PathBuf::from("/tmp/saida"));
        assert!(config.headless);
        assert_eq!(config.status_filter, StatusFilter::All);
        assert!(!config.include_previous_period);
        assert_eq!(config.download_timeout, Duration::from_secs(60));
        assert_eq!(config.auth_error_dir(), PathBuf::from("/tmp/saida/auth-error"));
    }
}
