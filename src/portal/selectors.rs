//! Portal URLs and CSS selectors.
//!
//! The portal is an Angular SPA without stable ids for most of the issuance
//! controls, so several of these are positional chains lifted from the
//! rendered DOM. They are the contract this whole crate depends on.

use crate::config::StatusFilter;

pub const PORTAL_URL: &str = "https://contribuinte.sefaz.al.gov.br/#/";
pub const QUERY_URL: &str = "https://contribuinte.sefaz.al.gov.br/cobrancadfe/#/calculo-nfe";

// Sign-in
pub const LOGIN_ENTRY_BUTTON: &str = ".action-button";
pub const USERNAME_INPUT: &str = "#username";
pub const PASSWORD_INPUT: &str = "#password";
pub const LOGGED_IN_BANNER: &str = "#mensagem-logado-como";
pub const AUTH_ERROR_BANNER: &str = ".alert.alert-danger";

// Both the login form and the query form submit through the only
// `button[type=submit]` rendered on their respective views.
pub const SUBMIT_BUTTON: &str = "button[type=submit]";

// Query section
pub const CNPJ_BANNER: &str = ".alert.alert-data";
pub const STATUS_SELECT: &str = "#situacoes-select";
pub const RESULT_CARD: &str = ".card";

// Issuance controls inside the result listing
pub const PENDING_DOCS_BUTTON: &str = "body > jhi-main > div.container-fluid > div > jhi-calculo-nfe > div > div:nth-child(7) > div:nth-child(3) > div > div > div > div:nth-child(1) > button";
pub const SELECT_ALL_CHECKBOX: &str = "#checkall";
pub const PRINT_BUTTON: &str = "body > jhi-main > div.container-fluid > div > jhi-calculo-nfe > div > div:nth-child(7) > div:nth-child(2) > div > div > div > div:nth-child(2) > button";
pub const ISSUE_BUTTON: &str = "body > jhi-main > div.container-fluid > div > jhi-calculo-nfe > div > div:nth-child(7) > div:nth-child(3) > div > div > div > div:nth-child(2) > button";
pub const CONFIRM_ISSUE_BUTTON: &str = "body > ngb-modal-window > div > div > jhi-confirmar-emissao-dar-consolidado > div.modal-body.container-tidy button.btn.btn-outline-success";
pub const DUE_DATE_CONFIRM_BUTTON: &str = "body > ngb-modal-window > div > div > jhi-escolher-vencimento-dar > div.modal-body.container-tidy > div.text-center.my-3 > button.btn.btn-outline-success";

/// The month picker exposes one control per month of the year; the control
/// for month `m` (1-based) sits at `:nth-child(m + 3)`.
pub fn month_picker(month: u32) -> String {
    format!(
        "#pickerForm .row div.col-4:nth-child({}) span",
        month + 3
    )
}

impl StatusFilter {
    /// Positional option inside the ng-select dropdown panel.
    // TODO: confirm the All/Open positions against the live portal; only the
    // Settled position is attested in production runs.
    pub fn option_selector(self) -> &'static str {
        match self {
            StatusFilter::All => ".ng-dropdown-panel-items > div:nth-child(2) div:nth-child(1)",
            StatusFilter::Open => ".ng-dropdown-panel-items > div:nth-child(2) div:nth-child(2)",
            StatusFilter::Settled => ".ng-dropdown-panel-items > div:nth-child(2) div:nth-child(3)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_picker_positions() {
        assert_eq!(
            month_picker(1),
            "#pickerForm .row div.col-4:nth-child(4) span"
        );
        assert_eq!(
            month_picker(12),
            "#pickerForm .row div.col-4:nth-child(15) span"
        );
    }

    #[test]
    fn test_status_filter_options() {
        assert!(StatusFilter::Settled.option_selector().ends_with("div:nth-child(3)"));
        assert!(StatusFilter::Open.option_selector().ends_with("div:nth-child(2)"));
        assert!(StatusFilter::All.option_selector().ends_with("div:nth-child(1)"));
    }
}
