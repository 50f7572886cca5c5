//! Query periods (competências).
//!
//! The primary period is always the month before the run date. SN accounts
//! additionally query the month before that when the previous-period toggle
//! is enabled.

use chrono::{Datelike, Local, NaiveDate};

use crate::account::Account;

/// A calendar month targeted by one antecipado query. Immutable once
/// computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPeriod {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
}

impl QueryPeriod {
    /// The calendar month `n` months before `today`.
    pub fn months_back(today: NaiveDate, n: u32) -> Self {
        let total = today.year() * 12 + today.month0() as i32 - n as i32;
        Self {
            year: total.div_euclid(12),
            month: total.rem_euclid(12) as u32 + 1,
        }
    }

    /// `antecipado-<year>-<month>.png` — result-card screenshot.
    pub fn screenshot_name(&self) -> String {
        format!("antecipado-{}-{}.png", self.year, self.month)
    }

    /// `antecipado-<year>-<month>.pdf` — printed computed assessment.
    pub fn assessment_name(&self) -> String {
        format!("antecipado-{}-{}.pdf", self.year, self.month)
    }

    /// `doc-arrecadacao-<year>-<month>.pdf` — collection document (DAR).
    pub fn collection_name(&self) -> String {
        format!("doc-arrecadacao-{}-{}.pdf", self.year, self.month)
    }
}

/// Periods to query for one account, most recent first.
pub fn periods_for(account: &Account, include_previous: bool) -> Vec<QueryPeriod> {
    periods_from(account, include_previous, Local::now().date_naive())
}

fn periods_from(account: &Account, include_previous: bool, today: NaiveDate) -> Vec<QueryPeriod> {
    let mut periods = vec![QueryPeriod::months_back(today, 1)];
    if include_previous && account.is_simples_nacional() {
        periods.push(QueryPeriod::months_back(today, 2));
    }
    periods
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(tipo: &str) -> Account {
        Account {
            empresa: "Acme".into(),
            login: "user1".into(),
            senha: "pass1".into(),
            tipo: tipo.into(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_months_back() {
        let today = date(2024, 5, 17);
        assert_eq!(
            QueryPeriod::months_back(today, 1),
            QueryPeriod { year: 2024, month: 4 }
        );
        assert_eq!(
            QueryPeriod::months_back(today, 2),
            QueryPeriod { year: 2024, month: 3 }
        );
    }

    #[test]
    fn test_months_back_year_rollover() {
        let january = date(2024, 1, 10);
        assert_eq!(
            QueryPeriod::months_back(january, 1),
            QueryPeriod { year: 2023, month: 12 }
        );
        let february = date(2024, 2, 10);
        assert_eq!(
            QueryPeriod::months_back(february, 2),
            QueryPeriod { year: 2023, month: 12 }
        );
    }

    #[test]
    fn test_sn_account_gets_two_periods() {
        let periods = periods_from(&account("SN"), true, date(2024, 5, 17));
        assert_eq!(
            periods,
            vec![
                QueryPeriod { year: 2024, month: 4 },
                QueryPeriod { year: 2024, month: 3 },
            ]
        );
    }

    #[test]
    fn test_regular_account_gets_one_period() {
        let periods = periods_from(&account("NORMAL"), true, date(2024, 5, 17));
        assert_eq!(periods, vec![QueryPeriod { year: 2024, month: 4 }]);
    }

    #[test]
    fn test_previous_period_toggle_off() {
        let periods = periods_from(&account("SN"), false, date(2024, 5, 17));
        assert_eq!(periods.len(), 1);
    }

    #[test]
    fn test_artifact_names_unpadded() {
        let period = QueryPeriod { year: 2024, month: 3 };
        assert_eq!(period.screenshot_name(), "antecipado-2024-3.png");
        assert_eq!(period.assessment_name(), "antecipado-2024-3.pdf");
        assert_eq!(period.collection_name(), "doc-arrecadacao-2024-3.pdf");
    }
}
