//! Operator-facing progress reporting. Pure side channel: nothing here is
//! consulted for control flow.

use std::fmt;

/// Fixed phase vocabulary shown next to the account label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Authenticating,
    Querying,
    SavingScreenshot,
    HasDocuments,
    NoDocuments,
    Printing,
    Issuing,
    Logout,
    Error,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Authenticating => "Autenticando",
            Phase::Querying => "Pesquisando Antecipado",
            Phase::SavingScreenshot => "Salvando print",
            Phase::HasDocuments => "Tem documentos",
            Phase::NoDocuments => "Não tem documentos",
            Phase::Printing => "Imprimindo",
            Phase::Issuing => "Emitindo",
            Phase::Logout => "Logout",
            Phase::Error => "Erro",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub trait ProgressSink: Send + Sync {
    fn update(&self, index: usize, total: usize, label: &str, phase: Phase);

    fn finish(&self) {}
}

/// Sink that reports nothing; used in tests and as the default.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn update(&self, _index: usize, _total: usize, _label: &str, _phase: Phase) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::Authenticating.to_string(), "Autenticando");
        assert_eq!(Phase::Querying.to_string(), "Pesquisando Antecipado");
        assert_eq!(Phase::SavingScreenshot.to_string(), "Salvando print");
        assert_eq!(Phase::NoDocuments.to_string(), "Não tem documentos");
        assert_eq!(Phase::Issuing.to_string(), "Emitindo");
    }
}
