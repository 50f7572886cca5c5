//! Account list input.
//!
//! One row per taxpayer account, semicolon-delimited with a header line:
//! `EMPRESA;LOGIN;SENHA;TIPO`. The CNPJ is not part of the input; it is
//! extracted from the portal after login.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::PortalError;

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    #[serde(rename = "EMPRESA")]
    pub empresa: String,
    #[serde(rename = "LOGIN")]
    pub login: String,
    #[serde(rename = "SENHA")]
    pub senha: String,
    #[serde(rename = "TIPO")]
    pub tipo: String,
}

impl Account {
    /// SN (Simples Nacional) accounts also get a query for the month before
    /// the primary period.
    pub fn is_simples_nacional(&self) -> bool {
        self.tipo.trim() == "SN"
    }
}

pub fn read_accounts(path: impl AsRef<Path>) -> Result<Vec<Account>, PortalError> {
    let file = std::fs::File::open(path)?;
    parse_accounts(file)
}

pub fn parse_accounts(reader: impl Read) -> Result<Vec<Account>, PortalError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut accounts = Vec::new();
    for row in csv_reader.deserialize() {
        let account: Account = row?;
        accounts.push(account);
    }
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = "EMPRESA;LOGIN;SENHA;TIPO\n\
                         Acme;user1;pass1;SN\n\
                         Beta Ltda;user2;pass2;NORMAL\n";

    #[test]
    fn test_parse_accounts() {
        let accounts = parse_accounts(INPUT.as_bytes()).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].empresa, "Acme");
        assert_eq!(accounts[0].login, "user1");
        assert_eq!(accounts[0].senha, "pass1");
        assert!(accounts[0].is_simples_nacional());
        assert_eq!(accounts[1].empresa, "Beta Ltda");
        assert!(!accounts[1].is_simples_nacional());
    }

    #[test]
    fn test_parse_accounts_crlf() {
        let input = "EMPRESA;LOGIN;SENHA;TIPO\r\nAcme;user1;pass1;SN\r\n";
        let accounts = parse_accounts(input.as_bytes()).unwrap();
        assert_eq!(accounts.len(), 1);
        assert!(accounts[0].is_simples_nacional());
    }

    #[test]
    fn test_parse_accounts_missing_column() {
        let input = "EMPRESA;LOGIN\nAcme;user1\n";
        assert!(parse_accounts(input.as_bytes()).is_err());
    }
}
