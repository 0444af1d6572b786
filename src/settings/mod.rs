// src/settings/mod.rs
//! Process configuration, read from the environment (and `.env` via dotenvy in
//! the binary). `from_lookup` takes any key -> value source so tests never touch
//! the real environment.

pub mod env;

use std::path::PathBuf;

use crate::sheets::error::{SheetError, SheetResult};
use env::{optional, parse_or};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/";
pub const DEFAULT_KEY_PATH: &str = "./credentials/google-service-account.json";
pub const DEFAULT_DEALS_TAB: &str = "Deals";
pub const DEFAULT_ADMINS_TAB: &str = "Admins";
pub const DEFAULT_PORT: u16 = 3001;

/// Service-account credential inputs. Inline fields win over the key file when
/// both the client email and the private key are present.
#[derive(Debug, Clone, Default)]
pub struct CredentialSettings {
    pub client_email: Option<String>,
    pub private_key: Option<String>,
    pub private_key_id: Option<String>,
    pub project_id: Option<String>,
    pub client_id: Option<String>,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub spreadsheet_id: String,
    pub api_base: String,
    pub deals_tab: String,
    pub admins_tab: String,
    pub bootstrap_admins: Vec<String>,
    pub port: u16,
    pub credentials: CredentialSettings,
}

impl Settings {
    pub fn from_env() -> SheetResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> SheetResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let spreadsheet_id = optional(&lookup, "GOOGLE_SHEETS_SPREADSHEET_ID").ok_or_else(|| {
            SheetError::Config("GOOGLE_SHEETS_SPREADSHEET_ID is not set".to_string())
        })?;

        let bootstrap_admins = optional(&lookup, "ADMIN_BOOTSTRAP_EMAILS")
            .map(|list| {
                list.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            spreadsheet_id,
            api_base: optional(&lookup, "SHEETS_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            deals_tab: optional(&lookup, "DEALS_SHEET_NAME").unwrap_or_else(|| DEFAULT_DEALS_TAB.to_string()),
            admins_tab: optional(&lookup, "ADMINS_SHEET_NAME").unwrap_or_else(|| DEFAULT_ADMINS_TAB.to_string()),
            bootstrap_admins,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            credentials: CredentialSettings {
                client_email: optional(&lookup, "GOOGLE_SHEETS_CLIENT_EMAIL"),
                private_key: optional(&lookup, "GOOGLE_SHEETS_PRIVATE_KEY"),
                private_key_id: optional(&lookup, "GOOGLE_PRIVATE_KEY_ID"),
                project_id: optional(&lookup, "GOOGLE_PROJECT_ID"),
                client_id: optional(&lookup, "GOOGLE_CLIENT_ID_SERVICE"),
                key_path: optional(&lookup, "GOOGLE_PRIVATE_KEY_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_PATH)),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[("GOOGLE_SHEETS_SPREADSHEET_ID", "sheet-1")])).unwrap();
        assert_eq!(settings.spreadsheet_id, "sheet-1");
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert_eq!(settings.deals_tab, "Deals");
        assert_eq!(settings.admins_tab, "Admins");
        assert_eq!(settings.port, DEFAULT_PORT);
        assert!(settings.bootstrap_admins.is_empty());
        assert_eq!(settings.credentials.key_path, PathBuf::from(DEFAULT_KEY_PATH));
        assert!(settings.credentials.client_email.is_none());
    }

    #[test]
    fn test_missing_spreadsheet_id_is_configuration_error() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.is_configuration());
        let err = Settings::from_lookup(lookup(&[("GOOGLE_SHEETS_SPREADSHEET_ID", "  ")])).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_overrides_and_bootstrap_list() {
        let settings = Settings::from_lookup(lookup(&[
            ("GOOGLE_SHEETS_SPREADSHEET_ID", "sheet-1"),
            ("PORT", "8080"),
            ("DEALS_SHEET_NAME", "Registrations"),
            ("ADMIN_BOOTSTRAP_EMAILS", " Ops@Example.com, ,lead@example.com"),
            ("GOOGLE_PRIVATE_KEY_PATH", "/secrets/sa.json"),
        ]))
        .unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.deals_tab, "Registrations");
        assert_eq!(settings.bootstrap_admins, vec!["ops@example.com", "lead@example.com"]);
        assert_eq!(settings.credentials.key_path, PathBuf::from("/secrets/sa.json"));
    }

    #[test]
    fn test_bad_port() {
        let err = Settings::from_lookup(lookup(&[
            ("GOOGLE_SHEETS_SPREADSHEET_ID", "sheet-1"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SheetError::Config(_)));
    }
}
