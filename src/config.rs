use crate::client::{BASE_URL, DEFAULT_TIMEOUT};
use crate::error::ReportError;
use crate::models::{ReportFilters, ReportWindow};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_JSON_OUTPUT: &str = "output.json";
pub const DEFAULT_CSV_OUTPUT: &str = "output.csv";

/// Everything a single export run needs.
#[derive(Clone)]
pub struct Config {
    pub email: String,
    pub password: String,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub window: ReportWindow,
    pub filters: ReportFilters,
    pub json_output: PathBuf,
    pub csv_output: PathBuf,
}

impl Config {
    /// Config with the default endpoint, timeout and output paths.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        api_key: impl Into<String>,
        window: ReportWindow,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            window,
            filters: ReportFilters::default(),
            json_output: PathBuf::from(DEFAULT_JSON_OUTPUT),
            csv_output: PathBuf::from(DEFAULT_CSV_OUTPUT),
        }
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.email.trim().is_empty() {
            return Err(ReportError::MissingCredential("EMAIL"));
        }
        if self.password.is_empty() {
            return Err(ReportError::MissingCredential("PASSWORD"));
        }
        if self.api_key.trim().is_empty() {
            return Err(ReportError::MissingCredential("API_KEY"));
        }
        if self.base_url.trim().is_empty() {
            return Err(ReportError::InvalidParameter("base url must not be empty"));
        }
        if self.timeout.is_zero() {
            return Err(ReportError::InvalidParameter("timeout must be greater than zero"));
        }
        if self.json_output == self.csv_output {
            return Err(ReportError::InvalidParameter(
                "json and csv outputs must be different files",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("window", &self.window)
            .field("filters", &self.filters)
            .field("json_output", &self.json_output)
            .field("csv_output", &self.csv_output)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window() -> ReportWindow {
        ReportWindow::from_dates(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn accepts_complete_config() {
        let config = Config::new("me@example.com", "pw", "key", window());
        assert!(config.validate().is_ok());
        assert_eq!(config.json_output, PathBuf::from("output.json"));
        assert_eq!(config.csv_output, PathBuf::from("output.csv"));
    }

    #[test]
    fn reports_first_missing_credential() {
        let cases = [
            (Config::new("", "pw", "key", window()), "EMAIL"),
            (Config::new("me@example.com", "", "key", window()), "PASSWORD"),
            (Config::new("me@example.com", "pw", "  ", window()), "API_KEY"),
        ];
        for (config, expected) in cases {
            match config.validate() {
                Err(ReportError::MissingCredential(name)) => assert_eq!(name, expected),
                other => panic!("expected missing {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_shared_output_path() {
        let mut config = Config::new("me@example.com", "pw", "key", window());
        config.csv_output = config.json_output.clone();
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidParameter(_))
        ));
    }

    #[test]
    fn debug_hides_secrets() {
        let config = Config::new("me@example.com", "hunter2", "sk_live_123", window());
        let printed = format!("{config:?}");
        assert!(printed.contains("me@example.com"));
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("sk_live_123"));
    }
}
