use std::{env, path::PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/state.json";
const DEFAULT_APP_NAME: &str = "TipIn";
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 30;
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub app_name: String,
    /// Lowercased addresses that receive the coach role on sign-up.
    pub coach_emails: Vec<String>,
    pub session_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_path = lookup("APP_DATA_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let app_name = lookup("APP_NAME")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        let coach_emails = lookup("COACH_EMAILS")
            .map(|value| {
                value
                    .split(',')
                    .map(|email| email.trim().to_lowercase())
                    .filter(|email| !email.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let session_ttl_hours = lookup("SESSION_TTL_HOURS")
            .and_then(|value| value.parse::<i64>().ok())
            .filter(|hours| (1..=MAX_SESSION_TTL_HOURS).contains(hours))
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS);

        Self {
            port,
            data_path,
            app_name,
            coach_emails,
            session_ttl_hours,
        }
    }

    pub fn is_coach_email(&self, email: &str) -> bool {
        self.coach_emails.iter().any(|coach| coach == email)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
