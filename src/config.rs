use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_API_BASE: &str = "https://learn.reboot01.com";
pub const DEFAULT_EVENT_ID: i64 = 20;

const SIGNIN_PATH: &str = "/api/auth/signin";
const GRAPHQL_PATH: &str = "/api/graphql-engine/v1/graphql";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub event_id: i64,
    pub session_file: PathBuf,
    pub http_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            event_id: DEFAULT_EVENT_ID,
            session_file: default_session_file(std::env::var("HOME").ok()),
            http_timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let api_base = std::env::var("PROGRESS_API_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);

        let event_id = match std::env::var("PROGRESS_EVENT_ID") {
            Ok(value) => value
                .trim()
                .parse()
                .with_context(|| format!("PROGRESS_EVENT_ID must be an integer, got {value:?}"))?,
            Err(_) => defaults.event_id,
        };

        let session_file = std::env::var("PROGRESS_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_file);

        let http_timeout = match std::env::var("PROGRESS_HTTP_TIMEOUT_SECS") {
            Ok(value) => Some(Duration::from_secs(value.trim().parse().with_context(|| {
                format!("PROGRESS_HTTP_TIMEOUT_SECS must be a whole number, got {value:?}")
            })?)),
            Err(_) => None,
        };

        Ok(Self {
            api_base,
            event_id,
            session_file,
            http_timeout,
        })
    }

    pub fn signin_url(&self) -> String {
        format!("{}{}", self.api_base, SIGNIN_PATH)
    }

    pub fn graphql_url(&self) -> String {
        format!("{}{}", self.api_base, GRAPHQL_PATH)
    }
}

fn default_session_file(home: Option<String>) -> PathBuf {
    match home {
        Some(home) if !home.is_empty() => PathBuf::from(home)
            .join(".progress-dashboard")
            .join("session.json"),
        _ => PathBuf::from(".progress-session.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_hang_off_the_base() {
        let config = Config {
            api_base: "https://example.test".to_string(),
            ..Config::default()
        };
        assert_eq!(config.signin_url(), "https://example.test/api/auth/signin");
        assert_eq!(
            config.graphql_url(),
            "https://example.test/api/graphql-engine/v1/graphql"
        );
    }

    #[test]
    fn session_file_falls_back_without_home() {
        assert_eq!(
            default_session_file(Some("/home/avery".to_string())),
            PathBuf::from("/home/avery/.progress-dashboard/session.json")
        );
        assert_eq!(
            default_session_file(None),
            PathBuf::from(".progress-session.json")
        );
        assert_eq!(
            default_session_file(Some(String::new())),
            PathBuf::from(".progress-session.json")
        );
    }
}
