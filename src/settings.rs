use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use regex::Regex;
use once_cell::sync::Lazy;
use std::{env, fmt, str::FromStr};
use url::Url;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

/// Mailbox addresses may carry a display name: `Site <contact@example.com>`.
static MAILBOX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[^<>]*<)?[^\s@<>]+@[^\s@<>]+\.[^\s@<>]+>?$").expect("mailbox pattern is valid")
});

/// Longest accepted rate-limit window.
pub const MAX_RATE_LIMIT_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub trust_x_forwarded_for: bool,

    /// When set, rate-limit counters live in Redis and are shared between instances.
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    #[serde(default = "default_rate_limit_purge_interval_secs")]
    pub rate_limit_purge_interval_secs: u64,

    #[serde(default)]
    pub email_api_key: String,

    #[serde(default = "default_email_api_base_url")]
    pub email_api_base_url: Url,

    #[serde(default = "default_email_from")]
    pub email_from: String,

    #[serde(default = "default_email_to")]
    pub email_to: String,

    #[serde(default = "default_email_subject_tag")]
    pub email_subject_tag: String,

    #[serde(default = "default_email_timeout_secs")]
    pub email_timeout_secs: u64,

    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Offset of the site's regional time zone, used for timestamps in outgoing mail.
    #[serde(default = "default_display_utc_offset_minutes")]
    pub display_utc_offset_minutes: i32,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-Contact-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_rate_limit_max_requests() -> u32 {
    5
}
fn default_rate_limit_window_secs() -> u64 {
    60 * 60
}
fn default_rate_limit_purge_interval_secs() -> u64 {
    5 * 60
}
fn default_email_api_base_url() -> Url {
    Url::parse("https://api.resend.com").expect("default email API URL is valid")
}
fn default_email_from() -> String {
    "contact@kwt.co.kr".to_string()
}
fn default_email_to() -> String {
    "kwt@kwt.co.kr".to_string()
}
fn default_email_subject_tag() -> String {
    "[KWT 문의]".to_string()
}
fn default_email_timeout_secs() -> u64 {
    10
}
fn default_site_name() -> String {
    "KWT.CO.KR".to_string()
}
fn default_display_utc_offset_minutes() -> i32 {
    // Asia/Seoul, no daylight saving
    9 * 60
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .try_parsing(true)
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        config.email_api_key = fill_or_env(config.email_api_key, "APP_EMAIL_API_KEY")?;

        if config.redis_url.is_none() {
            config.redis_url = env::var("APP_REDIS_URL").ok().filter(|url| !url.trim().is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.email_api_key.trim().is_empty() {
            errors.push("EMAIL_API_KEY cannot be empty");
        }
        if !MAILBOX.is_match(&self.email_from) {
            errors.push("EMAIL_FROM must be a valid mailbox address");
        }
        if !MAILBOX.is_match(&self.email_to) {
            errors.push("EMAIL_TO must be a valid mailbox address");
        }
        if self.rate_limit_max_requests == 0 {
            errors.push("RATE_LIMIT_MAX_REQUESTS must be greater than zero");
        }
        if self.rate_limit_window_secs == 0 || self.rate_limit_window_secs > MAX_RATE_LIMIT_WINDOW_SECS {
            errors.push("RATE_LIMIT_WINDOW_SECS must be between 1 second and 7 days");
        }
        if self.rate_limit_purge_interval_secs == 0 {
            errors.push("RATE_LIMIT_PURGE_INTERVAL_SECS must be greater than zero");
        }
        if self.email_timeout_secs == 0 {
            errors.push("EMAIL_TIMEOUT_SECS must be greater than zero");
        }
        if self.display_utc_offset_minutes.abs() >= 24 * 60 {
            errors.push("DISPLAY_UTC_OFFSET_MINUTES must be within one day");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

pub(crate) trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("trust_x_forwarded_for", &self.trust_x_forwarded_for)
            .field("redis_url", &self.redis_url.as_deref().map(|url| url.redact()))
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("rate_limit_purge_interval_secs", &self.rate_limit_purge_interval_secs)
            .field("email_api_key", &self.email_api_key.redact())
            .field("email_api_base_url", &self.email_api_base_url.as_str())
            .field("email_from", &self.email_from)
            .field("email_to", &self.email_to)
            .field("email_subject_tag", &self.email_subject_tag)
            .field("email_timeout_secs", &self.email_timeout_secs)
            .field("site_name", &self.site_name)
            .field("display_utc_offset_minutes", &self.display_utc_offset_minutes)
            .finish()
    }
}

/// Valid configuration for unit tests; no environment lookups.
#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: default_name(),
        port: 0,
        host: default_host(),
        worker_count: 1,
        cors_allowed_origins: default_cors_origins(),
        trust_x_forwarded_for: false,
        redis_url: None,
        rate_limit_max_requests: default_rate_limit_max_requests(),
        rate_limit_window_secs: default_rate_limit_window_secs(),
        rate_limit_purge_interval_secs: default_rate_limit_purge_interval_secs(),
        email_api_key: "re_test_key".to_string(),
        email_api_base_url: default_email_api_base_url(),
        email_from: default_email_from(),
        email_to: default_email_to(),
        email_subject_tag: default_email_subject_tag(),
        email_timeout_secs: default_email_timeout_secs(),
        site_name: default_site_name(),
        display_utc_offset_minutes: default_display_utc_offset_minutes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        test_config()
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let config = AppConfig { email_api_key: "  ".into(), ..valid_config() };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("EMAIL_API_KEY"));
    }

    #[test]
    fn zero_quota_is_rejected() {
        let config = AppConfig { rate_limit_max_requests: 0, ..valid_config() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn mailbox_with_display_name_is_accepted() {
        let config = AppConfig { email_from: "KWT <contact@kwt.co.kr>".into(), ..valid_config() };
        assert!(config.validate().is_ok());

        let config = AppConfig { email_to: "not-an-address".into(), ..valid_config() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn wildcard_cors_is_rejected_in_production() {
        let config = AppConfig { env: AppEnvironment::Production, ..valid_config() };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("Wildcard CORS"));

        let config = AppConfig {
            env: AppEnvironment::Production,
            cors_allowed_origins: vec!["https://kwt.co.kr, https://www.kwt.co.kr".into()],
            ..valid_config()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.cors_origins().len(), 2);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let rendered = format!("{:?}", valid_config());
        assert!(!rendered.contains("re_test_key"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
