use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

pub const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com/emails";

/// Reset codes live at least a minute and at most a day.
pub const RESET_CODE_TTL_RANGE_MINUTES: (i64, i64) = (1, 1_440);
/// Seconds between expired-code sweeps.
pub const RESET_SWEEP_INTERVAL_RANGE_SECS: (u64, u64) = (1, 3_600);

/// Deployment mode. Only `Development` ever discloses reset codes over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }
}

/// Credentials for the primary transactional email API.
#[derive(Debug, Clone)]
pub struct EmailApiConfig {
    pub url: String,
    pub api_key: String,
}

/// Credentials for the fallback SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub environment: Environment,
    pub reset_code_ttl_minutes: i64,
    pub reset_sweep_interval_secs: u64,
    pub email_from: String,
    pub email_api: Option<EmailApiConfig>,
    pub smtp: Option<SmtpConfig>,
    pub contact_inbox: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| AppError::InternalServerError("JWT_SECRET must be set".into()))?;

        let email_api = get("EMAIL_API_KEY").map(|api_key| EmailApiConfig {
            url: get("EMAIL_API_URL").unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string()),
            api_key,
        });

        let smtp = match get("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_or("SMTP_PORT", get("SMTP_PORT"), 587)?,
                username: get("SMTP_USERNAME").unwrap_or_default(),
                password: get("SMTP_PASSWORD").unwrap_or_default(),
            }),
            None => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            server_port: parse_or("SERVER_PORT", get("SERVER_PORT"), 8080)?,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret,
            environment: get("APP_ENV")
                .map(|raw| Environment::parse(&raw))
                .unwrap_or(Environment::Production),
            reset_code_ttl_minutes: parse_in_range(
                "RESET_CODE_TTL_MINUTES",
                get("RESET_CODE_TTL_MINUTES"),
                10,
                RESET_CODE_TTL_RANGE_MINUTES,
            )?,
            reset_sweep_interval_secs: parse_in_range(
                "RESET_SWEEP_INTERVAL_SECS",
                get("RESET_SWEEP_INTERVAL_SECS"),
                60,
                RESET_SWEEP_INTERVAL_RANGE_SECS,
            )?,
            email_from: get("EMAIL_FROM")
                .unwrap_or_else(|| "no-reply@shopforge.local".to_string()),
            email_api,
            smtp,
            contact_inbox: get("CONTACT_INBOX"),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn exposes_reset_codes(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw {
        Some(value) => value.trim().parse().map_err(|_| {
            AppError::InternalServerError(format!("{} must be a number, got {:?}", key, value))
        }),
        None => Ok(default),
    }
}

fn parse_in_range<T>(
    key: &str,
    raw: Option<String>,
    default: T,
    (min, max): (T, T),
) -> Result<T, AppError>
where
    T: FromStr + PartialOrd + fmt::Display,
{
    let value = parse_or(key, raw, default)?;
    if value < min || value > max {
        return Err(AppError::InternalServerError(format!(
            "{} must be between {} and {}, got {}",
            key, min, max, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.reset_code_ttl_minutes, 10);
        assert!(config.email_api.is_none());
        assert!(config.smtp.is_none());
        assert!(!config.exposes_reset_codes());
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_config_custom_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://test"),
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("APP_ENV", "development"),
            ("EMAIL_API_KEY", "re_123"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "465"),
            ("RESET_CODE_TTL_MINUTES", "15"),
        ]))
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://test"));
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert!(config.exposes_reset_codes());
        assert_eq!(config.reset_code_ttl_minutes, 15);

        let api = config.email_api.unwrap();
        assert_eq!(api.url, DEFAULT_EMAIL_API_URL);
        assert_eq!(api.api_key, "re_123");
        assert_eq!(config.smtp.unwrap().port, 465);
    }

    #[test]
    fn test_config_requires_jwt_secret() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("JWT_SECRET", "  ")])).is_err());
    }

    #[test]
    fn test_config_rejects_bad_numbers() {
        let result = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("SERVER_PORT", "eighty"),
        ]));
        match result {
            Err(AppError::InternalServerError(msg)) => assert!(msg.contains("SERVER_PORT")),
            other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unknown_environment_is_production() {
        let config = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("APP_ENV", "staging"),
        ]))
        .unwrap();
        assert!(!config.exposes_reset_codes());
    }

    #[test]
    fn test_reset_ttl_out_of_range_is_rejected() {
        for raw in ["0", "-5", "1441", "9223372036854775807", "99999999999999999999"] {
            let result = Config::from_lookup(lookup_from(&[
                ("JWT_SECRET", "s3cret"),
                ("RESET_CODE_TTL_MINUTES", raw),
            ]));
            match result {
                Err(AppError::InternalServerError(msg)) => {
                    assert!(msg.contains("RESET_CODE_TTL_MINUTES"), "{}: {}", raw, msg)
                }
                other => panic!("TTL {} accepted: {:?}", raw, other.map(|c| c.reset_code_ttl_minutes)),
            }
        }

        let longest = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("RESET_CODE_TTL_MINUTES", "1440"),
        ]))
        .unwrap();
        assert_eq!(longest.reset_code_ttl_minutes, 1_440);
    }

    #[test]
    fn test_zero_sweep_interval_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("RESET_SWEEP_INTERVAL_SECS", "0"),
        ]));
        match result {
            Err(AppError::InternalServerError(msg)) => {
                assert!(msg.contains("RESET_SWEEP_INTERVAL_SECS"))
            }
            other => panic!("zero interval accepted: {:?}", other.map(|c| c.reset_sweep_interval_secs)),
        }
    }
}
