use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use admission_core::models::upload::MAX_UPLOAD_BYTES;

#[derive(Clone, Debug)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, localstack). Implies path-style addressing.
    pub endpoint: Option<String>,
    /// Overrides the `https://{bucket}.s3.{region}.amazonaws.com` URL prefix.
    pub public_base_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RazorpaySettings {
    pub key_id: String,
    pub secret: String,
    pub api_base: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub s3: S3Settings,
    pub razorpay: RazorpaySettings,
    pub max_upload_bytes: usize,
    pub upload_timeout: Duration,
    pub max_body_bytes: usize,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            database_url: get("DATABASE_URL").context("DATABASE_URL must be set")?,

            bind_addr: get("ADMISSION_BIND").unwrap_or_else(|| "0.0.0.0:3000".to_string()),

            db_max_connections: parse_or(get("ADMISSION_DB_MAX_CONNECTIONS"), "ADMISSION_DB_MAX_CONNECTIONS", 5)?,

            s3: S3Settings {
                bucket: get("S3_BUCKET").unwrap_or_else(|| "admission-uploads".to_string()),
                region: get("S3_REGION")
                    .or_else(|| get("AWS_REGION"))
                    .unwrap_or_else(|| "us-east-1".to_string()),
                endpoint: get("S3_ENDPOINT"),
                public_base_url: get("S3_PUBLIC_BASE_URL"),
            },

            razorpay: RazorpaySettings {
                key_id: get("RAZORPAY_KEY_ID").unwrap_or_default(),
                secret: get("RAZORPAY_SECRET").unwrap_or_default(),
                api_base: get("RAZORPAY_API_BASE")
                    .unwrap_or_else(|| "https://api.razorpay.com/v1".to_string()),
            },

            max_upload_bytes: parse_or(get("ADMISSION_MAX_UPLOAD_BYTES"), "ADMISSION_MAX_UPLOAD_BYTES", MAX_UPLOAD_BYTES)?,

            upload_timeout: Duration::from_secs(parse_or(
                get("ADMISSION_UPLOAD_TIMEOUT_SECS"),
                "ADMISSION_UPLOAD_TIMEOUT_SECS",
                30,
            )?),

            max_body_bytes: parse_or(get("ADMISSION_MAX_BODY_BYTES"), "ADMISSION_MAX_BODY_BYTES", 32 * 1024 * 1024)?,

            log_json: get("ADMISSION_LOG_JSON")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
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
    fn defaults_apply_when_only_database_is_set() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/admission")])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.upload_timeout, Duration::from_secs(30));
        assert_eq!(config.razorpay.api_base, "https://api.razorpay.com/v1");
        assert_eq!(config.s3.region, "us-east-1");
        assert!(!config.log_json);
    }

    #[test]
    fn missing_database_url_fails() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/admission"),
            ("AWS_REGION", "ap-south-1"),
            ("ADMISSION_MAX_UPLOAD_BYTES", "1048576"),
            ("ADMISSION_LOG_JSON", "true"),
        ]))
        .unwrap();
        assert_eq!(config.s3.region, "ap-south-1");
        assert_eq!(config.max_upload_bytes, 1_048_576);
        assert!(config.log_json);
    }

    #[test]
    fn bad_numbers_are_reported() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/admission"),
            ("ADMISSION_UPLOAD_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("ADMISSION_UPLOAD_TIMEOUT_SECS"));
    }
}
