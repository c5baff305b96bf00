use std::env;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    /// Only the database commands need it.
    pub database_url: Option<String>,
    pub api_url: String,
    pub razorpay_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok(); // Load .env if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Config {
            database_url: get("DATABASE_URL"),
            api_url: get("ADMISSION_API_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            razorpay_secret: get("RAZORPAY_SECRET"),
        }
    }

    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set for this command")
    }
}
