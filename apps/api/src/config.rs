use anyhow::{anyhow, Context, Result};

use crate::auth::RoleCheck;

const DEFAULT_RESUME_PARSER_URL: &str = "https://api.apilayer.com/resume_parser/upload";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_public_key_path: String,
    pub jwt_private_key_path: String,
    pub role_check: RoleCheck,
    pub resume_parser_url: String,
    pub resume_parser_api_key: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            jwt_public_key_path: require("JWT_PUBLIC_KEY_PATH")?,
            jwt_private_key_path: require("JWT_PRIVATE_KEY_PATH")?,
            role_check: get("ROLE_CHECK")
                .map(|v| v.parse::<RoleCheck>().map_err(|e| anyhow!(e)))
                .transpose()
                .context("ROLE_CHECK must be 'exact' or 'applicant_only'")?
                .unwrap_or_default(),
            resume_parser_url: get("RESUME_PARSER_URL")
                .unwrap_or_else(|| DEFAULT_RESUME_PARSER_URL.to_string()),
            resume_parser_api_key: require("RESUME_PARSER_API_KEY")?,
            s3_bucket: require("S3_BUCKET")?,
            s3_endpoint: require("S3_ENDPOINT")?,
            aws_access_key_id: require("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/rms"),
            ("JWT_PUBLIC_KEY_PATH", "pubkey.pem"),
            ("JWT_PRIVATE_KEY_PATH", "private.pem"),
            ("RESUME_PARSER_API_KEY", "key"),
            ("S3_BUCKET", "resumes"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("AWS_ACCESS_KEY_ID", "minio"),
            ("AWS_SECRET_ACCESS_KEY", "minio123"),
        ])
    }

    fn load(env: &HashMap<&str, &str>) -> Result<Config> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.role_check, RoleCheck::Exact);
        assert_eq!(config.resume_parser_url, DEFAULT_RESUME_PARSER_URL);
    }

    #[test]
    fn test_missing_required_variable_is_named() {
        let mut env = base_env();
        env.remove("JWT_PRIVATE_KEY_PATH");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("JWT_PRIVATE_KEY_PATH"));
    }

    #[test]
    fn test_role_check_and_port_overrides() {
        let mut env = base_env();
        env.insert("ROLE_CHECK", "applicant_only");
        env.insert("PORT", "9090");
        let config = load(&env).unwrap();
        assert_eq!(config.role_check, RoleCheck::ApplicantOnly);
        assert_eq!(config.port, 9090);

        env.insert("ROLE_CHECK", "loose");
        assert!(load(&env).is_err());

        env.insert("ROLE_CHECK", "exact");
        env.insert("PORT", "not-a-port");
        assert!(load(&env).is_err());
    }
}
