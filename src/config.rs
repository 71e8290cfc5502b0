use log::info;
use std::env;

use crate::errors::ConfigError;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_APP_NAME: &str = "Company Manager";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret: String,
    pub s3_bucket: String,
    /// Public prefix media URLs are built from.
    pub media_base_url: String,
    /// Used to sign outgoing mail.
    pub app_name: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let s3_bucket = required("AWS_S3_BUCKET")?;
        let media_base_url = optional("MEDIA_BASE_URL")
            .unwrap_or_else(|| format!("https://{}.s3.amazonaws.com", s3_bucket));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_address: optional("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            jwt_secret: required("JWT_SECRET")?,
            s3_bucket,
            media_base_url,
            app_name: optional("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    let value = env::var(key).map_err(|_| ConfigError::Missing(key))?;
    if value.trim().is_empty() {
        return Err(ConfigError::Empty(key));
    }
    Ok(value)
}

fn optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => {
            info!("{} not set, using default", key);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_blank_values() {
        assert!(matches!(
            required("COMPANY_MANAGER_TEST_UNSET"),
            Err(ConfigError::Missing("COMPANY_MANAGER_TEST_UNSET"))
        ));

        env::set_var("COMPANY_MANAGER_TEST_BLANK", "  ");
        assert!(matches!(
            required("COMPANY_MANAGER_TEST_BLANK"),
            Err(ConfigError::Empty("COMPANY_MANAGER_TEST_BLANK"))
        ));

        env::set_var("COMPANY_MANAGER_TEST_SET", "value");
        assert_eq!(required("COMPANY_MANAGER_TEST_SET").unwrap(), "value");
    }

    #[test]
    fn optional_treats_blank_as_unset() {
        env::set_var("COMPANY_MANAGER_TEST_OPTIONAL", "");
        assert_eq!(optional("COMPANY_MANAGER_TEST_OPTIONAL"), None);
    }
}
