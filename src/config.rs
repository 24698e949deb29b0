use crate::constants;
use crate::error::{EtlError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub retry: RetryConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the three pipeline CSV files
    pub data_root: PathBuf,
    /// Directory for run reports
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let mut config: Config = toml::from_str(&config_content)?;

        // DATABASE_URL wins over the file so deployments never put
        // credentials in config.toml
        if let Ok(url) = env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                config.database.url = url;
            }
        }

        Ok(config)
    }

    pub fn raw_path(&self) -> PathBuf {
        self.paths.data_root.join(constants::RAW_FILE)
    }

    pub fn processed_path(&self) -> PathBuf {
        self.paths.data_root.join(constants::PROCESSED_FILE)
    }

    pub fn final_path(&self) -> PathBuf {
        self.paths.data_root.join(constants::FINAL_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
            [paths]
            data_root = "data"
            output_dir = "output"

            [retry]
            max_attempts = 3
            delay_secs = 300

            [database]
            url = "postgres://localhost/healthcare_db"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay_secs, 300);
        assert_eq!(
            config.raw_path(),
            PathBuf::from("data").join("hospital_admissions.csv")
        );
    }
}
