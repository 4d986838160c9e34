use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EtlError, Result};
use crate::transform::PromotionJoin;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_SOURCE: &str = "data/Retail_Transactions_Dataset.csv";
pub const DEFAULT_OBJECT_STORE_ENDPOINT: &str = "https://s3.amazonaws.com";
pub const DEFAULT_WAREHOUSE_PATH: &str = "retail_dw.db";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub warehouse: WarehouseConfig,
    pub transform: TransformConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Local path, `http(s)://` URL or `s3://bucket/key`.
    pub location: String,
    pub object_store_endpoint: String,
    pub object_store_token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_SOURCE.to_string(),
            object_store_endpoint: DEFAULT_OBJECT_STORE_ENDPOINT.to_string(),
            object_store_token: None,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarehouseConfig {
    Sqlite { path: PathBuf },
    Libsql { url: String, auth_token: String },
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        WarehouseConfig::Sqlite {
            path: PathBuf::from(DEFAULT_WAREHOUSE_PATH),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub promotion_join: PromotionJoin,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "retail_dw.log".to_string(),
            filter: "retail_dw=info".to_string(),
        }
    }
}

impl Config {
    /// Reads `path`, then applies environment overrides. Only the default
    /// path may be absent, in which case built-in defaults are used.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            Self::from_toml(&content)?
        } else if path == Path::new(DEFAULT_CONFIG_PATH) {
            Self::default()
        } else {
            return Err(EtlError::Config(format!(
                "Config file '{}' does not exist",
                path.display()
            )));
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overrides values from a variable lookup; `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(location) = lookup("RETAIL_DW_SOURCE") {
            self.source.location = location;
        }
        if let Some(endpoint) = lookup("RETAIL_DW_OBJECT_STORE_ENDPOINT") {
            self.source.object_store_endpoint = endpoint;
        }
        if let Some(token) = lookup("RETAIL_DW_OBJECT_STORE_TOKEN") {
            self.source.object_store_token = Some(token);
        }

        match (lookup("LIBSQL_URL"), lookup("LIBSQL_AUTH_TOKEN")) {
            (Some(url), Some(auth_token)) => {
                self.warehouse = WarehouseConfig::Libsql { url, auth_token };
            }
            (Some(_), None) => {
                return Err(EtlError::Config(
                    "LIBSQL_URL is set but LIBSQL_AUTH_TOKEN is not".to_string(),
                ));
            }
            _ => {
                if let Some(path) = lookup("RETAIL_DW_WAREHOUSE_PATH") {
                    self.warehouse = WarehouseConfig::Sqlite {
                        path: PathBuf::from(path),
                    };
                }
            }
        }

        if let Some(join) = lookup("RETAIL_DW_PROMOTION_JOIN") {
            self.transform.promotion_join = join.parse().map_err(EtlError::Config)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parses_full_config_file() {
        let config = Config::from_toml(
            r#"
            [source]
            location = "s3://retail-transaction-data-project/raw/Retail_Transactions_Dataset.csv"

            [warehouse]
            kind = "sqlite"
            path = "/var/lib/retail_dw.db"

            [transform]
            promotion_join = "inner"
            "#,
        )
        .unwrap();

        assert!(config.source.location.starts_with("s3://"));
        assert_eq!(config.source.object_store_endpoint, DEFAULT_OBJECT_STORE_ENDPOINT);
        assert!(matches!(
            config.warehouse,
            WarehouseConfig::Sqlite { ref path } if path == Path::new("/var/lib/retail_dw.db")
        ));
        assert_eq!(config.transform.promotion_join, PromotionJoin::Inner);
        assert_eq!(config.logging.filter, "retail_dw=info");
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("RETAIL_DW_SOURCE", "/tmp/tx.csv"),
            ("LIBSQL_URL", "libsql://retail.turso.io"),
            ("LIBSQL_AUTH_TOKEN", "secret"),
            ("RETAIL_DW_PROMOTION_JOIN", "left"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.source.location, "/tmp/tx.csv");
        assert!(matches!(config.warehouse, WarehouseConfig::Libsql { .. }));
        assert_eq!(config.transform.promotion_join, PromotionJoin::Left);
    }

    #[test]
    fn libsql_url_without_token_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(|key| {
            (key == "LIBSQL_URL").then(|| "libsql://retail.turso.io".to_string())
        });
        assert!(matches!(result, Err(EtlError::Config(_))));
    }

    #[test]
    fn explicit_missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(EtlError::Config(msg)) if msg.contains("absent.toml")));
    }

    #[test]
    fn existing_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retail.toml");
        fs::write(&path, "[transform]\npromotion_join = \"inner\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        // RETAIL_DW_PROMOTION_JOIN would override the file.
        if std::env::var("RETAIL_DW_PROMOTION_JOIN").is_err() {
            assert_eq!(config.transform.promotion_join, PromotionJoin::Inner);
        }
    }
}
