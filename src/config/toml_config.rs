use crate::core::activation::VendorDirectory;
use crate::domain::model::{ScanMode, Vendor, VendorId};
use crate::utils::error::{MarktError, Result};
use crate::utils::validation::{self, Validate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarktConfig {
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default = "default_vendors")]
    pub vendors: Vec<VendorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub title: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub assets_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    File,
    Memory,
    Session,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    pub path: String,
    /// session backend only: minutes until an untouched session is dropped
    pub session_idle_minutes: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub mode: ScanMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub uid: Option<String>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            title: "Markt Stockstadt".to_string(),
            timezone: "Europe/Berlin".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            assets_dir: "./Assets".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::File,
            path: "./data/activations.json".to_string(),
            session_idle_minutes: 24,
        }
    }
}

fn default_vendors() -> Vec<VendorConfig> {
    [
        ("metzger", "Metzger", "Metzger.png"),
        ("baecker", "Bäcker", "Bäcker.png"),
        ("gemuese", "Gemüse", "Gemüse.png"),
    ]
    .into_iter()
    .map(|(id, name, image)| VendorConfig {
        id: id.to_string(),
        name: name.to_string(),
        image: Some(image.to_string()),
        uid: None,
    })
    .collect()
}

impl Default for MarktConfig {
    fn default() -> Self {
        Self {
            market: MarketConfig::default(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            scan: ScanConfig::default(),
            vendors: default_vendors(),
        }
    }
}

impl MarktConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarktError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用內建預設值 (三個攤位，沒有 QR uid)
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(
                "⚠️ Config file {} not found, using built-in defaults (scans disabled)",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MarktError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${METZGER_UID})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MarktError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.market
            .timezone
            .parse::<Tz>()
            .map_err(|e| MarktError::InvalidConfigValueError {
                field: "market.timezone".to_string(),
                value: self.market.timezone.clone(),
                reason: e.to_string(),
            })
    }

    /// 建立攤位目錄；仍含 `${...}` 的 uid 代表環境變數缺失，該攤位無法掃描
    pub fn vendor_directory(&self) -> VendorDirectory {
        self.vendors
            .iter()
            .fold(VendorDirectory::new(), |directory, vendor| {
                let uid = vendor.uid.as_deref().filter(|uid| {
                    let unresolved = uid.contains("${");
                    if unresolved {
                        tracing::warn!(
                            vendor = %vendor.id,
                            "⚠️ uid still contains an unresolved placeholder, scans disabled for this vendor"
                        );
                    }
                    !unresolved
                });
                directory.with_vendor(
                    Vendor {
                        id: VendorId::new(vendor.id.clone()),
                        name: vendor.name.clone(),
                        image: vendor.image.clone(),
                    },
                    uid,
                )
            })
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("market.title", &self.market.title)?;
        validation::validate_timezone("market.timezone", &self.market.timezone)?;
        validation::validate_bind_address("server.bind", &self.server.bind)?;
        validation::validate_path("server.assets_dir", &self.server.assets_dir)?;

        match self.storage.backend {
            StorageBackendKind::File => {
                validation::validate_path("storage.path", &self.storage.path)?;
            }
            StorageBackendKind::Session => {
                validation::validate_positive_number(
                    "storage.session_idle_minutes",
                    self.storage.session_idle_minutes,
                    1,
                )?;
            }
            StorageBackendKind::Memory => {}
        }

        if self.vendors.is_empty() {
            return Err(MarktError::MissingConfigError {
                field: "vendors".to_string(),
            });
        }

        for vendor in &self.vendors {
            validation::validate_slug("vendors.id", &vendor.id)?;
            validation::validate_non_empty_string("vendors.name", &vendor.name)?;
        }
        validation::validate_unique("vendors.id", self.vendors.iter().map(|v| v.id.as_str()))?;
        validation::validate_unique(
            "vendors.uid",
            self.vendors
                .iter()
                .filter_map(|v| v.uid.as_deref())
                .map(str::trim)
                .filter(|uid| !uid.is_empty() && !uid.contains("${")),
        )?;

        Ok(())
    }
}

impl Validate for MarktConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
[market]
title = "Wochenmarkt"
timezone = "Europe/Berlin"

[server]
bind = "127.0.0.1:9000"
assets_dir = "./static"

[storage]
backend = "session"

[scan]
mode = "toggle"

[[vendors]]
id = "metzger"
name = "Metzger"
image = "Metzger.png"
uid = "UID_M"

[[vendors]]
id = "baecker"
name = "Bäcker"
"#;

    #[test]
    fn test_parse_full_config() {
        let config = MarktConfig::from_toml_str(FULL_CONFIG).unwrap();

        assert_eq!(config.market.title, "Wochenmarkt");
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.storage.backend, StorageBackendKind::Session);
        assert_eq!(config.storage.path, "./data/activations.json");
        assert_eq!(config.scan.mode, ScanMode::Toggle);
        assert_eq!(config.vendors.len(), 2);
        assert!(config.validate().is_ok());

        let directory = config.vendor_directory();
        assert_eq!(directory.vendors().len(), 2);
        assert_eq!(directory.lookup_uid("UID_M"), Some(&VendorId::from("metzger")));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = MarktConfig::from_toml_str("").unwrap();
        assert_eq!(config.market.title, "Markt Stockstadt");
        assert_eq!(config.storage.backend, StorageBackendKind::File);
        assert_eq!(config.scan.mode, ScanMode::Explicit);
        assert_eq!(config.vendors.len(), 3);
        assert!(config.validate().is_ok());
        assert_eq!(config.vendor_directory().scannable_count(), 0);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MARKT_TEST_METZGER_UID", "secret-123");

        let config = MarktConfig::from_toml_str(
            r#"
[[vendors]]
id = "metzger"
name = "Metzger"
uid = "${MARKT_TEST_METZGER_UID}"
"#,
        )
        .unwrap();
        assert_eq!(config.vendors[0].uid.as_deref(), Some("secret-123"));

        std::env::remove_var("MARKT_TEST_METZGER_UID");
    }

    #[test]
    fn test_unresolved_uid_disables_scanning() {
        let config = MarktConfig::from_toml_str(
            r#"
[[vendors]]
id = "metzger"
name = "Metzger"
uid = "${MARKT_TEST_DEFINITELY_UNSET_VAR}"
"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.vendor_directory().scannable_count(), 0);
    }

    #[test]
    fn test_config_validation() {
        let mut config = MarktConfig::default();
        config.market.timezone = "Nowhere/City".to_string();
        assert!(config.validate().is_err());

        let mut config = MarktConfig::default();
        config.vendors[1].id = "metzger".to_string();
        assert!(config.validate().is_err());

        let mut config = MarktConfig::default();
        config.vendors[0].uid = Some("same".to_string());
        config.vendors[1].uid = Some("same".to_string());
        assert!(config.validate().is_err());

        let mut config = MarktConfig::default();
        config.vendors.clear();
        assert!(matches!(
            config.validate(),
            Err(MarktError::MissingConfigError { .. })
        ));

        let mut config = MarktConfig::default();
        config.storage.path = String::new();
        assert!(config.validate().is_err());
        config.storage.backend = StorageBackendKind::Memory;
        assert!(config.validate().is_ok());

        let mut config = MarktConfig::default();
        config.storage.backend = StorageBackendKind::Session;
        config.storage.session_idle_minutes = 0;
        assert!(config.validate().is_err());
        config.storage.session_idle_minutes = 30;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = MarktConfig::from_toml_str("[scan]\nmode = \"sometimes\"").unwrap_err();
        assert!(matches!(err, MarktError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FULL_CONFIG.as_bytes()).unwrap();

        let config = MarktConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.market.title, "Wochenmarkt");

        let missing = temp_file.path().with_extension("missing.toml");
        let config = MarktConfig::load_or_default(&missing).unwrap();
        assert_eq!(config.vendors.len(), 3);
    }
}
