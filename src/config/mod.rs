pub mod toml_config;

pub use toml_config::{MarktConfig, StorageBackendKind};

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "markt-stockstadt")]
#[command(about = "Weekly vendor overview for the Stockstadt market")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "markt.toml")]
    pub config: String,

    /// Override server.bind from the config file
    #[arg(long)]
    pub bind: Option<String>,

    /// Override storage.path from the config file
    #[arg(long)]
    pub storage_path: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    /// Validate the configuration, print a summary and exit
    #[arg(long)]
    pub check: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 命令列參數優先於設定檔
    pub fn apply_overrides(&self, config: &mut MarktConfig) {
        if let Some(bind) = &self.bind {
            tracing::info!("🔧 server.bind overridden to: {}", bind);
            config.server.bind = bind.clone();
        }
        if let Some(path) = &self.storage_path {
            tracing::info!("🔧 storage.path overridden to: {}", path);
            config.storage.path = path.clone();
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_config_values() {
        let cli = CliConfig::parse_from([
            "markt-stockstadt",
            "--bind",
            "127.0.0.1:3000",
            "--storage-path",
            "/tmp/markt.json",
        ]);
        let mut config = MarktConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.storage.path, "/tmp/markt.json");
        assert_eq!(cli.config, "markt.toml");
        assert!(!cli.check);
    }
}
