use clap::Parser;
use markt_stockstadt::config::StorageBackendKind;
use markt_stockstadt::utils::error::ErrorSeverity;
use markt_stockstadt::utils::{logger, validation::Validate};
use markt_stockstadt::{web, AppState, CliConfig, MarktConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting markt-stockstadt");
    tracing::info!("📁 Loading configuration from: {}", cli.config);

    let mut config = match MarktConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config);

    if cli.check {
        return Ok(());
    }

    let state = Arc::new(AppState::from_config(&config)?);

    if let Err(e) = web::serve(state, &config.server.bind).await {
        tracing::error!(
            "❌ Server stopped: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low | ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

fn display_config_summary(config: &MarktConfig) {
    let directory = config.vendor_directory();

    tracing::info!("📋 Market: {} ({})", config.market.title, config.market.timezone);
    tracing::info!("🌐 Bind: {}", config.server.bind);
    tracing::info!("🖼️ Assets: {}", config.server.assets_dir);
    match config.storage.backend {
        StorageBackendKind::File => tracing::info!("💾 Storage: file {}", config.storage.path),
        StorageBackendKind::Memory => {
            tracing::warn!("💾 Storage: process memory, activations are lost on restart")
        }
        StorageBackendKind::Session => {
            tracing::warn!(
                "💾 Storage: per browser session ({} min idle), scans are not shared between visitors",
                config.storage.session_idle_minutes
            )
        }
    }
    tracing::info!("📱 Scan mode: {}", config.scan.mode);
    tracing::info!(
        "🏪 Vendors: {} ({} scannable)",
        directory.vendors().len(),
        directory.scannable_count()
    );
}
