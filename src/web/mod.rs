pub mod handlers;
pub mod query;
pub mod view;

use crate::adapters::{JsonFileStore, MemoryStore, SessionStore, SystemClock};
use crate::config::{MarktConfig, StorageBackendKind};
use crate::core::market::{MarketService, PageRequest, WeekOverview};
use crate::domain::ports::Clock;
use crate::utils::error::{MarktError, Result};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Where the activation record of a request comes from.
pub enum StoreBackend {
    File(JsonFileStore),
    Memory(MemoryStore),
    Session(SessionStore),
}

impl StoreBackend {
    pub fn from_config(config: &MarktConfig) -> Self {
        match config.storage.backend {
            StorageBackendKind::File => StoreBackend::File(JsonFileStore::new(&config.storage.path)),
            StorageBackendKind::Memory => StoreBackend::Memory(MemoryStore::new()),
            StorageBackendKind::Session => StoreBackend::Session(SessionStore::with_idle_timeout(
                Duration::from_secs(config.storage.session_idle_minutes.saturating_mul(60)),
            )),
        }
    }
}

pub struct AppState {
    pub title: String,
    pub service: MarketService,
    pub backend: StoreBackend,
    pub assets_dir: PathBuf,
}

impl AppState {
    pub fn new(
        title: impl Into<String>,
        service: MarketService,
        backend: StoreBackend,
        assets_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            title: title.into(),
            service,
            backend,
            assets_dir: assets_dir.into(),
        }
    }

    pub fn from_config(config: &MarktConfig) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.timezone()?));
        let service = MarketService::new(clock, config.vendor_directory(), config.scan.mode);
        Ok(Self::new(
            config.market.title.clone(),
            service,
            StoreBackend::from_config(config),
            &config.server.assets_dir,
        ))
    }

    /// Runs the request against the configured backend. For session storage
    /// the second value is a freshly issued session id, if one was needed.
    pub async fn overview(
        &self,
        headers: &HeaderMap,
        request: &PageRequest,
    ) -> Result<(WeekOverview, Option<String>)> {
        match &self.backend {
            StoreBackend::File(store) => Ok((self.service.handle(store, request).await?, None)),
            StoreBackend::Memory(store) => Ok((self.service.handle(store, request).await?, None)),
            StoreBackend::Session(sessions) => {
                let (id, fresh) = match handlers::session_id(headers) {
                    Some(id) => (id, false),
                    None => (SessionStore::new_session_id(), true),
                };
                let scope = sessions.scope(id.clone());
                let overview = self.service.handle(&scope, request).await?;
                Ok((overview, fresh.then_some(id)))
            }
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let assets = ServeDir::new(&state.assets_dir);

    Router::new()
        .route("/", get(handlers::week_page))
        .nest_service("/Assets", assets)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<()> {
    let app = router(state);

    tracing::info!("Binding to {}", bind);
    let listener = TcpListener::bind(bind).await.map_err(|e| MarktError::ConfigError {
        message: format!("Cannot bind {}: {}", bind, e),
    })?;
    tracing::info!("🚀 Server running on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
