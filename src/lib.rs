pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;
pub mod web;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::MarktConfig;
pub use crate::core::market::{MarketService, PageRequest, WeekOverview};
pub use crate::utils::error::{MarktError, Result};
pub use crate::web::{router, AppState, StoreBackend};
