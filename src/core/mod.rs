pub mod activation;
pub mod market;
pub mod week_clock;

pub use crate::domain::model::{ActivationRecord, ScanMode, ScanOutcome, VendorId, WeekKey};
pub use crate::domain::ports::{ActivationStorage, Clock};
pub use crate::utils::error::Result;
