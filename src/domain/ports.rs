use crate::domain::model::ActivationRecord;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Backing medium for the activation record.
///
/// `load` may fail (unreadable or malformed data); callers decide how to
/// degrade. `save` replaces the whole record and must never leave a
/// half-written record visible to a later `load`.
#[async_trait]
pub trait ActivationStorage: Send + Sync {
    async fn load(&self) -> Result<ActivationRecord>;
    async fn save(&self, record: &ActivationRecord) -> Result<()>;

    /// Human readable location used in log lines.
    fn describe(&self) -> String;
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}
