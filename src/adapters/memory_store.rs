use crate::domain::model::ActivationRecord;
use crate::domain::ports::ActivationStorage;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

/// Process-wide record held in memory. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<ActivationRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: ActivationRecord) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }
}

#[async_trait]
impl ActivationStorage for MemoryStore {
    async fn load(&self) -> Result<ActivationRecord> {
        // a poisoned lock still holds a whole record; replacements are single assignments
        let guard = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.clone())
    }

    async fn save(&self, record: &ActivationRecord) -> Result<()> {
        let mut guard = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = record.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
