use crate::domain::model::ActivationRecord;
use crate::domain::ports::ActivationStorage;
use crate::utils::error::{MarktError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Activation record kept as one JSON document on disk.
///
/// Writes go to a uniquely named sibling file which is then renamed over the
/// target, so a reader sees either the old or the new document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("activations.json");
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4().simple()))
    }

    fn write_failure(&self, e: impl std::fmt::Display) -> MarktError {
        MarktError::PersistenceWriteFailure {
            location: self.path.display().to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl ActivationStorage for JsonFileStore {
    async fn load(&self) -> Result<ActivationRecord> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No activation file yet");
                return Ok(ActivationRecord::default());
            }
            Err(e) => return Err(MarktError::IoError(e)),
        };

        if content.trim().is_empty() {
            return Ok(ActivationRecord::default());
        }

        serde_json::from_str(&content).map_err(|e| MarktError::MalformedPersistedState {
            location: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn save(&self, record: &ActivationRecord) -> Result<()> {
        let data = serde_json::to_vec_pretty(record)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_failure(e))?;
        }

        let temp = self.temp_path();
        if let Err(e) = fs::write(&temp, &data).await {
            let _ = fs::remove_file(&temp).await;
            return Err(self.write_failure(e));
        }

        if let Err(e) = fs::rename(&temp, &self.path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(self.write_failure(e));
        }

        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
