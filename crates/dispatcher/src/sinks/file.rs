//! FileFeedbackReporter - appends feedback records to a JSON lines file

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use contracts::{ContractError, FeedbackReporter};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

/// Configuration for FileFeedbackReporter
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file (created if missing, appended otherwise)
    pub path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .ok_or_else(|| "missing 'path' parameter".to_string())?;
        Ok(Self { path })
    }
}

/// Feedback reporter writing one JSON record per line
pub struct FileFeedbackReporter {
    name: String,
    config: FileSinkConfig,
    file: Mutex<File>,
}

impl FileFeedbackReporter {
    /// Open (or create) the output file
    pub async fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .await?;

        let name = name.into();
        debug!(sink = %name, path = %config.path.display(), "FileFeedbackReporter opened");

        Ok(Self {
            name,
            config,
            file: Mutex::new(file),
        })
    }

    /// Create from params map (for factory)
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config =
            FileSinkConfig::from_params(params).map_err(|e| ContractError::sink_write(&name, e))?;
        Self::new(name.clone(), config)
            .await
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))
    }

    async fn append_line(&self, payload: &[u8]) -> std::io::Result<()> {
        let mut file = self.file.lock().await;
        let mut line = Vec::with_capacity(payload.len() + 1);
        line.extend_from_slice(payload);
        line.push(b'\n');
        file.write_all(&line).await?;
        file.flush().await
    }
}

#[async_trait]
impl FeedbackReporter for FileFeedbackReporter {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_feedback_send",
        skip(self, payload),
        fields(sink = %self.name, bytes = payload.len())
    )]
    async fn send_feedback(&self, payload: &[u8]) -> Result<(), ContractError> {
        self.append_line(payload).await.map_err(|e| {
            error!(sink = %self.name, path = %self.config.path.display(), error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}
