//! Persistence for the quota suspension flag

use crate::error::{ShipgenError, ShipgenResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use tracing::debug;

/// Persisted suspension record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaFlag {
    /// When the quota error was seen
    pub suspended_at: DateTime<Utc>,

    /// When API calls may resume
    pub until: DateTime<Utc>,

    /// Error text that triggered the suspension
    pub reason: String,
}

impl QuotaFlag {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.until
    }
}

/// Key-value backing for the suspension flag
#[async_trait]
pub trait QuotaFlagStore: Send + Sync {
    /// Read the stored flag, if any
    async fn load(&self) -> ShipgenResult<Option<QuotaFlag>>;

    /// Replace the stored flag
    async fn save(&self, flag: &QuotaFlag) -> ShipgenResult<()>;

    /// Remove the stored flag
    async fn clear(&self) -> ShipgenResult<()>;
}

/// Flag kept for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flag: Mutex<Option<QuotaFlag>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotaFlagStore for MemoryFlagStore {
    async fn load(&self) -> ShipgenResult<Option<QuotaFlag>> {
        Ok(self.flag.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn save(&self, flag: &QuotaFlag) -> ShipgenResult<()> {
        *self.flag.lock().unwrap_or_else(|e| e.into_inner()) = Some(flag.clone());
        Ok(())
    }

    async fn clear(&self) -> ShipgenResult<()> {
        *self.flag.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Flag stored as a JSON file, shared by consecutive CLI runs
#[derive(Debug, Clone)]
pub struct FileFlagStore {
    path: PathBuf,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QuotaFlagStore for FileFlagStore {
    async fn load(&self) -> ShipgenResult<Option<QuotaFlag>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            ShipgenError::io(format!("reading quota flag {}", self.path.display()), e)
        })?;

        let flag: QuotaFlag = serde_json::from_str(&content)?;
        Ok(Some(flag))
    }

    async fn save(&self, flag: &QuotaFlag) -> ShipgenResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ShipgenError::io("creating state directory", e))?;
        }

        let content = serde_json::to_string_pretty(flag)?;
        fs::write(&self.path, content).await.map_err(|e| {
            ShipgenError::io(format!("writing quota flag {}", self.path.display()), e)
        })?;

        debug!("Persisted quota flag until {}", flag.until);
        Ok(())
    }

    async fn clear(&self) -> ShipgenResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).await.map_err(|e| {
                ShipgenError::io(format!("removing quota flag {}", self.path.display()), e)
            })?;
        }
        Ok(())
    }
}
