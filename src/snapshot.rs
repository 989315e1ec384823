//! File-backed count source
//!
//! Stands in for the PayID database: the file is re-read on every fetch, so
//! whatever process maintains it controls the reported counts.

use async_trait::async_trait;
use payid_metrics_lib::{
    AddressCount, AddressCountFetcher, MetricsError, MetricsResult, PayIdCountFetcher,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default snapshot location when `PAYID_METRICS_SNAPSHOT` is unset
pub const DEFAULT_SNAPSHOT_PATH: &str = "./payid_metrics_snapshot.json";

/// On-disk snapshot of directory counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountSnapshot {
    #[serde(default)]
    pub address_counts: Vec<AddressCount>,
    #[serde(default)]
    pub pay_id_count: u64,
}

/// Reads a [`CountSnapshot`] JSON file on every fetch
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> MetricsResult<CountSnapshot> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            MetricsError::fetch(format!(
                "Cannot read count snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl AddressCountFetcher for SnapshotFile {
    async fn fetch_address_counts(&self) -> MetricsResult<Vec<AddressCount>> {
        Ok(self.read().await?.address_counts)
    }
}

#[async_trait]
impl PayIdCountFetcher for SnapshotFile {
    async fn fetch_payid_count(&self) -> MetricsResult<u64> {
        Ok(self.read().await?.pay_id_count)
    }
}
