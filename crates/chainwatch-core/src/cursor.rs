//! Progress cursors: the per-chain last-committed block number that
//! makes scanning resumable across restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::Error;

/// Tracks the last processed block for each chain.
///
/// The saved block is inclusive: a poller resuming from a saved value
/// `n` starts fetching at `n + 1`.
#[async_trait]
pub trait Cursor: Send + Sync {
    /// Returns the last saved block number for the chain, or 0 if no
    /// progress has been saved.
    async fn load(&self, chain_id: &str) -> Result<u64, Error>;

    /// Persists the block number for the chain.
    async fn save(&self, chain_id: &str, block: u64) -> Result<(), Error>;
}

/// In-memory cursor. Progress is lost on restart; suitable for tests
/// and fire-and-forget monitoring.
#[derive(Default)]
pub struct MemoryCursor {
    blocks: RwLock<HashMap<String, u64>>,
}

impl MemoryCursor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cursor for MemoryCursor {
    async fn load(&self, chain_id: &str) -> Result<u64, Error> {
        Ok(self
            .blocks
            .read()
            .unwrap()
            .get(chain_id)
            .copied()
            .unwrap_or(0))
    }

    async fn save(&self, chain_id: &str, block: u64) -> Result<(), Error> {
        self.blocks
            .write()
            .unwrap()
            .insert(chain_id.to_string(), block);
        Ok(())
    }
}

/// File-backed cursor persisting progress as a JSON object
/// `{"chain_id": block_number, ...}`.
///
/// Writes are atomic against crashes: the full state is written to a
/// temporary sibling path, fsynced, then renamed over the target.
pub struct FileCursor {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCursor {
    /// Creates a file-backed cursor. The parent directory is created on
    /// the first save if it does not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> HashMap<String, u64> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            // Missing or unreadable file means no progress yet.
            Err(_) => HashMap::new(),
        }
    }
}

#[async_trait]
impl Cursor for FileCursor {
    async fn load(&self, chain_id: &str) -> Result<u64, Error> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await.get(chain_id).copied().unwrap_or(0))
    }

    async fn save(&self, chain_id: &str, block: u64) -> Result<(), Error> {
        let _guard = self.lock.lock().await;

        let mut state = self.read_all().await;
        state.insert(chain_id.to_string(), block);
        let bytes = serde_json::to_vec_pretty(&state)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
