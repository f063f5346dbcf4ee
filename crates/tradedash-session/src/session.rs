/*
[INPUT]:  Wallet id issued by the backend, optional session file path
[OUTPUT]: Current wallet session, change notifications, persisted session file
[POS]:    Session layer - single source of the active wallet id
[UPDATE]: When the session file format or notification semantics change
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::ClientError;

const APP_DIR: &str = "tradedash";
const SESSION_FILE: &str = "session.json";

/// Opaque wallet identifier issued by the backend after credential exchange
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ClientError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ClientError::validation("wallet id must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wallet_id: Option<WalletId>,
}

/// Holds the active wallet id, persists it and notifies subscribers.
///
/// Loading happens synchronously in [`SessionStore::open`], so the store is
/// ready before any poller or facade is built on top of it.
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    tx: watch::Sender<Option<WalletId>>,
    // Serializes file writes with their notifications
    write_lock: Mutex<()>,
}

impl SessionStore {
    /// Default session file location: `<data dir>/tradedash/session.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_DIR).join(SESSION_FILE))
    }

    /// Open a file-backed store. A missing file means no wallet; a corrupt one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let wallet_id = load(&path)?;
        debug!(path = %path.display(), restored = wallet_id.is_some(), "session store opened");
        let (tx, _rx) = watch::channel(wallet_id);
        Ok(Self {
            path: Some(path),
            tx,
            write_lock: Mutex::new(()),
        })
    }

    /// Store without a backing file
    pub fn in_memory(initial: Option<WalletId>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            path: None,
            tx,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self) -> Option<WalletId> {
        self.tx.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Store, persist and announce a wallet id
    pub fn set(&self, wallet_id: WalletId) -> Result<(), ClientError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.persist(Some(&wallet_id))?;
        info!(wallet_id = %wallet_id, "wallet session stored");
        self.tx.send_replace(Some(wallet_id));
        Ok(())
    }

    /// Remove the wallet id, persist its absence and announce it
    pub fn clear(&self) -> Result<(), ClientError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.persist(None)?;
        let previous = self.tx.send_replace(None);
        if let Some(previous) = previous {
            info!(wallet_id = %previous, "wallet session cleared");
        }
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<WalletId>> {
        self.tx.subscribe()
    }

    fn persist(&self, wallet_id: Option<&WalletId>) -> Result<(), ClientError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        write_atomic(
            path,
            &SessionFile {
                wallet_id: wallet_id.cloned(),
            },
        )
        .map_err(|err| ClientError::Storage(format!("{}: {err}", path.display())))
    }
}

fn load(path: &Path) -> Result<Option<WalletId>, ClientError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|err| ClientError::Storage(format!("{}: {err}", path.display())))?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    let file: SessionFile = serde_json::from_str(&content)
        .map_err(|err| ClientError::Storage(format!("{} is corrupt: {err}", path.display())))?;
    Ok(file.wallet_id)
}

fn write_atomic(path: &Path, file: &SessionFile) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut temp_file = NamedTempFile::new_in(&parent)?;
    let json = serde_json::to_string_pretty(file)?;
    temp_file.write_all(json.as_bytes())?;
    temp_file.flush()?;
    temp_file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
