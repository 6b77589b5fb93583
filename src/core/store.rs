use std::{fs, path::Path, sync::Mutex};

use crate::core::error::LensError;
use crate::core::types::ScanSession;

/// Durable key-value persistence for sessions. Load failures are treated as
/// "empty list" by callers; save failures are best-effort.
pub trait SessionStore: Send {
    fn load_all(&self) -> Result<Vec<ScanSession>, LensError>;
    fn save_all(&self, sessions: &[ScanSession]) -> Result<(), LensError>;
}

/// JSON-file-backed store. The whole session list is rewritten on every save;
/// there is exactly one logical writer at a time.
#[derive(Debug)]
pub struct JsonFileStore {
    path: std::path::PathBuf,
}

impl JsonFileStore {
    pub fn new(path: &Path) -> Result<Self, LensError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            fs::write(path, b"[]\n")?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl SessionStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<ScanSession>, LensError> {
        let data = fs::read_to_string(&self.path)?;
        let sessions: Vec<ScanSession> = serde_json::from_str(&data).unwrap_or_default();
        Ok(sessions)
    }

    fn save_all(&self, sessions: &[ScanSession]) -> Result<(), LensError> {
        let json = serde_json::to_string_pretty(sessions)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store for tests and one-shot CLI runs.
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<Vec<ScanSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<ScanSession>, LensError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|_| LensError::Store("memory store poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save_all(&self, sessions: &[ScanSession]) -> Result<(), LensError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| LensError::Store("memory store poisoned".into()))?;
        *guard = sessions.to_vec();
        Ok(())
    }
}
