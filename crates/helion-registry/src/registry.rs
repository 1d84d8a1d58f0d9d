//! Durable, restart-surviving snapshot of every engine's last-known health.
//!
//! Backed by a single JSON file, written on every state change under an
//! async lock. Reads are served from an in-memory mirror. Crash-safety:
//! writes go to a temp file in the same directory, then an atomic rename —
//! a reader never observes a half-written snapshot.

use crate::error::{RegistryError, RegistryResult};
use helion_core::{EngineHealth, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}

/// Persisted unit: an engine's last-known health plus when it was first
/// registered. `registered_at` is set once, at `register()`, and carried
/// forward unchanged by `update()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryEntry {
    health: EngineHealth,
    registered_at: u64,
}

pub struct EngineRegistry {
    path: PathBuf,
    mirror: RwLock<HashMap<Symbol, RegistryEntry>>,
    write_lock: Mutex<()>,
}

impl EngineRegistry {
    /// Loads an existing snapshot from `path`, or starts empty if the file
    /// doesn't exist yet.
    pub async fn load(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mirror = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(RegistryError::Io(e)),
        };
        info!(path = %path.display(), engines = mirror.len(), "engine registry loaded");
        Ok(Self {
            path,
            mirror: RwLock::new(mirror),
            write_lock: Mutex::new(()),
        })
    }

    /// Registers `symbol` with a fresh `registered_at` timestamp, overwriting
    /// any prior entry (and its `registered_at`) for the same symbol.
    pub async fn register(&self, symbol: Symbol, health: EngineHealth) -> RegistryResult<()> {
        let entry = RegistryEntry {
            health,
            registered_at: now_unix(),
        };
        self.mirror.write().await.insert(symbol, entry);
        self.persist().await
    }

    pub async fn unregister(&self, symbol: &Symbol) -> RegistryResult<()> {
        self.mirror.write().await.remove(symbol);
        self.persist().await
    }

    /// Updates the health of an already-registered symbol, preserving its
    /// original `registered_at`. Falls back to registering fresh if the
    /// symbol isn't present yet.
    pub async fn update(&self, symbol: Symbol, health: EngineHealth) -> RegistryResult<()> {
        let registered_at = {
            let mirror = self.mirror.read().await;
            mirror.get(&symbol).map(|e| e.registered_at)
        };
        let entry = RegistryEntry {
            health,
            registered_at: registered_at.unwrap_or_else(now_unix),
        };
        self.mirror.write().await.insert(symbol, entry);
        self.persist().await
    }

    pub async fn get(&self, symbol: &Symbol) -> Option<EngineHealth> {
        self.mirror.read().await.get(symbol).map(|e| e.health.clone())
    }

    pub async fn get_all(&self) -> Vec<EngineHealth> {
        self.mirror.read().await.values().map(|e| e.health.clone()).collect()
    }

    /// Unix timestamp of when `symbol` was first registered, if present.
    pub async fn registered_at(&self, symbol: &Symbol) -> Option<u64> {
        self.mirror.read().await.get(symbol).map(|e| e.registered_at)
    }

    async fn persist(&self) -> RegistryResult<()> {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.mirror.read().await.clone();
        let json = serde_json::to_vec_pretty(&snapshot)?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(dir).await?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> RegistryResult<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            std::io::Write::write_all(&mut tmp, &json)?;
            tmp.persist(&path).map_err(|e| RegistryError::Io(e.error))?;
            Ok(())
        })
        .await
        .expect("persist task panicked")?;

        debug!(path = %self.path.display(), "engine registry flushed to disk");
        Ok(())
    }
}
