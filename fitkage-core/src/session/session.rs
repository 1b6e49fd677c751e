use crate::config::EngineConfig;
use crate::db::{SqliteStore, WorkoutStore};
use crate::session::SessionEngine;
use crate::session::summary::CachedSummary;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A user's workout session: the engine plus the store its results go to.
pub struct Session {
    pub(crate) engine: SessionEngine,
    pub(crate) store: Arc<dyn WorkoutStore>,
    pub(crate) user_id: String,
    /// Summary of the completed run, built on first request and kept while
    /// the engine stays on that run so rating, notes and save retries act on
    /// one record.
    pub(crate) summary: Mutex<Option<CachedSummary>>,
}

impl Session {
    pub fn new(engine: SessionEngine, store: Arc<dyn WorkoutStore>, user_id: impl Into<String>) -> Self {
        Self {
            engine,
            store,
            user_id: user_id.into(),
            summary: Mutex::new(None),
        }
    }

    /// Opens the SQLite store at `database_url` and an engine on the current
    /// runtime.
    pub async fn open(database_url: &str, user_id: &str, config: EngineConfig) -> Result<Self> {
        let store = SqliteStore::open(database_url).await?;
        let engine = SessionEngine::with_current_runtime(config)?;
        Ok(Self::new(engine, Arc::new(store), user_id))
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn WorkoutStore> {
        &self.store
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}
