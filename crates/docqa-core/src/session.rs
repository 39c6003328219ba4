use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use docqa_memory::VectorIndex;
use tokio::sync::RwLock;

/// Binding between a session id and the index of one uploaded file.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub index: Arc<VectorIndex>,
    pub chunk_count: usize,
    pub created_at: SystemTime,
}

/// Process-wide session map. Entries are only ever added.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `index` under a fresh random id.
    pub async fn create(&self, index: Arc<VectorIndex>) -> Session {
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            chunk_count: index.len(),
            index,
            created_at: SystemTime::now(),
        };
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        tracing::debug!(session_id = %session.id, chunks = session.chunk_count, "session created");
        session
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
