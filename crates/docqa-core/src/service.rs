use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use docqa_llm::AnyProvider;
use docqa_memory::{DocumentLoader, SplitterConfig};

use crate::config::{Config, TimeoutConfig};
use crate::pipeline::{IngestionPipeline, PipelineError, QaPipeline};
use crate::session::SessionStore;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("session not found: {0}")]
    UnknownSession(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Pipeline settings the service is built with.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub splitter: SplitterConfig,
    pub top_k: usize,
    pub timeouts: TimeoutConfig,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ServiceOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            splitter: config.ingestion.splitter(),
            top_k: config.retrieval.top_k,
            timeouts: config.timeouts,
        }
    }
}

/// Outcome of a successful upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub session_id: String,
    pub chunks: usize,
}

/// Upload and ask operations over a shared session store.
pub struct DocQa {
    ingestion: IngestionPipeline<AnyProvider>,
    qa: QaPipeline<AnyProvider, AnyProvider>,
    sessions: SessionStore,
}

impl DocQa {
    #[must_use]
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        embedder: Arc<AnyProvider>,
        llm: Arc<AnyProvider>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            ingestion: IngestionPipeline::new(
                loader,
                options.splitter,
                Arc::clone(&embedder),
                options.timeouts.embedding_seconds,
            ),
            qa: QaPipeline::new(
                embedder,
                llm,
                options.top_k,
                options.timeouts.embedding_seconds,
                options.timeouts.llm_seconds,
            ),
            sessions: SessionStore::new(),
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Ingest the file at `path` and register a new session for it.
    ///
    /// # Errors
    ///
    /// Returns the ingestion failure; no session is created in that case.
    pub async fn upload_file(&self, path: &Path) -> Result<Upload, ServiceError> {
        let started = Instant::now();
        let ingested = self.ingestion.ingest(path).await?;
        let session = self.sessions.create(ingested.index).await;

        tracing::info!(
            session_id = %session.id,
            chunks = session.chunk_count,
            elapsed_ms = started.elapsed().as_millis(),
            "document ingested"
        );
        Ok(Upload {
            session_id: session.id,
            chunks: session.chunk_count,
        })
    }

    /// Answer `question` against the session's index. Pipeline failures are
    /// returned as the answer text.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownSession`] if no such session exists.
    pub async fn ask(&self, session_id: &str, question: &str) -> Result<String, ServiceError> {
        let session = self
            .sessions
            .get(session_id)
            .await
            .ok_or_else(|| ServiceError::UnknownSession(session_id.to_owned()))?;

        let started = Instant::now();
        let answer = self.qa.answer(question, Some(session.index)).await;
        tracing::info!(
            session_id,
            elapsed_ms = started.elapsed().as_millis(),
            "question answered"
        );
        Ok(answer)
    }
}
