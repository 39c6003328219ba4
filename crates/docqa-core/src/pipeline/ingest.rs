//! Upload path: load and split a PDF, then embed the chunks into a fresh index.

use std::path::PathBuf;
use std::sync::Arc;

use docqa_llm::LlmProvider;
use docqa_memory::document::types::FILENAME_KEY;
use docqa_memory::{Chunk, DocumentLoader, SplitterConfig, TextSplitter, VectorIndex};

use super::PipelineError;
use super::builder::{Chain, Pipeline, Start};
use super::step::{Step, with_deadline};

/// Loads a file and cuts it into chunks tagged with the file path.
pub struct ChunkStep {
    loader: Arc<dyn DocumentLoader>,
    splitter: TextSplitter,
}

impl ChunkStep {
    #[must_use]
    pub fn new(loader: Arc<dyn DocumentLoader>, splitter: SplitterConfig) -> Self {
        Self {
            loader,
            splitter: TextSplitter::new(splitter),
        }
    }
}

impl Step for ChunkStep {
    type Input = PathBuf;
    type Output = Vec<Chunk>;

    fn name(&self) -> &'static str {
        "chunk"
    }

    async fn run(&self, path: Self::Input) -> Result<Self::Output, PipelineError> {
        if path.as_os_str().is_empty() {
            return Err(PipelineError::InvalidInput("no file path".into()));
        }

        let pages = self.loader.load(&path).await?;
        let mut chunks = self.splitter.split_all(&pages);

        let filename = path.display().to_string();
        for chunk in &mut chunks {
            chunk
                .metadata
                .extra
                .insert(FILENAME_KEY.into(), filename.clone());
        }

        tracing::debug!(
            file = %filename,
            pages = pages.len(),
            chunks = chunks.len(),
            "split document"
        );
        Ok(chunks)
    }
}

/// Result of ingesting one file.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub chunks: Vec<Chunk>,
    pub index: Arc<VectorIndex>,
}

/// Embeds every chunk and builds the index. The whole stage shares one deadline.
pub struct IndexStep<E> {
    embedder: Arc<E>,
    timeout_secs: u64,
}

impl<E> IndexStep<E> {
    #[must_use]
    pub fn new(embedder: Arc<E>, timeout_secs: u64) -> Self {
        Self {
            embedder,
            timeout_secs,
        }
    }
}

impl<E: LlmProvider> IndexStep<E> {
    async fn embed_all(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let mut vectors = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            vectors.push(self.embedder.embed(&chunk.content).await?);
        }
        Ok(vectors)
    }
}

impl<E: LlmProvider> Step for IndexStep<E> {
    type Input = Vec<Chunk>;
    type Output = Ingested;

    fn name(&self) -> &'static str {
        "index"
    }

    async fn run(&self, chunks: Self::Input) -> Result<Self::Output, PipelineError> {
        if chunks.is_empty() {
            return Err(PipelineError::InvalidInput("no chunks".into()));
        }

        let vectors = with_deadline(self.name(), self.timeout_secs, self.embed_all(&chunks)).await?;
        let index = VectorIndex::build(vectors.into_iter().zip(chunks.iter().cloned()).collect())?;

        tracing::debug!(
            entries = index.len(),
            dimension = index.dimension(),
            embedder = self.embedder.name(),
            "built vector index"
        );
        Ok(Ingested {
            chunks,
            index: Arc::new(index),
        })
    }
}

/// `ChunkStep` followed by `IndexStep`.
pub struct IngestionPipeline<E> {
    pipeline: Pipeline<Chain<Start<ChunkStep>, IndexStep<E>>>,
}

impl<E: LlmProvider> IngestionPipeline<E> {
    #[must_use]
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        splitter: SplitterConfig,
        embedder: Arc<E>,
        embedding_timeout_secs: u64,
    ) -> Self {
        Self {
            pipeline: Pipeline::start(ChunkStep::new(loader, splitter))
                .step(IndexStep::new(embedder, embedding_timeout_secs)),
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty path or a file without text, and the
    /// loader, embedding, or index error otherwise.
    pub async fn ingest(&self, path: impl Into<PathBuf>) -> Result<Ingested, PipelineError> {
        self.pipeline.run(path.into()).await
    }
}
