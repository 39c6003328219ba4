//! Ask path: retrieve the closest chunks, then let the model answer from them.

use std::sync::Arc;

use docqa_llm::{LlmProvider, Message};
use docqa_memory::VectorIndex;

use super::PipelineError;
use super::builder::{Chain, Pipeline, Start};
use super::step::{Step, with_deadline};

/// Answer returned when there is nothing to ask or nothing to answer from.
pub const NO_QUESTION_OR_CONTENT: &str = "No question or content";

const CONTENT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct Query {
    pub question: String,
    pub index: Option<Arc<VectorIndex>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieved {
    pub question: String,
    /// Retrieved chunk texts joined by a blank line; `None` without hits.
    pub content: Option<String>,
}

pub struct RetrieveStep<E> {
    embedder: Arc<E>,
    top_k: usize,
    timeout_secs: u64,
}

impl<E> RetrieveStep<E> {
    #[must_use]
    pub fn new(embedder: Arc<E>, top_k: usize, timeout_secs: u64) -> Self {
        Self {
            embedder,
            top_k,
            timeout_secs,
        }
    }
}

impl<E: LlmProvider> Step for RetrieveStep<E> {
    type Input = Query;
    type Output = Retrieved;

    fn name(&self) -> &'static str {
        "retrieve"
    }

    async fn run(&self, query: Self::Input) -> Result<Self::Output, PipelineError> {
        if query.question.trim().is_empty() {
            return Err(PipelineError::MissingInput("no question provided".into()));
        }
        let Some(index) = query.index else {
            return Err(PipelineError::MissingInput("no vector index provided".into()));
        };

        let embedding = with_deadline(self.name(), self.timeout_secs, async {
            Ok(self.embedder.embed(&query.question).await?)
        })
        .await?;
        let hits = index.search(&embedding, self.top_k)?;

        tracing::debug!(hits = hits.len(), top_k = self.top_k, "retrieved chunks");

        let content = (!hits.is_empty()).then(|| {
            hits.iter()
                .map(|h| h.chunk.content.as_str())
                .collect::<Vec<_>>()
                .join(CONTENT_SEPARATOR)
        });
        Ok(Retrieved {
            question: query.question,
            content,
        })
    }
}

pub struct AnswerStep<P> {
    provider: Arc<P>,
    timeout_secs: u64,
}

impl<P> AnswerStep<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, timeout_secs: u64) -> Self {
        Self {
            provider,
            timeout_secs,
        }
    }
}

#[must_use]
pub fn render_prompt(question: &str, content: &str) -> String {
    format!(
        "You are a helpful assistant.\n\
         Answer the following question using only the content provided.\n\n\
         Question:\n{question}\n\n\
         Content:\n{content}"
    )
}

impl<P: LlmProvider> Step for AnswerStep<P> {
    type Input = Retrieved;
    type Output = String;

    fn name(&self) -> &'static str {
        "answer"
    }

    async fn run(&self, retrieved: Self::Input) -> Result<Self::Output, PipelineError> {
        let content = retrieved.content.as_deref().unwrap_or_default();
        if retrieved.question.trim().is_empty() || content.trim().is_empty() {
            return Ok(NO_QUESTION_OR_CONTENT.into());
        }

        let messages = [Message::user(render_prompt(&retrieved.question, content))];
        with_deadline(self.name(), self.timeout_secs, async {
            Ok(self.provider.chat(&messages).await?)
        })
        .await
    }
}

/// `RetrieveStep` followed by `AnswerStep`.
pub struct QaPipeline<E, P> {
    pipeline: Pipeline<Chain<Start<RetrieveStep<E>>, AnswerStep<P>>>,
}

impl<E: LlmProvider, P: LlmProvider> QaPipeline<E, P> {
    #[must_use]
    pub fn new(
        embedder: Arc<E>,
        provider: Arc<P>,
        top_k: usize,
        embedding_timeout_secs: u64,
        llm_timeout_secs: u64,
    ) -> Self {
        Self {
            pipeline: Pipeline::start(RetrieveStep::new(embedder, top_k, embedding_timeout_secs))
                .step(AnswerStep::new(provider, llm_timeout_secs)),
        }
    }

    /// # Errors
    ///
    /// Returns `MissingInput` for a blank question or absent index, and the
    /// embedding, index, model, or timeout error otherwise.
    pub async fn try_answer(
        &self,
        question: &str,
        index: Option<Arc<VectorIndex>>,
    ) -> Result<String, PipelineError> {
        self.pipeline
            .run(Query {
                question: question.to_owned(),
                index,
            })
            .await
    }

    /// Like [`Self::try_answer`], but a failure becomes the answer text.
    pub async fn answer(&self, question: &str, index: Option<Arc<VectorIndex>>) -> String {
        match self.try_answer(question, index).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "question answering failed");
                e.to_string()
            }
        }
    }
}
