pub mod answer;
pub mod builder;
pub mod ingest;
pub mod step;

pub use answer::{AnswerStep, NO_QUESTION_OR_CONTENT, QaPipeline, Query, RetrieveStep, Retrieved};
pub use builder::Pipeline;
pub use ingest::{ChunkStep, IndexStep, Ingested, IngestionPipeline};
pub use step::Step;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("external service error: {0}")]
    ExternalService(#[from] docqa_llm::LlmError),

    #[error(transparent)]
    Document(#[from] docqa_memory::DocumentError),

    #[error(transparent)]
    Index(#[from] docqa_memory::IndexError),

    #[error("{stage} stage timed out after {seconds}s")]
    Timeout { stage: &'static str, seconds: u64 },
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct AddSuffix {
        suffix: String,
    }

    impl Step for AddSuffix {
        type Input = String;
        type Output = String;

        fn name(&self) -> &'static str {
            "suffix"
        }

        async fn run(&self, input: Self::Input) -> Result<Self::Output, PipelineError> {
            Ok(format!("{input}{}", self.suffix))
        }
    }

    struct CharCount;

    impl Step for CharCount {
        type Input = String;
        type Output = usize;

        fn name(&self) -> &'static str {
            "count"
        }

        async fn run(&self, input: Self::Input) -> Result<Self::Output, PipelineError> {
            Ok(input.chars().count())
        }
    }

    struct Reject;

    impl Step for Reject {
        type Input = String;
        type Output = String;

        fn name(&self) -> &'static str {
            "reject"
        }

        async fn run(&self, _input: Self::Input) -> Result<Self::Output, PipelineError> {
            Err(PipelineError::MissingInput("nothing here".into()))
        }
    }

    struct Counted {
        calls: Arc<AtomicUsize>,
    }

    impl Step for Counted {
        type Input = String;
        type Output = String;

        fn name(&self) -> &'static str {
            "counted"
        }

        async fn run(&self, input: Self::Input) -> Result<Self::Output, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(input)
        }
    }

    #[tokio::test]
    async fn single_step_pipeline() {
        let result = Pipeline::start(AddSuffix { suffix: "!".into() })
            .run("hello".into())
            .await
            .unwrap();
        assert_eq!(result, "hello!");
    }

    #[tokio::test]
    async fn stages_run_in_order_with_typed_handoff() {
        let result = Pipeline::start(AddSuffix {
            suffix: "é!".into(),
        })
        .step(CharCount)
        .run("ab".into())
        .await
        .unwrap();
        assert_eq!(result, 4);
    }

    #[tokio::test]
    async fn failing_stage_skips_the_rest() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result = Pipeline::start(Reject)
            .step(Counted {
                calls: Arc::clone(&calls),
            })
            .run("x".into())
            .await;
        assert!(matches!(result, Err(PipelineError::MissingInput(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_reports_stage() {
        let err = step::with_deadline("slow", 3, async {
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Timeout {
                stage: "slow",
                seconds: 3
            }
        ));
        assert_eq!(err.to_string(), "slow stage timed out after 3s");
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            PipelineError::InvalidInput("no file path".into()).to_string(),
            "invalid input: no file path"
        );
        assert_eq!(
            PipelineError::from(docqa_llm::LlmError::RateLimited).to_string(),
            "external service error: rate limited"
        );
        assert_eq!(
            PipelineError::from(docqa_memory::IndexError::Empty).to_string(),
            "cannot build an index without entries"
        );
    }
}
