use std::future::Future;

use super::PipelineError;

/// One stage of a linear pipeline.
pub trait Step: Send + Sync {
    type Input: Send;
    type Output: Send;

    /// Stage label used in logs and timeout errors.
    fn name(&self) -> &'static str;

    fn run(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = Result<Self::Output, PipelineError>> + Send;
}

/// Run `fut` under a deadline of `seconds`, reporting expiry against `stage`.
pub(crate) async fn with_deadline<T>(
    stage: &'static str,
    seconds: u64,
    fut: impl Future<Output = Result<T, PipelineError>>,
) -> Result<T, PipelineError> {
    tokio::time::timeout(std::time::Duration::from_secs(seconds), fut)
        .await
        .map_err(|_| PipelineError::Timeout { stage, seconds })?
}
