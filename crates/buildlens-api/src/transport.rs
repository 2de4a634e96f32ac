use async_trait::async_trait;

use crate::error::LensResult;
use crate::types::JobReference;

/// Network collaborator that talks to a Jenkins server.
///
/// Implementations surface upstream failures as
/// [`LensError::NetworkError`](crate::LensError::NetworkError),
/// [`LensError::AuthenticationFailed`](crate::LensError::AuthenticationFailed)
/// or [`LensError::NotFound`](crate::LensError::NotFound). Callers propagate
/// them unchanged.
#[async_trait]
pub trait JenkinsTransport: Send + Sync {
    /// Fetch the plain-text console output of a build
    async fn fetch_console_log(&self, job: &JobReference) -> LensResult<String>;

    /// Fetch the raw `api/json` document of a build
    async fn fetch_build_metadata(&self, job: &JobReference) -> LensResult<serde_json::Value>;
}
