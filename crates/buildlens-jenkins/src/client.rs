//! Jenkins HTTP transport

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use buildlens_api::{
    JenkinsInstance,
    JenkinsTransport,
    JobReference,
    LensError,
    LensResult,
    RetryPolicy,
};
use dashmap::DashMap;
use reqwest::header::{
    HeaderMap,
    HeaderValue,
    AUTHORIZATION,
};
use reqwest::{
    Client,
    StatusCode,
};

use crate::{
    config,
    types,
};

/// Timeouts and retry behaviour applied to every Jenkins request
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

/// [`JenkinsTransport`] over reqwest with one pooled client per instance
pub struct JenkinsClient {
    settings: HttpSettings,
    clients: DashMap<String, Arc<Client>>,
}

impl JenkinsClient {
    pub fn new(settings: HttpSettings) -> Self {
        Self {
            settings,
            clients: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    fn client_for(&self, instance: &JenkinsInstance) -> LensResult<Arc<Client>> {
        if let Some(client) = self.clients.get(instance.base_url()) {
            return Ok(Arc::clone(client.value()));
        }

        let client = Arc::new(build_http_client(instance, &self.settings)?);
        self.clients
            .insert(instance.base_url().to_string(), Arc::clone(&client));
        tracing::debug!(instance = instance.base_url(), "created HTTP client");
        Ok(client)
    }

    async fn get_text(&self, job: &JobReference, url: &str) -> LensResult<String> {
        let client = self.client_for(&job.instance)?;

        self.settings
            .retry
            .retry(|| async {
                tracing::debug!(%url, "GET");
                let response = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| LensError::NetworkError(format!("Failed to reach {url}: {e}")))?;

                if let Some(err) = map_status(response.status(), job) {
                    return Err(err);
                }

                response.text().await.map_err(|e| {
                    LensError::NetworkError(format!("Failed to read response from {url}: {e}"))
                })
            })
            .await
    }
}

impl Default for JenkinsClient {
    fn default() -> Self {
        Self::new(HttpSettings::default())
    }
}

#[async_trait]
impl JenkinsTransport for JenkinsClient {
    async fn fetch_console_log(&self, job: &JobReference) -> LensResult<String> {
        let url = console_url(job);
        let log = self.get_text(job, &url).await?;
        tracing::info!(job = %job, bytes = log.len(), "fetched console log");
        Ok(log)
    }

    async fn fetch_build_metadata(&self, job: &JobReference) -> LensResult<serde_json::Value> {
        let url = metadata_url(job);
        let body = self.get_text(job, &url).await?;
        let value = serde_json::from_str(&body)?;
        tracing::info!(job = %job, "fetched build metadata");
        Ok(value)
    }
}

fn build_http_client(instance: &JenkinsInstance, settings: &HttpSettings) -> LensResult<Client> {
    let credentials = format!("{}:{}", instance.username(), instance.api_token());
    let auth_header = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes())
    );

    let mut auth_value = HeaderValue::from_str(&auth_header)
        .map_err(|e| LensError::Configuration(format!("Invalid auth format: {e}")))?;
    auth_value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth_value);

    if !instance.verify_ssl() {
        tracing::warn!(
            instance = instance.base_url(),
            "TLS certificate verification disabled"
        );
    }

    Client::builder()
        .default_headers(headers)
        .danger_accept_invalid_certs(!instance.verify_ssl())
        .timeout(settings.timeout)
        .connect_timeout(settings.connect_timeout)
        .read_timeout(settings.read_timeout)
        .build()
        .map_err(|e| LensError::Internal(format!("Failed to build HTTP client: {e}")))
}

/// `{base}/job/a/job/b/{build}`
pub(crate) fn build_url(job: &JobReference) -> String {
    format!(
        "{}/{}/{}",
        job.instance.base_url(),
        config::encode_job_path(&job.job_path),
        job.build_ref
    )
}

pub(crate) fn console_url(job: &JobReference) -> String {
    format!("{}/consoleText", build_url(job))
}

pub(crate) fn metadata_url(job: &JobReference) -> String {
    format!("{}/api/json?tree={}", build_url(job), types::BUILD_TREE)
}

/// Maps a non-success HTTP status to the matching error
pub(crate) fn map_status(status: StatusCode, job: &JobReference) -> Option<LensError> {
    if status.is_success() {
        return None;
    }

    Some(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LensError::AuthenticationFailed(
            format!(
                "Jenkins rejected the credentials for {} (HTTP {})",
                job.instance.base_url(),
                status.as_u16()
            ),
        ),
        StatusCode::NOT_FOUND => LensError::NotFound(format!("Build not found: {job}")),
        _ => LensError::ApiError(format!(
            "Jenkins returned HTTP {} for {job}",
            status.as_u16()
        )),
    })
}

#[cfg(test)]
mod tests {
    use buildlens_api::BuildRef;

    use super::*;

    fn job(path: &[&str], build_ref: BuildRef) -> JobReference {
        JobReference {
            instance: Arc::new(JenkinsInstance::new(
                "https://ci.example.com/",
                "bot",
                "token",
                true,
            )),
            job_path: path.iter().map(|s| s.to_string()).collect(),
            build_ref,
        }
    }

    #[test]
    fn test_console_url() {
        let job = job(&["Folder", "my app"], BuildRef::Number(42));
        assert_eq!(
            console_url(&job),
            "https://ci.example.com/job/Folder/job/my%20app/42/consoleText"
        );
    }

    #[test]
    fn test_metadata_url_uses_alias() {
        let job = job(&["app"], BuildRef::LastFailedBuild);
        let url = metadata_url(&job);
        assert!(url.starts_with("https://ci.example.com/job/app/lastFailedBuild/api/json?tree="));
    }

    #[test]
    fn test_map_status() {
        let job = job(&["app"], BuildRef::LastBuild);
        assert!(map_status(StatusCode::OK, &job).is_none());
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, &job),
            Some(LensError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, &job),
            Some(LensError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, &job),
            Some(LensError::NotFound(_))
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, &job),
            Some(LensError::ApiError(_))
        ));
    }

    #[test]
    fn test_client_caching() {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let transport = JenkinsClient::default();
        let instance = JenkinsInstance::new("https://ci.example.com", "bot", "token", false);

        let first = transport.client_for(&instance).unwrap();
        let second = transport.client_for(&instance).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }
}
