use std::sync::Arc;

use buildlens_api::{
    JenkinsTransport,
    JobReference,
    LensResult,
};
use buildlens_jenkins::{
    extract_git_references,
    normalize_build_info,
    InstanceRegistry,
    JenkinsClient,
    SnippetExtractor,
};

use super::report::{
    Analysis,
    BuildInfoReport,
    ConsoleLogReport,
    ErrorAnalysisReport,
    GitReferencesReport,
    InstanceSummary,
    InstancesReport,
    JobSummary,
};
use crate::infrastructure::config::Settings;

/// Console log and build metadata operations over the configured instances.
///
/// Every operation takes a `target` (full job URL or bare job path) and an
/// optional build selector that overrides the one in the target. The target
/// is resolved before anything is fetched, so resolution errors never cost a
/// request.
pub struct BuildLensService {
    registry: InstanceRegistry,
    transport: Arc<dyn JenkinsTransport>,
    extractor: SnippetExtractor,
}

impl BuildLensService {
    pub fn new(
        registry: InstanceRegistry, transport: Arc<dyn JenkinsTransport>,
        extractor: SnippetExtractor,
    ) -> Self {
        Self {
            registry,
            transport,
            extractor,
        }
    }

    /// Service backed by the HTTP transport
    pub fn from_settings(settings: Settings) -> Self {
        let extractor = settings.extractor();
        let transport = Arc::new(JenkinsClient::new(settings.http));
        Self::new(settings.registry, transport, extractor)
    }

    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    pub fn resolve(&self, target: &str, build: Option<&str>) -> LensResult<JobReference> {
        self.registry.resolve_with_build(target, build)
    }

    pub async fn console_log(&self, target: &str, build: Option<&str>) -> LensResult<ConsoleLogReport> {
        let job = self.resolve(target, build)?;
        let log = self.transport.fetch_console_log(&job).await?;

        Ok(ConsoleLogReport {
            job: JobSummary::from(&job),
            characters: log.chars().count(),
            log,
        })
    }

    /// Fetches the console log and reduces it to error context.
    /// `context_lines` overrides the configured window for this call.
    pub async fn analyze_errors(
        &self, target: &str, build: Option<&str>, context_lines: Option<usize>,
    ) -> LensResult<ErrorAnalysisReport> {
        let job = self.resolve(target, build)?;
        let log = self.transport.fetch_console_log(&job).await?;

        let extractor = SnippetExtractor {
            context_lines: context_lines.unwrap_or(self.extractor.context_lines),
            ..self.extractor
        };

        let analysis = if log.is_empty() {
            tracing::warn!(job = %job, "console log is empty");
            Analysis::Empty
        } else {
            Analysis::from(extractor.extract(&log))
        };

        tracing::info!(
            job = %job,
            bytes = log.len(),
            mode = analysis_mode(&analysis),
            "analyzed console log"
        );

        Ok(ErrorAnalysisReport {
            job: JobSummary::from(&job),
            characters: log.chars().count(),
            context_lines: extractor.context_lines,
            analysis,
        })
    }

    pub async fn build_info(&self, target: &str, build: Option<&str>) -> LensResult<BuildInfoReport> {
        let job = self.resolve(target, build)?;
        let raw = self.transport.fetch_build_metadata(&job).await?;
        let info = normalize_build_info(&raw)?;

        tracing::info!(job = %job, status = %info.status, "normalized build metadata");

        Ok(BuildInfoReport {
            job: JobSummary::from(&job),
            info,
        })
    }

    pub async fn git_references(
        &self, target: &str, build: Option<&str>,
    ) -> LensResult<GitReferencesReport> {
        let job = self.resolve(target, build)?;
        let log = self.transport.fetch_console_log(&job).await?;
        let references = extract_git_references(&log);

        tracing::info!(job = %job, count = references.len(), "extracted git references");

        Ok(GitReferencesReport {
            job: JobSummary::from(&job),
            references,
        })
    }

    pub fn instances(&self) -> InstancesReport {
        let default = self.registry.default_instance();
        InstancesReport {
            instances: self
                .registry
                .instances()
                .iter()
                .map(|instance| {
                    let is_default = default.is_some_and(|d| Arc::ptr_eq(d, instance));
                    InstanceSummary::new(instance, is_default)
                })
                .collect(),
        }
    }
}

fn analysis_mode(analysis: &Analysis) -> &'static str {
    match analysis {
        Analysis::Empty => "empty",
        Analysis::Full(_) => "full",
        Analysis::Snippets(_) => "snippets",
        Analysis::Sample(_) => "sample",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };

    use async_trait::async_trait;
    use buildlens_api::{
        BuildRef,
        BuildStatus,
        JenkinsInstance,
        LensError,
    };
    use serde_json::json;

    use super::*;

    struct FakeTransport {
        log: String,
        metadata: serde_json::Value,
        calls: AtomicUsize,
        last_job: std::sync::Mutex<Option<String>>,
    }

    impl FakeTransport {
        fn new(log: &str, metadata: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                log: log.to_string(),
                metadata,
                calls: AtomicUsize::new(0),
                last_job: std::sync::Mutex::new(None),
            })
        }

        fn record(&self, job: &JobReference) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_job.lock().unwrap() = Some(job.to_string());
        }
    }

    #[async_trait]
    impl JenkinsTransport for FakeTransport {
        async fn fetch_console_log(&self, job: &JobReference) -> LensResult<String> {
            self.record(job);
            Ok(self.log.clone())
        }

        async fn fetch_build_metadata(&self, job: &JobReference) -> LensResult<serde_json::Value> {
            self.record(job);
            Ok(self.metadata.clone())
        }
    }

    struct MissingBuild;

    #[async_trait]
    impl JenkinsTransport for MissingBuild {
        async fn fetch_console_log(&self, job: &JobReference) -> LensResult<String> {
            Err(LensError::NotFound(format!("Build not found: {job}")))
        }

        async fn fetch_build_metadata(&self, job: &JobReference) -> LensResult<serde_json::Value> {
            Err(LensError::NotFound(format!("Build not found: {job}")))
        }
    }

    fn registry() -> InstanceRegistry {
        InstanceRegistry::new(
            vec![
                JenkinsInstance::new("https://ci.example.com", "bot", "token", true),
                JenkinsInstance::new("https://legacy.example.com", "old", "token", false),
            ],
            Some("https://ci.example.com"),
        )
        .unwrap()
    }

    fn service(transport: Arc<dyn JenkinsTransport>, max_size: usize) -> BuildLensService {
        BuildLensService::new(registry(), transport, SnippetExtractor::new(max_size, 2))
    }

    #[tokio::test]
    async fn test_small_log_is_returned_whole() {
        let transport = FakeTransport::new("step 1\nERROR: boom\n", json!({}));
        let service = service(transport.clone(), 1_000);

        let report = service
            .analyze_errors("https://legacy.example.com/job/app/7/console", None, None)
            .await
            .unwrap();

        assert_eq!(report.analysis, Analysis::Full("step 1\nERROR: boom\n".to_string()));
        assert_eq!(report.job.instance, "https://legacy.example.com");
        assert_eq!(report.job.build, "7");
        assert_eq!(
            transport.last_job.lock().unwrap().as_deref(),
            Some("app #7 on https://legacy.example.com")
        );
    }

    #[tokio::test]
    async fn test_large_log_yields_snippets() {
        let mut lines: Vec<String> = (0..40).map(|i| format!("line {i}")).collect();
        lines[20] = "ERROR: compilation failed".to_string();
        let log = lines.join("\n");
        let service = service(FakeTransport::new(&log, json!({})), 10);

        let report = service.analyze_errors("app", Some("lastBuild"), Some(1)).await.unwrap();

        assert_eq!(report.context_lines, 1);
        match report.analysis {
            Analysis::Snippets(snippets) => {
                assert_eq!(snippets.len(), 1);
                assert_eq!(snippets[0].start_line, 20);
                assert_eq!(snippets[0].end_line, 22);
            }
            other => panic!("unexpected analysis: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_log() {
        let service = service(FakeTransport::new("", json!({})), 10);
        let report = service.analyze_errors("app", None, None).await.unwrap();
        assert_eq!(report.analysis, Analysis::Empty);

        let report = service.console_log("app", None).await.unwrap();
        assert_eq!(report.to_string(), "Console log is empty.");
    }

    #[tokio::test]
    async fn test_invalid_target_fails_before_fetch() {
        let transport = FakeTransport::new("log", json!({}));
        let service = service(transport.clone(), 10);

        let err = service
            .console_log("https://ci.example.com/view/All/", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LensError::InvalidReference { .. }));

        let err = service.console_log("app", Some("latest")).await.unwrap_err();
        assert!(matches!(err, LensError::InvalidReference { .. }));

        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_build_info() {
        let transport = FakeTransport::new(
            "",
            json!({
                "number": 15,
                "result": null,
                "building": true,
                "timestamp": 1_700_000_000_000_i64,
                "duration": 0,
                "actions": [{"causes": [{"shortDescription": "Started by user Jane", "userId": "jane"}]}]
            }),
        );
        let service = service(transport, 10);

        let report = service
            .build_info("https://ci.example.com/job/Folder/job/app/", Some("15"))
            .await
            .unwrap();

        assert_eq!(report.info.status, BuildStatus::InProgress);
        assert_eq!(report.info.build_number, 15);
        assert_eq!(report.info.triggered_by.as_deref(), Some("Started by user Jane"));
        assert_eq!(report.job.job, "Folder/app");
    }

    #[tokio::test]
    async fn test_git_references() {
        let log = "Cloning the remote Git repository\n\
                   Cloning repository https://github.com/acme/app.git\n\
                   Checking out Revision 0123456789abcdef0123456789abcdef01234567 (refs/remotes/origin/main)\n";
        let service = service(FakeTransport::new(log, json!({})), 10);

        let report = service.git_references("app", None).await.unwrap();

        assert_eq!(report.references.len(), 1);
        assert_eq!(report.references[0].url, "https://github.com/acme/app.git");
        assert_eq!(report.references[0].branch.as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn test_transport_errors_propagate() {
        let service = service(Arc::new(MissingBuild), 10);
        let err = service.console_log("app", Some("999")).await.unwrap_err();
        match err {
            LensError::NotFound(msg) => assert!(msg.contains("app #999")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_instances_marks_default() {
        let service = service(Arc::new(MissingBuild), 10);
        let report = service.instances();
        assert_eq!(report.instances.len(), 2);
        assert!(report.instances[0].default);
        assert!(!report.instances[1].default);
        assert!(!report.instances[1].verify_ssl);
    }

    #[test]
    fn test_resolve_override() {
        let service = service(Arc::new(MissingBuild), 10);
        let job = service.resolve("app/12", Some("lastCompletedBuild")).unwrap();
        assert_eq!(job.build_ref, BuildRef::LastCompletedBuild);
    }
}
