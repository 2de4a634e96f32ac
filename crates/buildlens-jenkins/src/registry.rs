use std::sync::Arc;

use buildlens_api::{
    BuildRef,
    JenkinsInstance,
    JobReference,
    LensError,
    LensResult,
};

use crate::config;

/// Read-only set of configured Jenkins servers.
///
/// Built once at startup and shared by handle; no interior mutability, so
/// concurrent requests need no locking. Matching is a linear scan, which is
/// fine for the handful of servers a deployment configures.
#[derive(Debug, Clone, Default)]
pub struct InstanceRegistry {
    instances: Vec<Arc<JenkinsInstance>>,
    default: Option<usize>,
}

impl InstanceRegistry {
    /// Creates a registry. `default_base_url` must name one of `instances`.
    pub fn new(
        instances: Vec<JenkinsInstance>, default_base_url: Option<&str>,
    ) -> LensResult<Self> {
        let mut registered: Vec<Arc<JenkinsInstance>> = Vec::with_capacity(instances.len());
        for instance in instances {
            if instance.base_url().is_empty() {
                return Err(LensError::Configuration(
                    "Jenkins instance with empty URL".to_string(),
                ));
            }
            if registered.iter().any(|r| r.base_url() == instance.base_url()) {
                return Err(LensError::Configuration(format!(
                    "Jenkins instance {} configured more than once",
                    instance.base_url()
                )));
            }
            registered.push(Arc::new(instance));
        }

        let default = match default_base_url {
            Some(url) => {
                let url = buildlens_api::normalize_base_url(url);
                let index = registered
                    .iter()
                    .position(|r| r.base_url() == url)
                    .ok_or_else(|| {
                        LensError::Configuration(format!(
                            "Default Jenkins instance {url} is not among the configured instances"
                        ))
                    })?;
                Some(index)
            }
            None => None,
        };

        Ok(Self {
            instances: registered,
            default,
        })
    }

    pub fn instances(&self) -> &[Arc<JenkinsInstance>] {
        &self.instances
    }

    pub fn default_instance(&self) -> Option<&Arc<JenkinsInstance>> {
        self.default.map(|index| &self.instances[index])
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Instance whose base URL is the longest prefix of `url`, ending on a
    /// path boundary so `https://ci.example.com` never matches
    /// `https://ci.example.com.evil/...`.
    pub fn match_url(&self, url: &str) -> Option<&Arc<JenkinsInstance>> {
        self.instances
            .iter()
            .filter(|instance| {
                let base = instance.base_url();
                url.strip_prefix(base)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']))
            })
            .max_by_key(|instance| instance.base_url().len())
    }

    /// Resolves a full job URL or a bare job path into a [`JobReference`].
    ///
    /// Full URLs pick the longest-prefix instance and fall back to the
    /// default instance; bare paths always use the default instance.
    pub fn resolve(&self, job_url_or_path: &str) -> LensResult<JobReference> {
        let input = job_url_or_path.trim();

        if config::has_scheme(input) {
            if let Some(instance) = self.match_url(input) {
                let rest = &input[instance.base_url().len()..];
                let (job_path, build_ref) = config::decompose_url_path(rest, input)?;
                tracing::debug!(instance = instance.base_url(), ?job_path, %build_ref, "resolved job URL");
                return Ok(JobReference {
                    instance: Arc::clone(instance),
                    job_path,
                    build_ref,
                });
            }

            let instance = self.require_default(input)?;
            tracing::debug!(
                instance = instance.base_url(),
                "no instance matches URL, using default"
            );
            let (job_path, build_ref) =
                config::decompose_url_path(config::path_of_url(input), input)?;
            return Ok(JobReference {
                instance: Arc::clone(instance),
                job_path,
                build_ref,
            });
        }

        let instance = self.require_default(input)?;
        let (job_path, build_ref) = config::decompose_bare_path(input, input)?;
        Ok(JobReference {
            instance: Arc::clone(instance),
            job_path,
            build_ref,
        })
    }

    /// Resolves job coordinates: a target as accepted by [`Self::resolve`]
    /// plus an optional explicit build selector that overrides the one found
    /// in the target.
    pub fn resolve_with_build(
        &self, job_url_or_path: &str, build: Option<&str>,
    ) -> LensResult<JobReference> {
        let reference = self.resolve(job_url_or_path)?;
        match build {
            Some(build) => Ok(reference.with_build(build.parse::<BuildRef>()?)),
            None => Ok(reference),
        }
    }

    fn require_default(&self, input: &str) -> LensResult<&Arc<JenkinsInstance>> {
        if let Some(instance) = self.default_instance() {
            return Ok(instance);
        }

        if self.instances.is_empty() {
            return Err(LensError::Configuration(
                "No Jenkins instances configured. Set JENKINS_URL, JENKINS_USER and JENKINS_API_TOKEN or add [[instances]] to the config file.".to_string(),
            ));
        }

        let available = self
            .instances
            .iter()
            .map(|instance| instance.base_url())
            .collect::<Vec<_>>()
            .join(", ");
        Err(LensError::Configuration(format!(
            "No Jenkins instance matches '{input}' and no default instance is configured. Available instances: {available}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(url: &str) -> JenkinsInstance {
        JenkinsInstance::new(url, "bot", "token", true)
    }

    fn registry(urls: &[&str], default: Option<&str>) -> InstanceRegistry {
        InstanceRegistry::new(urls.iter().map(|u| instance(u)).collect(), default).unwrap()
    }

    #[test]
    fn test_resolve_nested_job_url() {
        let registry = registry(
            &["https://ci.example.com", "https://other.example.org"],
            Some("https://other.example.org"),
        );

        let job = registry
            .resolve("https://ci.example.com/job/Foo/job/Bar/lastBuild")
            .unwrap();

        assert_eq!(job.instance.base_url(), "https://ci.example.com");
        assert_eq!(job.job_path, vec!["Foo", "Bar"]);
        assert_eq!(job.build_ref, BuildRef::LastBuild);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let registry = registry(
            &["https://ci.example.com", "https://ci.example.com/legacy"],
            None,
        );

        let job = registry
            .resolve("https://ci.example.com/legacy/job/app/12/console")
            .unwrap();
        assert_eq!(job.instance.base_url(), "https://ci.example.com/legacy");
        assert_eq!(job.job_path, vec!["app"]);
        assert_eq!(job.build_ref, BuildRef::Number(12));

        let job = registry.resolve("https://ci.example.com/job/app").unwrap();
        assert_eq!(job.instance.base_url(), "https://ci.example.com");
    }

    #[test]
    fn test_prefix_must_end_on_boundary() {
        let registry = registry(&["https://ci.example.com"], None);
        assert!(registry.match_url("https://ci.example.com.evil/job/x").is_none());
        assert!(registry.match_url("https://ci.example.com").is_some());
    }

    #[test]
    fn test_matching_is_case_sensitive_on_host() {
        let registry = registry(&["https://ci.example.com"], None);
        assert!(registry.match_url("https://CI.example.com/job/x").is_none());
    }

    #[test]
    fn test_unmatched_host_without_default_is_configuration_error() {
        let registry = registry(&["https://ci.example.com"], None);
        let err = registry
            .resolve("https://unknown.example.net/job/app/1")
            .unwrap_err();
        match err {
            LensError::Configuration(msg) => {
                assert!(msg.contains("https://unknown.example.net/job/app/1"));
                assert!(msg.contains("https://ci.example.com"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unmatched_host_falls_back_to_default() {
        let registry = registry(&["https://ci.example.com"], Some("https://ci.example.com/"));
        let job = registry
            .resolve("https://mirror.example.net/job/app/job/main/5")
            .unwrap();
        assert_eq!(job.instance.base_url(), "https://ci.example.com");
        assert_eq!(job.job_path, vec!["app", "main"]);
        assert_eq!(job.build_ref, BuildRef::Number(5));
    }

    #[test]
    fn test_bare_path_uses_default() {
        let registry = registry(&["https://a.example.com", "https://b.example.com"], Some("https://b.example.com"));
        let job = registry.resolve("Folder/app/lastFailedBuild").unwrap();
        assert_eq!(job.instance.base_url(), "https://b.example.com");
        assert_eq!(job.job_path, vec!["Folder", "app"]);
        assert_eq!(job.build_ref, BuildRef::LastFailedBuild);
    }

    #[test]
    fn test_empty_registry_is_configuration_error() {
        let registry = InstanceRegistry::default();
        assert!(matches!(
            registry.resolve("app"),
            Err(LensError::Configuration(_))
        ));
        assert!(matches!(
            registry.resolve("https://ci.example.com/job/app"),
            Err(LensError::Configuration(_))
        ));
    }

    #[test]
    fn test_url_without_job_segment_is_invalid_reference() {
        let registry = registry(&["https://ci.example.com"], None);
        let err = registry.resolve("https://ci.example.com/view/All/").unwrap_err();
        assert!(matches!(err, LensError::InvalidReference { .. }));
    }

    #[test]
    fn test_explicit_build_overrides_target() {
        let registry = registry(&["https://ci.example.com"], Some("https://ci.example.com"));
        let job = registry
            .resolve_with_build("https://ci.example.com/job/app/3", Some("lastSuccessfulBuild"))
            .unwrap();
        assert_eq!(job.build_ref, BuildRef::LastSuccessfulBuild);

        let err = registry.resolve_with_build("app", Some("nope")).unwrap_err();
        assert!(matches!(err, LensError::InvalidReference { .. }));
    }

    #[test]
    fn test_duplicate_instances_rejected() {
        let result = InstanceRegistry::new(
            vec![instance("https://ci.example.com/"), instance("https://ci.example.com")],
            None,
        );
        assert!(matches!(result, Err(LensError::Configuration(_))));
    }

    #[test]
    fn test_unknown_default_rejected() {
        let result = InstanceRegistry::new(vec![instance("https://ci.example.com")], Some("https://x.example.com"));
        assert!(matches!(result, Err(LensError::Configuration(_))));
    }
}
