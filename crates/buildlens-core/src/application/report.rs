//! Result types returned by [`BuildLensService`](super::BuildLensService)
//!
//! Each type serializes to JSON and renders a plain-text report through
//! `Display`.

use std::fmt;

use buildlens_api::{
    BuildInfo,
    ErrorSnippet,
    GitReference,
    JenkinsInstance,
    JobReference,
    LogExtraction,
};
use serde::Serialize;

const SNIPPET_DELIMITER: &str = "\n\n--- SNIPPET DELIMITER ---\n\n";

/// Resolved build coordinates, without credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub instance: String,
    pub job: String,
    pub build: String,
}

impl From<&JobReference> for JobSummary {
    fn from(job: &JobReference) -> Self {
        Self {
            instance: job.instance.base_url().to_string(),
            job: job.job_name(),
            build: job.build_ref.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsoleLogReport {
    pub job: JobSummary,
    pub characters: usize,
    pub log: String,
}

impl fmt::Display for ConsoleLogReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.log.is_empty() {
            return f.write_str("Console log is empty.");
        }
        write!(
            f,
            "Console log for {} build {} ({} characters):\n\n{}",
            self.job.job, self.job.build, self.characters, self.log
        )
    }
}

/// Owned form of [`LogExtraction`], plus the empty-log case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "data", rename_all = "snake_case")]
pub enum Analysis {
    Empty,
    Full(String),
    Snippets(Vec<ErrorSnippet>),
    Sample(ErrorSnippet),
}

impl From<LogExtraction<'_>> for Analysis {
    fn from(extraction: LogExtraction<'_>) -> Self {
        match extraction {
            LogExtraction::Full(log) => Self::Full(log.to_string()),
            LogExtraction::Snippets(snippets) => Self::Snippets(snippets),
            LogExtraction::Sample(sample) => Self::Sample(sample),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorAnalysisReport {
    pub job: JobSummary,
    pub characters: usize,
    pub context_lines: usize,
    pub analysis: Analysis,
}

impl fmt::Display for ErrorAnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let JobSummary { job, build, .. } = &self.job;
        let characters = self.characters;

        match &self.analysis {
            Analysis::Empty => f.write_str("Console log is empty or could not be fetched."),
            Analysis::Full(log) => write!(
                f,
                "Build log for {job} build {build} ({characters} characters):\n\
                 The log is small enough to analyze in its entirety.\n\n\
                 --- FULL CONSOLE LOG ---\n\
                 {log}"
            ),
            Analysis::Snippets(snippets) => {
                let combined = snippets
                    .iter()
                    .map(|snippet| snippet.text.as_str())
                    .collect::<Vec<_>>()
                    .join(SNIPPET_DELIMITER);
                write!(
                    f,
                    "Build log analysis for {job} build {build} ({characters} characters):\n\
                     Found {} error snippets. Here are the relevant sections:\n\n\
                     --- ERROR CONTEXT SNIPPETS ---\n\
                     {combined}",
                    snippets.len()
                )
            }
            Analysis::Sample(sample) => write!(
                f,
                "Build log for {job} build {build} ({characters} characters):\n\
                 The log was too large to analyze fully, and no specific error keywords \
                 (like 'error' or 'exception') were found. Manual review may be needed; \
                 the beginning and end of the log follow.\n\n\
                 --- LOG SAMPLE ---\n\
                 {}",
                sample.text
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfoReport {
    pub job: JobSummary,
    #[serde(flatten)]
    pub info: BuildInfo,
}

impl fmt::Display for BuildInfoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = &self.info;
        writeln!(
            f,
            "Build Information for {} #{}:",
            self.job.job, info.build_number
        )?;
        writeln!(f)?;
        writeln!(f, "Status: {}", info.status)?;
        writeln!(
            f,
            "Duration: {:.2} seconds",
            info.duration_ms as f64 / 1000.0
        )?;
        writeln!(f, "Timestamp: {}", info.timestamp.to_rfc3339())?;
        writeln!(f, "Building: {}", info.building)?;
        write!(f, "URL: {}", info.url.as_deref().unwrap_or("N/A"))?;

        if let Some(branch) = &info.branch {
            write!(f, "\nBranch: {branch}")?;
        }
        if let Some(commit) = &info.commit {
            write!(f, "\nCommit: {commit}")?;
        }

        if !info.causes.is_empty() {
            write!(f, "\n\nTriggered by:")?;
            for cause in &info.causes {
                write!(f, "\n  - {cause}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GitReferencesReport {
    pub job: JobSummary,
    pub references: Vec<GitReference>,
}

impl fmt::Display for GitReferencesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.references.is_empty() {
            return write!(
                f,
                "No git references found in the console log for {} build {}.",
                self.job.job, self.job.build
            );
        }

        write!(
            f,
            "Git references for {} build {} ({} found):",
            self.job.job,
            self.job.build,
            self.references.len()
        )?;
        for reference in &self.references {
            write!(f, "\n  - {}", reference.url)?;
            if let Some(branch) = &reference.branch {
                write!(f, "\n    branch: {branch}")?;
            }
            if let Some(commit) = &reference.commit {
                write!(f, "\n    commit: {commit}")?;
            }
        }
        Ok(())
    }
}

/// A configured instance, without its token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSummary {
    pub url: String,
    pub username: String,
    pub verify_ssl: bool,
    pub default: bool,
}

impl InstanceSummary {
    pub(crate) fn new(instance: &JenkinsInstance, default: bool) -> Self {
        Self {
            url: instance.base_url().to_string(),
            username: instance.username().to_string(),
            verify_ssl: instance.verify_ssl(),
            default,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstancesReport {
    pub instances: Vec<InstanceSummary>,
}

impl fmt::Display for InstancesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instances.is_empty() {
            return f.write_str(
                "No Jenkins instances configured. Set JENKINS_URL, JENKINS_USER and JENKINS_API_TOKEN or add [[instances]] to the config file.",
            );
        }

        write!(f, "Configured Jenkins instances:")?;
        for instance in &self.instances {
            write!(
                f,
                "\n  - {} (user: {}, verify_ssl: {})",
                instance.url, instance.username, instance.verify_ssl
            )?;
            if instance.default {
                write!(f, " [default]")?;
            }
        }
        Ok(())
    }
}
