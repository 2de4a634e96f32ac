use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{
    DateTime,
    Utc,
};
use secrecy::{
    ExposeSecret,
    SecretString,
};
use serde::{
    Deserialize,
    Serialize,
    Serializer,
};

use crate::error::LensError;

/// One configured Jenkins server. Identity is the normalized base URL.
#[derive(Debug)]
pub struct JenkinsInstance {
    base_url: String,
    username: String,
    api_token: SecretString,
    verify_ssl: bool,
}

impl JenkinsInstance {
    pub fn new(
        base_url: &str, username: impl Into<String>, api_token: impl Into<String>,
        verify_ssl: bool,
    ) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            username: username.into(),
            api_token: SecretString::from(api_token.into()),
            verify_ssl,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn api_token(&self) -> &str {
        self.api_token.expose_secret()
    }

    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }
}

impl PartialEq for JenkinsInstance {
    fn eq(&self, other: &Self) -> bool {
        self.base_url == other.base_url
    }
}

impl Eq for JenkinsInstance {}

pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Build selector: a concrete build number or one of the permalinks Jenkins
/// exposes for every job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildRef {
    Number(u64),
    #[default]
    LastBuild,
    LastSuccessfulBuild,
    LastFailedBuild,
    LastCompletedBuild,
}

impl BuildRef {
    pub const ALIASES: [&'static str; 4] = [
        "lastBuild",
        "lastSuccessfulBuild",
        "lastFailedBuild",
        "lastCompletedBuild",
    ];

    /// Recognizes a single path segment as a build selector. Only positive
    /// integers count as build numbers.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "lastBuild" => Some(Self::LastBuild),
            "lastSuccessfulBuild" => Some(Self::LastSuccessfulBuild),
            "lastFailedBuild" => Some(Self::LastFailedBuild),
            "lastCompletedBuild" => Some(Self::LastCompletedBuild),
            s if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                s.parse::<u64>().ok().filter(|n| *n > 0).map(Self::Number)
            }
            _ => None,
        }
    }
}

impl fmt::Display for BuildRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::LastBuild => f.write_str("lastBuild"),
            Self::LastSuccessfulBuild => f.write_str("lastSuccessfulBuild"),
            Self::LastFailedBuild => f.write_str("lastFailedBuild"),
            Self::LastCompletedBuild => f.write_str("lastCompletedBuild"),
        }
    }
}

impl FromStr for BuildRef {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::from_segment(trimmed).ok_or_else(|| {
            LensError::invalid_reference(
                s,
                format!(
                    "expected a positive build number or one of {}",
                    Self::ALIASES.join(", ")
                ),
            )
        })
    }
}

impl Serialize for BuildRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved build coordinate: which server, which job, which build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReference {
    pub instance: Arc<JenkinsInstance>,
    pub job_path: Vec<String>,
    pub build_ref: BuildRef,
}

impl JobReference {
    /// Slash-joined job path, e.g. `Folder/my-job`
    pub fn job_name(&self) -> String {
        self.job_path.join("/")
    }

    pub fn with_build(mut self, build_ref: BuildRef) -> Self {
        self.build_ref = build_ref;
        self
    }
}

impl fmt::Display for JobReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{} on {}",
            self.job_name(),
            self.build_ref,
            self.instance.base_url()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSnippet {
    /// 1-based, inclusive
    pub start_line: usize,
    /// 1-based, inclusive
    pub end_line: usize,
    pub text: String,
}

/// Outcome of snippet extraction over a console log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "data", rename_all = "snake_case")]
pub enum LogExtraction<'a> {
    /// Log was under the size threshold; no extraction occurred.
    Full(&'a str),
    /// Merged context windows around anchor lines.
    Snippets(Vec<ErrorSnippet>),
    /// No anchor line was found; a bounded head/tail sample of the log.
    Sample(ErrorSnippet),
}

impl LogExtraction<'_> {
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    pub fn snippets(&self) -> &[ErrorSnippet] {
        match self {
            Self::Full(_) => &[],
            Self::Snippets(snippets) => snippets,
            Self::Sample(sample) => std::slice::from_ref(sample),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GitReference {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Success,
    Failure,
    Unstable,
    Aborted,
    InProgress,
    Unknown,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Unstable => "UNSTABLE",
            Self::Aborted => "ABORTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub status: BuildStatus,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub build_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<String>,
    pub building: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Every cause description in payload order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_ref_segments() {
        assert_eq!(BuildRef::from_segment("42"), Some(BuildRef::Number(42)));
        assert_eq!(BuildRef::from_segment("lastBuild"), Some(BuildRef::LastBuild));
        assert_eq!(
            BuildRef::from_segment("lastCompletedBuild"),
            Some(BuildRef::LastCompletedBuild)
        );
        assert_eq!(BuildRef::from_segment("0"), None);
        assert_eq!(BuildRef::from_segment("-3"), None);
        assert_eq!(BuildRef::from_segment("lastStableBuild"), None);
        assert_eq!(BuildRef::from_segment(""), None);
    }

    #[test]
    fn test_build_ref_from_str_rejects_garbage() {
        assert_eq!("  17 ".parse::<BuildRef>().unwrap(), BuildRef::Number(17));
        let err = "latest".parse::<BuildRef>().unwrap_err();
        assert!(matches!(err, LensError::InvalidReference { ref input, .. } if input == "latest"));
    }

    #[test]
    fn test_build_ref_display_roundtrips_segment() {
        for alias in BuildRef::ALIASES {
            assert_eq!(BuildRef::from_segment(alias).unwrap().to_string(), alias);
        }
        assert_eq!(BuildRef::Number(7).to_string(), "7");
    }

    #[test]
    fn test_instance_normalizes_base_url() {
        let instance = JenkinsInstance::new(" https://ci.example.com/ ", "bot", "t0k3n", true);
        assert_eq!(instance.base_url(), "https://ci.example.com");
        assert_eq!(instance.api_token(), "t0k3n");
    }

    #[test]
    fn test_instance_debug_redacts_token() {
        let instance = JenkinsInstance::new("https://ci.example.com", "bot", "t0k3n", true);
        let debug = format!("{instance:?}");
        assert!(!debug.contains("t0k3n"));
    }

    #[test]
    fn test_build_status_serializes_screaming_case() {
        let json = serde_json::to_string(&BuildStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }

    #[test]
    fn test_sample_extraction_exposes_single_snippet() {
        let sample = ErrorSnippet {
            start_line: 1,
            end_line: 3,
            text: "1: a".to_string(),
        };
        let extraction = LogExtraction::Sample(sample.clone());
        assert_eq!(extraction.snippets(), &[sample]);
        assert!(LogExtraction::Full("log").snippets().is_empty());
    }
}
