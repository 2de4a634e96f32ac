//! Normalization of raw Jenkins build metadata

use buildlens_api::{
    BuildInfo,
    BuildStatus,
    LensResult,
};
use chrono::DateTime;
use serde::Deserialize;

use crate::git_refs::normalize_branch;
use crate::types;

/// Cause classes describing a person or an upstream job starting the build
const ATTRIBUTABLE_CAUSES: &[&str] = &[
    "UserIdCause",
    "UserCause",
    "UpstreamCause",
    "RebuildCause",
    "ReplayCause",
];

/// Maps a Jenkins build result to [`BuildStatus`]. `None` means the build
/// has not finished yet; unknown results map to `Unknown`.
pub fn map_jenkins_result(result: Option<&str>) -> BuildStatus {
    match result {
        Some("SUCCESS") => BuildStatus::Success,
        Some("FAILURE") => BuildStatus::Failure,
        Some("UNSTABLE") => BuildStatus::Unstable,
        Some("ABORTED") => BuildStatus::Aborted,
        None => BuildStatus::InProgress,
        Some(other) => {
            tracing::debug!(result = other, "unrecognized Jenkins build result");
            BuildStatus::Unknown
        }
    }
}

/// Normalizes a raw `api/json` build document.
///
/// Fails only when the payload is not a JSON object of the expected shape;
/// unrecognized values inside it degrade to defaults.
pub fn normalize_build_info(raw: &serde_json::Value) -> LensResult<BuildInfo> {
    let build = types::Build::deserialize(raw)?;
    Ok(build_to_info(build))
}

/// Converts a deserialized Jenkins build to [`BuildInfo`]
pub fn build_to_info(build: types::Build) -> BuildInfo {
    let status = if build.building {
        BuildStatus::InProgress
    } else {
        match &build.result {
            serde_json::Value::Null => map_jenkins_result(None),
            serde_json::Value::String(result) => map_jenkins_result(Some(result)),
            other => {
                tracing::debug!(result = %other, "non-string Jenkins build result");
                BuildStatus::Unknown
            }
        }
    };

    let timestamp = DateTime::from_timestamp_millis(build.timestamp).unwrap_or_default();
    let duration_ms = u64::try_from(build.duration).unwrap_or(0);

    let mut causes: Vec<String> = Vec::new();
    let mut triggered_by = None;
    let mut branch = None;
    let mut commit = None;

    for action in &build.actions {
        for cause in &action.causes {
            let Some(description) = describe_cause(cause) else {
                continue;
            };
            if triggered_by.is_none() && is_attributable(cause) {
                triggered_by = Some(description.clone());
            }
            if !causes.contains(&description) {
                causes.push(description);
            }
        }

        if commit.is_none() {
            if let Some(revision) = &action.last_built_revision {
                let first_branch = revision.branch.first();
                commit = first_branch
                    .and_then(|b| b.sha1.clone())
                    .or_else(|| revision.sha1.clone())
                    .map(|sha| sha.to_ascii_lowercase());
                branch = first_branch
                    .and_then(|b| b.name.as_deref())
                    .and_then(normalize_branch);
            }
        }
    }

    BuildInfo {
        status,
        duration_ms,
        timestamp,
        build_number: build.number,
        triggered_by,
        building: build.building,
        url: build.url,
        display_name: build.full_display_name.or(build.display_name),
        causes,
        branch,
        commit,
    }
}

fn is_attributable(cause: &types::BuildCause) -> bool {
    cause.user_id.is_some()
        || cause.user_name.is_some()
        || cause.upstream_project.is_some()
        || cause.class.as_deref().is_some_and(|class| {
            ATTRIBUTABLE_CAUSES
                .iter()
                .any(|suffix| class.ends_with(suffix))
        })
}

fn describe_cause(cause: &types::BuildCause) -> Option<String> {
    if let Some(description) = cause
        .short_description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        return Some(description.to_string());
    }

    if let Some(project) = &cause.upstream_project {
        return Some(match cause.upstream_build {
            Some(number) => format!("Started by upstream project \"{project}\" build number {number}"),
            None => format!("Started by upstream project \"{project}\""),
        });
    }

    cause
        .user_name
        .as_ref()
        .or(cause.user_id.as_ref())
        .map(|user| format!("Started by user {user}"))
}
