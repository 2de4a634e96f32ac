//! Job path decomposition and Jenkins URL construction

use buildlens_api::{
    BuildRef,
    LensError,
    LensResult,
};

/// Trailing segments that select a view of a build rather than the build
/// itself, e.g. `.../42/consoleText` or `.../lastBuild/api/json`.
const IGNORED_SEGMENTS: &[&str] = &[
    "console",
    "consoleFull",
    "consoleText",
    "api",
    "json",
    "xml",
    "python",
    "display",
    "redirect",
    "pipeline-console",
    "pipeline-graph",
    "changes",
    "parameters",
    "testReport",
];

pub(crate) fn has_scheme(input: &str) -> bool {
    match input.find("://") {
        Some(pos) => {
            pos > 0
                && input[..pos]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Path portion of a full URL: everything after `scheme://host[:port]`,
/// without query string or fragment.
pub(crate) fn path_of_url(url: &str) -> &str {
    let after_scheme = url.find("://").map(|pos| &url[pos + 3..]).unwrap_or(url);
    let path = after_scheme
        .find('/')
        .map(|pos| &after_scheme[pos..])
        .unwrap_or("");
    strip_query(path)
}

pub(crate) fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// Splits the path portion of a job URL into job segments and a build
/// selector.
///
/// Only the segment following each `job` marker is a job name; anything else
/// before the build selector (context paths, views) is skipped. The build
/// selector defaults to `lastBuild`. Fails when the path carries no `job`
/// marker or no job segment can be found.
pub(crate) fn decompose_url_path(path: &str, input: &str) -> LensResult<(Vec<String>, BuildRef)> {
    let segments = split_segments(path);
    let (job_path, build_ref) = decompose_marked(&segments);
    finish(job_path, build_ref, input)
}

/// Splits a bare job path (`Folder/app/42`, `Folder/job/app`) into job
/// segments and a build selector. `job` segments act as delimiters only.
pub(crate) fn decompose_bare_path(path: &str, input: &str) -> LensResult<(Vec<String>, BuildRef)> {
    let segments: Vec<&str> = split_segments(path)
        .into_iter()
        .filter(|s| *s != "job")
        .collect();
    let (job_path, build_ref) = decompose_bare(&segments);
    finish(job_path, build_ref, input)
}

fn split_segments(path: &str) -> Vec<&str> {
    strip_query(path)
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn finish(
    job_path: Vec<String>, build_ref: Option<BuildRef>, input: &str,
) -> LensResult<(Vec<String>, BuildRef)> {
    if job_path.is_empty() {
        return Err(LensError::invalid_reference(
            input,
            "could not extract a job name; expected e.g. https://jenkins.example.com/job/Folder/job/my-job/42 or Folder/my-job",
        ));
    }
    Ok((job_path, build_ref.unwrap_or_default()))
}

fn decompose_marked(segments: &[&str]) -> (Vec<String>, Option<BuildRef>) {
    let mut job_path = Vec::new();
    let mut build_ref = None;
    let mut i = 0;

    while i < segments.len() {
        let segment = segments[i];
        if segment == "job" {
            if let Some(name) = segments.get(i + 1) {
                job_path.push(decode_segment(name));
            }
            i += 2;
            continue;
        }
        if !job_path.is_empty() {
            if let Some(parsed) = BuildRef::from_segment(segment) {
                build_ref = Some(parsed);
                break;
            }
        }
        i += 1;
    }

    (job_path, build_ref)
}

fn decompose_bare(segments: &[&str]) -> (Vec<String>, Option<BuildRef>) {
    let mut names: Vec<&str> = segments.to_vec();
    while names
        .last()
        .is_some_and(|last| IGNORED_SEGMENTS.contains(last))
    {
        names.pop();
    }

    let build_ref = match names.split_last() {
        Some((last, rest)) if !rest.is_empty() => BuildRef::from_segment(last),
        _ => None,
    };
    if build_ref.is_some() {
        names.pop();
    }

    (names.into_iter().map(decode_segment).collect(), build_ref)
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Encodes job segments into the `job/a/job/b` form the Jenkins API expects
pub(crate) fn encode_job_path(job_path: &[String]) -> String {
    job_path
        .iter()
        .map(|name| format!("job/{}", urlencoding::encode(name)))
        .collect::<Vec<_>>()
        .join("/")
}
