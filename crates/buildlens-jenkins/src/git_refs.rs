//! Git repository references recovered from console output
//!
//! The Jenkins git plugin and pipeline `checkout` steps print a handful of
//! recognizable lines while fetching and checking out sources. Each rule below
//! turns one such line into a piece of evidence; pieces that appear close to
//! each other are assembled into a single [`GitReference`].

use std::sync::LazyLock;

use buildlens_api::GitReference;
use indexmap::IndexMap;
use regex::Regex;
use url::Url;

/// Maximum distance, in lines, between two pieces of evidence that still
/// belong to the same repository checkout.
pub const CORRELATION_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    /// Start of a fetch/clone block
    BlockStart,
    /// Repository URL in capture group 1
    Url,
    /// Commit in group 1, branch list in optional group 2
    Revision,
    /// Commit checked out by a `git checkout -f` echo
    Checkout,
}

struct GitRule {
    kind: RuleKind,
    pattern: Regex,
}

impl GitRule {
    fn new(kind: RuleKind, pattern: &str) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern).expect("Invalid git rule pattern"),
        }
    }
}

static GIT_RULES: LazyLock<Vec<GitRule>> = LazyLock::new(|| {
    vec![
        GitRule::new(
            RuleKind::BlockStart,
            r"^\s*(?:Fetching changes from (?:\d+ remote Git repositories|the remote Git repository)|Cloning the remote Git repository)",
        ),
        GitRule::new(RuleKind::Url, r"Fetching upstream changes from\s+(\S+)"),
        GitRule::new(RuleKind::Url, r"Cloning repository\s+(\S+)"),
        GitRule::new(RuleKind::Url, r">\s*git config remote\.\S+\.url\s+(\S+)"),
        GitRule::new(
            RuleKind::Url,
            r">\s*git (?:fetch|clone)\b.*?\s((?:https?|ssh|git|file)://\S+|[\w.-]+@[\w.-]+:\S+)",
        ),
        GitRule::new(
            RuleKind::Revision,
            r"Checking out Revision\s+([0-9a-fA-F]{7,40})\b(?:\s+\(([^)]*)\))?",
        ),
        GitRule::new(
            RuleKind::Checkout,
            r">\s*git checkout\s+-f\s+([0-9a-fA-F]{7,40})\b",
        ),
    ]
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Evidence {
    BlockStart,
    Url(String),
    Commit {
        commit: String,
        branch: Option<String>,
    },
}

fn classify(line: &str) -> Option<Evidence> {
    GIT_RULES.iter().find_map(|rule| {
        let captures = rule.pattern.captures(line)?;
        match rule.kind {
            RuleKind::BlockStart => Some(Evidence::BlockStart),
            RuleKind::Url => {
                let raw = captures.get(1)?.as_str();
                normalize_repo_url(raw).map(Evidence::Url)
            }
            RuleKind::Revision => Some(Evidence::Commit {
                commit: captures.get(1)?.as_str().to_ascii_lowercase(),
                branch: captures
                    .get(2)
                    .and_then(|branches| normalize_branch(branches.as_str())),
            }),
            RuleKind::Checkout => Some(Evidence::Commit {
                commit: captures.get(1)?.as_str().to_ascii_lowercase(),
                branch: None,
            }),
        }
    })
}

#[derive(Debug, Default)]
struct Partial {
    url: Option<String>,
    branch: Option<String>,
    commit: Option<String>,
    last_line: usize,
}

impl Partial {
    fn with_url(url: String, line: usize) -> Self {
        Self {
            url: Some(url),
            last_line: line,
            ..Self::default()
        }
    }

    fn with_commit(commit: String, branch: Option<String>, line: usize) -> Self {
        Self {
            commit: Some(commit),
            branch,
            last_line: line,
            ..Self::default()
        }
    }

    fn accepts_commit(&self, commit: &str) -> bool {
        self.commit.as_deref().is_none_or(|c| c == commit)
    }
}

/// Extracts the git repositories a build checked out, in first-seen order.
///
/// Never fails: lines without recognizable evidence are skipped and a log
/// without any yields an empty list.
pub fn extract_git_references(log: &str) -> Vec<GitReference> {
    let mut assembled = Vec::new();
    let mut current: Option<Partial> = None;

    for (i, line) in log.lines().enumerate() {
        if current
            .as_ref()
            .is_some_and(|p| i - p.last_line > CORRELATION_WINDOW)
        {
            flush(current.take(), &mut assembled);
        }

        let Some(evidence) = classify(line) else {
            continue;
        };

        current = match (current.take(), evidence) {
            (previous, Evidence::BlockStart) => {
                flush(previous, &mut assembled);
                None
            }
            (Some(mut partial), Evidence::Url(url)) if partial.url.is_none() => {
                partial.url = Some(url);
                partial.last_line = i;
                Some(partial)
            }
            (Some(mut partial), Evidence::Url(url))
                if partial.commit.is_none() && partial.url.as_deref() == Some(url.as_str()) =>
            {
                partial.last_line = i;
                Some(partial)
            }
            (previous, Evidence::Url(url)) => {
                flush(previous, &mut assembled);
                Some(Partial::with_url(url, i))
            }
            (Some(mut partial), Evidence::Commit { commit, branch })
                if partial.accepts_commit(&commit) =>
            {
                partial.commit = Some(commit);
                if branch.is_some() {
                    partial.branch = branch;
                }
                partial.last_line = i;
                Some(partial)
            }
            (previous, Evidence::Commit { commit, branch }) => {
                flush(previous, &mut assembled);
                Some(Partial::with_commit(commit, branch, i))
            }
        };
    }
    flush(current, &mut assembled);

    let references = deduplicate(assembled);
    tracing::debug!(count = references.len(), "extracted git references");
    references
}

fn flush(partial: Option<Partial>, out: &mut Vec<GitReference>) {
    let Some(partial) = partial else {
        return;
    };
    match partial.url {
        Some(url) => out.push(GitReference {
            url,
            branch: partial.branch,
            commit: partial.commit,
        }),
        None => tracing::debug!(
            commit = ?partial.commit,
            "dropping checkout with no repository URL nearby"
        ),
    }
}

/// Collapses records sharing (url, branch, commit). URLs that differ only by
/// a trailing `.git` count as equal and keep the longer spelling. A bare URL
/// record is dropped when the same repository also appears with a branch or
/// commit. Order of first appearance is kept.
fn deduplicate(references: Vec<GitReference>) -> Vec<GitReference> {
    let mut unique: IndexMap<(String, Option<String>, Option<String>), GitReference> =
        IndexMap::with_capacity(references.len());

    for reference in references {
        let key = (
            repo_identity(&reference.url).to_string(),
            reference.branch.clone(),
            reference.commit.clone(),
        );
        match unique.get_mut(&key) {
            Some(existing) => {
                if prefers(&reference.url, &existing.url) {
                    existing.url = reference.url;
                }
            }
            None => {
                unique.insert(key, reference);
            }
        }
    }

    let detailed: Vec<String> = unique
        .iter()
        .filter(|(_, r)| r.branch.is_some() || r.commit.is_some())
        .map(|((identity, _, _), _)| identity.clone())
        .collect();

    unique
        .into_iter()
        .filter(|((identity, branch, commit), _)| {
            branch.is_some() || commit.is_some() || !detailed.contains(identity)
        })
        .map(|(_, reference)| reference)
        .collect()
}

fn repo_identity(url: &str) -> &str {
    url.strip_suffix(".git").unwrap_or(url)
}

/// Two URLs with one identity are either equal or differ by `.git`.
fn prefers(candidate: &str, existing: &str) -> bool {
    candidate.len() > existing.len()
}

/// Cleans a captured URL and strips embedded credentials. Returns `None` for
/// remote names and other values that are not repository locations.
pub(crate) fn normalize_repo_url(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim_matches(|c: char| matches!(c, '\'' | '"' | '<' | '>' | ',' | ';' | '(' | ')'))
        .trim_end_matches('/');

    let scp_like = !trimmed.contains("://") && trimmed.contains('@') && trimmed.contains(':');
    if !trimmed.contains("://") && !scp_like {
        return None;
    }

    Some(strip_credentials(trimmed))
}

fn strip_credentials(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    let has_credentials = url.password().is_some()
        || (matches!(url.scheme(), "http" | "https") && !url.username().is_empty());
    if !has_credentials {
        return raw.to_string();
    }

    if url.set_password(None).is_err() || url.set_username("").is_err() {
        return raw.to_string();
    }
    url.to_string()
}

/// Picks the first branch out of the parenthesised list printed after a
/// revision, e.g. `refs/remotes/origin/main, refs/remotes/origin/HEAD`.
pub(crate) fn normalize_branch(raw: &str) -> Option<String> {
    let first = raw.split(',').next()?.trim();

    let branch = if let Some(rest) = first.strip_prefix("refs/remotes/") {
        rest.split_once('/').map(|(_, b)| b).unwrap_or(rest)
    } else if let Some(rest) = first.strip_prefix("refs/heads/") {
        rest
    } else if let Some(rest) = first.strip_prefix("origin/") {
        rest
    } else {
        first
    };

    match branch {
        "" | "detached" | "HEAD" => None,
        b => Some(b.to_string()),
    }
}
