//! Error snippet extraction from console logs
//!
//! Logs at or below the size threshold are returned whole. Larger logs are
//! reduced to merged context windows around anchor lines, each line prefixed
//! with its 1-based number. A log with no anchor at all yields a head/tail
//! sample instead of nothing.
//!
//! Anchor vocabulary (ASCII case-insensitive substring match):
//! `error`, `exception`, `failed`, `failure`, `traceback`, `fatal`.
//! `BUILD FAILED` is covered by `failed`. In addition, a stack frame line
//! (`\tat com.x.Y(Y.java:1)`, `  File "x.py", line 3`, `Caused by: ...`,
//! `\t... 12 more`) directly following an anchor is itself an anchor, so a
//! long trace keeps its window open until it ends.

use std::borrow::Cow;

use buildlens_api::{
    ErrorSnippet,
    LogExtraction,
};

pub const DEFAULT_MAX_LOG_SIZE: usize = 250_000;
pub const DEFAULT_CONTEXT_LINES: usize = 15;
pub const DEFAULT_HEAD_TAIL_LINES: usize = 50;
pub const DEFAULT_MAX_LINE_CHARS: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnchorRule {
    /// Lowercase keyword found anywhere in the lowercased line
    Keyword(&'static str),
    /// Stack frame continuing an anchored line
    StackFrame,
}

const ANCHOR_RULES: &[AnchorRule] = &[
    AnchorRule::Keyword("error"),
    AnchorRule::Keyword("exception"),
    AnchorRule::Keyword("failed"),
    AnchorRule::Keyword("failure"),
    AnchorRule::Keyword("traceback"),
    AnchorRule::Keyword("fatal"),
    AnchorRule::StackFrame,
];

impl AnchorRule {
    fn matches(self, line: &str, lowered: &str, follows_anchor: bool) -> bool {
        match self {
            AnchorRule::Keyword(keyword) => lowered.contains(keyword),
            AnchorRule::StackFrame => follows_anchor && is_stack_frame(line),
        }
    }
}

fn is_stack_frame(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("Caused by:") {
        return true;
    }
    let indented = trimmed.len() < line.len();
    indented
        && (trimmed.starts_with("at ")
            || trimmed.starts_with("File \"")
            || (trimmed.starts_with("...") && trimmed.trim_end().ends_with(" more")))
}

/// Snippet extraction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetExtractor {
    pub max_size: usize,
    pub context_lines: usize,
    pub head_tail_lines: usize,
    pub max_line_chars: usize,
}

impl Default for SnippetExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOG_SIZE, DEFAULT_CONTEXT_LINES)
    }
}

impl SnippetExtractor {
    pub fn new(max_size: usize, context_lines: usize) -> Self {
        Self {
            max_size,
            context_lines,
            head_tail_lines: DEFAULT_HEAD_TAIL_LINES,
            max_line_chars: DEFAULT_MAX_LINE_CHARS,
        }
    }

    pub fn with_head_tail_lines(mut self, head_tail_lines: usize) -> Self {
        self.head_tail_lines = head_tail_lines.max(1);
        self
    }

    pub fn with_max_line_chars(mut self, max_line_chars: usize) -> Self {
        self.max_line_chars = max_line_chars.max(1);
        self
    }

    pub fn extract<'a>(&self, log: &'a str) -> LogExtraction<'a> {
        if log.len() <= self.max_size {
            return LogExtraction::Full(log);
        }

        let lines: Vec<&str> = log
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        let anchors = find_anchors(&lines);

        if anchors.is_empty() {
            tracing::warn!(
                bytes = log.len(),
                lines = lines.len(),
                "no anchor lines found, returning head/tail sample"
            );
            return LogExtraction::Sample(self.head_tail_sample(&lines));
        }

        let last_line = lines.len() - 1;
        let windows = anchors
            .iter()
            .map(|&i| {
                (
                    i.saturating_sub(self.context_lines),
                    i.saturating_add(self.context_lines).min(last_line),
                )
            })
            .collect();
        let merged = merge_windows(windows);

        tracing::debug!(
            anchors = anchors.len(),
            snippets = merged.len(),
            "extracted error snippets"
        );

        LogExtraction::Snippets(
            merged
                .into_iter()
                .map(|(start, end)| ErrorSnippet {
                    start_line: start + 1,
                    end_line: end + 1,
                    text: self.render(&lines, start..=end),
                })
                .collect(),
        )
    }

    fn head_tail_sample(&self, lines: &[&str]) -> ErrorSnippet {
        let total = lines.len();
        let keep = self.head_tail_lines.max(1);

        let text = if total <= keep.saturating_mul(2) {
            self.render(lines, 0..=total - 1)
        } else {
            let head = self.render(lines, 0..=keep - 1);
            let tail = self.render(lines, total - keep..=total - 1);
            format!(
                "{head}\n... {} lines omitted ...\n{tail}",
                total - 2 * keep
            )
        };

        ErrorSnippet {
            start_line: 1,
            end_line: total,
            text,
        }
    }

    fn render(&self, lines: &[&str], range: std::ops::RangeInclusive<usize>) -> String {
        range
            .map(|i| format!("{}: {}", i + 1, clip_line(lines[i], self.max_line_chars)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Extracts error snippets with the default head/tail sample size
pub fn extract_snippets(log: &str, max_size: usize, context_lines: usize) -> LogExtraction<'_> {
    SnippetExtractor::new(max_size, context_lines).extract(log)
}

/// 0-based indices of anchor lines, ascending
fn find_anchors(lines: &[&str]) -> Vec<usize> {
    let mut anchors = Vec::new();
    let mut previous_anchored = false;

    for (i, line) in lines.iter().enumerate() {
        let lowered = line.to_ascii_lowercase();
        let anchored = ANCHOR_RULES
            .iter()
            .any(|rule| rule.matches(line, &lowered, previous_anchored));
        if anchored {
            anchors.push(i);
        }
        previous_anchored = anchored;
    }

    anchors
}

/// Merges inclusive `(start, end)` windows that overlap or touch
/// (`a.end + 1 >= b.start`). Output is sorted and non-overlapping.
pub(crate) fn merge_windows(mut windows: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    windows.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(windows.len());
    for (start, end) in windows {
        match merged.last_mut() {
            Some(last) if last.1.saturating_add(1) >= start => {
                last.1 = last.1.max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn clip_line(line: &str, max_chars: usize) -> Cow<'_, str> {
    if line.len() <= max_chars {
        return Cow::Borrowed(line);
    }
    let mut end = max_chars;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!(
        "{} [... {} bytes truncated]",
        &line[..end],
        line.len() - end
    ))
}
