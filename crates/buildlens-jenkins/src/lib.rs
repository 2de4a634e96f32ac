//! Jenkins console-log analysis
//!
//! Turns Jenkins job URLs into build coordinates and reduces raw console
//! output and build metadata into something a reader can act on.
//!
//! # Architecture
//!
//! - `registry` - Configured instances and job URL resolution
//! - `config` - Job URL path decomposition and encoding
//! - `snippets` - Error-focused console log reduction
//! - `git_refs` - Repository, branch and commit discovery in console logs
//! - `mapper` - Build metadata normalization
//! - `client` - HTTP transport against the Jenkins API
//! - `types` - API response types
//!
//! # Example Usage
//!
//! ```no_run
//! use buildlens_api::JenkinsInstance;
//! use buildlens_jenkins::{
//!     extract_snippets,
//!     InstanceRegistry,
//! };
//!
//! let registry = InstanceRegistry::new(
//!     vec![JenkinsInstance::new("https://ci.example.com", "bot", "token", true)],
//!     Some("https://ci.example.com"),
//! )?;
//! let job = registry.resolve("https://ci.example.com/job/app/42/console")?;
//! println!("{job}");
//!
//! let extraction = extract_snippets("ERROR: boom", 250_000, 15);
//! assert!(extraction.is_full());
//! # Ok::<(), buildlens_api::LensError>(())
//! ```

mod client;
mod config;
mod git_refs;
mod mapper;
mod registry;
mod snippets;
mod types;

pub use client::{
    HttpSettings,
    JenkinsClient,
};
pub use git_refs::extract_git_references;
pub use mapper::{
    map_jenkins_result,
    normalize_build_info,
};
pub use registry::InstanceRegistry;
pub use snippets::{
    extract_snippets,
    SnippetExtractor,
    DEFAULT_CONTEXT_LINES,
    DEFAULT_HEAD_TAIL_LINES,
    DEFAULT_MAX_LINE_CHARS,
    DEFAULT_MAX_LOG_SIZE,
};
