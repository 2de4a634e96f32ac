use secrecy::SecretString;
use serde::Deserialize;

pub(super) const DEFAULT_MAX_LOG_SIZE: usize = buildlens_jenkins::DEFAULT_MAX_LOG_SIZE;

pub(super) const DEFAULT_CONTEXT_LINES: usize = buildlens_jenkins::DEFAULT_CONTEXT_LINES;

pub(super) const DEFAULT_HEAD_TAIL_LINES: usize = buildlens_jenkins::DEFAULT_HEAD_TAIL_LINES;

pub(super) const DEFAULT_MAX_LINE_CHARS: usize = buildlens_jenkins::DEFAULT_MAX_LINE_CHARS;

pub(super) const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

pub(super) const DEFAULT_CONNECT_TIMEOUT_SECS: f64 = 10.0;

pub(super) const DEFAULT_READ_TIMEOUT_SECS: f64 = 120.0;

pub(super) const DEFAULT_MAX_RETRIES: usize = 2;

pub(super) const DEFAULT_RETRY_DELAY_MS: u64 = 50;

/// Contents of `buildlens.toml`
#[derive(Debug, Deserialize, Default)]
pub struct BuildLensConfig {
    #[serde(default)]
    pub instances: Vec<InstanceFileConfig>,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// One `[[instances]]` entry
#[derive(Debug, Deserialize)]
pub struct InstanceFileConfig {
    pub url: String,

    pub username: String,

    pub api_token: SecretString,

    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,

    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_max_log_size")]
    pub max_log_size: usize,

    #[serde(default = "default_context_lines")]
    pub context_lines: usize,

    #[serde(default = "default_head_tail_lines")]
    pub head_tail_lines: usize,

    #[serde(default = "default_max_line_chars")]
    pub max_line_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_log_size: DEFAULT_MAX_LOG_SIZE,
            context_lines: DEFAULT_CONTEXT_LINES,
            head_tail_lines: DEFAULT_HEAD_TAIL_LINES,
            max_line_chars: DEFAULT_MAX_LINE_CHARS,
        }
    }
}

/// Request timeouts in seconds and retry behaviour
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: f64,

    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: f64,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

fn default_verify_ssl() -> bool {
    true
}

fn default_max_log_size() -> usize {
    DEFAULT_MAX_LOG_SIZE
}

fn default_context_lines() -> usize {
    DEFAULT_CONTEXT_LINES
}

fn default_head_tail_lines() -> usize {
    DEFAULT_HEAD_TAIL_LINES
}

fn default_max_line_chars() -> usize {
    DEFAULT_MAX_LINE_CHARS
}

fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> f64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_read_timeout_secs() -> f64 {
    DEFAULT_READ_TIMEOUT_SECS
}

fn default_max_retries() -> usize {
    DEFAULT_MAX_RETRIES
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}
