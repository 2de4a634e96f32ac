use std::path::{
    Path,
    PathBuf,
};
use std::time::Duration;

use buildlens_api::{
    JenkinsInstance,
    RetryPolicy,
};
use buildlens_jenkins::{
    HttpSettings,
    InstanceRegistry,
    SnippetExtractor,
};
use secrecy::ExposeSecret;
use thiserror::Error;

use super::env::{
    apply_overrides,
    discover_instances,
    EnvSnapshot,
};
use super::interpolation::{
    interpolate_toml,
    InterpolationError,
};
use super::schema::{
    AnalysisConfig,
    BuildLensConfig,
    HttpConfig,
};

pub const CONFIG_PATH_VAR: &str = "BUILDLENS_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Environment variable interpolation failed: {0}")]
    InterpolationError(#[from] InterpolationError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ConfigLoadResult<T> = Result<T, ConfigLoadError>;

/// Everything the application needs at runtime, merged from the config file
/// and the environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub registry: InstanceRegistry,
    pub analysis: AnalysisConfig,
    pub http: HttpSettings,
}

impl Settings {
    pub fn extractor(&self) -> SnippetExtractor {
        SnippetExtractor::new(self.analysis.max_log_size, self.analysis.context_lines)
            .with_head_tail_lines(self.analysis.head_tail_lines)
            .with_max_line_chars(self.analysis.max_line_chars)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// `BUILDLENS_CONFIG_PATH` when set, otherwise the first existing file
    /// among the platform config dir and `./buildlens.toml`
    pub fn discover_config_path(env: &EnvSnapshot) -> Option<PathBuf> {
        if let Some(path) = env.get(CONFIG_PATH_VAR) {
            tracing::debug!("Using config path from {}: {}", CONFIG_PATH_VAR, path);
            return Some(PathBuf::from(path));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("buildlens").join("config.toml");
            if path.exists() {
                tracing::debug!("Using user config path: {}", path.display());
                return Some(path);
            }
        }

        let local = PathBuf::from("buildlens.toml");
        if local.exists() {
            tracing::debug!("Using local config path: {}", local.display());
            return Some(local);
        }

        tracing::debug!("No config file found, using environment only");
        None
    }

    /// Loads settings from `explicit_path` (which must exist) or the
    /// discovered config file, then layers the process environment on top
    pub fn load_settings(explicit_path: Option<&Path>) -> ConfigLoadResult<Settings> {
        let env = EnvSnapshot::capture();
        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| Self::discover_config_path(&env));
        Self::load_settings_from(path.as_deref(), &env)
    }

    pub fn load_settings_from(path: Option<&Path>, env: &EnvSnapshot) -> ConfigLoadResult<Settings> {
        let config = match path {
            Some(path) => Self::load(path, env)?,
            None => BuildLensConfig::default(),
        };
        Self::resolve(config, env)
    }

    pub fn load(path: &Path, env: &EnvSnapshot) -> ConfigLoadResult<BuildLensConfig> {
        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, env)
    }

    pub fn parse(content: &str, env: &EnvSnapshot) -> ConfigLoadResult<BuildLensConfig> {
        let mut value: toml::Value = toml::from_str(content)?;

        interpolate_toml(&mut value, &|name| env.lookup(name))?;

        let config: BuildLensConfig = value.try_into().map_err(|e| {
            ConfigLoadError::InvalidConfig(format!("Failed to deserialize config: {}", e))
        })?;

        tracing::debug!(instances = config.instances.len(), "Loaded config");

        Ok(config)
    }

    /// Merges file instances with environment-defined ones, applies
    /// environment overrides and validates the result
    pub fn resolve(config: BuildLensConfig, env: &EnvSnapshot) -> ConfigLoadResult<Settings> {
        let BuildLensConfig {
            instances: file_instances,
            mut analysis,
            mut http,
        } = config;

        let mut instances: Vec<JenkinsInstance> = Vec::new();
        let mut file_default: Option<String> = None;

        for entry in file_instances {
            validate_url(&entry.url)?;
            let instance = JenkinsInstance::new(
                &entry.url,
                entry.username,
                entry.api_token.expose_secret(),
                entry.verify_ssl,
            );
            if instances.iter().any(|i| i.base_url() == instance.base_url()) {
                return Err(ConfigLoadError::InvalidConfig(format!(
                    "Jenkins instance {} is configured more than once",
                    instance.base_url()
                )));
            }
            if entry.default {
                if let Some(previous) = &file_default {
                    return Err(ConfigLoadError::InvalidConfig(format!(
                        "Only one instance may be the default, found {} and {}",
                        previous,
                        instance.base_url()
                    )));
                }
                file_default = Some(instance.base_url().to_string());
            }
            instances.push(instance);
        }

        let mut env_default: Option<String> = None;
        for found in discover_instances(env) {
            validate_url(&found.url)?;
            let instance =
                JenkinsInstance::new(&found.url, found.username, found.api_token, found.verify_ssl);
            if instances.iter().any(|i| i.base_url() == instance.base_url()) {
                tracing::warn!(
                    instance = instance.base_url(),
                    "environment instance duplicates a configured one, skipping"
                );
                continue;
            }
            if found.name.is_none() {
                env_default = Some(instance.base_url().to_string());
            }
            instances.push(instance);
        }

        let default = file_default.or(env_default).or_else(|| match instances.as_slice() {
            [only] => Some(only.base_url().to_string()),
            _ => None,
        });

        apply_overrides(env, &mut analysis, &mut http)?;

        let registry = InstanceRegistry::new(instances, default.as_deref())
            .map_err(|e| ConfigLoadError::InvalidConfig(e.to_string()))?;

        if registry.is_empty() {
            tracing::warn!("No Jenkins instances configured");
        } else {
            tracing::info!(
                instances = registry.len(),
                default = registry.default_instance().map(|i| i.base_url()),
                "Jenkins instances configured"
            );
        }

        Ok(Settings {
            registry,
            analysis,
            http: http_settings(&http)?,
        })
    }
}

fn validate_url(raw: &str) -> ConfigLoadResult<()> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| ConfigLoadError::InvalidConfig(format!("Invalid Jenkins URL '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigLoadError::InvalidConfig(format!(
            "Jenkins URL '{raw}' must use http or https"
        )));
    }
    Ok(())
}

fn http_settings(http: &HttpConfig) -> ConfigLoadResult<HttpSettings> {
    let seconds = |name: &str, value: f64| {
        Duration::try_from_secs_f64(value).map_err(|_| {
            ConfigLoadError::InvalidConfig(format!("{name} must be a non-negative number of seconds"))
        })
    };

    Ok(HttpSettings {
        timeout: seconds("timeout_secs", http.timeout_secs)?,
        connect_timeout: seconds("connect_timeout_secs", http.connect_timeout_secs)?,
        read_timeout: seconds("read_timeout_secs", http.read_timeout_secs)?,
        retry: RetryPolicy::new(
            http.max_retries,
            Duration::from_millis(http.retry_delay_ms),
            true,
        ),
    })
}
