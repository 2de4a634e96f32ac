use std::collections::BTreeMap;
use std::ffi::OsString;
use std::str::FromStr;

use super::loader::{
    ConfigLoadError,
    ConfigLoadResult,
};
use super::schema::{
    AnalysisConfig,
    HttpConfig,
};

const PREFIX: &str = "JENKINS_";

/// Point-in-time copy of the process environment
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Variables whose name or value is not valid Unicode are left out.
    fn from_os_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        vars.into_iter()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (Ok(key), Err(_)) => {
                    tracing::debug!(var = %key, "skipping non-unicode environment value");
                    None
                }
                _ => None,
            })
            .collect()
    }

    /// Non-blank value of `name`, trimmed
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub(super) fn lookup(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Instance described by `JENKINS_*` variables. `name` is `None` for the
/// unprefixed `JENKINS_URL` set.
#[derive(Debug)]
pub(super) struct EnvInstance {
    pub name: Option<String>,
    pub url: String,
    pub username: String,
    pub api_token: String,
    pub verify_ssl: bool,
}

/// Collects the default instance and every complete `JENKINS_<NAME>_*` set,
/// named instances in name order. Incomplete sets are skipped.
pub(super) fn discover_instances(env: &EnvSnapshot) -> Vec<EnvInstance> {
    let mut found = Vec::new();

    if let Some(instance) = read_instance(env, None) {
        found.push(instance);
    }

    let names: Vec<&str> = env
        .keys()
        .filter_map(|key| key.strip_prefix(PREFIX)?.strip_suffix("_URL"))
        .filter(|name| !name.is_empty())
        .collect();

    for name in names {
        if let Some(instance) = read_instance(env, Some(name)) {
            found.push(instance);
        }
    }

    found
}

fn read_instance(env: &EnvSnapshot, name: Option<&str>) -> Option<EnvInstance> {
    let var = |suffix: &str| match name {
        Some(name) => format!("{PREFIX}{name}_{suffix}"),
        None => format!("{PREFIX}{suffix}"),
    };

    let url = env.get(&var("URL"));
    let username = env.get(&var("USER"));
    let api_token = env.get(&var("API_TOKEN"));

    match (url, username, api_token) {
        (Some(url), Some(username), Some(api_token)) => Some(EnvInstance {
            name: name.map(str::to_string),
            url: url.to_string(),
            username: username.to_string(),
            api_token: api_token.to_string(),
            verify_ssl: env.get(&var("VERIFY_SSL")).is_none_or(parse_flag),
        }),
        (None, None, None) => None,
        _ => {
            tracing::warn!(
                prefix = %var(""),
                has_url = url.is_some(),
                has_user = username.is_some(),
                has_token = api_token.is_some(),
                "skipping incomplete Jenkins instance definition"
            );
            None
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Applies `MAX_LOG_SIZE`, `CONTEXT_WINDOW` and the `HTTP_*` timeouts
pub(super) fn apply_overrides(
    env: &EnvSnapshot, analysis: &mut AnalysisConfig, http: &mut HttpConfig,
) -> ConfigLoadResult<()> {
    if let Some(value) = parse_var(env, "MAX_LOG_SIZE")? {
        analysis.max_log_size = value;
    }
    if let Some(value) = parse_var(env, "CONTEXT_WINDOW")? {
        analysis.context_lines = value;
    }
    if let Some(value) = parse_var(env, "HTTP_TIMEOUT")? {
        http.timeout_secs = value;
    }
    if let Some(value) = parse_var(env, "HTTP_CONNECT_TIMEOUT")? {
        http.connect_timeout_secs = value;
    }
    if let Some(value) = parse_var(env, "HTTP_READ_TIMEOUT")? {
        http.read_timeout_secs = value;
    }
    Ok(())
}

fn parse_var<T: FromStr>(env: &EnvSnapshot, name: &str) -> ConfigLoadResult<Option<T>> {
    env.get(name)
        .map(|raw| {
            raw.parse::<T>().map_err(|_| {
                ConfigLoadError::InvalidConfig(format!("{name} has an invalid value: '{raw}'"))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> EnvSnapshot {
        pairs.iter().copied().collect()
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_variables_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let env = EnvSnapshot::from_os_vars([
            (OsString::from("JENKINS_URL"), OsString::from("https://ci.example.com")),
            (OsString::from("JENKINS_USER"), OsString::from_vec(vec![0x62, 0xff, 0x74])),
            (OsString::from_vec(vec![0xfe, 0x41]), OsString::from("x")),
        ]);

        assert_eq!(env.get("JENKINS_URL"), Some("https://ci.example.com"));
        assert_eq!(env.get("JENKINS_USER"), None);
        assert_eq!(env.keys().count(), 1);
    }

    #[test]
    fn test_default_and_named_instances() {
        let env = snapshot(&[
            ("JENKINS_URL", "https://ci.example.com/"),
            ("JENKINS_USER", "bot"),
            ("JENKINS_API_TOKEN", "t0"),
            ("JENKINS_LEGACY_URL", "https://legacy.example.com"),
            ("JENKINS_LEGACY_USER", "old"),
            ("JENKINS_LEGACY_API_TOKEN", "t1"),
            ("JENKINS_LEGACY_VERIFY_SSL", "false"),
        ]);

        let instances = discover_instances(&env);
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].name, None);
        assert_eq!(instances[0].url, "https://ci.example.com/");
        assert!(instances[0].verify_ssl);
        assert_eq!(instances[1].name.as_deref(), Some("LEGACY"));
        assert_eq!(instances[1].username, "old");
        assert!(!instances[1].verify_ssl);
    }

    #[test]
    fn test_multi_word_instance_name() {
        let env = snapshot(&[
            ("JENKINS_TEAM_A_URL", "https://a.example.com"),
            ("JENKINS_TEAM_A_USER", "a"),
            ("JENKINS_TEAM_A_API_TOKEN", "ta"),
        ]);
        let instances = discover_instances(&env);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name.as_deref(), Some("TEAM_A"));
    }

    #[test]
    fn test_incomplete_instance_is_skipped() {
        let env = snapshot(&[
            ("JENKINS_URL", "https://ci.example.com"),
            ("JENKINS_USER", "bot"),
            ("JENKINS_STAGING_URL", "https://staging.example.com"),
            ("JENKINS_STAGING_API_TOKEN", "t"),
        ]);
        assert!(discover_instances(&env).is_empty());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("off"));
    }

    #[test]
    fn test_overrides() {
        let env = snapshot(&[
            ("MAX_LOG_SIZE", "1000"),
            ("CONTEXT_WINDOW", "3"),
            ("HTTP_READ_TIMEOUT", "7.5"),
        ]);
        let mut analysis = AnalysisConfig::default();
        let mut http = HttpConfig::default();

        apply_overrides(&env, &mut analysis, &mut http).unwrap();

        assert_eq!(analysis.max_log_size, 1000);
        assert_eq!(analysis.context_lines, 3);
        assert_eq!(http.read_timeout_secs, 7.5);
        assert_eq!(http.timeout_secs, 30.0);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let env = snapshot(&[("MAX_LOG_SIZE", "lots")]);
        let result = apply_overrides(
            &env,
            &mut AnalysisConfig::default(),
            &mut HttpConfig::default(),
        );
        assert!(matches!(result, Err(ConfigLoadError::InvalidConfig(_))));
    }
}
