use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterpolationError {
    #[error("Required environment variable not found: {0}")]
    RequiredVarNotFound(String),
}

pub type InterpolationResult<T> = Result<T, InterpolationError>;

static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex pattern")
});

/// Replaces `${VAR}` and `${VAR:-default}` using `lookup`. Substituted
/// values are inserted verbatim and never re-expanded.
pub fn interpolate_with(
    input: &str, lookup: &dyn Fn(&str) -> Option<String>,
) -> InterpolationResult<String> {
    let mut output = String::with_capacity(input.len());
    let mut last = 0;

    for captures in VAR_PATTERN.captures_iter(input) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };

        output.push_str(&input[last..whole.start()]);
        match lookup(name.as_str()) {
            Some(value) => output.push_str(&value),
            None => match captures.get(2) {
                Some(default) => output.push_str(default.as_str()),
                None => {
                    return Err(InterpolationError::RequiredVarNotFound(
                        name.as_str().to_string(),
                    ))
                }
            },
        }
        last = whole.end();
    }

    output.push_str(&input[last..]);
    Ok(output)
}

/// Interpolates every string in a TOML document in place
pub fn interpolate_toml(
    value: &mut toml::Value, lookup: &dyn Fn(&str) -> Option<String>,
) -> InterpolationResult<()> {
    match value {
        toml::Value::String(s) => {
            *s = interpolate_with(s, lookup)?;
        }
        toml::Value::Array(arr) => {
            for item in arr {
                interpolate_toml(item, lookup)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                interpolate_toml(v, lookup)?;
            }
        }
        _ => {}
    }
    Ok(())
}
