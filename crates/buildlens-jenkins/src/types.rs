//! API response types for the Jenkins build `api/json` endpoint

use serde::de::DeserializeOwned;
use serde::{
    Deserialize,
    Deserializer,
};

/// Field selection requested from `{build}/api/json`
pub(crate) const BUILD_TREE: &str = "number,result,building,timestamp,duration,url,displayName,fullDisplayName,actions[_class,causes[_class,shortDescription,userId,userName,upstreamProject,upstreamBuild],lastBuiltRevision[SHA1,branch[SHA1,name]]]";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Build {
    #[serde(deserialize_with = "lenient")]
    pub number: i64,
    #[serde(deserialize_with = "lenient")]
    pub url: Option<String>,
    /// Kept raw: `null` means the build is still running, while any other
    /// non-string value is an unrecognized result.
    pub result: serde_json::Value,
    #[serde(deserialize_with = "lenient")]
    pub building: bool,
    #[serde(deserialize_with = "lenient")]
    pub timestamp: i64,
    #[serde(deserialize_with = "lenient")]
    pub duration: i64,
    #[serde(rename = "displayName", deserialize_with = "lenient")]
    pub display_name: Option<String>,
    #[serde(rename = "fullDisplayName", deserialize_with = "lenient")]
    pub full_display_name: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub actions: Vec<BuildAction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BuildAction {
    #[serde(rename = "_class")]
    pub class: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub causes: Vec<BuildCause>,
    #[serde(rename = "lastBuiltRevision")]
    pub last_built_revision: Option<Revision>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BuildCause {
    #[serde(rename = "_class")]
    pub class: Option<String>,
    #[serde(rename = "shortDescription")]
    pub short_description: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
    #[serde(rename = "upstreamProject")]
    pub upstream_project: Option<String>,
    #[serde(rename = "upstreamBuild")]
    pub upstream_build: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Revision {
    #[serde(rename = "SHA1")]
    pub sha1: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub branch: Vec<Branch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Branch {
    #[serde(rename = "SHA1")]
    pub sha1: Option<String>,
    pub name: Option<String>,
}

/// `null` or a value of the wrong type falls back to the field default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Jenkins pads action lists with `{}` and occasionally `null`; entries that
/// do not fit the expected shape are skipped instead of failing the payload.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter(|value| !value.is_null())
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}
