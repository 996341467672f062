// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Rejects empty deployment directories and non-http endpoint URLs.

use hyper::Uri;
use serde::Deserialize;
use std::path::PathBuf;

pub fn deserialize_deploy_dir<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.trim().is_empty() {
        return Err(serde::de::Error::custom("deploy_dir cannot be empty"));
    }
    Ok(PathBuf::from(s))
}

pub fn deserialize_endpoint_url<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let uri = s
        .parse::<Uri>()
        .map_err(|e| serde::de::Error::custom(format!("invalid remote url {}: {}", s, e)))?;
    if uri.scheme_str() != Some("http") || uri.host().is_none() {
        return Err(serde::de::Error::custom(format!(
            "remote url must look like http://host[:port], got {}",
            s
        )));
    }
    Ok(s)
}
