//! TOML configuration files.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Reads the TOML file at `path` and deserializes it into `T`.
pub fn load_toml<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("Could not open {}", path.display()))?;
    parse_toml(&text).with_context(|| format!("Invalid syntax in {}", path.display()))
}

/// Like [`load_toml`], but a file that does not exist yields `T::default()`.
/// A file that exists and fails to parse is still an error.
pub fn load_toml_or_default<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let path = path.as_ref();
    if !path.exists() {
        log::info!("{} not found, using default configuration", path.display());
        return Ok(T::default());
    }
    load_toml(path)
}

pub fn parse_toml<T>(text: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    toml::from_str(text).map_err(anyhow::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppConfig;

    #[test]
    fn missing_file_gives_defaults() {
        let config: AppConfig = load_toml_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn missing_file_is_an_error_for_strict_loading() {
        let err = load_toml::<AppConfig>("definitely/not/here.toml").unwrap_err();
        assert!(format!("{err:#}").contains("here.toml"));
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(parse_toml::<AppConfig>("width = [").is_err());
        assert!(parse_toml::<AppConfig>("width = \"wide\"").is_err());
    }
}
