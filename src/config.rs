//! Settings and on-disk assets
//!
//! Covers the pieces an export run reads from disk before it starts: the
//! YAML settings file, the token file, and the named GraphQL query
//! documents.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default token file name
pub const SECRET_FILE: &str = "secret";

/// Default directory holding query documents
pub const QUERIES_DIR: &str = "queries";

/// Line format of the token file: `OAUTH_TOKEN: <value>`
static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\t ]*OAUTH_TOKEN[\t ]*:[\t ]*(\S+)").expect("valid pattern"));

/// Run settings, deserializable from a YAML file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// GraphQL endpoint URL
    pub endpoint: String,
    /// File the bearer token is read from
    pub token_file: PathBuf,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retry budget for transient transport failures
    pub max_retries: u32,
    /// Request throttle, requests per second
    pub requests_per_second: u32,
    /// Directory holding the GraphQL query documents
    pub queries_dir: PathBuf,
    /// Directory output files are written to
    pub output_dir: PathBuf,
    /// Cursor store file used for resume
    pub store_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: crate::client::DEFAULT_ENDPOINT.to_string(),
            token_file: PathBuf::from(SECRET_FILE),
            timeout_secs: 30,
            max_retries: 3,
            requests_per_second: 5,
            queries_dir: PathBuf::from(QUERIES_DIR),
            output_dir: PathBuf::from("data"),
            store_file: PathBuf::from(crate::state::DEFAULT_STORE_FILE),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read settings '{}': {e}", path.display())))?;
        let settings: Settings = serde_yaml::from_str(&raw)?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Load from an explicit file, or fall back to defaults when none is
    /// given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

/// Read the bearer token out of the token file.
///
/// The file carries one `OAUTH_TOKEN: <value>` line; anything else in it
/// is ignored.
pub fn load_secret(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|_| Error::MissingToken {
        path: path.display().to_string(),
    })?;
    for line in content.lines() {
        if let Some(captures) = TOKEN_PATTERN.captures(line) {
            return Ok(captures[1].to_string());
        }
    }
    Err(Error::MissingToken {
        path: path.display().to_string(),
    })
}

/// Load a named query document from the queries directory
pub fn load_query(dir: impl AsRef<Path>, name: &str) -> Result<String> {
    let path = dir.as_ref().join(name);
    if !path.exists() {
        return Err(Error::QueryNotFound {
            name: name.to_string(),
        });
    }
    let query = std::fs::read_to_string(&path)?;
    debug!(name, "loaded query document");
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint, crate::client::DEFAULT_ENDPOINT);
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.queries_dir, PathBuf::from("queries"));
    }

    #[test]
    fn test_settings_from_yaml_with_partial_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "endpoint: https://example.com/graphql\nmax_retries: 1\n").unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.endpoint, "https://example.com/graphql");
        assert_eq!(settings.max_retries, 1);
        // unspecified keys keep their defaults
        assert_eq!(settings.timeout_secs, 30);
    }

    #[test]
    fn test_settings_load_without_file_uses_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.max_retries, 3);
    }

    #[test]
    fn test_settings_load_missing_explicit_file_fails() {
        let err = Settings::load(Some(Path::new("/nonexistent/settings.yaml"))).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test_case("OAUTH_TOKEN: ghp_abc123" ; "plain")]
    #[test_case("OAUTH_TOKEN:ghp_abc123" ; "no space")]
    #[test_case("\tOAUTH_TOKEN\t: ghp_abc123" ; "tabs")]
    #[test_case("# comment\nOAUTH_TOKEN: ghp_abc123\n" ; "with other lines")]
    fn test_load_secret_variants(content: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        std::fs::write(&path, content).unwrap();

        assert_eq!(load_secret(&path).unwrap(), "ghp_abc123");
    }

    #[test]
    fn test_load_secret_missing_file() {
        let err = load_secret("/nonexistent/secret").unwrap_err();
        assert!(matches!(err, Error::MissingToken { .. }));
    }

    #[test]
    fn test_load_secret_without_token_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        std::fs::write(&path, "USERNAME: nobody\n").unwrap();

        let err = load_secret(&path).unwrap_err();
        assert!(matches!(err, Error::MissingToken { .. }));
    }

    #[test]
    fn test_load_query() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("commits.graphql"), "query { x }").unwrap();

        assert_eq!(load_query(dir.path(), "commits.graphql").unwrap(), "query { x }");
    }

    #[test]
    fn test_load_query_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_query(dir.path(), "nope.graphql").unwrap_err();
        assert!(matches!(err, Error::QueryNotFound { ref name } if name == "nope.graphql"));
    }
}
