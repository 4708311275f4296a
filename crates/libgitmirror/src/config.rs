use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, Result};

/// Settings for the git binary used by [`GitExecutor`](crate::GitExecutor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    /// Program name or path of the git binary.
    pub binary: String,
    /// Extra environment variables passed to every git invocation.
    pub env: BTreeMap<String, String>,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            env: BTreeMap::new(),
        }
    }
}

/// Top-level configuration file contents.
///
/// ```toml
/// cache_dir = "/var/cache/gitmirror"
///
/// [git]
/// binary = "/usr/bin/git"
/// env = { GIT_SSH_COMMAND = "ssh -o BatchMode=yes" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding mirrors, when not given on the command line.
    pub cache_dir: Option<PathBuf>,
    /// Git invocation settings.
    pub git: GitSettings,
}

impl Config {
    /// Read and parse the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| MirrorError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(path, &contents)
    }

    /// Like [`Config::load`], but return defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(path, &contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(MirrorError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Parse `contents`, attributing errors to `path`.
    fn parse(path: &Path, contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| MirrorError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempdir().unwrap();
        let config = Config::load_or_default(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.git.binary, "git");
    }

    #[test]
    fn missing_file_is_an_error_for_explicit_load() {
        let tmp = tempdir().unwrap();
        let err = Config::load(&tmp.path().join("config.toml")).unwrap_err();
        assert!(matches!(err, MirrorError::Config { .. }));
    }

    #[test]
    fn parses_full_config() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
cache_dir = "/srv/mirrors"

[git]
binary = "/opt/git/bin/git"
env = { GIT_SSH_COMMAND = "ssh -o BatchMode=yes" }
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.cache_dir, Some(PathBuf::from("/srv/mirrors")));
        assert_eq!(config.git.binary, "/opt/git/bin/git");
        assert_eq!(
            config.git.env.get("GIT_SSH_COMMAND").map(String::as_str),
            Some("ssh -o BatchMode=yes")
        );
    }

    #[test]
    fn partial_config_fills_defaults() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "cache_dir = \"mirrors\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.git, GitSettings::default());
    }

    #[test]
    fn malformed_config_reports_path() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "cache_dir = [").unwrap();

        let err = Config::load_or_default(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
