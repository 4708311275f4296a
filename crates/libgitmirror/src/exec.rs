use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tracing::{debug, warn};

use crate::{
    config::GitSettings,
    error::{MirrorError, Result},
};

/// Options controlling a single command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOptions {
    /// Repository store the command operates on, passed as `--git-dir`.
    pub git_dir: Option<PathBuf>,
    /// When `false`, a non-zero exit is reported through
    /// [`ExecOutput::success`] instead of as an error.
    pub raise_on_failure: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            git_dir: None,
            raise_on_failure: true,
        }
    }
}

impl ExecOptions {
    /// Options that target the repository store at `git_dir` and raise on failure.
    pub fn in_git_dir(git_dir: &Path) -> Self {
        Self {
            git_dir: Some(git_dir.to_path_buf()),
            raise_on_failure: true,
        }
    }

    /// Report non-zero exits through the output rather than as an error.
    pub fn allow_failure(mut self) -> Self {
        self.raise_on_failure = false;
        self
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Whether the command exited with status zero.
    pub success: bool,
    /// Exit status code, absent when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Standard output with trailing whitespace removed.
    pub stdout: String,
    /// Standard error, trimmed.
    pub stderr: String,
}

/// Runs git sub-commands on behalf of a repository handle.
///
/// Implementations must report a launch failure as [`MirrorError::Spawn`]
/// regardless of [`ExecOptions::raise_on_failure`], so callers can always tell
/// a broken tool apart from a command that simply exited non-zero.
pub trait Executor: Debug + Send + Sync {
    /// Run `git <args>` with the given options.
    fn execute(&self, args: &[&str], options: &ExecOptions) -> Result<ExecOutput>;
}

/// Executor that shells out to the system `git` binary.
#[derive(Debug, Clone)]
pub struct GitExecutor {
    /// Program name or path of the git binary.
    binary: String,
    /// Extra environment variables applied to every command.
    env: Vec<(String, String)>,
}

impl Default for GitExecutor {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            env: Vec::new(),
        }
    }
}

impl GitExecutor {
    /// Create an executor using `git` from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor from configured git settings.
    pub fn from_settings(settings: &GitSettings) -> Self {
        Self {
            binary: settings.binary.clone(),
            env: settings
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Render the command line for logs and error messages.
    fn command_line(&self, args: &[&str], options: &ExecOptions) -> String {
        let mut parts = vec![self.binary.clone()];
        if let Some(git_dir) = &options.git_dir {
            parts.push("--git-dir".to_string());
            parts.push(git_dir.display().to_string());
        }
        parts.extend(args.iter().map(|a| (*a).to_string()));
        parts.join(" ")
    }
}

impl Executor for GitExecutor {
    fn execute(&self, args: &[&str], options: &ExecOptions) -> Result<ExecOutput> {
        let command = self.command_line(args, options);

        let mut cmd = Command::new(&self.binary);
        if let Some(git_dir) = &options.git_dir {
            cmd.arg("--git-dir").arg(git_dir);
        }
        cmd.args(args);

        // Never let git block on a credential prompt.
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!(%command, "spawning git");

        let output = cmd.output().map_err(|source| MirrorError::Spawn {
            command: command.clone(),
            source,
        })?;

        let result = ExecOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout)
                .trim_end()
                .to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        debug!(%command, code = ?result.code, "git exited");

        if !result.success && options.raise_on_failure {
            warn!(%command, code = ?result.code, stderr = %result.stderr, "git command failed");
            return Err(MirrorError::CommandFailed {
                command,
                code: result.code,
                stderr: result.stderr,
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn command_line_includes_git_dir() {
        let exec = GitExecutor::new();
        let options = ExecOptions::in_git_dir(Path::new("/tmp/cache/repo"));
        assert_eq!(
            exec.command_line(&["fetch", "--prune"], &options),
            "git --git-dir /tmp/cache/repo fetch --prune"
        );
    }

    #[test]
    fn default_options_raise_on_failure() {
        let options = ExecOptions::default();
        assert!(options.raise_on_failure);
        assert!(options.git_dir.is_none());
        assert!(!options.allow_failure().raise_on_failure);
    }

    #[test]
    fn successful_command_captures_stdout() -> anyhow::Result<()> {
        let exec = GitExecutor::new();
        let output = exec.execute(&["--version"], &ExecOptions::default())?;
        assert!(output.success);
        assert_eq!(output.code, Some(0));
        assert!(output.stdout.starts_with("git version"));
        assert!(!output.stdout.ends_with('\n'));
        Ok(())
    }

    #[test]
    fn failure_raises_by_default() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let exec = GitExecutor::new();
        let options = ExecOptions::in_git_dir(&temp.path().join("missing"));

        let result = exec.execute(&["rev-parse", "HEAD"], &options);
        assert!(matches!(result, Err(MirrorError::CommandFailed { .. })));
        Ok(())
    }

    #[test]
    fn failure_is_reported_when_not_raising() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let exec = GitExecutor::new();
        let options = ExecOptions::in_git_dir(&temp.path().join("missing")).allow_failure();

        let output = exec.execute(&["rev-parse", "HEAD"], &options)?;
        assert!(!output.success);
        assert_ne!(output.code, Some(0));
        assert!(!output.stderr.is_empty());
        Ok(())
    }

    #[test]
    fn missing_binary_is_a_spawn_error_even_when_not_raising() {
        let settings = GitSettings {
            binary: "gitmirror-no-such-git-binary".to_string(),
            env: BTreeMap::new(),
        };
        let exec = GitExecutor::from_settings(&settings);
        let options = ExecOptions::default().allow_failure();

        let result = exec.execute(&["--version"], &options);
        assert!(matches!(result, Err(MirrorError::Spawn { .. })));
    }

    #[test]
    fn configured_environment_reaches_git() -> anyhow::Result<()> {
        let mut env = BTreeMap::new();
        env.insert(
            "GIT_CONFIG_PARAMETERS".to_string(),
            "'gitmirror.marker=yes'".to_string(),
        );
        let settings = GitSettings {
            binary: "git".to_string(),
            env,
        };
        let exec = GitExecutor::from_settings(&settings);

        let output = exec.execute(&["config", "--get", "gitmirror.marker"], &ExecOptions::default())?;
        assert_eq!(output.stdout, "yes");
        Ok(())
    }
}
