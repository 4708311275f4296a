#![allow(dead_code)]

use anyhow::{Context, Result, ensure};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run a git command inside `repo_path`, ensuring it succeeds.
pub fn git(repo_path: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;

    ensure!(
        output.status.success(),
        "git command failed: git {}\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(output)
}

/// Return the trimmed stdout of a successful git command.
pub fn git_stdout(repo_path: &Path, args: &[&str]) -> Result<String> {
    let output = git(repo_path, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Commit a change to `file` and return the new commit id.
pub fn commit_file(repo_path: &Path, file: &str, contents: &str) -> Result<String> {
    fs::write(repo_path.join(file), contents)?;
    git(repo_path, &["add", file])?;
    git(repo_path, &["commit", "-m", &format!("Update {file}")])?;
    git_stdout(repo_path, &["rev-parse", "HEAD"])
}

/// An upstream working repository plus a scratch directory for mirrors.
pub struct Fixture {
    /// Keeps the temporary tree alive.
    _temp_dir: TempDir,
    /// Non-bare repository playing the role of the remote.
    pub upstream: PathBuf,
    /// Directory mirrors are created in.
    pub cache_dir: PathBuf,
}

impl Fixture {
    /// Remote URL of the upstream repository.
    pub fn remote(&self) -> String {
        self.upstream.to_string_lossy().into_owned()
    }
}

/// Create an upstream repository on `main` with one commit, plus a cache dir.
pub fn create_upstream() -> Result<Fixture> {
    let temp_dir = TempDir::new()?;
    let upstream = temp_dir.path().join("upstream");
    let cache_dir = temp_dir.path().join("cache");
    fs::create_dir_all(&upstream)?;
    fs::create_dir_all(&cache_dir)?;

    git(&upstream, &["init", "-b", "main"])?;
    git(&upstream, &["config", "user.email", "test@example.com"])?;
    git(&upstream, &["config", "user.name", "Test User"])?;
    git(&upstream, &["config", "commit.gpgsign", "false"])?;
    git(&upstream, &["config", "tag.gpgsign", "false"])?;
    commit_file(&upstream, "README.md", "# Test Project")?;

    Ok(Fixture {
        _temp_dir: temp_dir,
        upstream,
        cache_dir,
    })
}
