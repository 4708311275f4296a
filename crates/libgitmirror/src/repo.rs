use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::debug;

use crate::{
    error::{MirrorError, Result},
    exec::{ExecOptions, Executor, GitExecutor},
    refs::{BRANCH_NAMESPACE, CommitId, RefKind, TAG_NAMESPACE, parse_ref_list},
};

/// What [`BareRepository::sync`] did to bring the mirror up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// The mirror did not exist and was cloned.
    Cloned,
    /// The mirror existed and was fetched.
    Fetched,
}

/// Classification of a ref pattern together with the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefDescription {
    /// The pattern as supplied by the caller.
    pub pattern: String,
    /// How the pattern was classified.
    pub kind: RefKind,
    /// The commit the pattern resolves to, absent for [`RefKind::Unknown`].
    pub commit: Option<CommitId>,
}

/// Handle to a bare mirror repository on disk.
///
/// The handle holds only the mirror's path and an executor. Nothing is
/// cached: every query runs git against the current on-disk state, so results
/// always reflect the latest fetch. The handle does no locking; callers that
/// share a mirror must serialize writers themselves.
#[derive(Debug, Clone)]
pub struct BareRepository {
    /// Location of the mirror, fixed at construction.
    path: PathBuf,
    /// Runs the git commands backing every operation.
    executor: Arc<dyn Executor>,
}

impl BareRepository {
    /// Create a handle for `basedir/dirname` backed by the system git binary.
    ///
    /// No I/O happens here; use [`BareRepository::exists`] to check the mirror.
    pub fn new(basedir: impl AsRef<Path>, dirname: impl AsRef<Path>) -> Self {
        Self::with_executor(basedir, dirname, Arc::new(GitExecutor::new()))
    }

    /// Create a handle for `basedir/dirname` that runs git through `executor`.
    pub fn with_executor(
        basedir: impl AsRef<Path>,
        dirname: impl AsRef<Path>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            path: basedir.as_ref().join(dirname),
            executor,
        }
    }

    /// Path of the mirror.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Repository store git operates on. For a bare mirror this is the mirror path.
    pub fn git_dir(&self) -> &Path {
        &self.path
    }

    /// Object store inside the mirror.
    pub fn objects_dir(&self) -> PathBuf {
        self.path.join("objects")
    }

    /// Whether the mirror path currently exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Clone `remote` into the mirror path with `git clone --mirror`.
    ///
    /// The target must not already hold a repository; git's own check makes a
    /// second clone fail with [`MirrorError::CommandFailed`]. `remote` is
    /// always taken as a repository, never as an option.
    pub fn clone_mirror(&self, remote: &str) -> Result<()> {
        let path = self.path_str()?;
        self.executor.execute(
            &["clone", "--mirror", "--", remote, path],
            &ExecOptions::default(),
        )?;
        debug!(%remote, path, "cloned mirror");
        Ok(())
    }

    /// Fetch every remote ref, pruning refs that no longer exist upstream.
    pub fn fetch(&self) -> Result<()> {
        self.executor
            .execute(&["fetch", "--prune"], &self.options())?;
        Ok(())
    }

    /// Clone the mirror if it is missing, otherwise fetch it.
    pub fn sync(&self, remote: &str) -> Result<SyncAction> {
        if self.exists() {
            self.fetch()?;
            Ok(SyncAction::Fetched)
        } else {
            self.clone_mirror(remote)?;
            Ok(SyncAction::Cloned)
        }
    }

    /// Short names of all branches, in the order git lists them.
    pub fn branches(&self) -> Result<Vec<String>> {
        self.list_refs(BRANCH_NAMESPACE)
    }

    /// Short names of all tags, in the order git lists them.
    pub fn tags(&self) -> Result<Vec<String>> {
        self.list_refs(TAG_NAMESPACE)
    }

    /// Resolve `pattern` to the commit it names, peeling annotated tags.
    ///
    /// `pattern` may be anything `git rev-parse` accepts: a branch or tag
    /// name, a full or abbreviated id, or an expression such as `main~2`.
    /// Returns `Ok(None)` when the pattern does not resolve; an error means
    /// git itself could not be run.
    pub fn resolve(&self, pattern: &str) -> Result<Option<CommitId>> {
        let spec = format!("{pattern}^{{commit}}");
        let output = self.executor.execute(
            &["rev-parse", "--verify", "--quiet", &spec],
            &self.options().allow_failure(),
        )?;

        if !output.success {
            debug!(pattern, "pattern did not resolve");
            return Ok(None);
        }

        Ok(output
            .stdout
            .lines()
            .next()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(CommitId::new))
    }

    /// Classify `pattern` as a branch, tag, commit, or unknown.
    ///
    /// Checks run in a fixed order: exact branch name, exact tag name, then
    /// resolution. When a branch and a tag share a name the result is
    /// [`RefKind::Branch`], and no ambiguity is reported.
    pub fn ref_kind(&self, pattern: &str) -> Result<RefKind> {
        Ok(self.classify(pattern)?.0)
    }

    /// Classify `pattern` and resolve the commit it denotes under that classification.
    ///
    /// Branches and tags are resolved through their fully qualified ref, so a
    /// branch that shares its name with a tag reports the branch tip.
    pub fn describe_ref(&self, pattern: &str) -> Result<RefDescription> {
        let (kind, resolved) = self.classify(pattern)?;
        let commit = match kind {
            RefKind::Branch => self.resolve(&format!("{BRANCH_NAMESPACE}{pattern}"))?,
            RefKind::Tag => self.resolve(&format!("{TAG_NAMESPACE}{pattern}"))?,
            RefKind::Commit | RefKind::Unknown => resolved,
        };
        Ok(RefDescription {
            pattern: pattern.to_string(),
            kind,
            commit,
        })
    }

    /// URL of the `origin` remote recorded in the mirror, if any.
    pub fn remote_url(&self) -> Result<Option<String>> {
        let output = self.executor.execute(
            &["config", "--get", "remote.origin.url"],
            &self.options().allow_failure(),
        )?;
        if !output.success || output.stdout.is_empty() {
            return Ok(None);
        }
        Ok(Some(output.stdout))
    }

    /// Priority-ordered classification. The commit is only carried for
    /// [`RefKind::Commit`], where resolution already produced it.
    fn classify(&self, pattern: &str) -> Result<(RefKind, Option<CommitId>)> {
        if self.branches()?.iter().any(|b| b == pattern) {
            return Ok((RefKind::Branch, None));
        }
        if self.tags()?.iter().any(|t| t == pattern) {
            return Ok((RefKind::Tag, None));
        }
        match self.resolve(pattern)? {
            Some(commit) => Ok((RefKind::Commit, Some(commit))),
            None => Ok((RefKind::Unknown, None)),
        }
    }

    /// List refs under `namespace` and strip the prefix.
    fn list_refs(&self, namespace: &str) -> Result<Vec<String>> {
        let pattern = namespace.trim_end_matches('/');
        let output = self.executor.execute(
            &["for-each-ref", pattern, "--format", "%(refname)"],
            &self.options(),
        )?;
        Ok(parse_ref_list(&output.stdout, namespace))
    }

    /// Executor options targeting this mirror.
    fn options(&self) -> ExecOptions {
        ExecOptions::in_git_dir(&self.path)
    }

    /// The mirror path as a string argument.
    fn path_str(&self) -> Result<&str> {
        self.path.to_str().ok_or_else(|| MirrorError::InvalidPath {
            path: self.path.clone(),
        })
    }
}
