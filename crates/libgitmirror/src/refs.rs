use std::fmt;

/// Namespace prefix of local branch refs.
pub const BRANCH_NAMESPACE: &str = "refs/heads/";
/// Namespace prefix of tag refs.
pub const TAG_NAMESPACE: &str = "refs/tags/";

/// Classification of a ref pattern against a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// The pattern is exactly the short name of a branch.
    Branch,
    /// The pattern is exactly the short name of a tag.
    Tag,
    /// The pattern resolves to a commit but names no branch or tag.
    Commit,
    /// The pattern does not resolve.
    Unknown,
}

impl RefKind {
    /// Lowercase label for display and machine-readable output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::Tag => "tag",
            Self::Commit => "commit",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full hexadecimal object id of a commit, as reported by git.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(String);

impl CommitId {
    /// Wrap an id produced by a successful resolution.
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The full id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first `len` characters of the id.
    pub fn short(&self, len: usize) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(len)
            .map_or(self.0.len(), |(idx, _)| idx);
        &self.0[..end]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse `for-each-ref --format %(refname)` output into short names.
///
/// The input holds one full ref name per line. Lines starting with
/// `namespace` contribute the rest of the line; everything else is skipped.
/// Order is preserved.
pub fn parse_ref_list(output: &str, namespace: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim_end_matches('\r').strip_prefix(namespace))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
