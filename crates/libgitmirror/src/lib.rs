#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Core library for managing local bare mirrors of remote Git repositories.
//!
//! A [`BareRepository`] owns the on-disk location of one mirror. It can clone
//! and refresh the mirror, list its branches and tags, resolve arbitrary ref
//! patterns to commits, and classify a pattern as a branch, tag, or commit.
//! All Git work is delegated to an [`Executor`], which makes the handle
//! testable without a real repository. The CLI binary in `crates/gitmirror`
//! builds on top of this library.

/// Configuration loaded from TOML.
mod config;
/// Error types shared across the crate.
mod error;
/// The command executor seam and its `git` implementation.
mod exec;
/// Ref namespaces, ref-list parsing and classification types.
mod refs;
/// The bare repository handle.
mod repo;

pub use config::{Config, GitSettings};
pub use error::{MirrorError, Result};
pub use exec::{ExecOptions, ExecOutput, Executor, GitExecutor};
pub use refs::{BRANCH_NAMESPACE, CommitId, RefKind, TAG_NAMESPACE, parse_ref_list};
pub use repo::{BareRepository, RefDescription, SyncAction};
