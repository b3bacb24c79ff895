//! Report value types returned by the engine.
//!
//! Both reports are designed to be printed or serialized directly: warnings
//! are ordered, human-readable sentences, and every entry failure pairs the
//! DN with its error text so an operator can act on exactly the failed
//! subset.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How entries are relocated during a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationMode {
    /// Delegate to the directory's rename primitive (ModRDN). Preferred:
    /// no intermediate-state window.
    NativeRename,
    /// Read the full entry, re-add it under the new DN, then delete the old
    /// one. Compatible with servers lacking rename, but slower and with a
    /// dual-existence window if the delete fails after the create.
    CopyThenDelete,
    /// Explicit no-op: record a warning and move nothing. Entries remain
    /// reachable only at their old location.
    LeaveOrphaned,
}

impl fmt::Display for MigrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationMode::NativeRename => "native_rename",
            MigrationMode::CopyThenDelete => "copy_then_delete",
            MigrationMode::LeaveOrphaned => "leave_orphaned",
        };
        f.write_str(name)
    }
}

/// Advisory impact report for a proposed RDN change.
///
/// Produced by impact analysis before any data moves. `blocking` is always
/// `false`: the report warns, it never vetoes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationCheck {
    /// The RDN being renamed away from.
    pub old_rdn: String,
    /// The RDN being renamed to.
    pub new_rdn: String,
    /// Base DN the discovery searched under.
    pub base_dn: String,
    /// Total number of affected entries discovered (not capped).
    pub entries_count: usize,
    /// Display preview: the first affected entry DNs, capped at ten.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub entries_dns: Vec<String>,
    /// Whether the server is believed to support native rename.
    pub supports_native_rename: bool,
    /// The migration mode the analysis recommends.
    pub recommended_mode: MigrationMode,
    /// Ordered, human-readable advisories.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
    /// Always `false`: analysis never prevents the change.
    pub blocking: bool,
}

/// One entry that failed to migrate, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedEntry {
    /// DN of the entry at its old location.
    pub dn: String,
    /// Error text for this entry.
    pub error: String,
}

/// Outcome of a migration run.
///
/// Partial success is a first-class outcome: `success` is simply
/// `failed_entries.is_empty()`, and a re-run retries only what is still in
/// place under the old RDN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// True iff zero entries failed.
    pub success: bool,
    /// The mode selected for the run. Native rename can still fall back to
    /// copy-then-delete per entry when the client lacks the primitive.
    pub mode: MigrationMode,
    /// Number of entries migrated.
    pub entries_migrated: usize,
    /// Number of entries that failed.
    pub entries_failed: usize,
    /// Every failure, individually attributable.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failed_entries: Vec<FailedEntry>,
    /// Ordered, human-readable advisories.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

impl MigrationResult {
    /// A successful result that moved nothing.
    #[must_use]
    pub fn noop(mode: MigrationMode, warning: String) -> Self {
        Self {
            success: true,
            mode,
            entries_migrated: 0,
            entries_failed: 0,
            failed_entries: Vec::new(),
            warnings: vec![warning],
        }
    }

    /// A run aborted before any entry was touched.
    #[must_use]
    pub fn aborted(mode: MigrationMode, warning: String) -> Self {
        Self {
            success: false,
            mode,
            entries_migrated: 0,
            entries_failed: 0,
            failed_entries: Vec::new(),
            warnings: vec![warning],
        }
    }
}
