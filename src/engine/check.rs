//! Advisory impact analysis for a proposed RDN change.

use tracing::{debug, info, instrument, warn};

use super::MigrationEngine;
use crate::directory::DirectoryClient;
use crate::dn;
use crate::report::{MigrationCheck, MigrationMode};

/// How many affected-entry DNs the report shows verbatim.
const PREVIEW_LIMIT: usize = 10;

impl<D: DirectoryClient> MigrationEngine<D> {
    /// Analyze the impact of renaming every `old_rdn` container under
    /// `base_dn` to `new_rdn`.
    ///
    /// Lenient by contract: this never fails and never blocks. Parse errors,
    /// a missing base, and directory failures all degrade to warnings on a
    /// report that is produced unconditionally.
    #[instrument(skip(self))]
    pub async fn check_rdn_change(
        &self,
        old_rdn: &str,
        new_rdn: &str,
        base_dn: &str,
        object_class_filter: Option<&str>,
    ) -> MigrationCheck {
        let mut warnings: Vec<String> = Vec::new();
        let mut entry_dns: Vec<String> = Vec::new();

        match dn::split_rdn(old_rdn) {
            Err(e) => {
                warnings.push(format!("cannot analyze RDN change: {e}"));
            }
            Ok((attribute, value)) => {
                match self.discover_containers(base_dn, attribute, value).await {
                    Err(e) if e.is_not_found() => {
                        // Absent base: the change cannot affect anything.
                        debug!(base_dn = %base_dn, "base DN does not exist; zero impact");
                    }
                    Err(e) => {
                        warn!(error = %e, "container discovery failed during analysis");
                        warnings.push(format!(
                            "directory search under '{base_dn}' failed: {e}"
                        ));
                    }
                    Ok(containers) => {
                        let filter = Self::entry_filter(object_class_filter);
                        for container in &containers {
                            match self.entries_under(container.dn(), &filter).await {
                                Ok(entries) => {
                                    entry_dns.extend(
                                        entries.iter().map(|entry| entry.dn().to_string()),
                                    );
                                }
                                Err(e) if e.is_not_found() => {}
                                Err(e) => {
                                    warnings.push(format!(
                                        "search beneath '{}' failed: {e}",
                                        container.dn()
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }

        let entries_count = entry_dns.len();
        let supports_native_rename = self.config().supports_native_rename();

        let recommended_mode = if entries_count == 0 || supports_native_rename {
            MigrationMode::NativeRename
        } else {
            warnings.push(
                "native rename (ModRDN) is not supported by the server; \
                 copy-then-delete will be used, which is slower but compatible"
                    .to_string(),
            );
            MigrationMode::CopyThenDelete
        };

        if entries_count > 0 && !supports_native_rename {
            warnings.push(format!(
                "{entries_count} entries exist under '{old_rdn}'; proceeding without \
                 migration leaves them invisible at their old location"
            ));
        }

        if entries_count > PREVIEW_LIMIT {
            warnings.push(format!(
                "showing the first {PREVIEW_LIMIT} of {entries_count} affected entries"
            ));
        }
        entry_dns.truncate(PREVIEW_LIMIT);

        info!(
            entries_count,
            supports_native_rename,
            recommended_mode = %recommended_mode,
            "RDN change analysis complete"
        );

        MigrationCheck {
            old_rdn: old_rdn.to_string(),
            new_rdn: new_rdn.to_string(),
            base_dn: base_dn.to_string(),
            entries_count,
            entries_dns: entry_dns,
            supports_native_rename,
            recommended_mode,
            warnings,
            // Advisory only: analysis never vetoes the change.
            blocking: false,
        }
    }
}
