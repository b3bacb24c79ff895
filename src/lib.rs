//! # RDN Migration Engine
//!
//! Safely rename or relocate a class of directory containers (for example
//! renaming `ou=people` to `ou=users`) across an entire hierarchical
//! directory store, including containers nested arbitrarily deep under
//! unrelated parents.
//!
//! ## Features
//!
//! - Directory-wide discovery of every container matching the old RDN
//! - Advisory, never-blocking impact analysis with a capped DN preview
//! - Native rename (ModRDN) with transparent copy-then-delete fallback
//! - Per-entry failure isolation: one bad entry never stops the batch
//! - Container auto-creation at the target location
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rdn_migration::{LdapDirectory, LdapSettings, MigrationConfig, MigrationEngine};
//!
//! let directory = Arc::new(LdapDirectory::new(
//!     LdapSettings::new("ldap.example.com", "cn=admin,dc=example,dc=com")
//!         .with_password("secret"),
//! )?);
//! let engine = MigrationEngine::with_config(directory, MigrationConfig::new());
//!
//! // Advisory impact report first; it warns, it never vetoes.
//! let check = engine
//!     .check_rdn_change("ou=people", "ou=users", "dc=example,dc=com", None)
//!     .await;
//! println!("{} entries affected", check.entries_count);
//!
//! // Then the actual migration, auto-selecting the strategy.
//! let result = engine
//!     .migrate_entries("ou=people", "ou=users", "dc=example,dc=com", None, None, true)
//!     .await;
//! assert!(result.success);
//! ```
//!
//! ## Crate Organization
//!
//! - [`dn`] - pure DN/RDN string utilities
//! - [`directory`] - the directory client contract the engine consumes
//! - [`ldap`] - `ldap3`-backed implementation of that contract
//! - [`config`] - engine configuration and capability probing
//! - [`report`] - the impact-check and migration-result value types
//! - [`engine`] - the orchestrator with both entry points
//! - [`error`] - error types

pub mod config;
pub mod directory;
pub mod dn;
pub mod engine;
pub mod error;
pub mod ldap;
pub mod report;

// Re-exports
pub use config::MigrationConfig;
pub use directory::{DirectoryClient, Entry, Filter, SearchScope};
pub use engine::MigrationEngine;
pub use error::{DirectoryError, DirectoryResult, MigrationError};
pub use ldap::{LdapDirectory, LdapSettings};
pub use report::{FailedEntry, MigrationCheck, MigrationMode, MigrationResult};
