//! Error types for the migration engine.
//!
//! Two layers: [`DirectoryError`] is the contract surface of the directory
//! client (what a search/add/delete can fail with), while [`MigrationError`]
//! covers the structural failures the engine itself can produce (malformed
//! RDNs, un-rewritable DNs) plus anything the directory reported.

use thiserror::Error;

/// Error returned by a directory client operation.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The requested entry or search base does not exist.
    #[error("entry not found: {dn}")]
    NotFound { dn: String },

    /// The directory operation failed (network, server-side, or protocol).
    #[error("directory operation failed: {message}")]
    Operation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DirectoryError {
    /// Create a not-found error for a DN or search base.
    pub fn not_found(dn: impl Into<String>) -> Self {
        DirectoryError::NotFound { dn: dn.into() }
    }

    /// Create an operation error.
    pub fn operation(message: impl Into<String>) -> Self {
        DirectoryError::Operation {
            message: message.into(),
            source: None,
        }
    }

    /// Create an operation error with an underlying source.
    pub fn operation_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        DirectoryError::Operation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Check whether this is a not-found condition.
    ///
    /// Not-found is "nothing to do" at discovery time but a hard failure for
    /// an entry expected to exist mid-migration, so callers branch on it.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DirectoryError::NotFound { .. })
    }
}

/// Result type for directory client operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Error produced by the migration engine.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// An RDN string did not have the `attribute=value` shape.
    #[error("invalid RDN format: '{rdn}' (expected attribute=value)")]
    InvalidRdnFormat { rdn: String },

    /// A DN did not contain the RDN segment that was to be rewritten.
    #[error("RDN '{rdn}' not found in DN '{dn}'")]
    RdnNotFoundInDn { rdn: String, dn: String },

    /// No container object class is known for a naming attribute.
    #[error("no container object class known for naming attribute '{attribute}'")]
    UnknownNamingAttribute { attribute: String },

    /// A directory operation failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl MigrationError {
    /// Create an invalid-RDN error.
    pub fn invalid_rdn(rdn: impl Into<String>) -> Self {
        MigrationError::InvalidRdnFormat { rdn: rdn.into() }
    }

    /// Create an RDN-not-found-in-DN error.
    pub fn rdn_not_in_dn(rdn: impl Into<String>, dn: impl Into<String>) -> Self {
        MigrationError::RdnNotFoundInDn {
            rdn: rdn.into(),
            dn: dn.into(),
        }
    }
}
