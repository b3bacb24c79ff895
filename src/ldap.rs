//! LDAP directory adapter.
//!
//! Implements [`DirectoryClient`] over the `ldap3` async client, including a
//! true native rename via ModRDN. The connection is lazily established and
//! cached; the bind credentials come from [`LdapSettings`].

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::directory::{DirectoryClient, Entry, Filter, SearchScope};
use crate::dn;
use crate::error::{DirectoryError, DirectoryResult};

const RC_NO_SUCH_OBJECT: u32 = 32;
const RC_ALREADY_EXISTS: u32 = 68;

/// Connection settings for the LDAP adapter.
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapSettings {
    /// LDAP server hostname or IP address.
    pub host: String,

    /// LDAP server port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Use STARTTLS upgrade on a plain LDAP connection.
    #[serde(default)]
    pub use_starttls: bool,

    /// Bind DN for authentication.
    pub bind_dn: String,

    /// Bind password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Connection timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub connection_timeout_secs: u64,
}

fn default_ldap_port() -> u16 {
    389
}

fn default_timeout_secs() -> u64 {
    30
}

impl std::fmt::Debug for LdapSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .finish()
    }
}

impl LdapSettings {
    /// Create settings with required fields.
    pub fn new(host: impl Into<String>, bind_dn: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_ldap_port(),
            use_ssl: false,
            use_starttls: false,
            bind_dn: bind_dn.into(),
            bind_password: None,
            connection_timeout_secs: default_timeout_secs(),
        }
    }

    /// Set the bind password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.bind_password = Some(password.into());
        self
    }

    /// Enable SSL (LDAPS).
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = 636;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Set a non-default port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Get the LDAP URL.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    fn validate(&self) -> DirectoryResult<()> {
        if self.host.is_empty() {
            return Err(DirectoryError::operation("invalid settings: host is required"));
        }
        if self.bind_dn.is_empty() {
            return Err(DirectoryError::operation(
                "invalid settings: bind_dn is required",
            ));
        }
        if self.use_ssl && self.use_starttls {
            return Err(DirectoryError::operation(
                "invalid settings: cannot use both SSL and STARTTLS",
            ));
        }
        Ok(())
    }
}

/// Directory client backed by an LDAP server.
pub struct LdapDirectory {
    settings: LdapSettings,

    /// Cached LDAP connection (lazily initialized).
    connection: Arc<RwLock<Option<Ldap>>>,
}

impl LdapDirectory {
    /// Create a new LDAP directory client with the given settings.
    pub fn new(settings: LdapSettings) -> DirectoryResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            connection: Arc::new(RwLock::new(None)),
        })
    }

    /// Get an LDAP connection, creating one if necessary.
    async fn get_connection(&self) -> DirectoryResult<Ldap> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let conn = self.create_connection().await?;

        {
            let mut conn_guard = self.connection.write().await;
            *conn_guard = Some(conn.clone());
        }

        Ok(conn)
    }

    /// Create a new LDAP connection and bind.
    async fn create_connection(&self) -> DirectoryResult<Ldap> {
        let url = self.settings.url();

        debug!(url = %url, "Connecting to LDAP server");

        let conn_settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.settings.connection_timeout_secs))
            .set_starttls(self.settings.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(conn_settings, &url)
            .await
            .map_err(|e| {
                DirectoryError::operation_with_source(
                    format!("failed to connect to LDAP server at {url}"),
                    e,
                )
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let bind_dn = &self.settings.bind_dn;
        let bind_password = self.settings.bind_password.as_deref().unwrap_or("");

        debug!(bind_dn = %bind_dn, "Performing LDAP bind");

        let result = ldap.simple_bind(bind_dn, bind_password).await.map_err(|e| {
            DirectoryError::operation_with_source(format!("LDAP bind failed for {bind_dn}"), e)
        })?;

        if result.rc != 0 {
            return Err(DirectoryError::operation(format!(
                "LDAP bind failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(host = %self.settings.host, "LDAP connection established");

        Ok(ldap)
    }
}

/// Render a typed filter to LDAP filter syntax, escaping embedded values.
#[must_use]
pub fn filter_to_ldap(filter: &Filter) -> String {
    match filter {
        Filter::And { filters } => {
            let inner: Vec<String> = filters.iter().map(filter_to_ldap).collect();
            format!("(&{})", inner.join(""))
        }
        Filter::Or { filters } => {
            let inner: Vec<String> = filters.iter().map(filter_to_ldap).collect();
            format!("(|{})", inner.join(""))
        }
        Filter::Equals { attribute, value } => {
            format!("({}={})", attribute, escape_filter_value(value))
        }
        Filter::Present { attribute } => {
            format!("({attribute}=*)")
        }
    }
}

/// Escape special characters in LDAP filter values (RFC 4515).
#[must_use]
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

fn scope_to_ldap(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

/// Convert an ldap3 search entry to the engine's entry model.
///
/// Binary attributes are not carried: the engine only migrates string-valued
/// attributes.
fn entry_from_search(entry: SearchEntry) -> Entry {
    Entry::from_parts(entry.dn, entry.attrs)
}

#[async_trait]
impl DirectoryClient for LdapDirectory {
    async fn search(
        &self,
        base: &str,
        filter: &Filter,
        attributes: &[&str],
        scope: SearchScope,
    ) -> DirectoryResult<Vec<Entry>> {
        let mut ldap = self.get_connection().await?;
        let ldap_filter = filter_to_ldap(filter);

        debug!(base = %base, filter = %ldap_filter, "Searching LDAP");

        let result = ldap
            .search(base, scope_to_ldap(scope), &ldap_filter, attributes.to_vec())
            .await
            .map_err(|e| DirectoryError::operation_with_source("LDAP search failed", e))?;

        match result.success() {
            Ok((entries, _)) => Ok(entries
                .into_iter()
                .map(SearchEntry::construct)
                .map(entry_from_search)
                .collect()),
            Err(LdapError::LdapResult { result }) if result.rc == RC_NO_SUCH_OBJECT => {
                Err(DirectoryError::not_found(base))
            }
            Err(e) => Err(DirectoryError::operation_with_source(
                "LDAP search failed",
                e,
            )),
        }
    }

    async fn get_by_dn(&self, dn: &str, attributes: &[&str]) -> DirectoryResult<Option<Entry>> {
        match self
            .search(
                dn,
                &Filter::present("objectClass"),
                attributes,
                SearchScope::Base,
            )
            .await
        {
            Ok(entries) => Ok(entries.into_iter().next()),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn add(
        &self,
        dn: &str,
        object_classes: &[String],
        attributes: &HashMap<String, Vec<String>>,
    ) -> DirectoryResult<()> {
        let mut ldap = self.get_connection().await?;

        debug!(dn = %dn, "Creating LDAP entry");

        let mut ldap_attrs: Vec<(String, HashSet<String>)> = Vec::new();
        ldap_attrs.push((
            "objectClass".to_string(),
            object_classes.iter().cloned().collect(),
        ));

        for (name, values) in attributes {
            if name.eq_ignore_ascii_case("dn") || name.eq_ignore_ascii_case("objectClass") {
                continue;
            }
            if !values.is_empty() {
                ldap_attrs.push((name.clone(), values.iter().cloned().collect()));
            }
        }

        let result = ldap.add(dn, ldap_attrs).await.map_err(|e| {
            DirectoryError::operation_with_source(format!("failed to create entry: {dn}"), e)
        })?;

        if result.rc == RC_ALREADY_EXISTS {
            return Err(DirectoryError::operation(format!(
                "entry already exists: {dn}"
            )));
        }
        if result.rc != 0 {
            return Err(DirectoryError::operation(format!(
                "LDAP add failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(dn = %dn, "LDAP entry created");
        Ok(())
    }

    async fn delete(&self, dn: &str) -> DirectoryResult<()> {
        let mut ldap = self.get_connection().await?;

        debug!(dn = %dn, "Deleting LDAP entry");

        let result = ldap.delete(dn).await.map_err(|e| {
            DirectoryError::operation_with_source(format!("failed to delete entry: {dn}"), e)
        })?;

        if result.rc == RC_NO_SUCH_OBJECT {
            return Err(DirectoryError::not_found(dn));
        }
        if result.rc != 0 {
            return Err(DirectoryError::operation(format!(
                "LDAP delete failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(dn = %dn, "LDAP entry deleted");
        Ok(())
    }

    async fn rename(&self, dn: &str, new_dn: &str) -> DirectoryResult<()> {
        let mut ldap = self.get_connection().await?;

        let new_rdn = dn::leading_rdn(new_dn);
        let new_parent = dn::parent_dn(new_dn, "");
        let new_superior = (!new_parent.is_empty()).then_some(new_parent);

        debug!(dn = %dn, new_dn = %new_dn, "Renaming LDAP entry (ModRDN)");

        let result = ldap
            .modifydn(dn, new_rdn, true, new_superior)
            .await
            .map_err(|e| {
                DirectoryError::operation_with_source(format!("failed to rename entry: {dn}"), e)
            })?;

        if result.rc == RC_NO_SUCH_OBJECT {
            return Err(DirectoryError::not_found(dn));
        }
        if result.rc != 0 {
            return Err(DirectoryError::operation(format!(
                "LDAP rename failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(dn = %dn, new_dn = %new_dn, "LDAP entry renamed");
        Ok(())
    }

    fn supports_native_rename(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for LdapDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapDirectory")
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_builder() {
        let settings = LdapSettings::new("ldap.example.com", "cn=admin,dc=example,dc=com")
            .with_password("secret");

        assert_eq!(settings.host, "ldap.example.com");
        assert_eq!(settings.port, 389);
        assert_eq!(settings.bind_password, Some("secret".to_string()));
        assert_eq!(settings.url(), "ldap://ldap.example.com:389");
    }

    #[test]
    fn test_settings_ssl() {
        let settings = LdapSettings::new("ldap.example.com", "cn=admin").with_ssl();
        assert!(settings.use_ssl);
        assert_eq!(settings.port, 636);
        assert_eq!(settings.url(), "ldaps://ldap.example.com:636");
    }

    #[test]
    fn test_settings_validation() {
        assert!(LdapDirectory::new(LdapSettings::new("", "cn=admin")).is_err());
        assert!(LdapDirectory::new(LdapSettings::new("ldap.example.com", "")).is_err());

        let mut both = LdapSettings::new("ldap.example.com", "cn=admin").with_ssl();
        both.use_starttls = true;
        assert!(LdapDirectory::new(both).is_err());

        assert!(LdapDirectory::new(LdapSettings::new("ldap.example.com", "cn=admin")).is_ok());
    }

    #[test]
    fn test_settings_debug_redacts_password() {
        let settings = LdapSettings::new("ldap.example.com", "cn=admin").with_password("secret");
        let debug = format!("{settings:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("***REDACTED***"));
    }

    #[test]
    fn test_filter_to_ldap_equals() {
        let filter = Filter::eq("ou", "people");
        assert_eq!(filter_to_ldap(&filter), "(ou=people)");
    }

    #[test]
    fn test_filter_to_ldap_container_discovery() {
        let filter = Filter::and(vec![
            Filter::or(vec![
                Filter::eq("objectClass", "organizationalUnit"),
                Filter::eq("objectClass", "container"),
            ]),
            Filter::eq("ou", "people"),
        ]);
        assert_eq!(
            filter_to_ldap(&filter),
            "(&(|(objectClass=organizationalUnit)(objectClass=container))(ou=people))"
        );
    }

    #[test]
    fn test_filter_to_ldap_present() {
        assert_eq!(filter_to_ldap(&Filter::present("objectClass")), "(objectClass=*)");
    }

    #[test]
    fn test_filter_escapes_values() {
        let filter = Filter::eq("ou", "peo(ple)*");
        assert_eq!(filter_to_ldap(&filter), "(ou=peo\\28ple\\29\\2a)");
    }

    #[test]
    fn test_escape_filter_value() {
        assert_eq!(escape_filter_value("people"), "people");
        assert_eq!(escape_filter_value("a*b"), "a\\2ab");
        assert_eq!(escape_filter_value("(admin)"), "\\28admin\\29");
        assert_eq!(escape_filter_value("a\\b"), "a\\5cb");
        assert_eq!(escape_filter_value("a\0b"), "a\\00b");
    }

    #[test]
    fn test_scope_mapping() {
        assert!(matches!(scope_to_ldap(SearchScope::Base), Scope::Base));
        assert!(matches!(scope_to_ldap(SearchScope::OneLevel), Scope::OneLevel));
        assert!(matches!(scope_to_ldap(SearchScope::Subtree), Scope::Subtree));
    }
}
