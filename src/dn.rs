//! Distinguished Name utilities.
//!
//! Pure string helpers for splitting RDNs, deriving parent/child DNs, and
//! rewriting one RDN segment of a DN for another. All matching is
//! case-insensitive but case-preserving: only the matched RDN text is
//! replaced, every other character of the DN (including the comma
//! delimiters) is carried over untouched.

use crate::error::MigrationError;

/// Split an RDN of the form `attribute=value` into its two parts.
///
/// The string must contain exactly one unescaped `=` with a non-empty
/// attribute name in front of it. Anything else is an
/// [`MigrationError::InvalidRdnFormat`].
pub fn split_rdn(rdn: &str) -> Result<(&str, &str), MigrationError> {
    let mut separators = Vec::new();
    let mut escaped = false;
    for (i, ch) in rdn.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '=' => separators.push(i),
            _ => {}
        }
    }

    match separators.as_slice() {
        [pos] if *pos > 0 => Ok((&rdn[..*pos], &rdn[*pos + 1..])),
        _ => Err(MigrationError::invalid_rdn(rdn)),
    }
}

/// Build the DN of an entry named `attribute=value` directly under `parent_dn`.
#[must_use]
pub fn child_dn(attribute: &str, value: &str, parent_dn: &str) -> String {
    format!("{attribute}={value},{parent_dn}")
}

/// Return the parent portion of a DN: everything after the first unescaped
/// comma. A DN without a comma has no parent within the tree and falls back
/// to `fallback` (typically the deployment's default container DN).
#[must_use]
pub fn parent_dn<'a>(dn: &'a str, fallback: &'a str) -> &'a str {
    match first_unescaped_comma(dn) {
        Some(pos) => &dn[pos + 1..],
        None => fallback,
    }
}

/// Return the leading (most-specific) RDN of a DN.
#[must_use]
pub fn leading_rdn(dn: &str) -> &str {
    match first_unescaped_comma(dn) {
        Some(pos) => &dn[..pos],
        None => dn,
    }
}

fn first_unescaped_comma(dn: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, ch) in dn.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            ',' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Rewrite the `old_rdn` segment of `dn` to `new_rdn`.
///
/// The match is case-insensitive and must be bounded by comma delimiters or
/// the string boundaries on both sides, so `ou=people` can never match inside
/// `ou=peopleArchive`. The first bounded occurrence is replaced; the rest of
/// the DN, including both delimiting commas, is preserved byte for byte.
/// Fails with [`MigrationError::RdnNotFoundInDn`] when no bounded occurrence
/// exists.
pub fn rewrite_rdn_segment(
    dn: &str,
    old_rdn: &str,
    new_rdn: &str,
) -> Result<String, MigrationError> {
    let hay = dn.as_bytes();
    let needle = old_rdn.as_bytes();

    if !needle.is_empty() && needle.len() <= hay.len() {
        for pos in 0..=hay.len() - needle.len() {
            if !hay[pos..pos + needle.len()].eq_ignore_ascii_case(needle) {
                continue;
            }
            // Bounded on both sides by a comma or a string boundary.
            let starts_segment = pos == 0 || hay[pos - 1] == b',';
            let ends_segment =
                pos + needle.len() == hay.len() || hay[pos + needle.len()] == b',';
            if starts_segment && ends_segment {
                return Ok(format!(
                    "{}{}{}",
                    &dn[..pos],
                    new_rdn,
                    &dn[pos + needle.len()..]
                ));
            }
        }
    }

    Err(MigrationError::rdn_not_in_dn(old_rdn, dn))
}
