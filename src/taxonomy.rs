//! The fixed set of package namespaces treated as legacy by the audit

use serde::{Deserialize, Serialize};

/// Root namespace that source imports are checked against before the taxonomy
pub const DEFAULT_LEGACY_ROOT: &str = "javax";

/// Enterprise `javax.*` packages that moved to the `jakarta.*` namespace.
///
/// Each entry covers a package and its subpackages. An entry starting with
/// `!` carves a JDK-owned subpackage back out of a broader entry; the
/// remaining JDK `javax` packages (`javax.crypto`, `javax.naming`,
/// `javax.sql`, ...) are simply not listed.
pub const DEFAULT_LEGACY_PACKAGES: &[&str] = &[
    "!javax.annotation.processing",
    "!javax.transaction.xa",
    "javax.activation",
    "javax.annotation",
    "javax.batch",
    "javax.decorator",
    "javax.ejb",
    "javax.el",
    "javax.enterprise",
    "javax.faces",
    "javax.inject",
    "javax.interceptor",
    "javax.jms",
    "javax.json",
    "javax.jws",
    "javax.mail",
    "javax.persistence",
    "javax.portlet",
    "javax.resource",
    "javax.security.auth.message",
    "javax.security.enterprise",
    "javax.security.jacc",
    "javax.servlet",
    "javax.transaction",
    "javax.validation",
    "javax.websocket",
    "javax.ws.rs",
    "javax.xml.bind",
    "javax.xml.soap",
    "javax.xml.ws",
];

/// Marks a taxonomy entry as an exclusion
const EXCLUSION_MARKER: char = '!';

/// Ordered list of legacy package prefixes plus `!`-marked exclusions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegacyTaxonomy {
    entries: Vec<String>,
}

impl Default for LegacyTaxonomy {
    fn default() -> Self {
        Self::new(DEFAULT_LEGACY_PACKAGES.iter().map(|p| p.to_string()))
    }
}

impl LegacyTaxonomy {
    pub fn new(entries: impl IntoIterator<Item = String>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Legacy prefixes in match order
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(String::as_str)
            .filter(|entry| !entry.starts_with(EXCLUSION_MARKER))
    }

    /// Packages that are never legacy, even under a listed prefix
    pub fn exclusions(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter_map(|entry| entry.strip_prefix(EXCLUSION_MARKER))
    }

    /// True when no entry could ever match
    pub fn is_empty(&self) -> bool {
        self.prefixes().next().is_none()
    }

    /// Return the first prefix that `name` falls under, if any.
    ///
    /// Matching happens on package boundaries, so `javax.el` matches
    /// `javax.el.ELContext`, `javax.el.*` and `javax.el;version=2` but not
    /// `javax.elements`. A name under an exclusion never matches.
    pub fn matching_prefix(&self, name: &str) -> Option<&str> {
        if self
            .exclusions()
            .any(|excluded| is_package_prefix(excluded, name))
        {
            return None;
        }

        self.prefixes().find(|prefix| is_package_prefix(prefix, name))
    }

    pub fn is_legacy(&self, name: &str) -> bool {
        self.matching_prefix(name).is_some()
    }
}

fn is_package_prefix(prefix: &str, name: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) => match rest.chars().next() {
            None => true,
            Some(c) => matches!(c, '.' | ';' | ',' | '*') || c.is_whitespace(),
        },
        None => false,
    }
}
