//! # legacy_api_audit
//!
//! Migration audit for large JVM source trees:
//! - **Dependency inventory**: walk a checkout, read every `build.gradle`,
//!   `build-buildscript.gradle` and `dependencies.properties`, and group the
//!   declared coordinates by group, artifact and version
//! - **Duplicate detection**: artifacts declared with more than one version
//! - **Legacy API detection**: locate each artifact's jar through local caches
//!   or the public repository and report the legacy `javax.*` packages it uses
//!
//! ## Quick Start
//!
//! ```no_run
//! use legacy_api_audit::{audit_tree, AuditConfig, FindingsLog};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = AuditConfig::default();
//! let mut findings = FindingsLog::create(Path::new("legacy.log"))?;
//! let (aggregation, report) = audit_tree(Path::new("."), &config, &mut findings).await?;
//!
//! println!(
//!     "{} coordinates, {} using legacy APIs",
//!     aggregation.inventory.len(),
//!     report.summary.flagged
//! );
//! # Ok(())
//! # }
//! ```

mod aggregate;
mod audit;
mod config;
mod error;
mod inspect;
mod locator;
mod parser;
mod report;
mod taxonomy;
#[cfg(test)]
mod test_support;
mod types;

// Re-export public API
pub use aggregate::{aggregate, walk_tree, Aggregation, FileScan, ScanEvent, TreeWalk};
pub use audit::{audit_tree, FindingSink, LegacyResolver};
pub use config::{AuditConfig, AuditConfigBuilder, CacheLocations, LocatorConfig, NetworkConfig};
pub use error::{AuditError, Result};
pub use inspect::Inspector;
pub use locator::ArtifactLocator;
pub use parser::{
    dedup_coordinates, read_inventory_csv, scan_gradle, scan_properties, ScanRecord, ScannerKind,
};
pub use report::{
    duplicated_inventory_lines, format_finding, full_inventory_lines, write_lines, FindingsLog,
    ScanOutputs, FINDINGS_FILE,
};
pub use taxonomy::LegacyTaxonomy;
pub use types::{
    ArtifactKind, DeclaringSite, DependencyCoordinate, DependencyInventory, ManifestOutcome,
    ResolutionOutcome, ResolutionResult, ResolveReport, ResolveSummary,
};
