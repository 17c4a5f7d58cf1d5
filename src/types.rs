//! Core data types for the dependency inventory and legacy-API findings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// A (group, artifact, version) triple identifying a dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyCoordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl DependencyCoordinate {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for DependencyCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// Where a coordinate was declared: the configuration kind plus the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaringSite {
    /// `dependency` for properties files, the configuration name for Gradle files
    pub kind: String,
    pub file_path: PathBuf,
}

impl DeclaringSite {
    pub fn new(kind: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            kind: kind.into(),
            file_path: file_path.into(),
        }
    }
}

impl std::fmt::Display for DeclaringSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.kind, self.file_path.display())
    }
}

type VersionSites = BTreeMap<String, Vec<DeclaringSite>>;

/// Grouped inventory: `group -> artifact -> version -> declaring sites`.
///
/// Keys are kept sorted; the site list of each version keeps discovery order
/// and is never deduplicated.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyInventory {
    groups: BTreeMap<String, BTreeMap<String, VersionSites>>,
    #[serde(skip)]
    excluded_groups: BTreeSet<String>,
}

/// One declaring site of one coordinate, borrowed from an inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryRow<'a> {
    pub group: &'a str,
    pub artifact: &'a str,
    pub version: &'a str,
    pub site: &'a DeclaringSite,
}

impl DependencyInventory {
    /// Create an empty inventory that rejects the given groups
    pub fn new(excluded_groups: BTreeSet<String>) -> Self {
        Self {
            groups: BTreeMap::new(),
            excluded_groups,
        }
    }

    /// Record one declaring site for a coordinate.
    ///
    /// Returns `false` (and records nothing) when the group is excluded.
    pub fn populate(&mut self, coordinate: DependencyCoordinate, site: DeclaringSite) -> bool {
        if self.excluded_groups.contains(&coordinate.group) {
            return false;
        }

        self.groups
            .entry(coordinate.group)
            .or_default()
            .entry(coordinate.artifact)
            .or_default()
            .entry(coordinate.version)
            .or_default()
            .push(site);

        true
    }

    pub fn groups(&self) -> &BTreeMap<String, BTreeMap<String, VersionSites>> {
        &self.groups
    }

    /// Number of distinct coordinates
    pub fn len(&self) -> usize {
        self.groups
            .values()
            .flat_map(|artifacts| artifacts.values())
            .map(|versions| versions.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn sites_of(&self, coordinate: &DependencyCoordinate) -> Option<&[DeclaringSite]> {
        self.groups
            .get(&coordinate.group)?
            .get(&coordinate.artifact)?
            .get(&coordinate.version)
            .map(Vec::as_slice)
    }

    /// An artifact is duplicated when more than one distinct version is declared
    pub fn is_duplicated(&self, group: &str, artifact: &str) -> bool {
        self.groups
            .get(group)
            .and_then(|artifacts| artifacts.get(artifact))
            .is_some_and(|versions| versions.len() > 1)
    }

    /// Every declaring site, in sorted group/artifact/version order
    pub fn rows(&self) -> impl Iterator<Item = InventoryRow<'_>> {
        self.groups.iter().flat_map(|(group, artifacts)| {
            artifacts.iter().flat_map(move |(artifact, versions)| {
                versions.iter().flat_map(move |(version, sites)| {
                    sites.iter().map(move |site| InventoryRow {
                        group,
                        artifact,
                        version,
                        site,
                    })
                })
            })
        })
    }

    /// Rows restricted to duplicated artifacts
    pub fn duplicated_rows(&self) -> impl Iterator<Item = InventoryRow<'_>> {
        self.rows()
            .filter(move |row| self.is_duplicated(row.group, row.artifact))
    }

    /// Distinct coordinates in sorted order
    pub fn coordinates(&self) -> Vec<DependencyCoordinate> {
        let mut coordinates = Vec::new();

        for (group, artifacts) in &self.groups {
            for (artifact, versions) in artifacts {
                for version in versions.keys() {
                    coordinates.push(DependencyCoordinate::new(group, artifact, version));
                }
            }
        }

        coordinates
    }
}

/// Which archive of a coordinate is wanted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// The primary binary jar
    Binary,
    /// The companion `-sources` jar
    Sources,
}

impl ArtifactKind {
    pub fn qualifier(&self) -> Option<&'static str> {
        match self {
            Self::Binary => None,
            Self::Sources => Some("sources"),
        }
    }

    /// `<artifact>-<version>[-<qualifier>].jar`
    pub fn file_name(&self, coordinate: &DependencyCoordinate) -> String {
        match self.qualifier() {
            Some(qualifier) => format!(
                "{}-{}-{}.jar",
                coordinate.artifact, coordinate.version, qualifier
            ),
            None => format!("{}-{}.jar", coordinate.artifact, coordinate.version),
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Sources => write!(f, "sources"),
        }
    }
}

/// Result of reading a binary jar's manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestOutcome {
    /// The manifest has no `Import-Package` header; callers should fall back to sources
    NoHeader,
    /// Legacy entries of the header. Empty means the artifact is clean.
    Found(Vec<String>),
}

/// What resolving one coordinate produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "references", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// The artifact belongs to the host project and was not checked
    SkippedHost,
    /// No locator tier produced the primary archive
    Unresolved,
    /// No manifest header and no usable sources archive
    NotInspectable,
    /// The archive was inspected; an empty list means clean
    Inspected(Vec<String>),
}

/// Resolution outcome for one coordinate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub coordinate: DependencyCoordinate,
    pub outcome: ResolutionOutcome,
}

impl ResolutionResult {
    /// Legacy references when the artifact was actually inspected
    pub fn legacy_references(&self) -> Option<&[String]> {
        match &self.outcome {
            ResolutionOutcome::Inspected(references) => Some(references),
            _ => None,
        }
    }

    /// Whether this result belongs in the findings sink
    pub fn is_finding(&self) -> bool {
        self.legacy_references()
            .is_some_and(|references| !references.is_empty())
    }
}

/// Summary of a resolver run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveReport {
    /// Timestamp when the run started
    pub timestamp: DateTime<Utc>,
    pub summary: ResolveSummary,
    /// Coordinates with at least one legacy reference, in processing order
    pub findings: Vec<ResolutionResult>,
}

/// Per-outcome counters of a resolver run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveSummary {
    /// Unique coordinates seen
    pub checked: usize,
    pub skipped_host: usize,
    pub unresolved: usize,
    pub not_inspectable: usize,
    pub clean: usize,
    pub flagged: usize,
}

impl Default for ResolveReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolveReport {
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            summary: ResolveSummary::default(),
            findings: Vec::new(),
        }
    }

    /// Fold one result into the counters
    pub fn record(&mut self, result: ResolutionResult) {
        self.summary.checked += 1;

        match &result.outcome {
            ResolutionOutcome::SkippedHost => self.summary.skipped_host += 1,
            ResolutionOutcome::Unresolved => self.summary.unresolved += 1,
            ResolutionOutcome::NotInspectable => self.summary.not_inspectable += 1,
            ResolutionOutcome::Inspected(references) if references.is_empty() => {
                self.summary.clean += 1
            }
            ResolutionOutcome::Inspected(_) => {
                self.summary.flagged += 1;
                self.findings.push(result);
            }
        }
    }
}
