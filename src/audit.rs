//! Main audit orchestration logic

use crate::aggregate::{aggregate, Aggregation};
use crate::config::AuditConfig;
use crate::error::Result;
use crate::inspect::Inspector;
use crate::locator::ArtifactLocator;
use crate::parser::dedup_coordinates;
use crate::types::{
    ArtifactKind, DependencyCoordinate, ManifestOutcome, ResolutionOutcome, ResolutionResult,
    ResolveReport,
};
use std::path::Path;
use tracing::{debug, info, warn};

/// Destination for legacy findings.
///
/// `append` receives one complete record at a time and should persist it
/// before returning, so an interrupted run keeps everything found so far.
pub trait FindingSink {
    fn append(&mut self, result: &ResolutionResult) -> Result<()>;
}

impl FindingSink for Vec<ResolutionResult> {
    fn append(&mut self, result: &ResolutionResult) -> Result<()> {
        self.push(result.clone());
        Ok(())
    }
}

/// Drives the locator and inspector for each coordinate
pub struct LegacyResolver {
    locator: ArtifactLocator,
    inspector: Inspector,
    host_artifact_prefixes: Vec<String>,
}

impl LegacyResolver {
    pub fn new(
        locator: ArtifactLocator,
        inspector: Inspector,
        host_artifact_prefixes: Vec<String>,
    ) -> Self {
        Self {
            locator,
            inspector,
            host_artifact_prefixes,
        }
    }

    /// Build a resolver whose project-local cache lives under `project_root`
    pub fn from_config(config: &AuditConfig, project_root: &Path) -> Result<Self> {
        config.validate()?;

        let locator = ArtifactLocator::new(config.locator.resolve(project_root), &config.network)?;
        let inspector = Inspector::new(config.legacy_packages.clone(), config.legacy_root.clone());

        Ok(Self::new(
            locator,
            inspector,
            config.host_artifact_prefixes.clone(),
        ))
    }

    /// Artifacts published by the host project itself are never inspected
    pub fn is_host_artifact(&self, coordinate: &DependencyCoordinate) -> bool {
        self.host_artifact_prefixes
            .iter()
            .any(|prefix| coordinate.artifact.starts_with(prefix.as_str()))
    }

    /// Resolve and inspect a single coordinate
    pub async fn resolve_one(&self, coordinate: &DependencyCoordinate) -> ResolutionOutcome {
        if self.is_host_artifact(coordinate) {
            debug!("Skipping host artifact {}", coordinate);
            return ResolutionOutcome::SkippedHost;
        }

        let Some(jar) = self.locator.locate(coordinate, ArtifactKind::Binary).await else {
            debug!("No archive found for {}", coordinate);
            return ResolutionOutcome::Unresolved;
        };

        let manifest = match self.inspector.inspect_archive(&jar) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Cannot read manifest of {}: {}", jar.display(), e);
                ManifestOutcome::NoHeader
            }
        };

        match manifest {
            ManifestOutcome::Found(references) => ResolutionOutcome::Inspected(references),
            ManifestOutcome::NoHeader => {
                let Some(sources) = self.locator.locate(coordinate, ArtifactKind::Sources).await
                else {
                    debug!("No manifest header and no sources for {}", coordinate);
                    return ResolutionOutcome::NotInspectable;
                };

                match self.inspector.inspect_source_archive(&sources) {
                    Ok(references) => ResolutionOutcome::Inspected(references),
                    Err(e) => {
                        warn!("Cannot read sources {}: {}", sources.display(), e);
                        ResolutionOutcome::NotInspectable
                    }
                }
            }
        }
    }

    /// Resolve every unique coordinate, appending findings to `sink` as they
    /// are discovered.
    ///
    /// Only a sink failure aborts the run.
    pub async fn resolve<S: FindingSink>(
        &self,
        coordinates: impl IntoIterator<Item = DependencyCoordinate>,
        sink: &mut S,
    ) -> Result<ResolveReport> {
        let mut report = ResolveReport::new();

        for coordinate in dedup_coordinates(coordinates) {
            let outcome = self.resolve_one(&coordinate).await;
            let result = ResolutionResult { coordinate, outcome };

            if result.is_finding() {
                info!("Found legacy references for {}", result.coordinate);
                sink.append(&result)?;
            }

            report.record(result);
        }

        info!(
            "Resolution complete: {} checked, {} flagged, {} clean, {} unresolved, {} not inspectable",
            report.summary.checked,
            report.summary.flagged,
            report.summary.clean,
            report.summary.unresolved,
            report.summary.not_inspectable,
        );

        Ok(report)
    }
}

/// Scan `root` for declarations, then resolve every coordinate found
pub async fn audit_tree<S: FindingSink>(
    root: &Path,
    config: &AuditConfig,
    sink: &mut S,
) -> Result<(Aggregation, ResolveReport)> {
    info!("Starting audit of tree at: {}", root.display());

    let resolver = LegacyResolver::from_config(config, root)?;
    let aggregation = aggregate(root, config)?;
    let report = resolver
        .resolve(aggregation.inventory.coordinates(), sink)
        .await?;

    Ok((aggregation, report))
}
