//! Configuration for tree scanning and artifact resolution

use crate::error::{AuditError, Result};
use crate::taxonomy::{LegacyTaxonomy, DEFAULT_LEGACY_ROOT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public Maven repository used as the last locator tier
pub const DEFAULT_REPOSITORY_URL: &str = "https://repo1.maven.org/maven2/";

/// Relative location of a Gradle module cache inside a Gradle home
const GRADLE_MODULE_CACHE: [&str; 4] = [".gradle", "caches", "modules-2", "files-2.1"];

fn gradle_module_cache(base: &Path) -> PathBuf {
    GRADLE_MODULE_CACHE
        .iter()
        .fold(base.to_path_buf(), |path, component| path.join(component))
}

/// Main configuration for the audit process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Directories, relative to the scanned root, whose subtree is skipped
    pub excluded_dirs: Vec<String>,
    /// Dependency groups that never enter the inventory
    pub excluded_groups: BTreeSet<String>,
    /// Artifact name prefixes owned by the host project; never resolved
    pub host_artifact_prefixes: Vec<String>,
    /// Namespace a source import must start with to be considered
    pub legacy_root: String,
    /// Package prefixes considered legacy
    pub legacy_packages: LegacyTaxonomy,
    /// Where archives are looked for
    pub locator: LocatorConfig,
    /// Network configuration
    pub network: NetworkConfig,
}

/// Local cache locations searched before downloading
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Gradle module cache inside the project checkout.
    /// Defaults to `<project root>/.gradle/caches/modules-2/files-2.1`.
    pub project_cache: Option<PathBuf>,
    /// Gradle module cache in the user's home
    pub gradle_home_cache: Option<PathBuf>,
    /// Maven local repository in the user's home
    pub maven_repository: Option<PathBuf>,
    /// Where downloaded archives are stored. Defaults to `files`.
    pub download_dir: Option<PathBuf>,
}

/// Network configuration for artifact downloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Base URL of the artifact repository
    pub repository_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            excluded_dirs: vec!["modules/third-party".to_string(), "workspaces".to_string()],
            excluded_groups: BTreeSet::from(["com.liferay.portal".to_string()]),
            host_artifact_prefixes: vec!["com.liferay".to_string()],
            legacy_root: DEFAULT_LEGACY_ROOT.to_string(),
            legacy_packages: LegacyTaxonomy::default(),
            locator: LocatorConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

impl NetworkConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LocatorConfig {
    /// Resolve every cache location, filling defaults from the project root
    /// and the user's home directory.
    pub fn resolve(&self, project_root: &Path) -> CacheLocations {
        let home = dirs::home_dir();

        CacheLocations {
            project_cache: self
                .project_cache
                .clone()
                .unwrap_or_else(|| gradle_module_cache(project_root)),
            gradle_home_cache: self
                .gradle_home_cache
                .clone()
                .or_else(|| home.as_deref().map(gradle_module_cache)),
            maven_repository: self
                .maven_repository
                .clone()
                .or_else(|| home.as_ref().map(|h| h.join(".m2").join("repository"))),
            download_dir: self
                .download_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("files")),
        }
    }
}

/// Concrete cache directories used by the locator.
///
/// Home-based tiers are `None` when no home directory can be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocations {
    pub project_cache: PathBuf,
    pub gradle_home_cache: Option<PathBuf>,
    pub maven_repository: Option<PathBuf>,
    pub download_dir: PathBuf,
}

impl AuditConfig {
    /// Create a new builder for AuditConfig
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Load a configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AuditConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make every artifact look clean
    pub fn validate(&self) -> Result<()> {
        if self.legacy_root.trim().is_empty() {
            return Err(AuditError::config("legacy_root must not be empty"));
        }
        if self.legacy_packages.is_empty() {
            return Err(AuditError::config("legacy_packages must not be empty"));
        }
        if self.network.repository_url.trim().is_empty() {
            return Err(AuditError::config("network.repository_url must not be empty"));
        }
        Ok(())
    }
}

/// Builder for AuditConfig
#[derive(Default)]
pub struct AuditConfigBuilder {
    base: Option<AuditConfig>,
    excluded_dirs: Vec<String>,
    excluded_groups: Vec<String>,
    locator: Option<LocatorConfig>,
    network: Option<NetworkConfig>,
    legacy_packages: Option<LegacyTaxonomy>,
}

impl AuditConfigBuilder {
    /// Start from an existing configuration instead of the defaults
    pub fn base(mut self, config: AuditConfig) -> Self {
        self.base = Some(config);
        self
    }

    pub fn exclude_dir(mut self, dir: impl Into<String>) -> Self {
        self.excluded_dirs.push(dir.into());
        self
    }

    pub fn exclude_group(mut self, group: impl Into<String>) -> Self {
        self.excluded_groups.push(group.into());
        self
    }

    pub fn locator(mut self, locator: LocatorConfig) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn network(mut self, network: NetworkConfig) -> Self {
        self.network = Some(network);
        self
    }

    pub fn legacy_packages(mut self, taxonomy: LegacyTaxonomy) -> Self {
        self.legacy_packages = Some(taxonomy);
        self
    }

    pub fn build(self) -> AuditConfig {
        let mut config = self.base.unwrap_or_default();

        config.excluded_dirs.extend(self.excluded_dirs);
        config.excluded_groups.extend(self.excluded_groups);
        if let Some(locator) = self.locator {
            config.locator = locator;
        }
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(taxonomy) = self.legacy_packages {
            config.legacy_packages = taxonomy;
        }

        config
    }
}
