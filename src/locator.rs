//! Tiered lookup of dependency archives: local caches first, then the network

use crate::config::{CacheLocations, NetworkConfig};
use crate::error::{AuditError, Result};
use crate::types::{ArtifactKind, DependencyCoordinate};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Finds the jar for a coordinate.
///
/// Order, first hit wins:
/// 1. project Gradle cache (recursive search)
/// 2. user Gradle cache (recursive search)
/// 3. user Maven repository (direct path)
/// 4. download from the remote repository into the download directory
pub struct ArtifactLocator {
    locations: CacheLocations,
    repository_url: String,
    client: Client,
}

impl ArtifactLocator {
    pub fn new(locations: CacheLocations, network: &NetworkConfig) -> Result<Self> {
        Ok(Self {
            locations,
            repository_url: network.repository_url.clone(),
            client: build_client(network)?,
        })
    }

    /// Locate an archive, returning `None` once every tier came up empty
    pub async fn locate(
        &self,
        coordinate: &DependencyCoordinate,
        kind: ArtifactKind,
    ) -> Option<PathBuf> {
        if let Some(path) = self.find_local(coordinate, kind) {
            return Some(path);
        }

        match self.download(coordinate, kind).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Download of {} ({}) failed: {}", coordinate, kind, e);
                None
            }
        }
    }

    /// The three local tiers, without touching the network
    pub fn find_local(
        &self,
        coordinate: &DependencyCoordinate,
        kind: ArtifactKind,
    ) -> Option<PathBuf> {
        let found = find_in_gradle_cache(&self.locations.project_cache, coordinate, kind)
            .or_else(|| {
                self.locations
                    .gradle_home_cache
                    .as_deref()
                    .and_then(|cache| find_in_gradle_cache(cache, coordinate, kind))
            })
            .or_else(|| {
                self.locations
                    .maven_repository
                    .as_deref()
                    .and_then(|repository| find_in_maven_repository(repository, coordinate, kind))
            });

        if let Some(path) = &found {
            debug!("Found {} ({}) at {}", coordinate, kind, path.display());
        }

        found
    }

    /// Remote URL of an archive
    pub fn artifact_url(&self, coordinate: &DependencyCoordinate, kind: ArtifactKind) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.repository_url.trim_end_matches('/'),
            coordinate.group.replace('.', "/"),
            coordinate.artifact,
            coordinate.version,
            kind.file_name(coordinate)
        )
    }

    /// Fetch an archive into the download directory.
    ///
    /// A file left by an earlier run is returned without a request.
    pub async fn download(
        &self,
        coordinate: &DependencyCoordinate,
        kind: ArtifactKind,
    ) -> Result<PathBuf> {
        let file_name = kind.file_name(coordinate);
        let target = self.locations.download_dir.join(&file_name);

        if target.is_file() {
            debug!("Using previously downloaded {}", target.display());
            return Ok(target);
        }

        let url = self.artifact_url(coordinate, kind);
        info!("Downloading from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AuditError::DownloadFailed {
                url,
                status: response.status().as_u16(),
            });
        }

        tokio::fs::create_dir_all(&self.locations.download_dir).await?;
        let partial = self
            .locations
            .download_dir
            .join(format!("{}.part", file_name));

        if let Err(e) = stream_to_file(response, &partial).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        tokio::fs::rename(&partial, &target).await?;

        Ok(target)
    }
}

async fn stream_to_file(mut response: reqwest::Response, path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(())
}

/// Search `<cache>/<group>/<artifact>/<version>` recursively for the archive.
///
/// Gradle stores each file under a content-hash directory, hence the walk.
pub fn find_in_gradle_cache(
    cache: &Path,
    coordinate: &DependencyCoordinate,
    kind: ArtifactKind,
) -> Option<PathBuf> {
    let version_dir = cache
        .join(&coordinate.group)
        .join(&coordinate.artifact)
        .join(&coordinate.version);
    if !version_dir.is_dir() {
        return None;
    }

    let expected = kind.file_name(coordinate);

    WalkDir::new(version_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| {
            entry.file_type().is_file() && entry.file_name().to_str() == Some(expected.as_str())
        })
        .map(|entry| entry.into_path())
}

/// Check `<repository>/<group as dirs>/<artifact>/<version>/<file>` directly
pub fn find_in_maven_repository(
    repository: &Path,
    coordinate: &DependencyCoordinate,
    kind: ArtifactKind,
) -> Option<PathBuf> {
    let group_dir: PathBuf = coordinate.group.split('.').collect();
    let path = repository
        .join(group_dir)
        .join(&coordinate.artifact)
        .join(&coordinate.version)
        .join(kind.file_name(coordinate));

    path.is_file().then_some(path)
}

/// Build HTTP client with proper configuration
fn build_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout())
        .build()
        .map_err(|e| AuditError::network(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Caches {
        _tmp: TempDir,
        locations: CacheLocations,
    }

    fn caches() -> Caches {
        let tmp = TempDir::new().unwrap();
        let locations = CacheLocations {
            project_cache: tmp.path().join("project-cache"),
            gradle_home_cache: Some(tmp.path().join("home-cache")),
            maven_repository: Some(tmp.path().join("m2")),
            download_dir: tmp.path().join("files"),
        };
        Caches {
            _tmp: tmp,
            locations,
        }
    }

    fn locator(locations: CacheLocations, repository_url: &str) -> ArtifactLocator {
        let network = NetworkConfig {
            repository_url: repository_url.to_string(),
            ..NetworkConfig::default()
        };
        ArtifactLocator::new(locations, &network).unwrap()
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"jar").unwrap();
    }

    fn widget() -> DependencyCoordinate {
        DependencyCoordinate::new("com.acme", "widget", "1.0")
    }

    #[test]
    fn test_gradle_cache_hash_directories() {
        let caches = caches();
        let jar = caches
            .locations
            .project_cache
            .join("com.acme/widget/1.0/0a1b2c/widget-1.0-sources.jar");
        touch(&jar);

        let found = find_in_gradle_cache(
            &caches.locations.project_cache,
            &widget(),
            ArtifactKind::Sources,
        );
        assert_eq!(found, Some(jar));
        assert_eq!(
            find_in_gradle_cache(&caches.locations.project_cache, &widget(), ArtifactKind::Binary),
            None
        );
    }

    #[test]
    fn test_maven_layout_uses_group_directories() {
        let caches = caches();
        let repository = caches.locations.maven_repository.clone().unwrap();
        let jar = repository.join("com/acme/widget/1.0/widget-1.0.jar");
        touch(&jar);

        assert_eq!(
            find_in_maven_repository(&repository, &widget(), ArtifactKind::Binary),
            Some(jar)
        );
    }

    #[test]
    fn test_project_cache_wins_over_home_tiers() {
        let caches = caches();
        let project_jar = caches
            .locations
            .project_cache
            .join("com.acme/widget/1.0/aaa/widget-1.0.jar");
        let home_jar = caches
            .locations
            .gradle_home_cache
            .clone()
            .unwrap()
            .join("com.acme/widget/1.0/bbb/widget-1.0.jar");
        touch(&project_jar);
        touch(&home_jar);

        let locator = locator(caches.locations.clone(), "http://127.0.0.1:9");

        assert_eq!(
            locator.find_local(&widget(), ArtifactKind::Binary),
            Some(project_jar)
        );
    }

    #[test]
    fn test_artifact_url_layout() {
        let caches = caches();
        let locator = locator(caches.locations.clone(), "https://repo1.maven.org/maven2/");

        assert_eq!(
            locator.artifact_url(&widget(), ArtifactKind::Sources),
            "https://repo1.maven.org/maven2/com/acme/widget/1.0/widget-1.0-sources.jar"
        );
    }

    #[tokio::test]
    async fn test_download_tier_fetches_and_caches() {
        let caches = caches();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/com/acme/widget/1.0/widget-1.0.jar")
            .with_status(200)
            .with_body("jar bytes")
            .expect(1)
            .create_async()
            .await;

        let locator = locator(caches.locations.clone(), &server.url());

        let first = locator.locate(&widget(), ArtifactKind::Binary).await.unwrap();
        let second = locator.locate(&widget(), ArtifactKind::Binary).await.unwrap();

        assert_eq!(first, caches.locations.download_dir.join("widget-1.0.jar"));
        assert_eq!(first, second);
        assert_eq!(fs::read(&first).unwrap(), b"jar bytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_everywhere_is_not_found() {
        let caches = caches();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/com/acme/widget/1.0/widget-1.0.jar")
            .with_status(404)
            .create_async()
            .await;

        let locator = locator(caches.locations.clone(), &server.url());

        assert_eq!(locator.locate(&widget(), ArtifactKind::Binary).await, None);
        assert!(!caches.locations.download_dir.join("widget-1.0.jar").exists());
        assert!(!caches
            .locations
            .download_dir
            .join("widget-1.0.jar.part")
            .exists());
    }
}
