//! Dependency aggregation over a source tree
//!
//! [`walk_tree`] lazily yields one [`ScanEvent`] per interesting filesystem
//! entry; [`Aggregation`] folds those events into the grouped inventory and the
//! diagnostic log. Keeping the two apart lets the fold be tested without a
//! filesystem.

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::parser::{ScanRecord, ScannerKind};
use crate::types::{DeclaringSite, DependencyInventory};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Something the tree walk observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// An excluded directory, relative to the root; its subtree was not entered
    SkippedDir(PathBuf),
    /// A declaration file that was read and scanned
    Scanned(FileScan),
    /// An entry that could not be visited or read
    Unreadable { path: PathBuf, error: String },
}

/// Scan results of a single declaration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileScan {
    pub path: PathBuf,
    pub scanner: ScannerKind,
    pub records: Vec<ScanRecord>,
}

/// Lazy, sequential pre-order walk of a source tree
pub struct TreeWalk {
    root: PathBuf,
    excluded_dirs: Vec<PathBuf>,
    entries: walkdir::IntoIter,
}

/// Start walking `root`, skipping directories whose root-relative path equals
/// one of `excluded_dirs`.
///
/// Fails only when the root itself is not a traversable directory.
pub fn walk_tree(root: &Path, excluded_dirs: &[String]) -> Result<TreeWalk> {
    let metadata = std::fs::metadata(root)
        .map_err(|_| AuditError::RootNotTraversable(root.to_path_buf()))?;
    if !metadata.is_dir() {
        return Err(AuditError::RootNotTraversable(root.to_path_buf()));
    }

    Ok(TreeWalk {
        root: root.to_path_buf(),
        excluded_dirs: excluded_dirs.iter().map(PathBuf::from).collect(),
        entries: WalkDir::new(root).sort_by_file_name().into_iter(),
    })
}

impl TreeWalk {
    fn excluded_relative(&self, path: &Path) -> Option<PathBuf> {
        let relative = path.strip_prefix(&self.root).ok()?;
        self.excluded_dirs
            .iter()
            .any(|excluded| excluded.as_path() == relative)
            .then(|| relative.to_path_buf())
    }
}

impl Iterator for TreeWalk {
    type Item = ScanEvent;

    fn next(&mut self) -> Option<ScanEvent> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    return Some(ScanEvent::Unreadable {
                        path,
                        error: err.to_string(),
                    });
                }
            };

            if entry.file_type().is_dir() {
                if entry.depth() > 0 {
                    if let Some(relative) = self.excluded_relative(entry.path()) {
                        self.entries.skip_current_dir();
                        return Some(ScanEvent::SkippedDir(relative));
                    }
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(scanner) = entry
                .file_name()
                .to_str()
                .and_then(ScannerKind::for_file_name)
            else {
                continue;
            };

            let path = entry.into_path();
            return Some(match std::fs::read_to_string(&path) {
                Ok(content) => ScanEvent::Scanned(FileScan {
                    records: scanner.scan(content.lines()),
                    path,
                    scanner,
                }),
                Err(err) => ScanEvent::Unreadable {
                    path,
                    error: err.to_string(),
                },
            });
        }
    }
}

/// Inventory plus diagnostic log built from a walk
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub inventory: DependencyInventory,
    pub diagnostics: Vec<String>,
}

impl Aggregation {
    pub fn new(excluded_groups: BTreeSet<String>) -> Self {
        Self {
            inventory: DependencyInventory::new(excluded_groups),
            diagnostics: Vec::new(),
        }
    }

    /// Fold a sequence of events into a fresh aggregation
    pub fn fold(
        events: impl IntoIterator<Item = ScanEvent>,
        excluded_groups: BTreeSet<String>,
    ) -> Self {
        events
            .into_iter()
            .fold(Self::new(excluded_groups), |mut aggregation, event| {
                aggregation.absorb(event);
                aggregation
            })
    }

    pub fn absorb(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::SkippedDir(relative) => {
                self.log(format!("Skipping {}", relative.display()));
            }
            ScanEvent::Scanned(scan) => {
                self.log(format!("{}: {}", scan.scanner.heading(), scan.path.display()));

                for record in scan.records {
                    match record {
                        ScanRecord::Declared { coordinate, kind } => {
                            self.inventory
                                .populate(coordinate, DeclaringSite::new(kind, scan.path.clone()));
                        }
                        ScanRecord::Malformed(message) => self.log(format!("\t{}", message)),
                    }
                }
            }
            ScanEvent::Unreadable { path, error } => {
                warn!("Failed to visit {}: {}", path.display(), error);
                self.log(format!("Failed to visit {}: {}", path.display(), error));
            }
        }
    }

    fn log(&mut self, message: String) {
        debug!("{}", message);
        self.diagnostics.push(message);
    }
}

/// Walk `root` and build the dependency inventory
pub fn aggregate(root: &Path, config: &AuditConfig) -> Result<Aggregation> {
    info!("Scanning build declarations under: {}", root.display());

    let events = walk_tree(root, &config.excluded_dirs)?;
    let aggregation = Aggregation::fold(events, config.excluded_groups.clone());

    info!(
        "Found {} coordinates ({} diagnostics)",
        aggregation.inventory.len(),
        aggregation.diagnostics.len()
    );

    Ok(aggregation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DependencyCoordinate;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_fold_without_filesystem() {
        let events = vec![
            ScanEvent::SkippedDir(PathBuf::from("workspaces")),
            ScanEvent::Scanned(FileScan {
                path: PathBuf::from("a/build.gradle"),
                scanner: ScannerKind::Gradle,
                records: vec![
                    ScanRecord::Declared {
                        coordinate: DependencyCoordinate::new("com.liferay.portal", "kernel", "1"),
                        kind: "compileOnly".to_string(),
                    },
                    ScanRecord::Declared {
                        coordinate: DependencyCoordinate::new("org.x", "y", "2"),
                        kind: "compileOnly".to_string(),
                    },
                ],
            }),
        ];

        let aggregation = Aggregation::fold(
            events,
            BTreeSet::from(["com.liferay.portal".to_string()]),
        );

        assert_eq!(aggregation.inventory.len(), 1);
        assert_eq!(
            aggregation.diagnostics,
            vec!["Skipping workspaces", "Scanning Gradle file: a/build.gradle"]
        );
    }

    #[test]
    fn test_properties_scenario() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "modules/app/dependencies.properties",
            "dep1=com.acme:widget:1.2.3\ndep2=bad\n",
        );

        let aggregation = aggregate(tmp.path(), &AuditConfig::default()).unwrap();

        let sites = aggregation
            .inventory
            .sites_of(&DependencyCoordinate::new("com.acme", "widget", "1.2.3"))
            .unwrap();
        assert_eq!(sites, &[DeclaringSite::new("dependency", path.clone())]);
        assert_eq!(aggregation.inventory.len(), 1);
        assert_eq!(
            aggregation.diagnostics,
            vec![
                format!("Scanning dependencies.properties file: {}", path.display()),
                "\t[dependencies.properties] Line does not contain dependency: dep2=bad"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_excluded_subtree_is_never_visited() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "workspaces/sample/build.gradle",
            r#"compile group: "org.hidden", name: "hidden", version: "1.0""#,
        );
        write(
            tmp.path(),
            "modules/third-party/lib/build.gradle",
            r#"compile group: "org.hidden", name: "vendored", version: "1.0""#,
        );
        write(
            tmp.path(),
            "modules/apps/foo/build.gradle",
            r#"compile group: "org.visible", name: "visible", version: "1.0""#,
        );

        let aggregation = aggregate(tmp.path(), &AuditConfig::default()).unwrap();

        assert!(!aggregation.inventory.groups().contains_key("org.hidden"));
        assert!(aggregation.inventory.groups().contains_key("org.visible"));

        let skips: Vec<_> = aggregation
            .diagnostics
            .iter()
            .filter(|line| line.starts_with("Skipping"))
            .collect();
        assert_eq!(skips.len(), 2);
        assert!(aggregation
            .diagnostics
            .iter()
            .all(|line| !line.contains("workspaces") || line == "Skipping workspaces"));
    }

    #[test]
    fn test_exclusion_is_exact_not_prefix() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "modules/workspaces/build.gradle",
            r#"compile group: "org.nested", name: "nested", version: "1.0""#,
        );

        let aggregation = aggregate(tmp.path(), &AuditConfig::default()).unwrap();

        assert!(aggregation.inventory.groups().contains_key("org.nested"));
    }

    #[test]
    fn test_unregistered_files_are_ignored() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "ivy.xml", "<ivy-module/>");
        write(tmp.path(), "build.gradle.kts", "implementation(\"a:b:1\")");

        let aggregation = aggregate(tmp.path(), &AuditConfig::default()).unwrap();

        assert!(aggregation.inventory.is_empty());
        assert!(aggregation.diagnostics.is_empty());
    }

    #[test]
    fn test_unreadable_file_is_recorded_and_walk_continues() {
        let tmp = TempDir::new().unwrap();
        let bad = tmp.path().join("a").join("build.gradle");
        fs::create_dir_all(bad.parent().unwrap()).unwrap();
        fs::write(&bad, [0xff, 0xfe, 0x00]).unwrap();
        write(
            tmp.path(),
            "b/build.gradle",
            r#"compile group: "org.ok", name: "ok", version: "1.0""#,
        );

        let aggregation = aggregate(tmp.path(), &AuditConfig::default()).unwrap();

        assert!(aggregation.inventory.groups().contains_key("org.ok"));
        assert!(aggregation.diagnostics[0].starts_with("Failed to visit"));
    }

    #[test]
    fn test_aggregation_is_repeatable() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "z/build.gradle",
            r#"compile group: "org.a", name: "lib", version: "2.0""#,
        );
        write(tmp.path(), "a/dependencies.properties", "x=org.a:lib:1.0\n\n");

        let first = aggregate(tmp.path(), &AuditConfig::default()).unwrap();
        let second = aggregate(tmp.path(), &AuditConfig::default()).unwrap();

        assert_eq!(first.diagnostics, second.diagnostics);
        assert_eq!(
            first.inventory.rows().collect::<Vec<_>>(),
            second.inventory.rows().collect::<Vec<_>>()
        );
        assert!(first.inventory.is_duplicated("org.a", "lib"));
    }

    #[test]
    fn test_missing_root_is_a_hard_error() {
        let tmp = TempDir::new().unwrap();
        let result = aggregate(&tmp.path().join("missing"), &AuditConfig::default());

        assert!(matches!(result, Err(AuditError::RootNotTraversable(_))));
    }
}
