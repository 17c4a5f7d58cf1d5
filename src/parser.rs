//! Line-oriented scanners for build declarations and the inventory CSV reader
//!
//! Neither scanner understands its build language; each looks at one trimmed
//! line at a time and either extracts a coordinate or reports the line.

use crate::error::Result;
use crate::types::DependencyCoordinate;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

/// Declaring-site kind used for every properties-file entry
pub const PROPERTIES_KIND: &str = "dependency";

/// One outcome of scanning a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanRecord {
    /// A coordinate and the configuration kind that declared it
    Declared {
        coordinate: DependencyCoordinate,
        kind: String,
    },
    /// A line that does not fit the grammar, already formatted for the diagnostic log
    Malformed(String),
}

/// Which scanner handles a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerKind {
    Gradle,
    Properties,
}

impl ScannerKind {
    /// Look up the scanner registered for an exact file name
    pub fn for_file_name(file_name: &str) -> Option<Self> {
        match file_name {
            "build.gradle" | "build-buildscript.gradle" => Some(Self::Gradle),
            "dependencies.properties" => Some(Self::Properties),
            _ => None,
        }
    }

    /// Label written in front of each file's diagnostics
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Gradle => "Scanning Gradle file",
            Self::Properties => "Scanning dependencies.properties file",
        }
    }

    pub fn scan<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Vec<ScanRecord> {
        match self {
            Self::Gradle => scan_gradle(lines),
            Self::Properties => scan_properties(lines),
        }
    }
}

/// Scan `key=group:artifact:version` lines
pub fn scan_properties<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<ScanRecord> {
    lines
        .into_iter()
        .map(str::trim)
        .map(|line| {
            let Some((_, value)) = line.split_once('=') else {
                return ScanRecord::Malformed(format!(
                    "[dependencies.properties] Line is not a key value pair: {}",
                    line
                ));
            };

            let parts: Vec<&str> = value.split(':').collect();
            match parts.as_slice() {
                [group, artifact, version] => ScanRecord::Declared {
                    coordinate: DependencyCoordinate::new(*group, *artifact, *version),
                    kind: PROPERTIES_KIND.to_string(),
                },
                _ => ScanRecord::Malformed(format!(
                    "[dependencies.properties] Line does not contain dependency: {}",
                    line
                )),
            }
        })
        .collect()
}

fn gradle_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(.+?)group:\s*"(.+?)",\s*name:\s*"(.+?)".+?version:\s*"(.+?)""#,
        )
        .expect("gradle dependency pattern is valid")
    })
}

/// Scan `<configuration> group: "g", name: "a", version: "v"` lines.
///
/// Lines that never mention `group:` are unrelated build logic and produce
/// nothing; lines that do but fail the pattern are reported.
pub fn scan_gradle<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<ScanRecord> {
    let pattern = gradle_pattern();

    lines
        .into_iter()
        .map(str::trim)
        .filter_map(|line| match pattern.captures(line) {
            Some(captures) => Some(ScanRecord::Declared {
                coordinate: DependencyCoordinate::new(&captures[2], &captures[3], &captures[4]),
                kind: configuration_name(&captures[1]).to_string(),
            }),
            None if line.contains("group:") => Some(ScanRecord::Malformed(format!(
                "[Gradle] Line does not contain correct dependency: {}",
                line
            ))),
            None => None,
        })
        .collect()
}

/// Strip call syntax such as `compile(` down to the configuration name
fn configuration_name(prefix: &str) -> &str {
    prefix.trim().trim_end_matches(['(', ' ', '\t']).trim()
}

/// Read coordinates from a `group,artifact,version,kind,path` inventory file.
///
/// Lines without exactly five fields are skipped. Duplicates are kept; the
/// resolver deduplicates.
pub fn read_inventory_csv(path: &Path) -> Result<Vec<DependencyCoordinate>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_inventory_csv(&content))
}

pub fn parse_inventory_csv(content: &str) -> Vec<DependencyCoordinate> {
    content
        .lines()
        .filter_map(|line| {
            let columns: Vec<&str> = line.split(',').collect();
            match columns.as_slice() {
                [group, artifact, version, _, _] => {
                    Some(DependencyCoordinate::new(*group, *artifact, *version))
                }
                _ => None,
            }
        })
        .collect()
}

/// Keep the first occurrence of each coordinate, preserving order
pub fn dedup_coordinates(
    coordinates: impl IntoIterator<Item = DependencyCoordinate>,
) -> Vec<DependencyCoordinate> {
    let mut seen = HashSet::new();
    coordinates
        .into_iter()
        .filter(|coordinate| seen.insert(coordinate.clone()))
        .collect()
}
