//! Legacy-namespace extraction from binary and source jars

use crate::error::Result;
use crate::taxonomy::LegacyTaxonomy;
use crate::types::ManifestOutcome;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

/// Manifest header listing the packages a bundle imports
pub const IMPORT_PACKAGE_HEADER: &str = "Import-Package";

const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
const SOURCE_EXTENSION: &str = ".java";

/// Reads jars and reports references into the legacy taxonomy
#[derive(Debug, Clone)]
pub struct Inspector {
    taxonomy: LegacyTaxonomy,
    legacy_root: String,
}

impl Inspector {
    pub fn new(taxonomy: LegacyTaxonomy, legacy_root: impl Into<String>) -> Self {
        Self {
            taxonomy,
            legacy_root: legacy_root.into(),
        }
    }

    /// Read the `Import-Package` header of a binary jar.
    ///
    /// A jar without a manifest, or whose manifest lacks the header, yields
    /// [`ManifestOutcome::NoHeader`] rather than an empty list.
    pub fn inspect_archive(&self, path: &Path) -> Result<ManifestOutcome> {
        let mut archive = ZipArchive::new(File::open(path)?)?;

        let manifest = match archive.by_name(MANIFEST_PATH) {
            Ok(mut entry) => {
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes)?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            Err(ZipError::FileNotFound) => {
                debug!("{} has no manifest", path.display());
                return Ok(ManifestOutcome::NoHeader);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(header) = main_attribute(&manifest, IMPORT_PACKAGE_HEADER) else {
            return Ok(ManifestOutcome::NoHeader);
        };

        let legacy = split_header_entries(&header)
            .into_iter()
            .filter(|entry| self.taxonomy.is_legacy(entry))
            .collect();

        Ok(ManifestOutcome::Found(legacy))
    }

    /// Collect legacy imports from every `.java` file of a sources jar.
    ///
    /// Entries that cannot be read are logged and skipped. An empty result is
    /// final: the sources were read and nothing legacy was imported.
    pub fn inspect_source_archive(&self, path: &Path) -> Result<Vec<String>> {
        let mut archive = ZipArchive::new(File::open(path)?)?;
        let mut imports = Vec::new();

        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Cannot open entry {} of {}: {}", index, path.display(), e);
                    continue;
                }
            };

            if entry.is_dir() || !entry.name().ends_with(SOURCE_EXTENSION) {
                continue;
            }

            let name = entry.name().to_string();
            let mut content = String::new();
            if let Err(e) = entry.read_to_string(&mut content) {
                warn!("Cannot read {} in {}: {}", name, path.display(), e);
                continue;
            }

            imports.extend(
                content
                    .lines()
                    .filter_map(|line| import_target(line, &self.legacy_root))
                    .filter(|target| self.taxonomy.is_legacy(target))
                    .map(str::to_string),
            );
        }

        Ok(imports)
    }
}

/// Value of a header in the main section of a jar manifest.
///
/// The main section ends at the first blank line; a line starting with a
/// single space continues the previous header. Names compare case-insensitively.
pub fn main_attribute(manifest: &str, name: &str) -> Option<String> {
    let mut current: Option<(&str, String)> = None;

    for line in manifest.lines().map(|line| line.trim_end_matches('\r')) {
        if line.is_empty() {
            break;
        }

        if let Some(continuation) = line.strip_prefix(' ') {
            if let Some((_, value)) = current.as_mut() {
                value.push_str(continuation);
            }
            continue;
        }

        if let Some((header, value)) = current.take() {
            if header.eq_ignore_ascii_case(name) {
                return Some(value);
            }
        }

        current = line
            .split_once(':')
            .map(|(header, value)| (header.trim(), value.trim_start().to_string()));
    }

    current
        .filter(|(header, _)| header.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

/// Split a package list on commas that are not inside double quotes
pub fn split_header_entries(value: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in value.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            ',' if !quoted => entries.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    entries.push(current);

    entries
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Fully-qualified name imported by `line` when it starts with `root`
pub fn import_target<'a>(line: &'a str, root: &str) -> Option<&'a str> {
    let rest = line.trim_start().strip_prefix("import")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix("static")
        .filter(|after| after.starts_with(char::is_whitespace))
        .map(str::trim_start)
        .unwrap_or(rest);

    if !rest.starts_with(root) {
        return None;
    }

    rest.split(';').next().map(str::trim)
}
