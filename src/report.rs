//! Text records for the inventory, diagnostic and findings outputs

use crate::audit::FindingSink;
use crate::error::Result;
use crate::types::{DependencyInventory, InventoryRow, ResolutionResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const FULL_INVENTORY_FILE: &str = "full.csv";
pub const DUPLICATED_INVENTORY_FILE: &str = "duplicated.csv";
pub const DIAGNOSTIC_LOG_FILE: &str = "logs.log";
pub const FINDINGS_FILE: &str = "legacy.log";

/// `group,artifact,version,kind,path`
pub fn format_row(row: &InventoryRow<'_>) -> String {
    format!("{},{},{},{}", row.group, row.artifact, row.version, row.site)
}

pub fn full_inventory_lines(inventory: &DependencyInventory) -> Vec<String> {
    inventory.rows().map(|row| format_row(&row)).collect()
}

pub fn duplicated_inventory_lines(inventory: &DependencyInventory) -> Vec<String> {
    inventory.duplicated_rows().map(|row| format_row(&row)).collect()
}

/// Header line `group:artifact:version` followed by one tab-indented line per reference
pub fn format_finding(result: &ResolutionResult) -> String {
    let mut record = format!("{}\n", result.coordinate);
    for reference in result.legacy_references().unwrap_or_default() {
        record.push('\t');
        record.push_str(reference);
        record.push('\n');
    }
    record
}

/// Replace `path` with the given lines
pub fn write_lines<I, S>(path: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{}", line.as_ref())?;
    }
    writer.flush()?;
    Ok(())
}

/// Paths of the three scan outputs written into one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutputs {
    pub full: PathBuf,
    pub duplicated: PathBuf,
    pub diagnostics: PathBuf,
}

impl ScanOutputs {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            full: dir.join(FULL_INVENTORY_FILE),
            duplicated: dir.join(DUPLICATED_INVENTORY_FILE),
            diagnostics: dir.join(DIAGNOSTIC_LOG_FILE),
        }
    }

    pub fn write(&self, inventory: &DependencyInventory, diagnostics: &[String]) -> Result<()> {
        write_lines(&self.full, full_inventory_lines(inventory))?;
        write_lines(&self.duplicated, duplicated_inventory_lines(inventory))?;
        write_lines(&self.diagnostics, diagnostics)?;
        Ok(())
    }
}

/// Findings file that is flushed after every record
pub struct FindingsLog {
    file: File,
}

impl FindingsLog {
    /// Start a new findings file, discarding any previous run's content
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self { file })
    }
}

impl FindingSink for FindingsLog {
    fn append(&mut self, result: &ResolutionResult) -> Result<()> {
        self.file.write_all(format_finding(result).as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}
