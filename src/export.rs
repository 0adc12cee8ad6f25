//! Export and import of the whole practice history
//!
//! An export is a single pretty-printed JSON document holding every item and
//! every log, so it can be re-imported on another machine or kept as a backup.

use crate::error::{Error, Result};
use crate::model::{iso_millis, PracticeItem, PracticeLog};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Format version written into every export
pub const EXPORT_VERSION: &str = "1.0";

/// A full snapshot of items and logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Document format version
    pub version: String,
    /// When the snapshot was taken
    #[serde(with = "iso_millis")]
    pub export_date: DateTime<Utc>,
    pub items: Vec<PracticeItem>,
    /// Most recent first
    pub logs: Vec<PracticeLog>,
}

impl ExportDocument {
    pub fn new(items: Vec<PracticeItem>, logs: Vec<PracticeLog>, export_date: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            export_date,
            items,
            logs,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document, rejecting versions this build cannot read
    pub fn from_json(content: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(content)?;
        doc.check_version()?;
        Ok(doc)
    }

    /// Only the major version has to match
    pub fn check_version(&self) -> Result<()> {
        let major = |v: &str| v.split('.').next().unwrap_or("").to_string();
        if major(&self.version) != major(EXPORT_VERSION) {
            return Err(Error::Validation(format!(
                "Unsupported export version {} (expected {})",
                self.version, EXPORT_VERSION
            )));
        }
        Ok(())
    }

    /// Load an export from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save the export to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_json()?;

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// `practice-companion-export-YYYY-MM-DD.json`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("practice-companion-export-{}.json", date.format("%Y-%m-%d"))
}

/// Result of importing an export document
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Items inserted or replaced
    pub items_upserted: usize,
    /// Logs added
    pub logs_added: usize,
    /// Logs skipped (id already present)
    pub logs_skipped: usize,
}
