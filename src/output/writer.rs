//! JSON record writer

use crate::record::ProductRecord;
use crate::{HarvestError, WriteError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::sanitize_file_name;

/// Writes one `<product_id>.json` file per product into the output directory
#[derive(Debug, Clone)]
pub struct JsonWriter {
    output_dir: PathBuf,
}

impl JsonWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Creates the output directory if needed
    ///
    /// Failure here aborts the run, unlike per-record write errors.
    pub fn ensure_output_dir(&self) -> Result<(), HarvestError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| HarvestError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })
    }

    /// Path of the JSON file for a product id
    pub fn record_path(&self, product_id: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.json", sanitize_file_name(product_id)))
    }

    /// Renders a record as pretty JSON with a trailing newline
    pub fn render(record: &ProductRecord) -> Result<String, WriteError> {
        let mut json =
            serde_json::to_string_pretty(record).map_err(|source| WriteError::Serialize {
                product_id: record.product_id.clone(),
                source,
            })?;
        json.push('\n');
        Ok(json)
    }

    /// Writes a record, replacing any previous file for the same product
    ///
    /// The JSON is written to a temporary sibling first and renamed into place,
    /// so a reader never sees a partially written record.
    pub fn write(&self, record: &ProductRecord) -> Result<PathBuf, WriteError> {
        let json = Self::render(record)?;
        let path = self.record_path(&record.product_id);
        let tmp_path = path.with_extension("json.tmp");

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| WriteError::Io { path, source }
        };

        let mut file = fs::File::create(&tmp_path).map_err(io_err(&tmp_path))?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(io_err(&tmp_path))?;
        drop(file);

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_err(&path)(e));
        }

        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }
}
