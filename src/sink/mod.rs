//! Per-MO-type CSV output streams.
//!
//! One append-only writer per managed-object type, created lazily on the
//! first row and living for the rest of the run (an MO type spread over
//! several input files shares one output file). The header is written when
//! the stream is created; every row is flushed so a crash never loses rows
//! that were already reported as written.
//!
//! Quoting follows the csv crate's needed-only policy: a field is wrapped in
//! double quotes when it contains the delimiter, a quote, or a line break,
//! and embedded quotes are doubled.

use csv::Writer;
use indexmap::IndexMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::SinkResult;

/// Lazily-created pool of per-MO-type CSV writers.
pub struct SinkPool {
    output_dir: PathBuf,
    writers: IndexMap<String, Writer<File>>,
    rows_written: u64,
    files_created: usize,
}

impl SinkPool {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            writers: IndexMap::new(),
            rows_written: 0,
            files_created: 0,
        }
    }

    /// Append one row to the MO type's stream and flush it to disk.
    ///
    /// The first row for an MO type opens `<output_dir>/<mo_type>.csv` and
    /// writes the header line produced by `header`; later rows append only.
    pub fn write_row(
        &mut self,
        mo_type: &str,
        header: impl FnOnce() -> Vec<String>,
        row: &[String],
    ) -> SinkResult<()> {
        if !self.writers.contains_key(mo_type) {
            let path = self.output_dir.join(format!("{mo_type}.csv"));
            let mut writer = Writer::from_path(&path)?;
            writer.write_record(&header())?;
            self.writers.insert(mo_type.to_string(), writer);
            self.files_created += 1;
        }

        // Lookup cannot miss: the stream was just inserted above if absent.
        if let Some(writer) = self.writers.get_mut(mo_type) {
            writer.write_record(row)?;
            writer.flush()?;
            self.rows_written += 1;
        }
        Ok(())
    }

    /// Number of data rows written so far, headers excluded.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Number of output files created so far.
    pub fn files_created(&self) -> usize {
        self.files_created
    }

    /// Flush and drop every open stream.
    pub fn close(&mut self) -> SinkResult<()> {
        for (_, writer) in self.writers.iter_mut() {
            writer.flush()?;
        }
        self.writers.clear();
        Ok(())
    }
}
