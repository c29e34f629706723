//! Append-only CSV regime ledger.
//!
//! Every record is written and flushed before `append` returns, so an
//! external reader always sees a complete prefix of rows. The file handle is
//! released when the ledger is dropped or closed.

use crate::domain::error::RegimeError;
use crate::domain::regime::RegimeRecord;
use crate::ports::regime_sink::{LedgerShape, OpenMode, RegimeSink};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

pub struct CsvLedger {
    path: PathBuf,
    shape: LedgerShape,
    writer: csv::Writer<File>,
    rows_written: usize,
}

impl CsvLedger {
    pub fn open(path: impl Into<PathBuf>, shape: LedgerShape, mode: OpenMode) -> Result<Self, RegimeError> {
        let path = path.into();
        let fail = |reason: String| RegimeError::Ledger {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
        }

        let needs_header = match mode {
            OpenMode::Truncate => true,
            OpenMode::Append => fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true),
        };

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            OpenMode::Truncate => options.write(true).truncate(true),
            OpenMode::Append => options.append(true),
        };
        let file = options.open(&path).map_err(|e| fail(e.to_string()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer
                .write_record(shape.header())
                .map_err(|e| fail(e.to_string()))?;
            writer.flush().map_err(|e| fail(e.to_string()))?;
        }

        info!(path = %path.display(), ?shape, ?mode, "regime ledger opened");
        Ok(Self {
            path,
            shape,
            writer,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended through this handle, header excluded.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and release the file.
    pub fn close(mut self) -> Result<(), RegimeError> {
        self.writer.flush().map_err(|e| self.error(e.to_string()))
    }

    fn error(&self, reason: String) -> RegimeError {
        RegimeError::Ledger {
            path: self.path.display().to_string(),
            reason,
        }
    }

    fn fields(&self, record: &RegimeRecord) -> Vec<String> {
        let code = record.code();
        let mut fields = vec![
            record.date.format("%Y-%m-%d").to_string(),
            code.to_string(),
            record.label().to_string(),
        ];
        if self.shape == LedgerShape::Full {
            let (c, t, v) = record.bits();
            fields.extend([c, t, v, code].iter().map(i8::to_string));
        }
        fields
    }
}

impl RegimeSink for CsvLedger {
    fn append(&mut self, record: &RegimeRecord) -> Result<(), RegimeError> {
        let fields = self.fields(record);
        self.writer
            .write_record(&fields)
            .map_err(|e| self.error(e.to_string()))?;
        self.writer
            .flush()
            .map_err(|e| self.error(e.to_string()))?;
        self.rows_written += 1;
        Ok(())
    }
}
