//! CSV day-series adapter.
//!
//! Splits rows with the `csv` crate and hands each record to a
//! [`SeriesReader`]; header sniffing, column mapping and date parsing live there.

use crate::domain::day_series::DaySeries;
use crate::domain::error::RegimeError;
use crate::domain::series_reader::SeriesReader;
use crate::ports::series_port::SeriesPort;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

pub struct CsvAdapter {
    delimiter: u8,
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl CsvAdapter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn read_from<R: Read>(&self, source_name: &str, input: R) -> Result<DaySeries, RegimeError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(input);

        let mut reader = SeriesReader::new(source_name);
        for result in rdr.records() {
            match result {
                Ok(record) => {
                    let fields: Vec<&str> = record.iter().collect();
                    reader.push_record(&fields);
                }
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                    return Err(RegimeError::SeriesRead {
                        source_name: source_name.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(_) => reader.skip_record(),
            }
        }

        let series = reader.finish()?;
        let stats = series.stats();
        if stats.skipped > 0 {
            warn!(series = %source_name, skipped = stats.skipped, "skipped unparsable rows");
        }
        info!("{}", series.info());
        Ok(series)
    }
}

impl SeriesPort for CsvAdapter {
    fn load_series(&self, path: &Path) -> Result<DaySeries, RegimeError> {
        let source_name = path.display().to_string();
        let file = File::open(path).map_err(|e| RegimeError::SeriesRead {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;
        self.read_from(&source_name, file)
    }
}
