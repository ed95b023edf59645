//! Hourly VWAP report files.
//!
//! One CSV per completed session hour, named `Stock_VWAP_HH.csv` with a
//! two-digit zero-padded hour index. The first line is literally
//! `Stock, VWAP`; each row carries the raw 8-character symbol (trailing
//! spaces included) and the session-to-date VWAP. Rows appear in the
//! iteration order of the symbol map; consumers must not rely on a specific
//! row order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::engine::SymbolAggregate;
use crate::types::Stock;

/// Writes hourly VWAP snapshots as CSV files under a fixed directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    /// Create a writer that places reports in `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory reports are written into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The report path for a given session-hour index.
    pub fn path_for_hour(&self, hour: u64) -> PathBuf {
        self.output_dir.join(format!("Stock_VWAP_{hour:02}.csv"))
    }

    /// Write one snapshot of the aggregate map.
    ///
    /// The file handle lives only for this call and is flushed before
    /// returning. An existing file for the same hour is overwritten.
    pub fn write(
        &self,
        hour: u64,
        symbols: &BTreeMap<Stock, SymbolAggregate>,
    ) -> io::Result<PathBuf> {
        let path = self.path_for_hour(hour);
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "Stock, VWAP")?;
        for (stock, aggregate) in symbols {
            writeln!(writer, "{}, {}", stock, aggregate.vwap())?;
        }

        writer.flush()?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn unique_temp_dir(name: &str) -> PathBuf {
        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "report_test_{}_{}_{}",
            std::process::id(),
            name,
            counter
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_path_for_hour_is_zero_padded() {
        let writer = ReportWriter::new("/out");
        assert_eq!(
            writer.path_for_hour(9),
            PathBuf::from("/out/Stock_VWAP_09.csv")
        );
        assert_eq!(
            writer.path_for_hour(14),
            PathBuf::from("/out/Stock_VWAP_14.csv")
        );
    }

    #[test]
    fn test_write_report_rows() {
        let dir = unique_temp_dir("rows");
        let writer = ReportWriter::new(&dir);

        let mut symbols = BTreeMap::new();
        symbols.insert(
            Stock::from("AAPL"),
            SymbolAggregate {
                volume: 40,
                notional: 6000.0,
            },
        );
        symbols.insert(
            Stock::from("MSFT"),
            SymbolAggregate {
                volume: 10,
                notional: 29000.0,
            },
        );

        let path = writer.write(0, &symbols).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();

        assert_eq!(lines[0], "Stock, VWAP");
        assert_eq!(lines[1], "AAPL    , 150");
        assert_eq!(lines[2], "MSFT    , 2900");
        assert_eq!(lines.len(), 3);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_write_zero_volume_reports_zero() {
        let dir = unique_temp_dir("zero_volume");
        let writer = ReportWriter::new(&dir);

        let mut symbols = BTreeMap::new();
        symbols.insert(
            Stock::from("GOOG"),
            SymbolAggregate {
                volume: 0,
                notional: 0.0,
            },
        );

        let path = writer.write(3, &symbols).unwrap();
        assert!(path.ends_with("Stock_VWAP_03.csv"));

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().nth(1).unwrap(), "GOOG    , 0");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let dir = unique_temp_dir("missing");
        let writer = ReportWriter::new(dir.join("does_not_exist"));
        let result = writer.write(0, &BTreeMap::new());
        assert!(result.is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
