//! Bar loading from CSV files.
//!
//! Columns are located by header name (`timestamp, open, high, low, close,
//! volume`); anything else, such as a leading unnamed index column, is
//! ignored. Timestamps may be epoch milliseconds or one of the common
//! textual forms. Rows outside the optional date window are dropped; kept
//! rows must pass `Bar::is_sane`.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use thiserror::Error;
use tracing::{debug, warn};
use tradesim_core::domain::Bar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: unrecognised timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },

    #[error("row {row}: column '{column}' is not a number: '{value}'")]
    BadNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: inconsistent OHLCV values (need low <= open, close <= high, close > 0, volume >= 0)")]
    InvalidBar { row: usize },

    #[error("no bars left after date filtering")]
    NoBars,
}

/// Options controlling which bars are kept.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// First date to keep (inclusive).
    pub start: Option<NaiveDate>,
    /// Last date to keep (inclusive).
    pub end: Option<NaiveDate>,
    /// Expected spacing between bars; gaps or overlaps are logged.
    pub interval: Option<Duration>,
}

impl LoadOptions {
    fn keeps(&self, timestamp: NaiveDateTime) -> bool {
        let date = timestamp.date();
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

const COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

/// Load bars from a CSV file on disk.
pub fn load_bars_csv(path: &Path, opts: &LoadOptions) -> Result<Vec<Bar>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_bars_csv(file, opts)?;
    debug!(path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(bars)
}

/// Parse bars from any CSV reader.
pub fn read_bars_csv<R: Read>(reader: R, opts: &LoadOptions) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut index = [0usize; 6];
    for (slot, name) in index.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or(LoadError::MissingColumn(name))?;
    }

    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let row = i + 2;
        let raw_ts = record.get(index[0]).unwrap_or("");
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| LoadError::BadTimestamp {
            row,
            value: raw_ts.to_string(),
        })?;
        if !opts.keeps(timestamp) {
            continue;
        }
        let bar = Bar {
            timestamp,
            open: number(&record, row, index[1], COLUMNS[1])?,
            high: number(&record, row, index[2], COLUMNS[2])?,
            low: number(&record, row, index[3], COLUMNS[3])?,
            close: number(&record, row, index[4], COLUMNS[4])?,
            volume: number(&record, row, index[5], COLUMNS[5])?,
        };
        if !bar.is_sane() {
            return Err(LoadError::InvalidBar { row });
        }
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(LoadError::NoBars);
    }
    if let Some(interval) = opts.interval {
        check_spacing(&bars, interval);
    }
    Ok(bars)
}

fn number(
    record: &StringRecord,
    row: usize,
    index: usize,
    column: &'static str,
) -> Result<f64, LoadError> {
    let raw = record.get(index).unwrap_or("");
    raw.parse().map_err(|_| LoadError::BadNumber {
        row,
        column,
        value: raw.to_string(),
    })
}

/// Parse a timestamp in any of the accepted forms.
///
/// Epoch milliseconds, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`,
/// RFC 3339 (converted to UTC) or a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = text.parse().ok()?;
        return DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Count and log bar gaps that differ from the expected interval.
///
/// Irregular spacing is tolerated; the engine only needs increasing
/// timestamps.
pub fn check_spacing(bars: &[Bar], interval: Duration) -> usize {
    let irregular = bars
        .windows(2)
        .filter(|pair| pair[1].timestamp - pair[0].timestamp != interval)
        .count();
    if irregular > 0 {
        warn!(
            irregular,
            expected_seconds = interval.num_seconds(),
            "bar spacing differs from the configured interval"
        );
    }
    irregular
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANDAS_CSV: &str = "\
,timestamp,open,high,low,close,volume
0,2022-01-01 00:00:00,3676.0,3700.0,3660.0,3690.5,1200.5
1,2022-01-01 01:00:00,3690.5,3710.0,3680.0,3705.0,980.25
2,2022-01-01 02:00:00,3705.0,3720.0,3695.0,3700.0,870.0
";

    #[test]
    fn reads_pandas_export_with_index_column() {
        let bars = read_bars_csv(PANDAS_CSV.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].open, 3676.0);
        assert_eq!(bars[1].close, 3705.0);
        assert_eq!(bars[0].volume, 1200.5);
        assert_eq!(
            bars[2].timestamp,
            NaiveDate::from_ymd_opt(2022, 1, 1)
                .unwrap()
                .and_hms_opt(2, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2022, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("1640995200000"), Some(expected));
        assert_eq!(parse_timestamp("2022-01-01 00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2022-01-01T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2022-01-01T01:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2022-01-01"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn date_window_is_inclusive() {
        let opts = LoadOptions {
            start: NaiveDate::from_ymd_opt(2022, 1, 2),
            end: NaiveDate::from_ymd_opt(2022, 1, 3),
            interval: None,
        };
        let csv = "\
timestamp,open,high,low,close,volume
2022-01-01,1,1,1,1,1
2022-01-02,2,2,2,2,1
2022-01-03,3,3,3,3,1
2022-01-04,4,4,4,4,1
";
        let bars = read_bars_csv(csv.as_bytes(), &opts).unwrap();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![2.0, 3.0]);
    }

    #[test]
    fn missing_column_reported() {
        let csv = "timestamp,open,high,low,volume\n2022-01-01,1,1,1,1\n";
        assert!(matches!(
            read_bars_csv(csv.as_bytes(), &LoadOptions::default()),
            Err(LoadError::MissingColumn("close"))
        ));
    }

    #[test]
    fn bad_number_reports_row() {
        let csv = "timestamp,open,high,low,close,volume\n2022-01-01,1,1,1,oops,1\n";
        match read_bars_csv(csv.as_bytes(), &LoadOptions::default()) {
            Err(LoadError::BadNumber { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "close");
            }
            other => panic!("expected BadNumber, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_positive_close() {
        let csv = "\
timestamp,open,high,low,close,volume
2022-01-01,1,1,1,1,1
2022-01-02,0,0,0,0,1
";
        assert!(matches!(
            read_bars_csv(csv.as_bytes(), &LoadOptions::default()),
            Err(LoadError::InvalidBar { row: 3 })
        ));
    }

    #[test]
    fn rejects_high_below_low() {
        let csv = "timestamp,open,high,low,close,volume\n2022-01-01,10,9,11,10,1\n";
        assert!(matches!(
            read_bars_csv(csv.as_bytes(), &LoadOptions::default()),
            Err(LoadError::InvalidBar { row: 2 })
        ));
    }

    #[test]
    fn empty_after_filter() {
        let opts = LoadOptions {
            start: NaiveDate::from_ymd_opt(2030, 1, 1),
            ..LoadOptions::default()
        };
        assert!(matches!(
            read_bars_csv(PANDAS_CSV.as_bytes(), &opts),
            Err(LoadError::NoBars)
        ));
    }

    #[test]
    fn spacing_counts_irregular_gaps() {
        let mut bars = read_bars_csv(PANDAS_CSV.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(check_spacing(&bars, Duration::hours(1)), 0);
        bars[2].timestamp += Duration::hours(2);
        assert_eq!(check_spacing(&bars, Duration::hours(1)), 1);
    }
}
