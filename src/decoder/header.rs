//! Parsing of the first physical line of a fixed-width quote file.
//!
//! Current files start with `MMDDYYYY:NNNNNNNNNN` (date plus zero-padded record
//! count) space-padded to the record width; older files carry the date alone. The
//! header line is exactly as wide as every record line, which is what makes it the
//! source of the layout width.

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;

use crate::error::TaqError;
use crate::kernels::ascii_int;

const DATE_LEN: usize = 8;
const COUNT_LEN: usize = 10;

/// Per-file header data, shared read-only by every batch of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveMetadata {
    /// Trading date embedded in the header.
    pub date: NaiveDate,
    /// Record count declared by the producer. Advisory only.
    pub declared_rows: Option<u64>,
    /// POSIX seconds of local midnight on `date` in the exchange timezone.
    pub midnight_epoch: f64,
    /// Physical line width, terminator included.
    pub line_width: usize,
    /// The header line exactly as read.
    pub header_line: Vec<u8>,
}

impl ArchiveMetadata {
    /// Absolute timestamp of a record, in POSIX seconds.
    #[inline]
    pub fn timestamp(&self, hour: i64, minute: i64, msec_of_minute: i64) -> f64 {
        self.midnight_epoch
            + (hour * 3600 + minute * 60) as f64
            + msec_of_minute as f64 / 1000.0
    }
}

/// Parses a header line (terminator included) into `ArchiveMetadata`.
///
/// An unparseable declared count degrades to date-only mode with a warning; a
/// missing or invalid date is fatal.
pub fn parse_header(line: &[u8], tz: Tz) -> Result<ArchiveMetadata, TaqError> {
    let body = trim_terminator(line);
    let body = &body[body.iter().take_while(|&&b| b == b' ').count()..];

    let (dateish, declared_rows) = match body.iter().position(|&b| b == b':') {
        Some(colon) => {
            let count_field = &body[colon + 1..];
            match parse_count(count_field) {
                Some(count) => (&body[..colon], Some(count)),
                None => {
                    log::warn!(
                        "Header record count {:?} is not an integer; reading without a declared count",
                        String::from_utf8_lossy(count_field)
                    );
                    (body, None)
                }
            }
        }
        None => (body, None),
    };

    let date = parse_date(dateish)?;
    let midnight_epoch = local_midnight(date, tz)?;

    log::info!(
        "Header: date={} declared_rows={:?} line_width={}",
        date,
        declared_rows,
        line.len()
    );

    Ok(ArchiveMetadata {
        date,
        declared_rows,
        midnight_epoch,
        line_width: line.len(),
        header_line: line.to_vec(),
    })
}

/// Builds a header line of `line_width` bytes, the inverse of `parse_header`.
pub fn format_header(
    date: NaiveDate,
    declared_rows: Option<u64>,
    line_width: usize,
) -> Result<Vec<u8>, TaqError> {
    let mut line = date.format("%m%d%Y").to_string().into_bytes();
    if let Some(count) = declared_rows {
        let digits = ascii_int::format_padded(count, COUNT_LEN).ok_or_else(|| {
            TaqError::InvalidHeader(format!("record count {} exceeds {} digits", count, COUNT_LEN))
        })?;
        line.push(b':');
        line.extend_from_slice(&digits);
    }

    let body_width = line_width.saturating_sub(2);
    if line.len() > body_width {
        return Err(TaqError::InvalidHeader(format!(
            "a {}-byte header does not fit a {}-byte line",
            line.len(),
            line_width
        )));
    }
    line.resize(body_width, b' ');
    line.extend_from_slice(b"\r\n");
    Ok(line)
}

fn trim_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn parse_count(field: &[u8]) -> Option<u64> {
    let trimmed_len = field.iter().filter(|&&b| b != b' ').count();
    if trimmed_len == 0 {
        return None;
    }
    ascii_int::parse::<u64>(field)
}

fn parse_date(dateish: &[u8]) -> Result<NaiveDate, TaqError> {
    let digits = dateish
        .get(..DATE_LEN)
        .filter(|d| d.iter().all(u8::is_ascii_digit))
        .ok_or_else(|| {
            TaqError::InvalidHeader(format!(
                "expected an MMDDYYYY date, found {:?}",
                String::from_utf8_lossy(dateish)
            ))
        })?;

    let month = ascii_int::parse::<u32>(&digits[0..2]);
    let day = ascii_int::parse::<u32>(&digits[2..4]);
    let year = ascii_int::parse::<i32>(&digits[4..8]);

    month
        .zip(day)
        .zip(year)
        .and_then(|((m, d), y)| NaiveDate::from_ymd_opt(y, m, d))
        .ok_or_else(|| {
            TaqError::InvalidHeader(format!(
                "{:?} is not a calendar date",
                String::from_utf8_lossy(digits)
            ))
        })
}

/// Computes the file's local midnight once; every record time is an offset from it.
fn local_midnight(date: NaiveDate, tz: Tz) -> Result<f64, TaqError> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| TaqError::InvalidHeader(format!("no midnight on {}", date)))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp() as f64)
        .ok_or_else(|| TaqError::InvalidHeader(format!("midnight of {} does not exist in {}", date, tz)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    #[test]
    fn test_date_and_count_header() {
        let meta = parse_header(b"01022015:0000000001  \r\n", New_York).unwrap();
        assert_eq!(meta.date, NaiveDate::from_ymd_opt(2015, 1, 2).unwrap());
        assert_eq!(meta.declared_rows, Some(1));
        assert_eq!(meta.line_width, 23);
        // 2015-01-02T00:00:00-05:00
        assert_eq!(meta.midnight_epoch, 1_420_174_800.0);
    }

    #[test]
    fn test_date_only_header() {
        let meta = parse_header(b"02062014          \r\n", New_York).unwrap();
        assert_eq!(meta.date, NaiveDate::from_ymd_opt(2014, 2, 6).unwrap());
        assert_eq!(meta.declared_rows, None);
    }

    #[test]
    fn test_unparseable_count_degrades_to_date_only() {
        let meta = parse_header(b"01022015:00000x0001\r\n", New_York).unwrap();
        assert_eq!(meta.date, NaiveDate::from_ymd_opt(2015, 1, 2).unwrap());
        assert_eq!(meta.declared_rows, None);

        let meta = parse_header(b"01022015:     \r\n", New_York).unwrap();
        assert_eq!(meta.declared_rows, None);
    }

    #[test]
    fn test_summer_midnight_uses_daylight_offset() {
        let meta = parse_header(b"07012015\r\n", New_York).unwrap();
        // 2015-07-01T00:00:00-04:00
        assert_eq!(meta.midnight_epoch, 1_435_723_200.0);
    }

    #[test]
    fn test_bad_date_is_fatal() {
        for line in [&b"\r\n"[..], b"hello world\r\n", b"13452015:0000000001\r\n"] {
            let err = parse_header(line, New_York).unwrap_err();
            assert!(matches!(err, TaqError::InvalidHeader(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_record_timestamp() {
        let meta = parse_header(b"01022015:0000000001\r\n", New_York).unwrap();
        let ts = meta.timestamp(9, 30, 1_500);
        assert_eq!(ts, 1_420_174_800.0 + 9.0 * 3600.0 + 30.0 * 60.0 + 1.5);
    }

    #[test]
    fn test_format_header_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
        let line = format_header(date, Some(1), 23).unwrap();
        assert_eq!(line, b"01022015:0000000001  \r\n".to_vec());
        let meta = parse_header(&line, New_York).unwrap();
        assert_eq!((meta.date, meta.declared_rows), (date, Some(1)));

        assert!(format_header(date, Some(1), 12).is_err());
    }
}
