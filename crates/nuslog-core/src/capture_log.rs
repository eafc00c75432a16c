//! Append-only CSV capture log

use std::fs::OpenOptions;
use std::path::Path;

use csv::WriterBuilder;
use tracing::debug;

use crate::errors::CaptureError;
use crate::packet::CaptureRow;

/// Header row shared by the unified capture log and both split logs
pub const CAPTURE_HEADER: [&str; 8] = [
    "Device Name",
    "miliBuffer",
    "sensorBuffer_1",
    "sensorBuffer_2",
    "sensorBuffer_3",
    "sensorBuffer_4",
    "sensorBuffer_5",
    "sensorBuffer_6",
];

/// Append rows to the capture log at `path`
///
/// The file is created if needed. The header is written only when the file is
/// new or empty. All rows of one call are written and flushed together, so rows
/// from concurrent sessions interleave per call, never inside one.
pub fn append_rows(path: &Path, rows: &[CaptureRow]) -> Result<usize, CaptureError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CaptureError::io(path, e))?;

    let is_empty = file
        .metadata()
        .map_err(|e| CaptureError::io(path, e))?
        .len()
        == 0;

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    if is_empty {
        writer
            .write_record(CAPTURE_HEADER)
            .map_err(|e| CaptureError::csv(path, e))?;
        debug!("Created capture log {}", path.display());
    }

    for row in rows {
        writer
            .write_record(row.fields())
            .map_err(|e| CaptureError::csv(path, e))?;
    }

    writer.flush().map_err(|e| CaptureError::io(path, e))?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(name: &str, timestamp: u32) -> CaptureRow {
        CaptureRow {
            device_name: name.to_string(),
            timestamp,
            samples: [1, 2, 3, -4, -5, -6],
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.csv");

        append_rows(&path, &[row("IMU1L", 10), row("IMU1L", 20)]).unwrap();
        append_rows(&path, &[row("IMU2R", 30)]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                concat!(
                    "Device Name,miliBuffer,sensorBuffer_1,sensorBuffer_2,sensorBuffer_3,",
                    "sensorBuffer_4,sensorBuffer_5,sensorBuffer_6"
                ),
                "IMU1L,10,1,2,3,-4,-5,-6",
                "IMU1L,20,1,2,3,-4,-5,-6",
                "IMU2R,30,1,2,3,-4,-5,-6",
            ]
        );
    }

    #[test]
    fn test_existing_empty_file_gets_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.csv");
        std::fs::write(&path, "").unwrap();

        append_rows(&path, &[row("IMU1L", 10)]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Device Name,"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_empty_append_still_creates_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.csv");

        assert_eq!(append_rows(&path, &[]).unwrap(), 0);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("capture.csv");

        let err = append_rows(&path, &[row("IMU1L", 10)]).unwrap_err();
        assert!(matches!(err, CaptureError::Io { .. }));
    }
}
