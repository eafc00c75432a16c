//! Post-capture split of a unified capture log into left and right logs

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use tracing::{debug, info};

use crate::errors::CaptureError;
use crate::packet::Side;

/// Row counts produced by one split
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitSummary {
    pub left: usize,
    pub right: usize,
    /// Rows whose device name ends in neither `L` nor `R`
    pub dropped: usize,
}

impl SplitSummary {
    pub fn total(&self) -> usize {
        self.left + self.right + self.dropped
    }
}

/// Split `input` into `output_left` and `output_right`
///
/// The header row is copied verbatim into both outputs. Each data row is routed
/// by the last character of its first field; rows matching neither side are
/// dropped and counted. Both outputs are truncated before writing.
pub fn split_log(
    input: &Path,
    output_left: &Path,
    output_right: &Path,
) -> Result<SplitSummary, CaptureError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(input)
        .map_err(|e| CaptureError::csv(input, e))?;

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(|e| CaptureError::csv(input, e))?,
        None => {
            return Err(CaptureError::MissingHeader {
                path: input.to_path_buf(),
            })
        }
    };

    let mut left = create_writer(output_left)?;
    let mut right = create_writer(output_right)?;
    write(&mut left, output_left, &header)?;
    write(&mut right, output_right, &header)?;

    let mut summary = SplitSummary::default();
    for record in records {
        let record = record.map_err(|e| CaptureError::csv(input, e))?;
        let side = record.get(0).and_then(Side::from_device_name);
        match side {
            Some(Side::Left) => {
                write(&mut left, output_left, &record)?;
                summary.left += 1;
            }
            Some(Side::Right) => {
                write(&mut right, output_right, &record)?;
                summary.right += 1;
            }
            None => {
                debug!("Dropping row without side marker: {:?}", record.get(0));
                summary.dropped += 1;
            }
        }
    }

    left.flush().map_err(|e| CaptureError::io(output_left, e))?;
    right.flush().map_err(|e| CaptureError::io(output_right, e))?;

    info!(
        "Split {} into {} left and {} right rows",
        input.display(),
        summary.left,
        summary.right
    );
    Ok(summary)
}

fn create_writer(path: &Path) -> Result<Writer<std::fs::File>, CaptureError> {
    WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| CaptureError::csv(path, e))
}

fn write(
    writer: &mut Writer<std::fs::File>,
    path: &Path,
    record: &StringRecord,
) -> Result<(), CaptureError> {
    writer
        .write_record(record)
        .map_err(|e| CaptureError::csv(path, e))
}
