//! Capture file naming

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::packet::Side;

/// Timestamp format used in capture file names
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Date-time format sent to peripherals for clock synchronization
pub const TIME_SYNC_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Unified log and split log paths for one capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturePaths {
    pub active: PathBuf,
    pub left: PathBuf,
    pub right: PathBuf,
}

impl CapturePaths {
    /// Paths for a capture started at `started`
    ///
    /// `<dir>/<prefix>_<stamp>.csv`, `<dir>/<stamp>_L.csv` and `<dir>/<stamp>_R.csv`.
    pub fn at(output_dir: &Path, prefix: &str, started: NaiveDateTime) -> Self {
        let stamp = started.format(FILE_STAMP_FORMAT).to_string();
        Self {
            active: output_dir.join(format!("{}_{}.csv", prefix, stamp)),
            left: output_dir.join(side_file_name(&stamp, Side::Left)),
            right: output_dir.join(side_file_name(&stamp, Side::Right)),
        }
    }

    /// Split outputs next to an existing unified log
    ///
    /// A leading `<prefix>_` is removed from the file stem, so a log written by
    /// the capture loop maps to the same split names the capture loop uses.
    pub fn for_existing_log(input: &Path, prefix: &str) -> Self {
        let dir = input.parent().unwrap_or_else(|| Path::new(""));
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = stem
            .strip_prefix(&format!("{}_", prefix))
            .unwrap_or(&stem)
            .to_string();
        Self {
            active: input.to_path_buf(),
            left: dir.join(side_file_name(&base, Side::Left)),
            right: dir.join(side_file_name(&base, Side::Right)),
        }
    }

    pub fn split_path(&self, side: Side) -> &Path {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

fn side_file_name(base: &str, side: Side) -> String {
    format!("{}_{}.csv", base, side.suffix())
}

/// Clock synchronization message for `now`
pub fn time_sync_message(now: NaiveDateTime) -> String {
    now.format(TIME_SYNC_FORMAT).to_string()
}
