//! Operator device selection

use crate::error::{CliError, Result};

/// Parse comma-separated device indices into a sorted, deduplicated list
///
/// Every index must be below `count`. A blank answer selects nothing.
pub fn parse_selection(input: &str, count: usize) -> Result<Vec<usize>> {
    let mut selected = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let index: usize = part
            .parse()
            .map_err(|_| CliError::Selection(format!("'{}' is not a device index", part)))?;
        if index >= count {
            return Err(CliError::Selection(format!(
                "index {} is out of range (0..{})",
                index, count
            )));
        }
        selected.push(index);
    }
    selected.sort_unstable();
    selected.dedup();
    Ok(selected)
}
