//! Capture state owned by the command controller

use crate::paths::CapturePaths;

/// Whether decoded packets are persisted, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureState {
    logging_active: bool,
    paths: CapturePaths,
}

impl CaptureState {
    /// Inactive state pointing at `paths`
    pub fn new(paths: CapturePaths) -> Self {
        Self {
            logging_active: false,
            paths,
        }
    }

    pub fn is_logging(&self) -> bool {
        self.logging_active
    }

    pub fn paths(&self) -> &CapturePaths {
        &self.paths
    }

    /// Rebind the paths and activate logging
    ///
    /// Returns the previous paths when logging was already active into a
    /// different file; that capture is abandoned without being split. A restart
    /// within the same second keeps appending to the same file.
    pub fn start(&mut self, paths: CapturePaths) -> Option<CapturePaths> {
        let was_active = self.logging_active;
        let previous = std::mem::replace(&mut self.paths, paths);
        self.logging_active = true;
        (was_active && previous.active != self.paths.active).then_some(previous)
    }

    /// Deactivate logging, returning whether it was active
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.logging_active, false)
    }

    /// Capture log a decoded packet should be written to, if logging is active
    pub fn sink(&self) -> Option<&std::path::Path> {
        self.logging_active.then_some(self.paths.active.as_path())
    }
}
