//! Per-cycle grabs across the selected monitors.

use image::DynamicImage;
use tracing::{debug, instrument};
use xcap::Monitor;

use crate::{CaptureError, CaptureResult, FrameSource, RawFrame};

/// Holds capture handles for the monitors selected for a session.
///
/// Handles are resolved once at session start; the selection is immutable
/// for the lifetime of the recording.
#[derive(Debug)]
pub struct MonitorGrabber {
    monitors: Vec<(usize, Monitor)>,
}

impl MonitorGrabber {
    /// Resolve capture handles for the given zero-based monitor indexes.
    #[instrument(name = "open_grabber")]
    pub fn open(indexes: &[usize]) -> CaptureResult<Self> {
        if indexes.is_empty() {
            return Err(CaptureError::NoSources);
        }

        let mut all: Vec<Option<Monitor>> = Monitor::all()
            .map_err(|e| CaptureError::Enumeration(e.to_string()))?
            .into_iter()
            .map(Some)
            .collect();

        let mut monitors = Vec::with_capacity(indexes.len());
        for &index in indexes {
            let handle = all
                .get_mut(index)
                .and_then(Option::take)
                .ok_or(CaptureError::SourceNotFound(index))?;
            monitors.push((index, handle));
        }

        debug!(sources = monitors.len(), "Capture handles resolved");
        Ok(Self { monitors })
    }
}

impl FrameSource for MonitorGrabber {
    fn capture(&mut self) -> CaptureResult<Vec<RawFrame>> {
        let mut frames = Vec::with_capacity(self.monitors.len());

        for (index, monitor) in &self.monitors {
            let rgba = monitor
                .capture_image()
                .map_err(|e| CaptureError::Grab(format!("monitor {index}: {e}")))?;
            let rgb = DynamicImage::ImageRgba8(rgba).into_rgb8();
            frames.push(RawFrame::new(rgb, *index));
        }

        Ok(frames)
    }

    fn source_count(&self) -> usize {
        self.monitors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_rejects_empty_selection() {
        match MonitorGrabber::open(&[]) {
            Err(CaptureError::NoSources) => {}
            other => panic!("expected NoSources, got {other:?}"),
        }
    }
}
