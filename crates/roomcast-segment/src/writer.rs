//! One MP4 segment, encoded by an ffmpeg child process fed raw RGB frames.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Stdio};

use ffmpeg_sidecar::command::FfmpegCommand;
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::{SegmentError, SegmentResult};

/// Writes one segment file. Frames go in over ffmpeg's stdin as packed
/// rgb24; [`SegmentWriter::finalize`] closes the pipe, waits for the child,
/// and reports whether a playable file was produced.
pub struct SegmentWriter {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    path: PathBuf,
    width: u32,
    height: u32,
    frames_written: u64,
}

impl SegmentWriter {
    /// Spawn ffmpeg and open a new segment at `path`.
    ///
    /// All frames written to this segment must match `width` x `height`;
    /// the caller resizes before handing frames down.
    pub fn open(
        path: &Path,
        width: u32,
        height: u32,
        frame_rate: u32,
    ) -> SegmentResult<SegmentWriter> {
        let mut command = FfmpegCommand::new();
        command
            .args(["-f", "rawvideo"])
            .args(["-pix_fmt", "rgb24"])
            .args(["-s", &format!("{}x{}", width, height)])
            .args(["-r", &frame_rate.to_string()])
            .args(["-i", "-"])
            .args(["-c:v", "libx264"])
            .args(["-preset", "veryfast"])
            .args(["-pix_fmt", "yuv420p"])
            .args(["-movflags", "+faststart"])
            .arg("-y")
            .arg(path.to_string_lossy().as_ref());

        let inner = command.as_inner_mut();
        inner.stdin(Stdio::piped());
        inner.stdout(Stdio::null());
        inner.stderr(Stdio::null());

        let mut child = inner.spawn().map_err(|e| SegmentError::Spawn(e.to_string()))?;
        let stdin = child.stdin.take().ok_or(SegmentError::Stdin)?;

        info!(path = %path.display(), width, height, frame_rate, "Opened segment");

        Ok(SegmentWriter {
            child: Some(child),
            stdin: Some(stdin),
            path: path.to_path_buf(),
            width,
            height,
            frames_written: 0,
        })
    }

    /// Append one frame to the segment.
    pub fn write_frame(&mut self, frame: &RgbImage) -> SegmentResult<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(SegmentError::DimensionMismatch {
                got_width: frame.width(),
                got_height: frame.height(),
                want_width: self.width,
                want_height: self.height,
            });
        }

        let stdin = self.stdin.as_mut().ok_or(SegmentError::Stdin)?;
        stdin.write_all(frame.as_raw())?;
        self.frames_written += 1;
        Ok(())
    }

    /// Number of frames appended so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Path of the segment file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the pipe, wait for ffmpeg, and return the finished file.
    ///
    /// Returns `Ok(Some(path))` only when ffmpeg exited cleanly and the file
    /// exists with non-zero length; an empty segment (no frames reached the
    /// encoder) yields `Ok(None)` rather than an upload candidate.
    pub fn finalize(mut self) -> SegmentResult<Option<PathBuf>> {
        drop(self.stdin.take());

        if let Some(mut child) = self.child.take() {
            let status = child
                .wait()
                .map_err(|e| SegmentError::Finalize(e.to_string()))?;
            if !status.success() {
                return Err(SegmentError::Finalize(format!(
                    "exit code {:?}",
                    status.code()
                )));
            }
        }

        let produced = std::fs::metadata(&self.path)
            .map(|meta| meta.len() > 0)
            .unwrap_or(false);

        if produced {
            debug!(path = %self.path.display(), frames = self.frames_written, "Finalized segment");
            Ok(Some(self.path.clone()))
        } else {
            warn!(path = %self.path.display(), "Segment finalized without output");
            Ok(None)
        }
    }
}

impl Drop for SegmentWriter {
    fn drop(&mut self) {
        // Finalize not called: close the pipe and reap the child so an
        // aborted session does not leave a zombie ffmpeg behind.
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn rejects_mismatched_frame_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.mp4");
        // `cat` stands in for ffmpeg-shaped stdin handling without requiring
        // an encoder on the test host.
        let mut child = std::process::Command::new("cat")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .unwrap();
        let stdin = child.stdin.take().unwrap();
        let mut writer = SegmentWriter {
            child: Some(child),
            stdin: Some(stdin),
            path,
            width: 640,
            height: 480,
            frames_written: 0,
        };

        let wrong = RgbImage::from_pixel(320, 240, Rgb([0, 0, 0]));
        match writer.write_frame(&wrong) {
            Err(SegmentError::DimensionMismatch { got_width, .. }) => {
                assert_eq!(got_width, 320);
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
        assert_eq!(writer.frames_written(), 0);
    }

    #[test]
    fn finalize_without_output_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never-written.mp4");
        let writer = SegmentWriter {
            child: None,
            stdin: None,
            path,
            width: 640,
            height: 480,
            frames_written: 0,
        };
        assert!(writer.finalize().unwrap().is_none());
    }

    #[test]
    fn finalize_returns_the_path_of_a_produced_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("produced.mp4");
        std::fs::write(&path, b"not empty").unwrap();
        let writer = SegmentWriter {
            child: None,
            stdin: None,
            path: path.clone(),
            width: 640,
            height: 480,
            frames_written: 3,
        };
        assert_eq!(writer.finalize().unwrap(), Some(path));
    }
}
