//! One recording session: capture worker, rotation timer, live client.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::{Local, NaiveDateTime};
use crossbeam_channel::Sender;
use image::RgbImage;
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use roomcast_capture::{FrameSource, MonitorGrabber};
use roomcast_compose::{compose_grid, draw_identity_overlay, encode_jpeg, shrink_to_fit};
use roomcast_ipc::{RecorderConfig, RecorderEvent, SessionStats};
use roomcast_segment::{segment_file_name, SegmentWriter};
use roomcast_transport::{ConnectionWatch, LiveClient, LiveFrame};
use roomcast_upload::{
    DriveConfig, DriveStore, OriginStore, SegmentMeta, SegmentStore, UploadPipeline,
};

use crate::stats::StatsTracker;

/// Capture failures tolerated back to back before the worker gives up.
const MAX_CONSECUTIVE_CAPTURE_FAILURES: u32 = 30;

/// How often the rotation timer checks the age of the open segment.
const ROTATION_POLL: Duration = Duration::from_millis(250);

/// How many sent frames between progress log lines.
const SENT_LOG_EVERY: u64 = 25;

/// The active segment and its part bookkeeping. One lock guards both so
/// rotation and the capture worker never race on the writer.
pub(crate) struct SegmentSlot {
    writer: Option<SegmentWriter>,
    current_part: u32,
    next_part: u32,
    opened_at: Option<Instant>,
}

impl SegmentSlot {
    fn new() -> Self {
        Self {
            writer: None,
            current_part: 0,
            next_part: 1,
            opened_at: None,
        }
    }

    /// Hand out the next part number. Part numbers only ever move forward,
    /// whether or not the previous part uploaded.
    pub(crate) fn allocate_part(&mut self) -> u32 {
        let part = self.next_part;
        self.next_part += 1;
        self.current_part = part;
        part
    }
}

/// State shared between the capture worker, the rotation timer, and the
/// owning session.
pub(crate) struct SessionShared {
    slot: Mutex<SegmentSlot>,
    stats: StatsTracker,
    should_stop: AtomicBool,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            slot: Mutex::new(SegmentSlot::new()),
            stats: StatsTracker::new(),
            should_stop: AtomicBool::new(false),
        }
    }
}

/// A running recording session.
pub struct Session {
    shared: Arc<SessionShared>,
    worker: Option<JoinHandle<()>>,
    timer: Option<JoinHandle<()>>,
    live: Option<LiveClient>,
    temp_dir: PathBuf,
    pipeline: Arc<UploadPipeline>,
    config: RecorderConfig,
    event_tx: Sender<RecorderEvent>,
    last_upload_success: Arc<AtomicBool>,
}

impl Session {
    /// Open capture, connect the live view, and start the worker threads.
    #[instrument(name = "session_start", skip_all, fields(room = %config.room, username = %config.username))]
    pub fn start(
        config: RecorderConfig,
        event_tx: Sender<RecorderEvent>,
        last_upload_success: Arc<AtomicBool>,
    ) -> Result<Self, String> {
        if config.room.trim().is_empty() || config.username.trim().is_empty() {
            return Err("room and username must be set".to_string());
        }

        let monitors = if config.monitors.is_empty() {
            vec![0]
        } else {
            config.monitors.clone()
        };
        let grabber =
            MonitorGrabber::open(&monitors).map_err(|e| format!("Capture init failed: {}", e))?;

        let pipeline = Arc::new(build_pipeline(&config)?);

        Self::launch(
            Box::new(grabber),
            config,
            pipeline,
            event_tx,
            last_upload_success,
        )
    }

    /// Spawn the worker threads over an already-resolved frame source and
    /// upload pipeline.
    pub(crate) fn launch(
        source: Box<dyn FrameSource>,
        config: RecorderConfig,
        pipeline: Arc<UploadPipeline>,
        event_tx: Sender<RecorderEvent>,
        last_upload_success: Arc<AtomicBool>,
    ) -> Result<Self, String> {
        // Sessions started within the same second must not share a
        // directory.
        static SESSION_SEQ: AtomicU32 = AtomicU32::new(0);
        let seq = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);

        let session_start = Local::now().naive_local();
        let temp_dir = std::env::temp_dir().join(format!(
            "roomcast_{}_{}",
            session_start.format("%Y%m%d_%H%M%S"),
            seq
        ));
        std::fs::create_dir_all(&temp_dir)
            .map_err(|e| format!("Temp dir creation failed: {}", e))?;
        info!(path = %temp_dir.display(), "Session temp directory ready");

        // The live view is best-effort: a bad relay URL or a refused
        // connection leaves the session recording without it.
        let (live, live_tx) = match LiveClient::new(
            config.server_url.clone(),
            config.api_url.clone(),
            config.room.clone(),
            config.username.clone(),
        ) {
            Ok(mut client) => match client.connect() {
                Ok(tx) => {
                    let watch = client.watch();
                    (Some(client), Some((tx, watch)))
                }
                Err(e) => {
                    warn!("Live view disabled: {}", e);
                    (Some(client), None)
                }
            },
            Err(e) => {
                warn!("Live view disabled: {}", e);
                (None, None)
            }
        };

        let shared = Arc::new(SessionShared::new());
        shared.stats.start();

        let worker = {
            let shared = Arc::clone(&shared);
            let pipeline = Arc::clone(&pipeline);
            let event_tx = event_tx.clone();
            let config = config.clone();
            let temp_dir = temp_dir.clone();
            let last_upload_success = Arc::clone(&last_upload_success);
            thread::spawn(move || {
                capture_loop(
                    source,
                    config,
                    shared,
                    pipeline,
                    live_tx,
                    event_tx,
                    temp_dir,
                    session_start,
                    last_upload_success,
                );
            })
        };

        let timer = {
            let shared = Arc::clone(&shared);
            let pipeline = Arc::clone(&pipeline);
            let event_tx = event_tx.clone();
            let config = config.clone();
            let last_upload_success = Arc::clone(&last_upload_success);
            let interval = Duration::from_secs(config.segment_secs.max(1));
            thread::spawn(move || {
                rotation_loop(
                    shared,
                    pipeline,
                    config,
                    event_tx,
                    last_upload_success,
                    interval,
                );
            })
        };

        Ok(Self {
            shared,
            worker: Some(worker),
            timer: Some(timer),
            live,
            temp_dir,
            pipeline,
            config,
            event_tx,
            last_upload_success,
        })
    }

    /// Current session statistics.
    pub fn stats(&self) -> SessionStats {
        self.shared.stats.snapshot()
    }

    /// Directory the session writes segments into.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// True when the capture worker has exited on its own, e.g. after
    /// giving up on repeated capture failures.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| h.is_finished())
    }

    /// Stop the session. Blocks until the final segment has been finalized
    /// and its upload has resolved.
    #[instrument(name = "session_stop", skip(self))]
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.worker.is_none() && self.timer.is_none() {
            return;
        }

        self.shared.should_stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.timer.take() {
            let _ = handle.join();
        }

        // Both threads are joined, so no rotation is in flight: the final
        // rotation below and the cleanup decision both see the outcome of
        // the session's last upload.
        rotate_current(
            &self.shared,
            &self.pipeline,
            &self.config,
            &self.event_tx,
            &self.last_upload_success,
        );

        // Remove the temp directory only when its contents are known
        // stored: either the session produced nothing, or the last upload
        // succeeded.
        let produced = self.shared.slot.lock().next_part > 1;
        if !produced || self.last_upload_success.load(Ordering::SeqCst) {
            match std::fs::remove_dir_all(&self.temp_dir) {
                Ok(()) => debug!(path = %self.temp_dir.display(), "Session temp directory removed"),
                Err(e) => warn!(path = %self.temp_dir.display(), "Temp cleanup failed: {}", e),
            }
        } else {
            info!(path = %self.temp_dir.display(), "Retained segments left in temp directory");
        }

        if let Some(mut live) = self.live.take() {
            let _ = live.disconnect();
        }

        let snapshot = self.shared.stats.snapshot();
        info!(
            frames = snapshot.frames,
            sent = snapshot.frames_sent,
            parts = snapshot.parts_uploaded,
            uptime = snapshot.uptime_seconds,
            "Session stopped"
        );
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Assemble the storage tiers in fallback order: Drive first when
/// credentials are configured, then the origin API server.
fn build_pipeline(config: &RecorderConfig) -> Result<UploadPipeline, String> {
    let timeout = Duration::from_secs(config.upload_timeout_secs.max(1));
    let mut stores: Vec<Box<dyn SegmentStore>> = Vec::new();

    if let Some(ref drive) = config.drive {
        let drive_config = DriveConfig {
            client_id: drive.client_id.clone(),
            client_secret: drive.client_secret.clone(),
            refresh_token: drive.refresh_token.clone(),
            root_folder_id: drive.root_folder_id.clone(),
        };
        match DriveStore::new(drive_config, timeout) {
            Ok(store) => stores.push(Box::new(store)),
            Err(e) => warn!("Drive tier unavailable: {}", e),
        }
    }

    let origin = OriginStore::new(config.api_url.clone(), timeout)
        .map_err(|e| format!("Origin store init failed: {}", e))?;
    stores.push(Box::new(origin));

    Ok(UploadPipeline::new(stores))
}

/// Take the open segment (if any), finalize it, and run it through the
/// upload pipeline. Called by the rotation timer on the segment interval,
/// by the worker when a write fails, and by the worker's drain tail; the
/// slot lock makes concurrent calls rotate exactly once.
fn rotate_current(
    shared: &SessionShared,
    pipeline: &UploadPipeline,
    config: &RecorderConfig,
    event_tx: &Sender<RecorderEvent>,
    last_upload_success: &AtomicBool,
) {
    let (writer, part) = {
        let mut slot = shared.slot.lock();
        slot.opened_at = None;
        let part = slot.current_part;
        (slot.writer.take(), part)
    };
    let Some(writer) = writer else {
        return;
    };

    let path = match writer.finalize() {
        Ok(Some(path)) => path,
        Ok(None) => {
            debug!(part, "Segment produced no file, nothing to upload");
            return;
        }
        Err(e) => {
            warn!(part, "Segment finalize failed: {}", e);
            let _ = event_tx.try_send(RecorderEvent::Error {
                recoverable: true,
                message: format!("Segment {} finalize failed: {}", part, e),
            });
            return;
        }
    };

    let meta = SegmentMeta {
        room: config.room.clone(),
        username: config.username.clone(),
        part_number: part,
    };
    let report = pipeline.upload(&meta, &path);
    last_upload_success.store(report.success, Ordering::SeqCst);

    let status = if report.success {
        shared.stats.record_part();
        match &report.link {
            Some(link) => format!("Part {} stored ({}): {}", part, report.tier.name(), link),
            None => format!("Part {} stored ({})", part, report.tier.name()),
        }
    } else {
        format!("Part {} retained locally at {}", part, path.display())
    };
    let _ = event_tx.try_send(RecorderEvent::Status(status));
    let _ = event_tx.try_send(RecorderEvent::SegmentUploaded(report));
}

/// Periodic flush: rotates the segment once it reaches the configured age.
/// The worker opens the next segment lazily on its next frame, so long
/// sessions rotate iteratively with no nesting.
fn rotation_loop(
    shared: Arc<SessionShared>,
    pipeline: Arc<UploadPipeline>,
    config: RecorderConfig,
    event_tx: Sender<RecorderEvent>,
    last_upload_success: Arc<AtomicBool>,
    interval: Duration,
) {
    while !shared.should_stop.load(Ordering::SeqCst) {
        thread::sleep(ROTATION_POLL);

        let due = shared
            .slot
            .lock()
            .opened_at
            .is_some_and(|opened| opened.elapsed() >= interval);
        if due {
            info!("Segment interval reached, rotating");
            rotate_current(
                &shared,
                &pipeline,
                &config,
                &event_tx,
                &last_upload_success,
            );
        }
    }
}

/// Open the segment writer if needed and append one frame. The caller
/// resized the frame; dimensions are fixed for the lifetime of a segment.
fn write_segment_frame(
    shared: &SessionShared,
    frame: &RgbImage,
    config: &RecorderConfig,
    temp_dir: &Path,
    session_start: NaiveDateTime,
) -> Result<(), String> {
    let mut slot = shared.slot.lock();

    if slot.writer.is_none() {
        let part = slot.allocate_part();
        let name = segment_file_name(&config.room, &config.username, session_start, part);
        let path = temp_dir.join(name);
        let writer = SegmentWriter::open(&path, frame.width(), frame.height(), config.frame_rate)
            .map_err(|e| e.to_string())?;
        slot.writer = Some(writer);
        slot.opened_at = Some(Instant::now());
    }

    if let Some(writer) = slot.writer.as_mut() {
        writer.write_frame(frame).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Main capture loop: grab, compose, record, forward, pace.
#[allow(clippy::too_many_arguments)]
pub(crate) fn capture_loop(
    mut source: Box<dyn FrameSource>,
    config: RecorderConfig,
    shared: Arc<SessionShared>,
    pipeline: Arc<UploadPipeline>,
    live: Option<(Sender<LiveFrame>, ConnectionWatch)>,
    event_tx: Sender<RecorderEvent>,
    temp_dir: PathBuf,
    session_start: NaiveDateTime,
    last_upload_success: Arc<AtomicBool>,
) {
    debug!("Capture loop starting");

    let frame_interval = Duration::from_nanos(1_000_000_000 / u64::from(config.frame_rate.max(1)));
    let mut consecutive_failures = 0u32;

    while !shared.should_stop.load(Ordering::SeqCst) {
        let cycle_start = Instant::now();

        let images: Vec<RgbImage> = match source.capture() {
            Ok(frames) => frames.into_iter().map(|frame| frame.image).collect(),
            Err(e) => {
                warn!("Capture failed: {}", e);
                Vec::new()
            }
        };

        if images.is_empty() {
            consecutive_failures += 1;
            if consecutive_failures >= MAX_CONSECUTIVE_CAPTURE_FAILURES {
                error!("Capture failed {} cycles in a row, stopping", consecutive_failures);
                let _ = event_tx.try_send(RecorderEvent::Error {
                    recoverable: true,
                    message: "Screen capture failed repeatedly".to_string(),
                });
                // Bring the rotation timer down with us; the owning
                // session notices the finished worker and stops.
                shared.should_stop.store(true, Ordering::SeqCst);
                break;
            }
            pace(cycle_start, frame_interval);
            continue;
        }
        consecutive_failures = 0;

        let composed = match compose_grid(&images) {
            Ok(composed) => composed,
            Err(e) => {
                warn!("Compose failed: {}", e);
                pace(cycle_start, frame_interval);
                continue;
            }
        };
        let mut composed = shrink_to_fit(composed, config.max_width, config.max_height);

        let label = format!("{} | {}", config.username, Local::now().format("%H:%M:%S"));
        if let Err(e) = draw_identity_overlay(&mut composed, &label) {
            warn!("Overlay failed: {}", e);
        }

        shared.stats.record_frame();

        // libx264 with yuv420p needs even dimensions; crop a single
        // row/column when the downscale produced an odd size.
        let target_w = composed.width() & !1;
        let target_h = composed.height() & !1;
        if target_w >= 2 && target_h >= 2 {
            let cropped;
            let recording: &RgbImage = if composed.dimensions() == (target_w, target_h) {
                &composed
            } else {
                cropped = image::imageops::crop_imm(&composed, 0, 0, target_w, target_h).to_image();
                &cropped
            };

            if let Err(e) =
                write_segment_frame(&shared, recording, &config, &temp_dir, session_start)
            {
                warn!("Segment write failed, rotating early: {}", e);
                rotate_current(&shared, &pipeline, &config, &event_tx, &last_upload_success);
            }
        }

        // Frames are only submitted while the relay connection is up; a
        // connecting or failed socket drops them here rather than queueing.
        if let Some((ref live_tx, ref watch)) = live {
            if watch.is_connected() {
                match encode_jpeg(&composed, config.jpeg_quality) {
                    Ok(jpeg) => {
                        if live_tx.try_send(LiveFrame {
                            jpeg: Bytes::from(jpeg),
                        })
                        .is_ok()
                        {
                            shared.stats.record_sent();
                            let sent = shared.stats.frames_sent();
                            if sent % SENT_LOG_EVERY == 0 {
                                let snapshot = shared.stats.snapshot();
                                info!(sent, fps = snapshot.fps, "Live frames forwarded");
                            }
                        }
                    }
                    Err(e) => warn!("JPEG encode failed: {}", e),
                }
            }
        }

        let _ = event_tx.try_send(RecorderEvent::Stats(shared.stats.snapshot()));

        pace(cycle_start, frame_interval);
    }

    // The final rotation and the temp-dir decision belong to the owning
    // session, after this thread and the timer have both been joined.
    debug!("Capture loop stopped");
}

fn pace(cycle_start: Instant, frame_interval: Duration) {
    let elapsed = cycle_start.elapsed();
    if elapsed < frame_interval {
        thread::sleep(frame_interval - elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use roomcast_capture::{CaptureResult, RawFrame};
    use roomcast_ipc::StorageTier;
    use roomcast_upload::{UploadError, UploadResult};
    use std::sync::atomic::AtomicU32;

    #[test]
    fn part_numbers_only_move_forward() {
        let mut slot = SegmentSlot::new();
        assert_eq!(slot.allocate_part(), 1);
        // A failed upload never rewinds the counter.
        assert_eq!(slot.allocate_part(), 2);
        assert_eq!(slot.allocate_part(), 3);
        assert_eq!(slot.current_part, 3);
    }

    #[test]
    fn rotate_without_an_open_segment_is_a_noop() {
        let shared = SessionShared::new();
        let pipeline = UploadPipeline::new(Vec::new());
        let config = RecorderConfig::default();
        let (event_tx, event_rx) = roomcast_ipc::event_channel();
        let flag = AtomicBool::new(false);

        rotate_current(&shared, &pipeline, &config, &event_tx, &flag);

        assert!(event_rx.try_recv().is_err());
        assert_eq!(shared.slot.lock().next_part, 1);
    }

    struct EmptySource {
        calls: Arc<AtomicU32>,
    }

    impl FrameSource for EmptySource {
        fn capture(&mut self) -> CaptureResult<Vec<RawFrame>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        fn source_count(&self) -> usize {
            1
        }
    }

    #[test]
    fn loop_paces_to_the_configured_frame_rate() {
        let calls = Arc::new(AtomicU32::new(0));
        let shared = Arc::new(SessionShared::new());
        shared.stats.start();
        let pipeline = Arc::new(UploadPipeline::new(Vec::new()));
        let (event_tx, _event_rx) = roomcast_ipc::event_channel();
        let temp = tempfile::tempdir().unwrap();
        let temp_dir = temp.path().join("session");
        std::fs::create_dir_all(&temp_dir).unwrap();

        let config = RecorderConfig {
            room: "standup".to_string(),
            username: "alice".to_string(),
            frame_rate: 20,
            ..RecorderConfig::default()
        };

        let source = EmptySource {
            calls: Arc::clone(&calls),
        };
        let worker = {
            let shared = Arc::clone(&shared);
            let dir = temp_dir.clone();
            thread::spawn(move || {
                capture_loop(
                    Box::new(source),
                    config,
                    shared,
                    pipeline,
                    None,
                    event_tx,
                    dir,
                    Local::now().naive_local(),
                    Arc::new(AtomicBool::new(false)),
                );
            })
        };

        thread::sleep(Duration::from_millis(500));
        shared.should_stop.store(true, Ordering::SeqCst);
        worker.join().unwrap();

        // 20 fps over ~500 ms lands near 10 cycles; allow generous jitter.
        let cycles = calls.load(Ordering::SeqCst);
        assert!((5..=20).contains(&cycles), "got {cycles} cycles");
        // Cleanup is the owning session's job, not the worker's.
        assert!(temp_dir.exists());
    }

    #[test]
    fn repeated_capture_failures_stop_the_worker() {
        let calls = Arc::new(AtomicU32::new(0));
        let shared = Arc::new(SessionShared::new());
        shared.stats.start();
        let pipeline = Arc::new(UploadPipeline::new(Vec::new()));
        let (event_tx, event_rx) = roomcast_ipc::event_channel();
        let temp = tempfile::tempdir().unwrap();

        let config = RecorderConfig {
            room: "standup".to_string(),
            username: "alice".to_string(),
            frame_rate: 1000,
            ..RecorderConfig::default()
        };

        capture_loop(
            Box::new(EmptySource {
                calls: Arc::clone(&calls),
            }),
            config,
            Arc::clone(&shared),
            pipeline,
            None,
            event_tx,
            temp.path().to_path_buf(),
            Local::now().naive_local(),
            Arc::new(AtomicBool::new(false)),
        );

        assert_eq!(calls.load(Ordering::SeqCst), MAX_CONSECUTIVE_CAPTURE_FAILURES);
        // The worker takes the rotation timer down with it.
        assert!(shared.should_stop.load(Ordering::SeqCst));
        let saw_error = std::iter::from_fn(|| event_rx.try_recv().ok())
            .any(|event| matches!(event, RecorderEvent::Error { .. }));
        assert!(saw_error);
    }

    struct SolidSource;

    impl FrameSource for SolidSource {
        fn capture(&mut self) -> CaptureResult<Vec<RawFrame>> {
            let image = RgbImage::from_pixel(64, 64, Rgb([40, 90, 200]));
            Ok(vec![RawFrame::new(image, 0)])
        }

        fn source_count(&self) -> usize {
            1
        }
    }

    /// Store double that takes a while to resolve, records whether the file
    /// was still on disk when `put` ran, and succeeds or fails on demand.
    struct SlowStore {
        delay: Duration,
        succeed: bool,
        puts: Arc<AtomicU32>,
        resolved: Arc<AtomicBool>,
        missing_file: Arc<AtomicBool>,
    }

    impl SegmentStore for SlowStore {
        fn tier(&self) -> StorageTier {
            StorageTier::Origin
        }

        fn put(&self, _meta: &SegmentMeta, path: &Path) -> UploadResult<Option<String>> {
            if !path.exists() {
                self.missing_file.store(true, Ordering::SeqCst);
            }
            thread::sleep(self.delay);
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.resolved.store(true, Ordering::SeqCst);
            if self.succeed {
                Ok(None)
            } else {
                Err(UploadError::Rejected {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            }
        }
    }

    #[test]
    fn stop_blocks_until_the_final_upload_resolves() {
        let puts = Arc::new(AtomicU32::new(0));
        let resolved = Arc::new(AtomicBool::new(false));
        let missing_file = Arc::new(AtomicBool::new(false));
        let pipeline = Arc::new(UploadPipeline::new(vec![Box::new(SlowStore {
            delay: Duration::from_millis(200),
            succeed: true,
            puts: Arc::clone(&puts),
            resolved: Arc::clone(&resolved),
            missing_file: Arc::clone(&missing_file),
        })]));
        let (event_tx, _event_rx) = roomcast_ipc::event_channel();

        let config = RecorderConfig {
            room: "standup".to_string(),
            username: "alice".to_string(),
            frame_rate: 30,
            ..RecorderConfig::default()
        };

        let session = Session::launch(
            Box::new(SolidSource),
            config,
            pipeline,
            event_tx,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        let temp_dir = session.temp_dir().to_path_buf();

        // Let a few frames reach the encoder, then stop mid-segment.
        thread::sleep(Duration::from_millis(400));
        session.stop();

        assert!(
            resolved.load(Ordering::SeqCst),
            "stop returned before the upload resolved"
        );
        assert_eq!(puts.load(Ordering::SeqCst), 1);
        assert!(!missing_file.load(Ordering::SeqCst));
        // The upload succeeded, so the temp directory is gone.
        assert!(!temp_dir.exists());
    }

    #[test]
    fn failed_upload_keeps_the_segment_through_stop() {
        let puts = Arc::new(AtomicU32::new(0));
        let resolved = Arc::new(AtomicBool::new(false));
        let missing_file = Arc::new(AtomicBool::new(false));
        let pipeline = Arc::new(UploadPipeline::new(vec![Box::new(SlowStore {
            delay: Duration::from_millis(500),
            succeed: false,
            puts: Arc::clone(&puts),
            resolved: Arc::clone(&resolved),
            missing_file: Arc::clone(&missing_file),
        })]));
        let (event_tx, _event_rx) = roomcast_ipc::event_channel();

        let config = RecorderConfig {
            room: "standup".to_string(),
            username: "alice".to_string(),
            frame_rate: 30,
            segment_secs: 1,
            ..RecorderConfig::default()
        };

        let session = Session::launch(
            Box::new(SolidSource),
            config,
            pipeline,
            event_tx,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        let temp_dir = session.temp_dir().to_path_buf();

        // Run past the segment interval so the timer's rotation is mid
        // upload when stop arrives.
        thread::sleep(Duration::from_millis(1400));
        session.stop();

        assert!(
            !missing_file.load(Ordering::SeqCst),
            "segment file vanished while its upload was in flight"
        );
        assert!(puts.load(Ordering::SeqCst) >= 1);
        // Every upload failed, so the segments are retained on disk.
        assert!(temp_dir.exists());
        let retained = std::fs::read_dir(&temp_dir).unwrap().count();
        assert!(retained >= 1, "expected retained segment files");
        let _ = std::fs::remove_dir_all(&temp_dir);
    }
}
