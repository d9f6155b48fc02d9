//! Main recorder orchestrator.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use tracing::{debug, error, info, instrument, warn};

use roomcast_capture::enumerate_monitors;
use roomcast_ipc::{
    RecorderCommand, RecorderConfig, RecorderEvent, RecorderState, SessionStats, StopReason,
};

use crate::session::Session;

/// The recorder engine: owns the session and serves the command channel.
pub struct Recorder {
    command_rx: Receiver<RecorderCommand>,
    event_tx: Sender<RecorderEvent>,
    state: Arc<RwLock<RecorderState>>,
    session: Option<Session>,
    last_upload_success: Arc<AtomicBool>,
    previous_temp: Option<PathBuf>,
}

impl Recorder {
    /// Create a new recorder.
    pub fn new(command_rx: Receiver<RecorderCommand>, event_tx: Sender<RecorderEvent>) -> Self {
        Self {
            command_rx,
            event_tx,
            state: Arc::new(RwLock::new(RecorderState::Idle)),
            session: None,
            last_upload_success: Arc::new(AtomicBool::new(false)),
            previous_temp: None,
        }
    }

    /// Run the recorder (blocking).
    #[instrument(name = "recorder_run", skip(self))]
    pub fn run(&mut self) {
        info!("Recorder starting");
        self.send_event(RecorderEvent::Ready);

        loop {
            match self.command_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(command) => {
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    self.reap_finished_session();
                }
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    info!("Command channel disconnected, shutting down");
                    self.stop_session(StopReason::UserRequested);
                    break;
                }
            }
        }

        info!("Recorder stopped");
    }

    /// Handle a command. Returns false if the recorder should exit.
    fn handle_command(&mut self, command: RecorderCommand) -> bool {
        debug!(?command, "Handling command");

        match command {
            RecorderCommand::Start { config } => self.start_session(config),
            RecorderCommand::Stop => self.stop_session(StopReason::UserRequested),
            RecorderCommand::GetMonitors => self.send_monitors(),
            RecorderCommand::GetState => self.send_state(),
            RecorderCommand::Shutdown => {
                self.stop_session(StopReason::UserRequested);
                self.send_event(RecorderEvent::Shutdown);
                return false;
            }
        }

        true
    }

    /// Start a recording session.
    #[instrument(name = "start_session", skip(self, config))]
    fn start_session(&mut self, config: RecorderConfig) {
        // Idempotent: ignore if already starting or recording
        {
            let state = self.state.read();
            if state.is_starting() || state.is_recording() {
                debug!("Already starting or recording, ignoring start command");
                return;
            }
        }

        info!("Starting session");
        self.transition_to(RecorderState::Starting);

        // A leftover temp dir from the previous session is removed only
        // when that session's last upload succeeded; otherwise it holds
        // retained segments.
        if let Some(dir) = self.previous_temp.take() {
            if self.last_upload_success.load(Ordering::SeqCst) && dir.exists() {
                match std::fs::remove_dir_all(&dir) {
                    Ok(()) => debug!(path = %dir.display(), "Removed stale temp directory"),
                    Err(e) => warn!(path = %dir.display(), "Stale temp cleanup failed: {}", e),
                }
            }
        }

        match Session::start(
            config.clone(),
            self.event_tx.clone(),
            Arc::clone(&self.last_upload_success),
        ) {
            Ok(session) => {
                self.previous_temp = Some(session.temp_dir().to_path_buf());
                self.session = Some(session);
                self.transition_to(RecorderState::Recording {
                    config,
                    stats: SessionStats::default(),
                });
                info!("Session started");
            }
            Err(e) => {
                error!("Session start failed: {}", e);
                self.transition_to(RecorderState::Error {
                    message: e,
                    recoverable: true,
                });
            }
        }
    }

    /// Stop the session. Blocks until the final segment upload resolves.
    #[instrument(name = "stop_session", skip(self))]
    fn stop_session(&mut self, reason: StopReason) {
        // Idempotent: ignore if already idle or stopping
        {
            let state = self.state.read();
            if state.is_idle() || state.is_stopping() {
                debug!("Already idle or stopping, ignoring stop command");
                return;
            }
        }

        info!(?reason, "Stopping session");
        self.transition_to(RecorderState::Stopping {
            reason: reason.clone(),
        });

        if let Some(session) = self.session.take() {
            session.stop();
        }

        self.transition_to(RecorderState::Idle);
        self.send_event(RecorderEvent::Status(reason.message()));
        info!("Session stopped");
    }

    /// Fold a session whose capture worker exited on its own (repeated
    /// capture failures) back to idle, so state queries stop reporting a
    /// live recording over dead threads.
    fn reap_finished_session(&mut self) {
        let worker_done = self.session.as_ref().is_some_and(|s| s.is_finished());
        if worker_done && self.state.read().is_recording() {
            warn!("Capture worker exited unexpectedly, stopping session");
            self.stop_session(StopReason::CaptureFailed {
                message: "Screen capture failed repeatedly".to_string(),
            });
        }
    }

    fn send_monitors(&self) {
        match enumerate_monitors() {
            Ok(monitors) => self.send_event(RecorderEvent::Monitors(monitors)),
            Err(e) => {
                warn!("Monitor enumeration failed: {}", e);
                self.send_event(RecorderEvent::Error {
                    recoverable: true,
                    message: format!("Monitor enumeration failed: {}", e),
                });
            }
        }
    }

    fn send_state(&self) {
        let mut state = self.state.read().clone();
        if let Some(session) = self.session.as_ref() {
            if let RecorderState::Recording { ref mut stats, .. } = state {
                *stats = session.stats();
            }
        }
        self.send_event(RecorderEvent::StateChanged {
            previous: Box::new(state.clone()),
            current: Box::new(state),
        });
    }

    fn transition_to(&self, new_state: RecorderState) {
        let previous = {
            let mut state = self.state.write();
            let prev = state.clone();
            *state = new_state.clone();
            prev
        };

        debug!(
            previous = %previous.name(),
            current = %new_state.name(),
            "State transition"
        );

        self.send_event(RecorderEvent::StateChanged {
            previous: Box::new(previous),
            current: Box::new(new_state),
        });
    }

    fn send_event(&self, event: RecorderEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!("Failed to send event: {}", e);
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomcast_capture::{CaptureResult, FrameSource, RawFrame};
    use roomcast_ipc::{command_channel, event_channel};
    use roomcast_upload::UploadPipeline;

    #[test]
    fn reports_ready_then_idle_state_and_shuts_down() {
        let (cmd_tx, cmd_rx) = command_channel();
        let (event_tx, event_rx) = event_channel();

        let handle = std::thread::spawn(move || {
            let mut recorder = Recorder::new(cmd_rx, event_tx);
            recorder.run();
        });

        match event_rx.recv_timeout(Duration::from_secs(2)).unwrap() {
            RecorderEvent::Ready => {}
            other => panic!("expected Ready, got {other:?}"),
        }

        cmd_tx.send(RecorderCommand::GetState).unwrap();
        match event_rx.recv_timeout(Duration::from_secs(2)).unwrap() {
            RecorderEvent::StateChanged { current, .. } => assert!(current.is_idle()),
            other => panic!("expected StateChanged, got {other:?}"),
        }

        cmd_tx.send(RecorderCommand::Shutdown).unwrap();
        loop {
            match event_rx.recv_timeout(Duration::from_secs(2)).unwrap() {
                RecorderEvent::Shutdown => break,
                _ => continue,
            }
        }

        handle.join().unwrap();
    }

    struct DeadSource;

    impl FrameSource for DeadSource {
        fn capture(&mut self) -> CaptureResult<Vec<RawFrame>> {
            Ok(Vec::new())
        }

        fn source_count(&self) -> usize {
            1
        }
    }

    #[test]
    fn worker_give_up_is_reaped_back_to_idle() {
        let (_cmd_tx, cmd_rx) = command_channel();
        let (event_tx, _event_rx) = event_channel();
        let mut recorder = Recorder::new(cmd_rx, event_tx.clone());

        let config = RecorderConfig {
            room: "standup".to_string(),
            username: "alice".to_string(),
            frame_rate: 1000,
            ..RecorderConfig::default()
        };
        let session = Session::launch(
            Box::new(DeadSource),
            config.clone(),
            Arc::new(UploadPipeline::new(Vec::new())),
            event_tx,
            Arc::clone(&recorder.last_upload_success),
        )
        .unwrap();

        // Wait for the worker to give up on the dead source.
        for _ in 0..200 {
            if session.is_finished() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(session.is_finished());

        recorder.session = Some(session);
        *recorder.state.write() = RecorderState::Recording {
            config,
            stats: SessionStats::default(),
        };

        recorder.reap_finished_session();

        assert!(recorder.state.read().is_idle());
        assert!(recorder.session.is_none());
    }

    #[test]
    fn stop_when_idle_is_ignored() {
        let (_cmd_tx, cmd_rx) = command_channel();
        let (event_tx, event_rx) = event_channel();
        let mut recorder = Recorder::new(cmd_rx, event_tx);

        recorder.stop_session(StopReason::UserRequested);

        // No state transition events were emitted.
        assert!(event_rx.try_recv().is_err());
    }
}
