//! Record, publish, and upload a session.

use std::io::{BufRead, Write};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use roomcast_engine::create_recorder;
use roomcast_ipc::{
    command_channel, event_channel, DriveSettings, RecorderCommand, RecorderConfig, RecorderEvent,
};

pub fn run(config: RecorderConfig, duration: Option<u64>) -> anyhow::Result<()> {
    let (cmd_tx, cmd_rx) = command_channel();
    let (event_tx, event_rx) = event_channel();

    let engine = thread::spawn(move || {
        let mut recorder = create_recorder(cmd_rx, event_tx);
        recorder.run();
    });

    cmd_tx.send(RecorderCommand::Start { config })?;

    // Stop on Enter, or after --duration seconds.
    let stopper = cmd_tx.clone();
    match duration {
        Some(secs) => {
            println!("Recording for {secs} seconds...");
            thread::spawn(move || {
                thread::sleep(Duration::from_secs(secs));
                let _ = stopper.send(RecorderCommand::Stop);
                let _ = stopper.send(RecorderCommand::Shutdown);
            });
        }
        None => {
            println!("Recording. Press Enter to stop.");
            thread::spawn(move || {
                let mut line = String::new();
                let _ = std::io::stdin().lock().read_line(&mut line);
                let _ = stopper.send(RecorderCommand::Stop);
                let _ = stopper.send(RecorderCommand::Shutdown);
            });
        }
    }

    for event in event_rx.iter() {
        match event {
            RecorderEvent::Ready => {}
            RecorderEvent::Status(line) => println!("{line}"),
            RecorderEvent::Stats(stats) => {
                print!(
                    "\rFPS: {:.1} | frames: {} | parts: {}   ",
                    stats.fps, stats.frames_sent, stats.parts_uploaded
                );
                let _ = std::io::stdout().flush();
            }
            RecorderEvent::SegmentUploaded(report) => {
                println!();
                if report.success {
                    let link = report
                        .link
                        .map(|link| format!(": {link}"))
                        .unwrap_or_default();
                    println!(
                        "Part {} stored via {}{}",
                        report.part_number,
                        report.tier.name(),
                        link
                    );
                } else {
                    println!(
                        "Part {} kept locally (all upload tiers failed)",
                        report.part_number
                    );
                }
            }
            RecorderEvent::StateChanged { current, .. } => {
                debug!(state = current.name(), "State changed");
            }
            RecorderEvent::Error {
                recoverable,
                message,
            } => {
                println!();
                if recoverable {
                    eprintln!("error: {message}");
                } else {
                    eprintln!("fatal: {message}");
                }
            }
            RecorderEvent::Monitors(_) => {}
            RecorderEvent::Shutdown => break,
        }
    }

    engine
        .join()
        .map_err(|_| anyhow::anyhow!("engine thread panicked"))?;
    println!();
    println!("Done.");
    Ok(())
}

/// Read the Drive tier credentials from the environment. The tier is only
/// enabled when `DRIVE_ENABLED` is set and all four credentials are present.
pub fn drive_settings_from_env() -> Option<DriveSettings> {
    let enabled = std::env::var("DRIVE_ENABLED")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if !enabled {
        return None;
    }

    let get = |key: &str| std::env::var(key).ok().filter(|value| !value.is_empty());
    match (
        get("DRIVE_CLIENT_ID"),
        get("DRIVE_CLIENT_SECRET"),
        get("DRIVE_REFRESH_TOKEN"),
        get("DRIVE_ROOT_FOLDER_ID"),
    ) {
        (Some(client_id), Some(client_secret), Some(refresh_token), Some(root_folder_id)) => {
            Some(DriveSettings {
                client_id,
                client_secret,
                refresh_token,
                root_folder_id,
            })
        }
        _ => {
            warn!("DRIVE_ENABLED is set but credentials are incomplete; cloud tier disabled");
            None
        }
    }
}
