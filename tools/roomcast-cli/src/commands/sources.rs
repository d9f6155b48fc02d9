//! List capturable monitors.

use roomcast_capture::enumerate_monitors;

pub fn run() -> anyhow::Result<()> {
    let monitors = enumerate_monitors()?;

    if monitors.is_empty() {
        println!("No monitors detected");
        return Ok(());
    }

    for monitor in monitors {
        let primary = if monitor.is_primary { " (primary)" } else { "" };
        println!(
            "{}: {} {}x{} at ({}, {}){}",
            monitor.index,
            monitor.name,
            monitor.width,
            monitor.height,
            monitor.x,
            monitor.y,
            primary
        );
    }

    Ok(())
}
