//! Monitor enumeration for the source picker.

use tracing::debug;
use xcap::Monitor;

use roomcast_ipc::MonitorInfo;

use crate::{CaptureError, CaptureResult};

/// Enumerate the monitors available for capture, in OS order.
pub fn enumerate_monitors() -> CaptureResult<Vec<MonitorInfo>> {
    let monitors = Monitor::all().map_err(|e| CaptureError::Enumeration(e.to_string()))?;

    let infos: Vec<MonitorInfo> = monitors
        .iter()
        .enumerate()
        .map(|(index, m)| MonitorInfo {
            index,
            name: m.name().to_string(),
            x: m.x(),
            y: m.y(),
            width: m.width(),
            height: m.height(),
            is_primary: m.is_primary(),
        })
        .collect();

    debug!(count = infos.len(), "Enumerated monitors");
    Ok(infos)
}
