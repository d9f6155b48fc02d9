//! Tracing setup: console output plus a per-session log file.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize logging. For `record`, a `{username}_{room}.log` file under
/// `~/.roomcast/logs` is written alongside the console; the returned guard
/// must stay alive for the file writer to flush.
pub fn init(verbose: bool, session: Option<(&str, &str)>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let console = tracing_subscriber::fmt::layer();

    match session {
        Some((username, room)) => {
            let dir = log_dir();
            std::fs::create_dir_all(&dir)?;
            let file_name = format!("{}_{}.log", sanitize(username), sanitize(room));
            let file = tracing_appender::rolling::never(&dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(file);

            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .init();
            Ok(None)
        }
    }
}

fn log_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(".roomcast").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("roomcast_logs"))
}

fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_file_names_tame() {
        assert_eq!(sanitize("alice smith"), "alice_smith");
        assert_eq!(sanitize("room/42"), "room_42");
        assert_eq!(sanitize("plain"), "plain");
    }
}
