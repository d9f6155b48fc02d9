//! Roomcast CLI — headless screen-recording publisher.
//!
//! Usage:
//!   roomcast sources           List capturable monitors
//!   roomcast record [OPTIONS]  Record, publish, and upload a session

use clap::{Parser, Subcommand};

use roomcast_ipc::RecorderConfig;

mod commands;
mod logging;

#[derive(Parser)]
#[command(
    name = "roomcast",
    about = "Screen recording with live publishing and tiered upload",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List capturable monitors
    Sources,

    /// Record and publish a session
    Record {
        /// Room to publish into
        #[arg(long)]
        room: String,

        /// Operator display name
        #[arg(long)]
        username: String,

        /// WebSocket relay URL (ws:// or wss://)
        #[arg(long)]
        server_url: String,

        /// HTTP API base URL for uploads and registration
        #[arg(long)]
        api_url: String,

        /// Zero-based monitor indexes to capture
        #[arg(long, value_delimiter = ',', default_value = "0")]
        monitors: Vec<usize>,

        /// Target frame rate
        #[arg(long, default_value = "12")]
        fps: u32,

        /// JPEG quality for live frames (0-100)
        #[arg(long, default_value = "80")]
        jpeg_quality: u8,

        /// Maximum composed width
        #[arg(long, default_value = "1920")]
        max_width: u32,

        /// Maximum composed height
        #[arg(long, default_value = "1080")]
        max_height: u32,

        /// Seconds of recording per segment
        #[arg(long, default_value = "300")]
        segment_secs: u64,

        /// Timeout for a single upload attempt, in seconds
        #[arg(long, default_value = "600")]
        upload_timeout: u64,

        /// Stop automatically after this many seconds instead of waiting
        /// for Enter
        #[arg(long)]
        duration: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sources => {
            let _guard = logging::init(cli.verbose, None)?;
            commands::sources::run()
        }
        Commands::Record {
            room,
            username,
            server_url,
            api_url,
            monitors,
            fps,
            jpeg_quality,
            max_width,
            max_height,
            segment_secs,
            upload_timeout,
            duration,
        } => {
            let _guard = logging::init(cli.verbose, Some((&username, &room)))?;

            let config = RecorderConfig {
                server_url,
                api_url,
                room,
                username,
                monitors,
                frame_rate: fps,
                jpeg_quality,
                max_width,
                max_height,
                segment_secs,
                upload_timeout_secs: upload_timeout,
                drive: commands::record::drive_settings_from_env(),
            };

            commands::record::run(config, duration)
        }
    }
}
