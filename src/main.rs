use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use pose_relay::bridge::{CameraDevice, CommandInput, HostBridge, HostCommand, StdoutBridge};
use pose_relay::camera::{list_devices, StreamManager};
use pose_relay::config::Config;
use pose_relay::pose::DetectorLoader;
use pose_relay::tracker::Tracker;

/// pose-relay: camera-to-host landmark bridge
#[derive(Parser)]
#[command(name = "pose-relay")]
#[command(version, about = "Relays a normalized pose landmark from a live camera to a host application")]
#[command(long_about = "Streams live camera frames through a pose-estimation \
    capability and forwards JPEG frames plus one normalized body-part \
    coordinate to a host application over a line-oriented JSON protocol: \
    events on stdout, commands on stdin.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available camera devices
    ListCameras,

    /// Run the tracking bridge
    #[command(after_help = "EXAMPLES:
    # Wait for the host to issue a start command on stdin
    pose-relay track

    # Start tracking device 0 immediately
    pose-relay track --device 0

PROTOCOL:
    stdout  {\"channel\":\"camera-list\"|\"camera-ready\"|\"frame\"|\"landmark\", \"payload\": ...}
    stdin   {\"cmd\":\"start\",\"deviceId\":\"<id>\"}")]
    Track {
        /// Device to start tracking immediately (otherwise wait for a
        /// start command from the host)
        #[arg(long, short = 'd')]
        device: Option<String>,

        /// Custom config file path (default: ~/.config/pose-relay/config.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Model weights path (overrides the config file)
        #[arg(long, short = 'm')]
        model: Option<PathBuf>,
    },
}

fn main() {
    // Logs go to stderr; stdout carries the host protocol
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ListCameras => run_list_cameras(),
        Commands::Track {
            device,
            config,
            model,
        } => {
            // If --config is specified, require the file to exist;
            // otherwise fall back to defaults when no config is found
            let cfg = match config {
                Some(path) => match Config::load_from_explicit(path) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                },
                None => match Config::load() {
                    Ok(c) => c,
                    Err(e) => {
                        log::warn!("Failed to load config file: {}. Using defaults.", e);
                        Config::default()
                    }
                },
            };

            let model_path = model.unwrap_or_else(|| cfg.detector.model.clone());

            if let Err(e) = run_track(cfg, model_path, device) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_list_cameras() {
    match list_devices() {
        Ok(devices) => {
            if devices.is_empty() {
                println!("No cameras found.");
            } else {
                for device in &devices {
                    println!("{}", device);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_track(
    cfg: Config,
    model_path: PathBuf,
    initial_device: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        // Attach the host and report camera options once per attachment
        let host: Arc<dyn HostBridge> = Arc::new(StdoutBridge);
        let devices = list_devices()?;
        let options: Vec<CameraDevice> = devices.iter().map(CameraDevice::from).collect();
        host.notify_device_list(&options);

        let streams = StreamManager::new(cfg.camera_settings());
        let loader = DetectorLoader::new(model_path);
        let tracker = Tracker::new(streams, loader, host, cfg.tracker_config());

        let (input, commands) = CommandInput::spawn_listener();
        if let Some(device_id) = initial_device {
            let _ = input.send(HostCommand::StartTracking { device_id });
        }
        // Drop our sender so the tracker stops when stdin closes
        drop(input);

        tokio::select! {
            _ = tracker.run(commands) => {
                log::info!("Host input closed, stopping");
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down");
            }
        }

        Ok(())
    })
}
