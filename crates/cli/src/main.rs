use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use kiosk::{CameraApi, DeviceConfig, KioskPages, Language, PtzClient, PtzSpeeds, Server, ServerConfig};
use kiosk::ptz::HttpSoapTransport;

#[derive(Parser)]
#[command(
    name = "beaver-kiosk",
    about = "BeaverKiosk appliance server: menu pages, camera stream discovery and PTZ control"
)]
struct Args {
    /// Bind address (host:port)
    #[arg(long, short, env = "BEAVER_KIOSK_BIND", default_value = kiosk::server::DEFAULT_BIND_ADDR)]
    bind: String,

    /// Directory holding css/ and icons/
    #[arg(long, env = "BEAVER_KIOSK_PUBLIC_DIR", default_value = "public")]
    public_dir: PathBuf,

    /// Default page language (en or fr)
    #[arg(long, default_value = "fr", value_parser = parse_language)]
    lang: Language,

    /// Pan velocity magnitude for PTZ moves (0.0-1.0)
    #[arg(long, default_value_t = kiosk::ptz::DEFAULT_SPEED)]
    pan_speed: f64,

    /// Tilt velocity magnitude for PTZ moves (0.0-1.0)
    #[arg(long, default_value_t = kiosk::ptz::DEFAULT_SPEED)]
    tilt_speed: f64,

    /// Zoom velocity magnitude for PTZ moves (0.0-1.0)
    #[arg(long, default_value_t = kiosk::ptz::DEFAULT_SPEED)]
    zoom_speed: f64,
}

fn parse_language(value: &str) -> Result<Language, String> {
    Language::from_query(value).ok_or_else(|| format!("unsupported language '{value}', expected en or fr"))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let device = Arc::new(DeviceConfig::load());
    let transport = match HttpSoapTransport::new() {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!(error = %e, "failed to create PTZ HTTP client");
            return ExitCode::FAILURE;
        }
    };
    let speeds = PtzSpeeds {
        pan: args.pan_speed,
        tilt: args.tilt_speed,
        zoom: args.zoom_speed,
    };
    let ptz = Arc::new(PtzClient::with_transport(device.clone(), speeds, Box::new(transport)));

    let config = ServerConfig {
        bind_addr: args.bind,
        public_dir: args.public_dir,
        default_language: args.lang,
        ..Default::default()
    };
    let router = config.router(Arc::new(KioskPages::default()), CameraApi::new(device, ptz));
    let mut server = Server::new(config, router);

    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || shutdown.shutdown()) {
        tracing::error!(error = %e, "failed to install signal handler");
        return ExitCode::FAILURE;
    }

    if let Err(e) = server.run() {
        tracing::error!(error = %e, "failed to start server");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
