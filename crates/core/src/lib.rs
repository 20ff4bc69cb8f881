pub mod assets;
pub mod camera_api;
pub mod config;
pub mod error;
pub mod http;
pub mod pages;
pub mod ptz;
pub mod server;
pub mod transport;

pub use camera_api::CameraApi;
pub use config::DeviceConfig;
pub use error::{KioskError, Result};
pub use http::{HttpRequest, HttpResponse, Router};
pub use pages::{KioskPages, Language, PageRenderer};
pub use ptz::{CommandResult, PtzClient, PtzSpeeds};
pub use server::{Server, ServerConfig, ShutdownHandle};
