//! ONVIF PTZ camera control.
//!
//! Every named motion maps to one SOAP call against the camera's PTZ
//! service:
//!
//! | Operation | SOAP call | Velocity / axes |
//! |-----------|-----------|-----------------|
//! | `pan_left` / `pan_right` | ContinuousMove | pan `∓speed` |
//! | `tilt_up` / `tilt_down` | ContinuousMove | tilt `±speed` |
//! | `zoom_in` / `zoom_out` | ContinuousMove | zoom `±speed` |
//! | `stop` | Stop | pan-tilt and zoom |
//!
//! A call moves the client from idle to sending and back; nothing but the
//! configuration and the speeds survives between calls. Failures are values
//! ([`CommandResult`]), never errors, and are never retried.

pub mod auth;
pub mod envelope;
pub mod transport;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::DeviceConfig;
use crate::error::Result;
use envelope::Velocity;
pub use transport::{HttpSoapTransport, SoapRequest, SoapTransport};

pub const MSG_ACKNOWLEDGED: &str = "PTZ command acknowledged";
pub const MSG_CONFIG_INCOMPLETE: &str = "CCTV configuration incomplete";
pub const MSG_ENDPOINT_MISSING: &str = "ONVIF endpoint missing";
pub const MSG_UNKNOWN_ACTION: &str = "Unknown PTZ action";

/// Outcome of one PTZ operation.
///
/// A failed result always carries a non-empty diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            message: if message.is_empty() {
                "PTZ command failed".to_string()
            } else {
                message
            },
        }
    }
}

/// Motions accepted by the camera API, by their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtzAction {
    Left,
    Right,
    Up,
    Down,
    ZoomIn,
    ZoomOut,
    Stop,
}

impl PtzAction {
    pub const ALL: [PtzAction; 7] = [
        PtzAction::Left,
        PtzAction::Right,
        PtzAction::Up,
        PtzAction::Down,
        PtzAction::ZoomIn,
        PtzAction::ZoomOut,
        PtzAction::Stop,
    ];

    /// Parse a wire name, ignoring ASCII case.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PtzAction::Left => "left",
            PtzAction::Right => "right",
            PtzAction::Up => "up",
            PtzAction::Down => "down",
            PtzAction::ZoomIn => "zoom_in",
            PtzAction::ZoomOut => "zoom_out",
            PtzAction::Stop => "stop",
        }
    }
}

impl fmt::Display for PtzAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Velocity magnitudes used by the named motions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PtzSpeeds {
    pub pan: f64,
    pub tilt: f64,
    pub zoom: f64,
}

pub const DEFAULT_SPEED: f64 = 0.3;

impl Default for PtzSpeeds {
    fn default() -> Self {
        Self {
            pan: DEFAULT_SPEED,
            tilt: DEFAULT_SPEED,
            zoom: DEFAULT_SPEED,
        }
    }
}

impl PtzSpeeds {
    /// Clamp each magnitude into `[0.0, 1.0]`, the ONVIF generic velocity space.
    pub fn clamped(self) -> Self {
        Self {
            pan: self.pan.abs().clamp(0.0, 1.0),
            tilt: self.tilt.abs().clamp(0.0, 1.0),
            zoom: self.zoom.abs().clamp(0.0, 1.0),
        }
    }
}

/// PTZ client for one camera.
///
/// Holds an immutable configuration snapshot and serializes device calls:
/// at most one ContinuousMove/Stop is in flight at a time, however many
/// connection threads share the client.
pub struct PtzClient {
    config: Arc<DeviceConfig>,
    speeds: PtzSpeeds,
    transport: Box<dyn SoapTransport>,
    in_flight: Mutex<()>,
}

impl PtzClient {
    /// Client delivering over HTTP with the default speeds.
    pub fn new(config: Arc<DeviceConfig>) -> Result<Self> {
        Ok(Self::with_transport(
            config,
            PtzSpeeds::default(),
            Box::new(HttpSoapTransport::new()?),
        ))
    }

    pub fn with_transport(
        config: Arc<DeviceConfig>,
        speeds: PtzSpeeds,
        transport: Box<dyn SoapTransport>,
    ) -> Self {
        if !config.ptz_is_ready() {
            tracing::warn!(
                host = %config.host,
                user = %crate::config::sanitize_for_logging(&config.username, 2),
                "PTZ client created with incomplete configuration"
            );
        }
        Self {
            config,
            speeds: speeds.clamped(),
            transport,
            in_flight: Mutex::new(()),
        }
    }

    pub fn speeds(&self) -> PtzSpeeds {
        self.speeds
    }

    pub fn pan_left(&self) -> CommandResult {
        self.continuous_move(Velocity::new(-self.speeds.pan, 0.0, 0.0))
    }

    pub fn pan_right(&self) -> CommandResult {
        self.continuous_move(Velocity::new(self.speeds.pan, 0.0, 0.0))
    }

    pub fn tilt_up(&self) -> CommandResult {
        self.continuous_move(Velocity::new(0.0, self.speeds.tilt, 0.0))
    }

    pub fn tilt_down(&self) -> CommandResult {
        self.continuous_move(Velocity::new(0.0, -self.speeds.tilt, 0.0))
    }

    pub fn zoom_in(&self) -> CommandResult {
        self.continuous_move(Velocity::new(0.0, 0.0, self.speeds.zoom))
    }

    pub fn zoom_out(&self) -> CommandResult {
        self.continuous_move(Velocity::new(0.0, 0.0, -self.speeds.zoom))
    }

    /// Halt both pan-tilt and zoom motion.
    pub fn stop(&self) -> CommandResult {
        let body = envelope::stop(&self.config.profile_token, true, true);
        let result = self.send(&body, envelope::ACTION_STOP);
        if result.success {
            tracing::info!(pan_tilt = true, zoom = true, "issued PTZ Stop");
        }
        result
    }

    pub fn perform(&self, action: PtzAction) -> CommandResult {
        match action {
            PtzAction::Left => self.pan_left(),
            PtzAction::Right => self.pan_right(),
            PtzAction::Up => self.tilt_up(),
            PtzAction::Down => self.tilt_down(),
            PtzAction::ZoomIn => self.zoom_in(),
            PtzAction::ZoomOut => self.zoom_out(),
            PtzAction::Stop => self.stop(),
        }
    }

    /// Run an action by wire name (`left`, `zoom_in`, ...).
    pub fn execute(&self, action: &str) -> CommandResult {
        match PtzAction::parse(action) {
            Some(action) => self.perform(action),
            None => CommandResult::error(MSG_UNKNOWN_ACTION),
        }
    }

    fn continuous_move(&self, velocity: Velocity) -> CommandResult {
        let body = envelope::continuous_move(&self.config.profile_token, velocity);
        let result = self.send(&body, envelope::ACTION_CONTINUOUS_MOVE);
        if result.success {
            tracing::info!(
                pan = velocity.pan,
                tilt = velocity.tilt,
                zoom = velocity.zoom,
                "issued PTZ ContinuousMove"
            );
        }
        result
    }

    fn send(&self, body: &str, action: &str) -> CommandResult {
        if !self.config.ptz_is_ready() {
            return CommandResult::error(MSG_CONFIG_INCOMPLETE);
        }

        let endpoint = self.config.onvif_endpoint();
        if endpoint.is_empty() {
            return CommandResult::error(MSG_ENDPOINT_MISSING);
        }

        let request = SoapRequest {
            endpoint: &endpoint,
            action,
            body,
            username: &self.config.username,
            password: &self.config.password,
        };

        let _guard = self.in_flight.lock();
        match self.transport.deliver(&request) {
            Ok(status) if (200..300).contains(&status) => CommandResult::ok(MSG_ACKNOWLEDGED),
            Ok(status) => {
                tracing::warn!(status, action, "PTZ request rejected by device");
                CommandResult::error(format!("PTZ HTTP error {status}"))
            }
            Err(e) => {
                tracing::warn!(error = %e, action, "PTZ request failed");
                CommandResult::error(e.to_string())
            }
        }
    }
}
