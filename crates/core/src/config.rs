//! Camera device configuration.
//!
//! Values come from the process environment (see the `ENV_*` constants).
//! Derived values such as [`DeviceConfig::rtsp_uri`] and
//! [`DeviceConfig::onvif_endpoint`] are computed on demand, never stored.

use std::sync::atomic::{AtomicBool, Ordering};

pub const ENV_HOST: &str = "BEAVER_ALARM_CCTV_HOST";
pub const ENV_RTSP_PATH: &str = "BEAVER_ALARM_CCTV_RTSP_PATH";
pub const ENV_ONVIF_PATH: &str = "BEAVER_ALARM_ONVIF_PATH";
pub const ENV_USERNAME: &str = "BEAVER_ALARM_CCTV_USERNAME";
pub const ENV_PASSWORD: &str = "BEAVER_ALARM_CCTV_PASSWORD";
pub const ENV_PROFILE_TOKEN: &str = "BEAVER_ALARM_ONVIF_PROFILE";
pub const ENV_HLS_URL: &str = "BEAVER_ALARM_HLS_URL";
pub const ENV_MJPEG_URL: &str = "BEAVER_ALARM_MJPEG_URL";
pub const ENV_STREAM_PROTOCOL: &str = "BEAVER_ALARM_STREAM_PROTOCOL";

pub const DEFAULT_RTSP_PATH: &str = "cam/realmonitor?channel=1&subtype=1";
pub const DEFAULT_ONVIF_PATH: &str = "onvif/ptz_service";
pub const DEFAULT_PROFILE_TOKEN: &str = "Profile_1";
pub const DEFAULT_HLS_URL: &str = "/streams/beaveralarm/index.m3u8";
pub const DEFAULT_STREAM_PROTOCOL: &str = "HLS";

const RTSP_SCHEMES: [&str; 2] = ["rtsp://", "rtsps://"];

/// Set by the first load that logs its diagnostics.
static DIAGNOSTICS_LOGGED: AtomicBool = AtomicBool::new(false);

/// Connection settings for the CCTV camera.
///
/// Immutable once loaded; share it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Camera host, optionally with `:port`.
    pub host: String,
    /// Either a path relative to the camera host or an absolute `rtsp[s]://` URI.
    pub rtsp_path: String,
    /// Path of the ONVIF PTZ service on the camera host.
    pub onvif_path: String,
    pub username: String,
    pub password: String,
    /// ONVIF media profile the PTZ commands apply to.
    pub profile_token: String,
    pub hls_playlist_url: String,
    pub mjpeg_stream_url: String,
    /// Label reported to the UI (`HLS`, `MJPEG`, ...).
    pub streaming_protocol: String,
}

impl DeviceConfig {
    /// Load from the process environment.
    ///
    /// Safe to call any number of times; startup diagnostics are logged
    /// only on the first call in the process.
    pub fn load() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str, fallback: &str| lookup(name).unwrap_or_else(|| fallback.to_string());

        let config = DeviceConfig {
            host: get(ENV_HOST, ""),
            rtsp_path: get(ENV_RTSP_PATH, DEFAULT_RTSP_PATH),
            onvif_path: get(ENV_ONVIF_PATH, DEFAULT_ONVIF_PATH),
            username: get(ENV_USERNAME, ""),
            password: get(ENV_PASSWORD, ""),
            profile_token: get(ENV_PROFILE_TOKEN, DEFAULT_PROFILE_TOKEN),
            hls_playlist_url: get(ENV_HLS_URL, DEFAULT_HLS_URL),
            mjpeg_stream_url: get(ENV_MJPEG_URL, ""),
            streaming_protocol: get(ENV_STREAM_PROTOCOL, DEFAULT_STREAM_PROTOCOL),
        };

        config.log_diagnostics_once(&DIAGNOSTICS_LOGGED);
        config
    }

    /// Log diagnostics unless `gate` was already set. Returns whether this
    /// call logged.
    fn log_diagnostics_once(&self, gate: &AtomicBool) -> bool {
        let first = gate
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if first {
            self.log_diagnostics();
        }
        first
    }

    fn log_diagnostics(&self) {
        let direct_rtsp = self.rtsp_uri(false);
        if !self.host.is_empty() {
            tracing::info!(host = %self.host, "loaded CCTV camera host");
        } else if !direct_rtsp.is_empty() {
            tracing::info!(uri = %redact_uri(&direct_rtsp), "using direct RTSP URI for CCTV feed");
        } else {
            tracing::warn!("{ENV_HOST} is not set and no direct RTSP URI provided; CCTV feed disabled");
        }

        if !self.profile_token.is_empty() {
            tracing::info!(profile = %self.profile_token, "using ONVIF profile token");
        }

        if self.hls_playlist_url.is_empty() {
            tracing::warn!("HLS playlist URL not configured; set {ENV_HLS_URL}");
        }

        if !self.ptz_is_ready() {
            tracing::warn!(
                host = %self.host,
                user = %sanitize_for_logging(&self.username, 2),
                "PTZ control disabled until host, username and password are set"
            );
        }
    }

    /// Whether a video feed can be offered: a direct RTSP URI, a camera
    /// host, an HLS playlist or an MJPEG stream is configured.
    pub fn is_ready(&self) -> bool {
        is_absolute_rtsp(&self.rtsp_path)
            || !self.host.is_empty()
            || !self.hls_playlist_url.is_empty()
            || !self.mjpeg_stream_url.is_empty()
    }

    /// Whether PTZ commands can be sent: host and both credentials are set.
    pub fn ptz_is_ready(&self) -> bool {
        !self.host.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }

    /// The camera's RTSP URI, or an empty string if none can be built.
    ///
    /// An absolute `rtsp_path` is returned as-is, except that credentials
    /// are injected after the scheme when `include_credentials` is set and
    /// the URI has no `user@` segment yet. A relative `rtsp_path` is joined
    /// to `rtsp://[user[:pass]@]host`.
    pub fn rtsp_uri(&self, include_credentials: bool) -> String {
        if let Some((scheme, rest)) = split_rtsp_scheme(&self.rtsp_path) {
            if !include_credentials || self.username.is_empty() || has_userinfo(rest) {
                return self.rtsp_path.clone();
            }
            return format!("{scheme}{}{rest}", self.userinfo());
        }

        if self.host.is_empty() {
            return String::new();
        }

        let mut uri = String::from("rtsp://");
        if include_credentials && !self.username.is_empty() {
            uri.push_str(&self.userinfo());
        }
        uri.push_str(&self.host);
        push_path(&mut uri, &self.rtsp_path);
        uri
    }

    /// `http://host[/onvif_path]`, or an empty string without a host.
    pub fn onvif_endpoint(&self) -> String {
        if self.host.is_empty() {
            return String::new();
        }

        let mut uri = format!("http://{}", self.host);
        push_path(&mut uri, &self.onvif_path);
        uri
    }

    /// `user[:pass]@`
    fn userinfo(&self) -> String {
        if self.password.is_empty() {
            format!("{}@", self.username)
        } else {
            format!("{}:{}@", self.username, self.password)
        }
    }
}

fn is_absolute_rtsp(value: &str) -> bool {
    split_rtsp_scheme(value).is_some()
}

fn split_rtsp_scheme(value: &str) -> Option<(&str, &str)> {
    RTSP_SCHEMES
        .iter()
        .find_map(|scheme| value.strip_prefix(scheme).map(|rest| (*scheme, rest)))
}

/// Whether the authority of `rest` (the part after `scheme://`) carries a
/// `user@` segment. An `@` in the path or query does not count.
fn has_userinfo(rest: &str) -> bool {
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    authority.contains('@')
}

fn push_path(uri: &mut String, path: &str) {
    if path.is_empty() {
        return;
    }
    if !path.starts_with('/') {
        uri.push('/');
    }
    uri.push_str(path);
}

/// Mask a secret for log output, keeping the first `visible` characters.
///
/// `""` → `<empty>`; values no longer than `visible` are fully masked.
pub fn sanitize_for_logging(value: &str, visible: usize) -> String {
    if value.is_empty() {
        return "<empty>".to_string();
    }

    let len = value.chars().count();
    if len <= visible {
        return "*".repeat(len);
    }

    value
        .chars()
        .take(visible)
        .chain(std::iter::repeat_n('*', len - visible))
        .collect()
}

/// Replace the password of an `rtsp[s]://user:pass@host/...` URI with `***`.
pub fn redact_uri(uri: &str) -> String {
    let Some((scheme, rest)) = split_rtsp_scheme(uri) else {
        return uri.to_string();
    };
    if !has_userinfo(rest) {
        return uri.to_string();
    }
    let Some((creds, host)) = rest.split_once('@') else {
        return uri.to_string();
    };
    match creds.split_once(':') {
        Some((user, _)) => format!("{scheme}{user}:***@{host}"),
        None => uri.to_string(),
    }
}
