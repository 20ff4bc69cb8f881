//! ONVIF PTZ SOAP envelopes (ONVIF PTZ Service Specification §5.3).
//!
//! ```text
//! <s:Envelope xmlns:s=".../soap-envelope" xmlns:tptz=".../ptz/wsdl" xmlns:tt=".../schema">
//!   <s:Body>
//!     <tptz:ContinuousMove>
//!       <tptz:ProfileToken>Profile_1</tptz:ProfileToken>
//!       <tptz:Velocity><tt:PanTilt x="-0.3" y="0"/></tptz:Velocity>
//!     </tptz:ContinuousMove>
//!   </s:Body>
//! </s:Envelope>
//! ```

pub const NS_SOAP: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const NS_PTZ: &str = "http://www.onvif.org/ver20/ptz/wsdl";
pub const NS_SCHEMA: &str = "http://www.onvif.org/ver10/schema";

pub const ACTION_CONTINUOUS_MOVE: &str = "http://www.onvif.org/ver20/ptz/wsdl/ContinuousMove";
pub const ACTION_STOP: &str = "http://www.onvif.org/ver20/ptz/wsdl/Stop";

/// Velocity components at or below this magnitude are treated as zero and
/// left out of the request.
pub const VELOCITY_EPSILON: f64 = 1e-6;

/// Signed pan/tilt/zoom velocity, each in `[-1.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub pan: f64,
    pub tilt: f64,
    pub zoom: f64,
}

impl Velocity {
    pub fn new(pan: f64, tilt: f64, zoom: f64) -> Self {
        Self { pan, tilt, zoom }
    }

    fn has_pan_tilt(&self) -> bool {
        self.pan.abs() > VELOCITY_EPSILON || self.tilt.abs() > VELOCITY_EPSILON
    }

    fn has_zoom(&self) -> bool {
        self.zoom.abs() > VELOCITY_EPSILON
    }
}

/// Build a `ContinuousMove` request body.
///
/// Axes without motion are omitted: a zero pan/tilt drops the `PanTilt`
/// element, a zero zoom drops `Zoom`.
pub fn continuous_move(profile_token: &str, velocity: Velocity) -> String {
    let mut inner = String::new();
    if velocity.has_pan_tilt() {
        inner.push_str(&format!(
            r#"<tt:PanTilt x="{}" y="{}"/>"#,
            velocity.pan, velocity.tilt
        ));
    }
    if velocity.has_zoom() {
        inner.push_str(&format!(r#"<tt:Zoom x="{}"/>"#, velocity.zoom));
    }

    format!(
        concat!(
            r#"<s:Envelope xmlns:s="{soap}" xmlns:tptz="{ptz}" xmlns:tt="{tt}">"#,
            "<s:Body>",
            "<tptz:ContinuousMove>",
            "<tptz:ProfileToken>{token}</tptz:ProfileToken>",
            "<tptz:Velocity>{inner}</tptz:Velocity>",
            "</tptz:ContinuousMove>",
            "</s:Body>",
            "</s:Envelope>"
        ),
        soap = NS_SOAP,
        ptz = NS_PTZ,
        tt = NS_SCHEMA,
        token = xml_escape(profile_token),
        inner = inner,
    )
}

/// Build a `Stop` request body for the selected axes.
pub fn stop(profile_token: &str, pan_tilt: bool, zoom: bool) -> String {
    format!(
        concat!(
            r#"<s:Envelope xmlns:s="{soap}" xmlns:tptz="{ptz}">"#,
            "<s:Body>",
            "<tptz:Stop>",
            "<tptz:ProfileToken>{token}</tptz:ProfileToken>",
            "<tptz:PanTilt>{pan_tilt}</tptz:PanTilt>",
            "<tptz:Zoom>{zoom}</tptz:Zoom>",
            "</tptz:Stop>",
            "</s:Body>",
            "</s:Envelope>"
        ),
        soap = NS_SOAP,
        ptz = NS_PTZ,
        token = xml_escape(profile_token),
        pan_tilt = pan_tilt,
        zoom = zoom,
    )
}

pub fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
