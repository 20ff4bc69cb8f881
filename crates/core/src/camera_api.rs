//! Camera endpoints: stream discovery and PTZ control.
//!
//! ```text
//! GET  /api/cctv/stream        -> {"protocol","playlist","rtsp"[,"mjpeg"]}
//! POST /api/ptz?action=<name>  -> {"action","success","message"}
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::DeviceConfig;
use crate::http::query::url_decode;
use crate::http::response::NO_STORE;
use crate::http::{HttpRequest, HttpResponse};
use crate::ptz::PtzClient;

pub const PATH_STREAM: &str = "/api/cctv/stream";
pub const PATH_PTZ: &str = "/api/ptz";

#[derive(Debug, Serialize)]
struct StreamInfo<'a> {
    protocol: &'a str,
    playlist: &'a str,
    rtsp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mjpeg: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PtzReply<'a> {
    action: &'a str,
    success: bool,
    message: &'a str,
}

/// Serves `/api/cctv/stream` and `/api/ptz`.
///
/// The PTZ client is shared with every connection thread; its own lock
/// keeps device calls one at a time.
pub struct CameraApi {
    config: Arc<DeviceConfig>,
    ptz: Arc<PtzClient>,
}

impl CameraApi {
    pub fn new(config: Arc<DeviceConfig>, ptz: Arc<PtzClient>) -> Self {
        Self { config, ptz }
    }

    /// Handle a camera path. Returns `None` when `path` is not a camera
    /// endpoint so the caller can keep routing.
    pub fn handle(
        &self,
        path: &str,
        request: &HttpRequest,
        query: &HashMap<String, String>,
    ) -> Option<HttpResponse> {
        match path {
            PATH_STREAM => Some(self.stream_info()),
            PATH_PTZ => Some(self.ptz_command(request, query)),
            _ => None,
        }
    }

    fn stream_info(&self) -> HttpResponse {
        let info = StreamInfo {
            protocol: &self.config.streaming_protocol,
            playlist: &self.config.hls_playlist_url,
            rtsp: self.config.rtsp_uri(false),
            mjpeg: Some(self.config.mjpeg_stream_url.as_str()).filter(|url| !url.is_empty()),
        };
        json_response(HttpResponse::ok(), &info)
    }

    fn ptz_command(&self, request: &HttpRequest, query: &HashMap<String, String>) -> HttpResponse {
        if request.method != "POST" {
            return HttpResponse::method_not_allowed()
                .add_header("Allow", "POST")
                .with_text("Method Not Allowed");
        }

        let action = match action_from_request(request, query) {
            Some(action) if !action.is_empty() => action.to_ascii_lowercase(),
            _ => {
                return HttpResponse::bad_request()
                    .with_text("Missing action parameter");
            }
        };

        let result = self.ptz.execute(&action);
        tracing::debug!(action = %action, success = result.success, message = %result.message, "PTZ request handled");

        let reply = PtzReply {
            action: &action,
            success: result.success,
            message: &result.message,
        };
        let status = if result.success {
            HttpResponse::ok()
        } else {
            HttpResponse::bad_gateway()
        };
        json_response(status, &reply)
    }
}

/// `action` from the query string, else from an `action=` pair in the body.
///
/// Body pairs end at `&` or a line break; only a pair whose key is exactly
/// `action` counts.
fn action_from_request(request: &HttpRequest, query: &HashMap<String, String>) -> Option<String> {
    if let Some(action) = query.get("action") {
        return Some(action.clone());
    }

    request
        .body_text()
        .split(['&', '\n', '\r'])
        .find_map(|pair| pair.strip_prefix("action="))
        .map(url_decode)
}

fn json_response<T: Serialize>(response: HttpResponse, payload: &T) -> HttpResponse {
    let body = match serde_json::to_string(payload) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode JSON reply");
            return HttpResponse::new(500, "Internal Server Error");
        }
    };
    response
        .add_header("Cache-Control", NO_STORE)
        .add_header("Access-Control-Allow-Origin", "*")
        .with_json(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::ptz::{PtzSpeeds, SoapRequest, SoapTransport};
    use parking_lot::Mutex;

    struct Recorder {
        actions: Arc<Mutex<Vec<String>>>,
        status: u16,
    }

    impl SoapTransport for Recorder {
        fn deliver(&self, request: &SoapRequest<'_>) -> Result<u16> {
            self.actions.lock().push(request.action.to_string());
            Ok(self.status)
        }
    }

    fn config() -> DeviceConfig {
        DeviceConfig {
            host: "cam.local".into(),
            rtsp_path: "live".into(),
            onvif_path: "onvif/ptz_service".into(),
            username: "admin".into(),
            password: "secret".into(),
            profile_token: "Profile_1".into(),
            hls_playlist_url: "/streams/beaveralarm/index.m3u8".into(),
            streaming_protocol: "HLS".into(),
            ..Default::default()
        }
    }

    fn api(config: DeviceConfig, status: u16) -> (CameraApi, Arc<Mutex<Vec<String>>>) {
        let actions = Arc::new(Mutex::new(Vec::new()));
        let config = Arc::new(config);
        let ptz = PtzClient::with_transport(
            config.clone(),
            PtzSpeeds::default(),
            Box::new(Recorder { actions: actions.clone(), status }),
        );
        (CameraApi::new(config, Arc::new(ptz)), actions)
    }

    fn request(method: &str, body: &str) -> HttpRequest {
        HttpRequest {
            method: method.into(),
            path: PATH_PTZ.into(),
            version: "HTTP/1.1".into(),
            body: body.as_bytes().to_vec(),
            ..Default::default()
        }
    }

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn json(response: &HttpResponse) -> serde_json::Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn ignores_foreign_paths() {
        let (api, _) = api(config(), 200);
        assert!(api.handle("/api/menu", &request("GET", ""), &HashMap::new()).is_none());
    }

    #[test]
    fn stream_info_hides_credentials() {
        let (api, _) = api(config(), 200);
        let response = api.handle(PATH_STREAM, &request("GET", ""), &HashMap::new()).unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(response.header("Cache-Control"), Some(NO_STORE));

        let body = json(&response);
        assert_eq!(body["protocol"], "HLS");
        assert_eq!(body["playlist"], "/streams/beaveralarm/index.m3u8");
        assert_eq!(body["rtsp"], "rtsp://cam.local/live");
        assert!(body.get("mjpeg").is_none());
    }

    #[test]
    fn stream_info_includes_mjpeg_when_set() {
        let mut cfg = config();
        cfg.mjpeg_stream_url = "/mjpeg".into();
        let (api, _) = api(cfg, 200);
        let response = api.handle(PATH_STREAM, &request("GET", ""), &HashMap::new()).unwrap();
        assert_eq!(json(&response)["mjpeg"], "/mjpeg");
    }

    #[test]
    fn ptz_requires_post() {
        let (api, actions) = api(config(), 200);
        let response = api
            .handle(PATH_PTZ, &request("GET", ""), &query(&[("action", "left")]))
            .unwrap();
        assert_eq!(response.status_code, 405);
        assert_eq!(response.header("Allow"), Some("POST"));
        assert_eq!(response.body_text(), "Method Not Allowed");
        assert!(actions.lock().is_empty());
    }

    #[test]
    fn missing_action_is_bad_request() {
        let (api, _) = api(config(), 200);
        let response = api.handle(PATH_PTZ, &request("POST", ""), &HashMap::new()).unwrap();
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body_text(), "Missing action parameter");
    }

    #[test]
    fn query_action_is_lowercased() {
        let (api, actions) = api(config(), 200);
        let response = api
            .handle(PATH_PTZ, &request("POST", ""), &query(&[("action", "STOP")]))
            .unwrap();
        assert_eq!(response.status_code, 200);
        let body = json(&response);
        assert_eq!(body["action"], "stop");
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "PTZ command acknowledged");
        assert_eq!(actions.lock().as_slice(), [crate::ptz::envelope::ACTION_STOP]);
    }

    #[test]
    fn body_action_is_decoded_and_terminated() {
        let (api, actions) = api(config(), 200);
        let response = api
            .handle(PATH_PTZ, &request("POST", "speed=1&action=zoom%5Fin&x=2"), &HashMap::new())
            .unwrap();
        assert_eq!(json(&response)["action"], "zoom_in");
        assert_eq!(actions.lock().len(), 1);

        let response = api
            .handle(PATH_PTZ, &request("POST", "action=Left\r\n"), &HashMap::new())
            .unwrap();
        assert_eq!(json(&response)["action"], "left");
    }

    #[test]
    fn body_key_must_match_exactly() {
        let (api, actions) = api(config(), 200);
        let response = api
            .handle(PATH_PTZ, &request("POST", "reaction=left&transaction=up"), &HashMap::new())
            .unwrap();
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body_text(), "Missing action parameter");
        assert!(actions.lock().is_empty());

        let response = api
            .handle(PATH_PTZ, &request("POST", "reaction=left&action=right"), &HashMap::new())
            .unwrap();
        assert_eq!(json(&response)["action"], "right");
    }

    #[test]
    fn device_failure_is_bad_gateway() {
        let (api, _) = api(config(), 500);
        let response = api
            .handle(PATH_PTZ, &request("POST", ""), &query(&[("action", "up")]))
            .unwrap();
        assert_eq!(response.status_code, 502);
        let body = json(&response);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "PTZ HTTP error 500");
    }

    #[test]
    fn unknown_action_is_bad_gateway() {
        let (api, actions) = api(config(), 200);
        let response = api
            .handle(PATH_PTZ, &request("POST", ""), &query(&[("action", "spin")]))
            .unwrap();
        assert_eq!(response.status_code, 502);
        assert_eq!(json(&response)["message"], "Unknown PTZ action");
        assert!(actions.lock().is_empty());
    }

    #[test]
    fn incomplete_config_never_reaches_device() {
        let (api, actions) = api(DeviceConfig::default(), 200);
        let response = api
            .handle(PATH_PTZ, &request("POST", ""), &query(&[("action", "left")]))
            .unwrap();
        assert_eq!(response.status_code, 502);
        assert_eq!(json(&response)["message"], "CCTV configuration incomplete");
        assert!(actions.lock().is_empty());
    }
}
