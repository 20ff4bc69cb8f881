/// An HTTP response.
///
/// Serializes to the standard wire format:
///
/// ```text
/// HTTP/1.1 200 OK\r\n
/// Server: beaver-kiosk/0.1.0\r\n
/// Content-Type: application/json; charset=utf-8\r\n
/// Content-Length: 58\r\n
/// Connection: close\r\n
/// \r\n
/// {...}
/// ```
///
/// Uses a builder pattern: chain [`add_header`](Self::add_header) and
/// [`with_body`](Self::with_body), then call [`serialize`](Self::serialize).
/// `Content-Length` and `Connection: close` are added at serialization time
/// unless a handler already set them.
#[must_use]
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Server identification string included in every response.
pub const SERVER_AGENT: &str = concat!("beaver-kiosk/", env!("CARGO_PKG_VERSION"));

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
pub const NO_STORE: &str = "no-cache, no-store, must-revalidate";

impl HttpResponse {
    pub fn new(status_code: u16, status_text: &str) -> Self {
        HttpResponse {
            status_code,
            status_text: status_text.to_string(),
            headers: vec![("Server".to_string(), SERVER_AGENT.to_string())],
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200, "OK")
    }

    pub fn bad_request() -> Self {
        Self::new(400, "Bad Request")
    }

    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(405, "Method Not Allowed")
    }

    pub fn bad_gateway() -> Self {
        Self::new(502, "Bad Gateway")
    }

    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Replace any existing header with the same name (case-insensitive).
    pub fn set_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.add_header(name, value)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Plain-text body with the matching content type.
    pub fn with_text(self, text: &str) -> Self {
        self.set_header("Content-Type", CONTENT_TYPE_TEXT)
            .with_body(text)
    }

    /// JSON body with the matching content type.
    pub fn with_json(self, json: String) -> Self {
        self.set_header("Content-Type", CONTENT_TYPE_JSON)
            .with_body(json)
    }

    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Serialize to the HTTP/1.1 wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status_code, self.status_text);

        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }

        if self.header("Content-Length").is_none() {
            head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        }
        if self.header("Connection").is_none() {
            head.push_str("Connection: close\r\n");
        }
        head.push_str("\r\n");

        let mut out = head.into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::ok()
    }
}
