/// A parsed HTTP/1.x request.
///
/// ```text
/// Method SP Request-Target SP HTTP-Version CRLF
/// *(Header: Value CRLF)
/// CRLF
/// [body]
/// ```
///
/// Parsing is best-effort: [`parse`](Self::parse) never fails. A missing
/// request line or header block leaves the corresponding fields empty, and
/// the router answers an empty method or path with a 4xx instead of
/// crashing. The request is not modified after parsing.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    /// Request method (`GET`, `POST`, ...), as received.
    pub method: String,
    /// Request target including any `?query` suffix.
    pub path: String,
    /// Protocol version (`HTTP/1.1`, `HTTP/1.0`).
    pub version: String,
    /// Headers as ordered (name, value) pairs, trimmed. Lookups via
    /// [`header`](Self::header) are case-insensitive.
    pub headers: Vec<(String, String)>,
    /// Everything after the blank line that ended the header block.
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Parse a request from raw bytes as read off the socket.
    pub fn parse(raw: &[u8]) -> Self {
        let (head, body) = match find_head_end(raw) {
            Some((head_end, body_start)) => (&raw[..head_end], &raw[body_start..]),
            None => (raw, &[][..]),
        };

        let head = String::from_utf8_lossy(head);
        let mut lines = head.lines();

        let mut request = HttpRequest {
            body: body.to_vec(),
            ..Default::default()
        };

        let Some(request_line) = lines.next() else {
            return request;
        };

        let mut parts = request_line.split_whitespace();
        request.method = parts.next().unwrap_or_default().to_string();
        request.path = parts.next().unwrap_or_default().to_string();
        request.version = parts.next().unwrap_or_default().to_string();

        for line in lines {
            if line.is_empty() {
                break;
            }

            let Some((name, value)) = line.split_once(':') else {
                tracing::trace!(line, "skipping malformed header line");
                continue;
            };

            request
                .headers
                .push((name.trim().to_string(), value.trim().to_string()));
        }

        request
    }

    /// Look up a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Declared body length, if a valid `Content-Length` header is present.
    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length")
            .and_then(|value| value.parse().ok())
    }

    /// Split the request target into the path and the raw query string.
    ///
    /// `/api/ptz?action=left` → `("/api/ptz", Some("action=left"))`.
    pub fn target(&self) -> (&str, Option<&str>) {
        match self.path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (self.path.as_str(), None),
        }
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Locate the end of the header block.
///
/// Returns `(head_end, body_start)`: the head is `raw[..head_end]` and the
/// body starts at `body_start`. Accepts a bare `\n\n` terminator for lenient
/// clients.
pub(crate) fn find_head_end(raw: &[u8]) -> Option<(usize, usize)> {
    let crlf = raw.windows(4).position(|w| w == b"\r\n\r\n");
    let lf = raw.windows(2).position(|w| w == b"\n\n");

    match (crlf, lf) {
        (Some(c), Some(l)) if l < c => Some((l, l + 2)),
        (Some(c), _) => Some((c, c + 4)),
        (None, Some(l)) => Some((l, l + 2)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_get_request() {
        let raw = b"GET /index.html?lang=fr HTTP/1.1\r\nHost: kiosk.local\r\nAccept: */*\r\n\r\n";
        let req = HttpRequest::parse(raw);
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/index.html?lang=fr");
        assert_eq!(req.version, "HTTP/1.1");
        assert_eq!(req.header("Host"), Some("kiosk.local"));
        assert!(req.body.is_empty());
        assert_eq!(req.target(), ("/index.html", Some("lang=fr")));
    }

    #[test]
    fn parse_post_with_body() {
        let raw = b"POST /api/ptz HTTP/1.1\r\n\
                    Content-Type: application/x-www-form-urlencoded\r\n\
                    Content-Length: 11\r\n\r\n\
                    action=left";
        let req = HttpRequest::parse(raw);
        assert_eq!(req.method, "POST");
        assert_eq!(req.content_length(), Some(11));
        assert_eq!(req.body, b"action=left");
        assert_eq!(req.target(), ("/api/ptz", None));
    }

    #[test]
    fn header_whitespace_is_trimmed() {
        let raw = b"GET / HTTP/1.1\r\n  X-Kiosk  :   panel-3  \r\n\r\n";
        let req = HttpRequest::parse(raw);
        assert_eq!(req.headers, vec![("X-Kiosk".to_string(), "panel-3".to_string())]);
    }

    #[test]
    fn header_lookup_case_insensitive() {
        let raw = b"GET / HTTP/1.1\r\ncontent-length: 42\r\n\r\n";
        let req = HttpRequest::parse(raw);
        assert_eq!(req.header("Content-Length"), Some("42"));
        assert_eq!(req.header("CONTENT-LENGTH"), Some("42"));
        assert_eq!(req.content_length(), Some(42));
    }

    #[test]
    fn empty_input_yields_empty_request() {
        let req = HttpRequest::parse(b"");
        assert!(req.method.is_empty());
        assert!(req.path.is_empty());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn truncated_request_line_is_partial() {
        let req = HttpRequest::parse(b"GET\r\n\r\n");
        assert_eq!(req.method, "GET");
        assert!(req.path.is_empty());
        assert!(req.version.is_empty());
    }

    #[test]
    fn malformed_header_lines_are_skipped() {
        let raw = b"GET / HTTP/1.1\r\nnot a header\r\nHost: a\r\n\r\n";
        let req = HttpRequest::parse(raw);
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("Host"), Some("a"));
    }

    #[test]
    fn bare_lf_terminator_is_accepted() {
        let req = HttpRequest::parse(b"POST /api/ptz HTTP/1.0\nHost: a\n\naction=up");
        assert_eq!(req.header("Host"), Some("a"));
        assert_eq!(req.body, b"action=up");
    }

    #[test]
    fn head_end_prefers_earliest_terminator() {
        assert_eq!(find_head_end(b"A\r\n\r\nB"), Some((1, 5)));
        assert_eq!(find_head_end(b"A\n\nB\r\n\r\n"), Some((1, 3)));
        assert_eq!(find_head_end(b"A\r\nB"), None);
    }
}
