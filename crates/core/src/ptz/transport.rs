use std::time::Duration;

use rand::RngExt;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONNECTION, CONTENT_TYPE, WWW_AUTHENTICATE};

use super::auth::{self, Challenge, Credentials};
use crate::error::Result;

/// Upper bound on a single device call, connect through response.
pub const DEVICE_TIMEOUT: Duration = Duration::from_secs(5);

pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// One SOAP call to the camera.
#[derive(Debug, Clone, Copy)]
pub struct SoapRequest<'a> {
    /// Absolute ONVIF service URL.
    pub endpoint: &'a str,
    /// SOAP action URI, sent quoted in the `SOAPAction` header.
    pub action: &'a str,
    /// Complete envelope.
    pub body: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// Delivers SOAP envelopes to a device.
///
/// Returns the final HTTP status code; interpreting it is the caller's job.
/// [`HttpSoapTransport`] is the real implementation, tests substitute a
/// recording double.
pub trait SoapTransport: Send + Sync {
    fn deliver(&self, request: &SoapRequest<'_>) -> Result<u16>;
}

/// Blocking HTTP transport with Basic/Digest authentication.
///
/// The first POST goes out without credentials. If the device answers `401`
/// with a challenge it understands, the challenge is answered once; any other
/// status is returned as-is. There is no retry beyond that handshake.
pub struct HttpSoapTransport {
    client: Client,
}

impl HttpSoapTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEVICE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        // cameras sit on the local network; system proxies do not apply
        let client = Client::builder().timeout(timeout).no_proxy().build()?;
        Ok(Self { client })
    }

    fn post(&self, request: &SoapRequest<'_>, authorization: Option<&str>) -> Result<reqwest::blocking::Response> {
        let mut builder = self
            .client
            .post(request.endpoint)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header("SOAPAction", format!("\"{}\"", request.action))
            .header(CONNECTION, "close")
            .body(request.body.to_string());

        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }

        Ok(builder.send()?)
    }
}

impl SoapTransport for HttpSoapTransport {
    fn deliver(&self, request: &SoapRequest<'_>) -> Result<u16> {
        tracing::debug!(endpoint = %request.endpoint, action = %request.action, "sending SOAP request");

        let response = self.post(request, None)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response.status().as_u16());
        }

        let challenge = Challenge::select(
            response
                .headers()
                .get_all(WWW_AUTHENTICATE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        );
        let Some(challenge) = challenge else {
            tracing::warn!(endpoint = %request.endpoint, "device rejected request without a usable auth challenge");
            return Ok(response.status().as_u16());
        };

        let cnonce = format!("{:016x}", rand::rng().random::<u64>());
        let authorization = challenge.authorization(
            Credentials {
                username: request.username,
                password: request.password,
            },
            "POST",
            auth::request_uri(request.endpoint),
            &cnonce,
        );

        tracing::trace!(scheme = ?challenge_scheme(&challenge), "answering auth challenge");
        let response = self.post(request, Some(&authorization))?;
        Ok(response.status().as_u16())
    }
}

fn challenge_scheme(challenge: &Challenge) -> &'static str {
    match challenge {
        Challenge::Basic => "basic",
        Challenge::Digest(_) => "digest",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Minimal one-request-per-connection device: answers each connection
    /// with the next canned response and reports the raw request.
    fn fake_device(responses: Vec<&'static str>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for canned in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut raw = Vec::new();
                let mut buf = [0u8; 4096];
                loop {
                    let n = stream.read(&mut buf).unwrap();
                    raw.extend_from_slice(&buf[..n]);
                    if n == 0 || String::from_utf8_lossy(&raw).contains("</s:Envelope>") {
                        break;
                    }
                }
                tx.send(String::from_utf8_lossy(&raw).into_owned()).unwrap();
                stream.write_all(canned.as_bytes()).unwrap();
            }
        });

        (format!("http://{addr}/onvif/ptz_service"), rx)
    }

    fn request(endpoint: &str) -> SoapRequest<'_> {
        SoapRequest {
            endpoint,
            action: crate::ptz::envelope::ACTION_STOP,
            body: "<s:Envelope></s:Envelope>",
            username: "admin",
            password: "secret",
        }
    }

    const OK: &str = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    #[test]
    fn sends_soap_headers() {
        let (endpoint, rx) = fake_device(vec![OK]);
        let transport = HttpSoapTransport::new().unwrap();

        let status = transport.deliver(&request(&endpoint)).unwrap();
        assert_eq!(status, 200);

        let raw = rx.recv().unwrap().to_ascii_lowercase();
        assert!(raw.starts_with("post /onvif/ptz_service http/1.1"));
        assert!(raw.contains("content-type: application/soap+xml; charset=utf-8"));
        assert!(raw.contains("soapaction: \"http://www.onvif.org/ver20/ptz/wsdl/stop\""));
        assert!(!raw.contains("authorization:"));
    }

    #[test]
    fn answers_digest_challenge() {
        let (endpoint, rx) = fake_device(vec![
            "HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: Digest realm=\"cam\", qop=\"auth\", nonce=\"abc123\"\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            OK,
        ]);
        let transport = HttpSoapTransport::new().unwrap();

        assert_eq!(transport.deliver(&request(&endpoint)).unwrap(), 200);

        let _first = rx.recv().unwrap();
        let second = rx.recv().unwrap();
        assert!(second.contains("Digest username=\"admin\", realm=\"cam\", nonce=\"abc123\", uri=\"/onvif/ptz_service\""));
        assert!(second.contains("qop=auth, nc=00000001"));
    }

    #[test]
    fn answers_basic_challenge() {
        let (endpoint, rx) = fake_device(vec![
            "HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: Basic realm=\"cam\"\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            OK,
        ]);
        let transport = HttpSoapTransport::new().unwrap();

        assert_eq!(transport.deliver(&request(&endpoint)).unwrap(), 200);
        let _first = rx.recv().unwrap();
        let second = rx.recv().unwrap();
        assert!(second.contains("Basic YWRtaW46c2VjcmV0"));
    }

    #[test]
    fn reports_rejection_status() {
        let (endpoint, _rx) = fake_device(vec![
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        ]);
        let transport = HttpSoapTransport::new().unwrap();
        assert_eq!(transport.deliver(&request(&endpoint)).unwrap(), 500);
    }

    #[test]
    fn unreachable_device_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpSoapTransport::with_timeout(Duration::from_millis(500)).unwrap();
        let endpoint = format!("http://{addr}/onvif/ptz_service");
        assert!(transport.deliver(&request(&endpoint)).is_err());
    }
}
