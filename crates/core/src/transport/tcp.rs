use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::http::request::find_head_end;
use crate::http::{HttpRequest, HttpResponse, Router};
use crate::server::ServerConfig;

/// How often the accept loop re-checks the `running` flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

const READ_CHUNK: usize = 8 * 1024;

/// Non-blocking TCP accept loop.
///
/// Checks the `running` flag between accepts with a 50ms poll interval
/// so that [`crate::server::Server::stop`] can terminate it promptly.
/// The listener is dropped, and the port released, when the loop exits.
pub fn accept_loop(
    listener: TcpListener,
    router: Arc<Router>,
    config: Arc<ServerConfig>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer_addr)) => {
                if stream.set_nonblocking(false).is_err() {
                    continue;
                }
                let router = router.clone();
                let config = config.clone();
                thread::spawn(move || {
                    Connection::handle(stream, peer_addr, &router, &config);
                });
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            }
        }
    }
    tracing::debug!("accept loop exited");
}

/// One client connection: one request in, one response out, then close.
struct Connection {
    stream: TcpStream,
    peer_addr: SocketAddr,
}

impl Connection {
    fn handle(stream: TcpStream, peer_addr: SocketAddr, router: &Router, config: &ServerConfig) {
        if let Err(e) = stream.set_read_timeout(Some(config.read_timeout)) {
            tracing::warn!(%peer_addr, error = %e, "failed to set read timeout");
        }

        let mut conn = Connection { stream, peer_addr };
        let reason = conn.serve(router, config.max_request_bytes);
        conn.close();

        tracing::debug!(%peer_addr, reason, "connection closed");
    }

    /// Returns the reason the connection ended.
    fn serve(&mut self, router: &Router, max_request_bytes: usize) -> &'static str {
        let raw = match self.read_request(max_request_bytes) {
            Ok(raw) if raw.is_empty() => return "closed before sending a request",
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(peer = %self.peer_addr, error = %e, "read failed");
                return "read error";
            }
        };

        let request = HttpRequest::parse(&raw);
        tracing::info!(peer = %self.peer_addr, method = %request.method, path = %request.path, "request");

        let response = router.handle(&request);
        tracing::debug!(peer = %self.peer_addr, status = response.status_code, "response");

        match self.write_response(&response) {
            Ok(()) => "response sent",
            Err(e) => {
                tracing::debug!(peer = %self.peer_addr, error = %e, "write failed");
                "write error"
            }
        }
    }

    /// Read until the header block and `Content-Length` body bytes have
    /// arrived, the peer stops sending, or `limit` bytes are buffered.
    fn read_request(&mut self, limit: usize) -> std::io::Result<Vec<u8>> {
        let mut raw = Vec::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = match self.stream.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                // a timeout after partial data still yields a best-effort request
                Err(e) if is_timeout(&e) && !raw.is_empty() => break,
                Err(e) => return Err(e),
            };
            if n == 0 {
                break;
            }

            raw.extend_from_slice(&chunk[..n]);
            if raw.len() >= limit {
                tracing::warn!(peer = %self.peer_addr, limit, "request exceeds size limit, truncating");
                raw.truncate(limit);
                break;
            }
            if request_complete(&raw) {
                break;
            }
        }

        Ok(raw)
    }

    fn write_response(&mut self, response: &HttpResponse) -> std::io::Result<()> {
        self.stream.write_all(&response.serialize())?;
        self.stream.flush()
    }

    fn close(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Whether `raw` holds the full header block plus the declared body.
fn request_complete(raw: &[u8]) -> bool {
    let Some((head_end, body_start)) = find_head_end(raw) else {
        return false;
    };
    let head = HttpRequest::parse(&raw[..head_end]);
    let expected = head.content_length().unwrap_or(0);
    raw.len() - body_start >= expected
}
