use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::assets::StaticFiles;
use crate::camera_api::CameraApi;
use crate::error::{KioskError, Result};
use crate::http::Router;
use crate::pages::{Language, PageRenderer};
use crate::transport::tcp;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Listening-socket and per-connection settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `host:port` to listen on.
    pub bind_addr: String,
    /// Directory holding `css/` and `icons/`.
    pub public_dir: PathBuf,
    /// Page language when a request carries no valid `lang` parameter.
    pub default_language: Language,
    /// Pending-connection queue length passed to `listen(2)`.
    pub backlog: i32,
    /// Requests larger than this are cut off and answered as read so far.
    pub max_request_bytes: usize,
    /// How long a connection may stay silent before it is dropped.
    pub read_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            public_dir: PathBuf::from("public"),
            default_language: Language::default(),
            backlog: 16,
            max_request_bytes: 64 * 1024,
            read_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Router serving `pages` and `camera` with this configuration's public
    /// directory and default language.
    pub fn router(&self, pages: Arc<dyn PageRenderer>, camera: CameraApi) -> Router {
        Router::new(
            pages,
            camera,
            StaticFiles::new(&self.public_dir),
            self.default_language,
        )
    }
}

/// Stops a running [`Server`] from another thread or a signal handler.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!("shutdown requested");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }
}

/// Kiosk HTTP server.
///
/// Owns the listening socket through its accept thread. Each accepted
/// connection gets its own thread via [`transport::tcp`](crate::transport::tcp)
/// and is answered with exactly one response.
pub struct Server {
    config: Arc<ServerConfig>,
    router: Arc<Router>,
    running: Arc<AtomicBool>,
    local_addr: Option<SocketAddr>,
    accept_thread: Option<JoinHandle<()>>,
}

impl Server {
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            config: Arc::new(config),
            router: Arc::new(router),
            running: Arc::new(AtomicBool::new(false)),
            local_addr: None,
            accept_thread: None,
        }
    }

    /// Bind and start accepting on a background thread.
    ///
    /// On error nothing is left running and no socket stays open.
    pub fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) || self.accept_thread.is_some() {
            return Err(KioskError::AlreadyRunning);
        }

        let listener = setup_socket(&self.config)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        self.local_addr = Some(local_addr);

        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let router = self.router.clone();
        let config = self.config.clone();

        tracing::info!(addr = %local_addr, "kiosk server listening");

        self.accept_thread = Some(thread::spawn(move || {
            tcp::accept_loop(listener, router, config, running);
        }));

        Ok(())
    }

    /// Start, then block until a [`ShutdownHandle`] stops the server.
    pub fn run(&mut self) -> Result<()> {
        self.start()?;
        while self.running.load(Ordering::SeqCst) {
            thread::sleep(tcp::POLL_INTERVAL);
        }
        self.stop();
        Ok(())
    }

    /// Stop accepting and close the listening socket.
    ///
    /// Connections already being served finish on their own threads.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.accept_thread.take() {
            if handle.join().is_err() {
                tracing::error!("accept thread panicked");
            }
            tracing::info!("server stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            running: self.running.clone(),
        }
    }

    /// Bound address once started; reports the real port when binding to `:0`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Create the listening socket: address reuse, bind, listen.
fn setup_socket(config: &ServerConfig) -> Result<TcpListener> {
    let addr = config
        .bind_addr
        .to_socket_addrs()
        .map_err(|_| KioskError::InvalidAddress(config.bind_addr.clone()))?
        .next()
        .ok_or_else(|| KioskError::InvalidAddress(config.bind_addr.clone()))?;

    let bind_error = |source| KioskError::Bind {
        addr: config.bind_addr.clone(),
        source,
    };

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(bind_error)?;
    socket.set_reuse_address(true).map_err(bind_error)?;
    #[cfg(unix)]
    socket.set_reuse_port(true).map_err(bind_error)?;
    socket.bind(&addr.into()).map_err(bind_error)?;
    socket.listen(config.backlog).map_err(bind_error)?;

    Ok(socket.into())
}
