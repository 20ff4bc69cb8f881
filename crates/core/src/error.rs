//! Error types for the kiosk server library.

/// Errors that can occur in the kiosk server library.
///
/// Variants map to specific failure modes across the stack:
///
/// - **Startup**: [`Bind`](Self::Bind), [`InvalidAddress`](Self::InvalidAddress),
///   [`AlreadyRunning`](Self::AlreadyRunning): fatal, the accept loop never starts.
/// - **Connection**: [`Io`](Self::Io): socket read/write failures, logged per connection.
/// - **Device**: [`Http`](Self::Http), [`Transport`](Self::Transport): failures
///   talking to the camera. These never reach HTTP callers as errors; the PTZ
///   client folds them into a [`CommandResult`](crate::ptz::CommandResult).
#[derive(Debug, thiserror::Error)]
pub enum KioskError {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Creating, configuring, binding or listening on the server socket failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The configured bind address could not be parsed as `host:port`.
    #[error("invalid bind address: {0}")]
    InvalidAddress(String),

    /// [`Server::start`](crate::Server::start) was called while already running.
    #[error("server already running")]
    AlreadyRunning,

    /// The outbound HTTP client failed (connect, timeout, protocol).
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Any other failure delivering a request to the camera.
    #[error("{0}")]
    Transport(String),
}

/// Convenience alias for `Result<T, KioskError>`.
pub type Result<T> = std::result::Result<T, KioskError>;
