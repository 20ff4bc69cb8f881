//! Network transport for the kiosk's HTTP endpoints.
//!
//! - **TCP** ([`tcp`]): a non-blocking accept loop on the listening socket,
//!   with a thread per accepted connection. Each connection carries exactly
//!   one request/response exchange.

pub mod tcp;
