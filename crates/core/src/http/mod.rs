//! Minimal HTTP/1.1 for the kiosk's own endpoints.
//!
//! One request per connection, answered and closed:
//!
//! ```text
//! GET /api/menu?lang=fr HTTP/1.1\r\n
//! Host: kiosk.local:5000\r\n
//! \r\n
//! ```
//!
//! ## Routes
//!
//! | Path | Response |
//! |------|----------|
//! | `/`, `/index.html` | menu page |
//! | `/apps/<name>` | app page |
//! | `/api/menu` | menu JSON |
//! | `/api/cctv/stream` | stream discovery JSON |
//! | `/api/ptz` | PTZ command (POST only) |
//! | `/css/styles.css` | stylesheet from the public directory |
//! | `/icons/*` | SVG icons from the public directory |

pub mod query;
pub mod request;
pub mod response;
pub mod router;

pub use query::{parse_query, url_decode};
pub use request::HttpRequest;
pub use response::HttpResponse;
pub use router::Router;
