use std::fs;
use std::path::{Component, Path, PathBuf};

/// Read-only view of the kiosk's public directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Contents of `relative` under the root.
    ///
    /// Paths that could leave the root (`..`, absolute, drive prefixes) and
    /// missing or unreadable files yield `None`.
    pub fn read(&self, relative: &str) -> Option<Vec<u8>> {
        let relative = Path::new(relative.trim_start_matches('/'));
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !safe || relative.as_os_str().is_empty() {
            tracing::warn!(path = %relative.display(), "refusing static path");
            return None;
        }

        let path = self.root.join(relative);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "static file unavailable");
                None
            }
        }
    }
}

/// MIME type for `path`, by extension.
pub fn mime_type(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
