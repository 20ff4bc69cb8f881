use std::sync::Arc;

use crate::assets::{StaticFiles, mime_type};
use crate::camera_api::CameraApi;
use crate::http::query::parse_query;
use crate::http::request::HttpRequest;
use crate::http::response::{CONTENT_TYPE_HTML, HttpResponse, NO_STORE};
use crate::pages::{Language, PageRenderer};

const NOT_FOUND_PAGE: &str =
    "<html><body><h1>404 - Not Found</h1><p>The requested path was not found.</p></body></html>";

/// Maps one parsed request to one response.
///
/// Shared by every connection thread; holds no per-request state.
pub struct Router {
    pages: Arc<dyn PageRenderer>,
    camera: CameraApi,
    files: StaticFiles,
    default_language: Language,
}

impl Router {
    pub fn new(
        pages: Arc<dyn PageRenderer>,
        camera: CameraApi,
        files: StaticFiles,
        default_language: Language,
    ) -> Self {
        Self {
            pages,
            camera,
            files,
            default_language,
        }
    }

    pub fn handle(&self, request: &HttpRequest) -> HttpResponse {
        if request.method.is_empty() || request.path.is_empty() {
            tracing::warn!(method = %request.method, path = %request.path, "malformed request line");
            return not_found(&request.path);
        }

        let (path, raw_query) = request.target();
        let path = if path.is_empty() { "/" } else { path };
        let query = raw_query.map(parse_query).unwrap_or_default();

        let lang = query
            .get("lang")
            .and_then(|value| Language::from_query(value))
            .unwrap_or(self.default_language);

        if path == "/" || path == "/index.html" {
            return page(self.pages.menu_page(lang), lang);
        }

        if let Some(app) = path.strip_prefix("/apps/") {
            return match self.pages.app_page(app.trim_end_matches('/'), lang) {
                Some(html) => page(html, lang),
                None => not_found(path),
            };
        }

        if path == "/api/menu" {
            return HttpResponse::ok()
                .add_header("Access-Control-Allow-Origin", "*")
                .add_header("Content-Language", lang.code())
                .with_json(self.pages.menu_json(lang));
        }

        if let Some(response) = self.camera.handle(path, request, &query) {
            return response;
        }

        if path == "/css/styles.css" {
            return match self.files.read("css/styles.css") {
                Some(css) => HttpResponse::ok()
                    .add_header("Content-Type", mime_type(path))
                    .add_header("Cache-Control", "no-cache")
                    .with_body(css),
                None => HttpResponse::not_found()
                    .with_text("CSS file not found"),
            };
        }

        if path.starts_with("/icons/") {
            return match self.files.read(path) {
                Some(icon) => HttpResponse::ok()
                    .add_header("Content-Type", "image/svg+xml")
                    .add_header("Cache-Control", "public, max-age=86400")
                    .with_body(icon),
                None => HttpResponse::not_found()
                    .with_text("Icon not found"),
            };
        }

        not_found(path)
    }
}

fn page(html: String, lang: Language) -> HttpResponse {
    HttpResponse::ok()
        .add_header("Content-Type", CONTENT_TYPE_HTML)
        .add_header("Cache-Control", NO_STORE)
        .add_header("Content-Language", lang.code())
        .with_body(html)
}

fn not_found(path: &str) -> HttpResponse {
    tracing::debug!(path, "no route");
    HttpResponse::not_found()
        .add_header("Content-Type", CONTENT_TYPE_HTML)
        .with_body(NOT_FOUND_PAGE)
}
