//! HTTP front end: routing, handlers, and the tiny_http accept loop.
//!
//! Handlers work on plain [`Request`]/[`Response`] values so they can be
//! exercised without a socket. Page state is rebuilt from the store on
//! every request.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::Auth;
use crate::config::Site;
use crate::error::{Error, Result};
use crate::filter::{Filter, View};
use crate::library::{Library, NewPhoto, UPLOADS_URL_PREFIX};
use crate::lightbox::{Event, Key};
use crate::pages::{GalleryPage, HomePage};
use crate::render::Renderer;
use crate::store::PhotoUpdate;
use crate::theme::{self, Theme};
use crate::util::{parse_query, url_decode_path};

/// Non-upload bodies (login forms, JSON edits) are small.
const FORM_BODY_LIMIT: u64 = 64 * 1024;

/// Upper bound on `zoom=` wheel notches; the scale clamps well before this.
const MAX_ZOOM_NOTCHES: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Other,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub cookie: Option<String>,
    pub body: Vec<u8>,
    /// Body was cut off at the read limit
    pub body_too_large: bool,
}

impl Request {
    /// Build a request from a raw `path?query` target.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            method,
            path: url_decode_path(path),
            query: parse_query(query),
            cookie: None,
            body: Vec::new(),
            body_too_large: false,
        }
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl Response {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    fn html(status: u16, html: String) -> Self {
        Self::new(status, "text/html; charset=utf-8", html)
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status, "application/json; charset=utf-8", body),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode response");
                Self::new(500, "text/plain; charset=utf-8", "500 Internal Server Error")
            }
        }
    }

    fn json_error(status: u16, message: &str) -> Self {
        Self::json(status, &ErrorBody { error: message })
    }

    fn redirect(status: u16, location: &str) -> Self {
        Self::new(status, "text/plain; charset=utf-8", Vec::new()).with_header("Location", location)
    }

    fn not_found() -> Self {
        Self::new(404, "text/plain; charset=utf-8", "404 Not Found")
    }

    fn internal_error() -> Self {
        Self::new(500, "text/plain; charset=utf-8", "500 Internal Server Error")
    }

    fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status code and message for an API failure.
fn api_error(e: &Error) -> Response {
    match e {
        Error::PhotoNotFound { .. } => Response::json_error(404, "Photo not found"),
        Error::EmptyUpload => Response::json_error(400, "No file uploaded"),
        Error::UploadTooLarge { .. } => Response::json_error(413, &e.to_string()),
        Error::Unauthorized => Response::json_error(401, "Unauthorized"),
        Error::Image(_) => {
            tracing::error!(error = %e, "image processing failed");
            Response::json_error(500, "Image processing failed")
        }
        _ => {
            tracing::error!(error = %e, "request failed");
            Response::json_error(500, "Internal server error")
        }
    }
}

/// Replay the lightbox state a page link carries: `zoom=` wheel notches,
/// `info=1`, then a `key=` press from the keyboard adapter.
fn lightbox_events(req: &Request) -> Vec<Event> {
    let notches = req
        .param("zoom")
        .and_then(|z| z.parse::<u32>().ok())
        .unwrap_or(0)
        .min(MAX_ZOOM_NOTCHES);

    let mut events = vec![Event::Wheel { delta_y: -1.0 }; notches as usize];
    if req.param("info") == Some("1") {
        events.push(Event::InfoToggle);
    }
    if let Some(key) = req.param("key") {
        events.push(Event::Key(Key::from_name(key)));
    }
    events
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Gallery,
    ListPhotos,
    CreatePhoto,
    UpdatePhoto(String),
    DeletePhoto(String),
    ApiLogin,
    LoginPage,
    LoginForm,
    Admin(String),
    Upload(String),
    Static(String),
    Public(String),
    MethodNotAllowed,
}

impl Route {
    pub fn parse(method: Method, path: &str) -> Route {
        let path = path.trim_end_matches('/');

        match (method, path) {
            (Method::Get, "") => Route::Home,
            (Method::Get, "/gallery") => Route::Gallery,
            (Method::Get, "/api/photos") => Route::ListPhotos,
            (Method::Post, "/api/photos") => Route::CreatePhoto,
            (Method::Post, "/api/login") => Route::ApiLogin,
            (Method::Get, "/login") => Route::LoginPage,
            (Method::Post, "/login") => Route::LoginForm,
            (Method::Put | Method::Delete, _) if path.starts_with("/api/photos/") => {
                let id = path["/api/photos/".len()..].to_string();
                match (method, id.is_empty() || id.contains('/')) {
                    (_, true) => Route::MethodNotAllowed,
                    (Method::Put, false) => Route::UpdatePhoto(id),
                    _ => Route::DeletePhoto(id),
                }
            }
            (Method::Get, "/admin") => Route::Admin(String::new()),
            (Method::Get, _) => {
                if let Some(rest) = path.strip_prefix("/admin/") {
                    Route::Admin(rest.to_string())
                } else if let Some(name) = path.strip_prefix(UPLOADS_URL_PREFIX) {
                    Route::Upload(name.to_string())
                } else if let Some(name) = path.strip_prefix("/static/") {
                    Route::Static(name.to_string())
                } else {
                    Route::Public(path.trim_start_matches('/').to_string())
                }
            }
            _ => Route::MethodNotAllowed,
        }
    }
}

#[derive(Deserialize)]
struct LoginBody {
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct Message<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct LoginSuccess {
    success: bool,
}

/// Everything a request handler needs, built once at startup.
#[derive(Debug)]
pub struct App {
    library: Library,
    renderer: Renderer,
    auth: Auth,
    public_dir: PathBuf,
    date_format: String,
}

impl App {
    pub fn new(site_dir: &Path, site: &Site) -> Result<Self> {
        let theme = Theme::resolve(site_dir, &site.theme)?;
        Ok(Self {
            library: Library::for_site(site_dir, site),
            renderer: Renderer::new(theme, site),
            auth: Auth::new(&site.password),
            public_dir: site_dir.join(&site.public),
            date_format: site.date_format.clone(),
        })
    }

    /// Largest body the accept loop should read.
    pub fn body_limit(&self) -> u64 {
        self.library.max_upload_bytes().max(FORM_BODY_LIMIT)
    }

    pub fn handle(&self, req: &Request) -> Response {
        let route = Route::parse(req.method, &req.path);
        tracing::trace!(?route, "routing request");

        match route {
            Route::Home => self.home(req),
            Route::Gallery => self.gallery(req),
            Route::ListPhotos => match self.library.store().list_newest_first() {
                Ok(photos) => Response::json(200, &photos),
                Err(e) => api_error(&e),
            },
            Route::CreatePhoto => self.create_photo(req).unwrap_or_else(|e| api_error(&e)),
            Route::UpdatePhoto(id) => self
                .update_photo(req, &id)
                .unwrap_or_else(|e| api_error(&e)),
            Route::DeletePhoto(id) => self
                .delete_photo(req, &id)
                .unwrap_or_else(|e| api_error(&e)),
            Route::ApiLogin => self.api_login(req),
            Route::LoginPage => self.page(self.renderer.login(false), 200),
            Route::LoginForm => self.login_form(req),
            Route::Admin(rest) => {
                if !self.is_admin(req) {
                    return Response::redirect(302, "/login");
                }
                serve_file(&self.public_dir.join("admin"), &rest)
            }
            Route::Upload(name) => {
                match self.library.upload_path(&format!("{}{}", UPLOADS_URL_PREFIX, name)) {
                    Some(path) => read_file(&path),
                    None => Response::not_found(),
                }
            }
            Route::Static(name) => match self.renderer.theme().static_file(&name) {
                Some(data) => Response::new(200, guess_content_type(Path::new(&name)), data),
                None => Response::not_found(),
            },
            Route::Public(rest) => serve_file(&self.public_dir, &rest),
            Route::MethodNotAllowed => {
                Response::new(405, "text/plain; charset=utf-8", "405 Method Not Allowed")
            }
        }
    }

    fn home(&self, req: &Request) -> Response {
        let mut page = HomePage::load(self.library.store().list_newest_first(), &self.date_format);
        page.select_filter(Filter::parse(req.param("filter").unwrap_or_default()));
        page.select_view(View::parse(req.param("view").unwrap_or_default()));
        if let Some(index) = req.param("photo").and_then(|p| p.parse().ok()) {
            page.open(index);
            for event in lightbox_events(req) {
                page.handle(event);
            }
        }
        self.page(self.renderer.home(&page), 200)
    }

    fn gallery(&self, req: &Request) -> Response {
        let mut page =
            GalleryPage::load(self.library.store().list_newest_first(), &self.date_format);
        if let Some(index) = req.param("photo").and_then(|p| p.parse().ok()) {
            page.open(index);
            for event in lightbox_events(req) {
                page.handle(event);
            }
        }
        self.page(self.renderer.gallery(&page), 200)
    }

    fn page(&self, rendered: Result<String>, status: u16) -> Response {
        match rendered {
            Ok(html) => Response::html(status, html),
            Err(e) => {
                tracing::error!(error = %e, "failed to render page");
                Response::internal_error()
            }
        }
    }

    fn is_admin(&self, req: &Request) -> bool {
        self.auth.is_admin(req.cookie.as_deref())
    }

    fn require_admin(&self, req: &Request) -> Result<()> {
        if self.is_admin(req) {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }

    fn api_login(&self, req: &Request) -> Response {
        let Ok(body) = serde_json::from_slice::<LoginBody>(&req.body) else {
            return Response::json_error(400, "Invalid request body");
        };

        if self.auth.verify_password(&body.password) {
            tracing::info!("admin logged in");
            Response::json(200, &LoginSuccess { success: true })
                .with_header("Set-Cookie", self.auth.session_cookie())
        } else {
            tracing::warn!("failed login attempt");
            Response::json_error(401, "Wrong password")
        }
    }

    fn login_form(&self, req: &Request) -> Response {
        let form = parse_query(&String::from_utf8_lossy(&req.body));
        let password = form.get("password").map(String::as_str).unwrap_or_default();

        if self.auth.verify_password(password) {
            tracing::info!("admin logged in");
            Response::redirect(303, "/admin").with_header("Set-Cookie", self.auth.session_cookie())
        } else {
            tracing::warn!("failed login attempt");
            self.page(self.renderer.login(true), 401)
        }
    }

    fn create_photo(&self, req: &Request) -> Result<Response> {
        self.require_admin(req)?;
        if req.body_too_large {
            return Err(Error::UploadTooLarge {
                limit: self.library.max_upload_bytes(),
            });
        }

        let details = NewPhoto {
            title: req.param("title").map(str::to_string),
            category: req.param("category").map(str::to_string),
            series: req.param("series").map(str::to_string),
        };
        let photo = self.library.add(&req.body, details)?;
        Ok(Response::json(201, &photo))
    }

    fn update_photo(&self, req: &Request, id: &str) -> Result<Response> {
        self.require_admin(req)?;
        let Ok(update) = serde_json::from_slice::<PhotoUpdate>(&req.body) else {
            return Ok(Response::json_error(400, "Invalid request body"));
        };
        let photo = self.library.edit(id, update)?;
        Ok(Response::json(200, &photo))
    }

    fn delete_photo(&self, req: &Request, id: &str) -> Result<Response> {
        self.require_admin(req)?;
        self.library.remove(id)?;
        Ok(Response::json(
            200,
            &Message {
                message: "Photo deleted successfully",
            },
        ))
    }
}

/// Serve `rest` below `root`, with `index.html` for directories.
fn serve_file(root: &Path, rest: &str) -> Response {
    let path = if rest.is_empty() {
        root.to_path_buf()
    } else {
        match theme::safe_relative(rest) {
            Some(relative) => root.join(relative),
            None => return Response::not_found(),
        }
    };

    if path.is_dir() {
        read_file(&path.join("index.html"))
    } else {
        read_file(&path)
    }
}

fn read_file(path: &Path) -> Response {
    if !path.is_file() {
        return Response::not_found();
    }
    match std::fs::read(path) {
        Ok(data) => Response::new(200, guess_content_type(path), data),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read file");
            Response::internal_error()
        }
    }
}

fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

fn method_of(method: &tiny_http::Method) -> Method {
    match method {
        tiny_http::Method::Get | tiny_http::Method::Head => Method::Get,
        tiny_http::Method::Post => Method::Post,
        tiny_http::Method::Put => Method::Put,
        tiny_http::Method::Delete => Method::Delete,
        _ => Method::Other,
    }
}

/// Copy method, target, cookie and body (up to `limit`) out of a tiny_http request.
fn read_request(request: &mut tiny_http::Request, limit: u64) -> Result<Request> {
    let mut req = Request::new(method_of(request.method()), request.url());
    req.cookie = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Cookie"))
        .map(|h| h.value.as_str().to_string());

    request
        .as_reader()
        .take(limit + 1)
        .read_to_end(&mut req.body)?;
    if req.body.len() as u64 > limit {
        req.body.truncate(limit as usize);
        req.body_too_large = true;
    }

    Ok(req)
}

fn into_tiny(response: Response) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let mut out = tiny_http::Response::from_data(response.body).with_status_code(response.status);

    let headers = std::iter::once(("Content-Type", response.content_type.to_string()))
        .chain(response.headers);
    for (name, value) in headers {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => out.add_header(header),
            Err(()) => tracing::warn!(name, "dropping invalid header"),
        }
    }

    out
}

/// Serve until the process is stopped. One request at a time.
pub fn serve(app: &App, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let server = tiny_http::Server::http(&addr)
        .map_err(|e| Error::Other(format!("failed to start server: {}", e)))?;

    tracing::info!(url = %format!("http://localhost:{}", port), "serving site");
    println!(
        "\n  Serving at http://localhost:{}\n  Press Ctrl+C to stop\n",
        port
    );

    for mut request in server.incoming_requests() {
        let req = match read_request(&mut request, app.body_limit()) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read request");
                let _ = request.respond(into_tiny(Response::new(
                    400,
                    "text/plain; charset=utf-8",
                    "400 Bad Request",
                )));
                continue;
            }
        };

        let response = app.handle(&req);
        tracing::debug!(
            method = ?req.method,
            path = %req.path,
            status = response.status,
            "handled request"
        );

        if let Err(e) = request.respond(into_tiny(response)) {
            tracing::warn!(error = %e, "failed to send response");
        }
    }

    Ok(())
}
