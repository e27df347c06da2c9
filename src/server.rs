//! HTTP server.
//!
//! A `tiny_http` accept loop in front of a pure request handler. The loop
//! converts each socket request into a [`SiteRequest`], calls [`handle`],
//! and writes the [`SiteResponse`] back. Tests drive [`handle`] directly.
//!
//! # Routes
//!
//! | Method        | Path                       | Answer                          |
//! |---------------|----------------------------|---------------------------------|
//! | GET           | `/`                        | home page                       |
//! | GET           | `/blog`, `/blog/<slug>`    | listing, post                   |
//! | GET           | `/portfolio[?category=]`   | listing, optionally filtered    |
//! | GET           | `/portfolio/<slug>`        | artwork                         |
//! | GET           | `/api/preview?secret&slug` | enable preview, 307             |
//! | DELETE        | `/api/preview`             | disable preview, 307            |
//! | POST          | `/api/newsletter`          | JSON signup                     |
//! | GET           | anything else              | public asset or 404 page        |
//!
//! A known path with the wrong method answers 405. API routes answer errors
//! with the JSON envelope, page routes with an error page; both carry an
//! `X-Error-ID` header.

use crate::error::{SiteError, error_id};
use crate::newsletter;
use crate::preview::{Activation, ActivationParams, ContentKindParam, PreviewState};
use crate::site::Site;
use maud::Markup;
use std::fs;
use std::io::{Cursor, Read};
use std::net::{IpAddr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tiny_http::{Header, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use.
const MAX_PORT_RETRIES: u16 = 10;

/// Request bodies beyond this are truncated before parsing.
const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid interface address: {0}")]
    Interface(#[from] std::net::AddrParseError),
    #[error("failed to bind after {attempts} attempts (ports {first}-{last}): {message}")]
    Bind {
        attempts: u16,
        first: u16,
        last: u16,
        message: String,
    },
    #[error("failed to set Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

// ============================================================================
// Request / response model
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SiteRequest {
    pub method: String,
    /// Path plus optional query string, as received.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl SiteRequest {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl SiteResponse {
    fn new(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    fn html(status: u16, markup: Markup) -> Self {
        Self::new(status, "text/html; charset=utf-8", markup.into_string())
    }

    fn json(status: u16, value: &impl serde::Serialize) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        Self::new(status, "application/json", body)
    }

    fn redirect(location: &str) -> Self {
        let mut response = Self::new(307, "text/plain; charset=utf-8", "");
        response.push_header("Location", location);
        response
    }

    fn push_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ============================================================================
// Routing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    BlogIndex,
    BlogPost(String),
    PortfolioIndex,
    Artwork(String),
    PreviewApi,
    NewsletterApi,
    /// Anything else, looked up in the public directory.
    Asset(String),
}

impl Route {
    fn is_api(&self) -> bool {
        matches!(self, Route::PreviewApi | Route::NewsletterApi)
    }

    fn allowed_methods(&self) -> &'static [&'static str] {
        match self {
            Route::PreviewApi => &["GET", "DELETE"],
            Route::NewsletterApi => &["POST"],
            _ => &["GET", "HEAD"],
        }
    }
}

/// Map a decoded path (no query string) to a route.
pub fn route(path: &str) -> Route {
    let trimmed = path.trim_matches('/');
    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => Route::Home,
        ["blog"] => Route::BlogIndex,
        ["blog", slug] => Route::BlogPost(slug.to_string()),
        ["portfolio"] => Route::PortfolioIndex,
        ["portfolio", slug] => Route::Artwork(slug.to_string()),
        ["api", "preview"] => Route::PreviewApi,
        ["api", "newsletter"] => Route::NewsletterApi,
        _ => Route::Asset(trimmed.to_string()),
    }
}

/// Split a request URL into its decoded path and query pairs.
pub fn split_url(url: &str) -> (String, Vec<(String, String)>) {
    let (raw_path, raw_query) = url.split_once('?').unwrap_or((url, ""));
    let path = decode(raw_path);
    let query = raw_query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(&k.replace('+', " ")), decode(&v.replace('+', " ")))
        })
        .collect();
    (path, query)
}

fn decode(text: &str) -> String {
    urlencoding::decode(text)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| text.to_string())
}

fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

// ============================================================================
// Handler
// ============================================================================

/// Handle one request. `now_secs` is the current Unix time, used for the
/// preview cookie.
pub fn handle(site: &Site, request: &SiteRequest, now_secs: u64) -> SiteResponse {
    let (path, query) = split_url(&request.url);
    let route = route(&path);
    let preview = site.gate().state(request.header("Cookie"), now_secs);

    if !route.allowed_methods().contains(&request.method.as_str()) {
        let mut response = error_response(site, &route, &SiteError::MethodNotAllowed, &path, preview);
        response.push_header("Allow", &route.allowed_methods().join(", "));
        return response;
    }

    let result = match &route {
        Route::Home => site.home_page(preview).map(page),
        Route::BlogIndex => site.blog_index_page(preview).map(page),
        Route::BlogPost(slug) => site.blog_post_page(slug, preview).map(page),
        Route::PortfolioIndex => site
            .portfolio_page(query_value(&query, "category"), preview)
            .map(page),
        Route::Artwork(slug) => site.artwork_page(slug, preview).map(page),
        Route::PreviewApi if request.method == "DELETE" => Ok(disable_preview(site, &query)),
        Route::PreviewApi => enable_preview(site, &query, now_secs),
        Route::NewsletterApi => newsletter::subscribe(&request.body, site.logger())
            .map(|subscribed| SiteResponse::json(200, &subscribed)),
        Route::Asset(relative) => serve_asset(site, relative),
    };

    result.unwrap_or_else(|err| error_response(site, &route, &err, &path, preview))
}

fn page(markup: Markup) -> SiteResponse {
    SiteResponse::html(200, markup)
}

fn enable_preview(
    site: &Site,
    query: &[(String, String)],
    now_secs: u64,
) -> Result<SiteResponse, SiteError> {
    let params = ActivationParams {
        secret: query_value(query, "secret").map(String::from),
        slug: query_value(query, "slug").map(String::from),
        kind: query_value(query, "kind").map(String::from),
    };
    let activation = site
        .gate()
        .activate(&params, now_secs, |kind, slug| site.lookup(kind, slug))?;
    Ok(match activation {
        Activation::Enabled { location, cookie } => {
            site.logger().info(&format!("preview enabled for {location}"));
            let mut response = SiteResponse::redirect(&location);
            response.push_header("Set-Cookie", &cookie);
            response
        }
        Activation::Published { location } => SiteResponse::redirect(&location),
    })
}

fn disable_preview(site: &Site, query: &[(String, String)]) -> SiteResponse {
    let kind = match query_value(query, "kind") {
        Some("portfolio") => ContentKindParam::Portfolio,
        _ => ContentKindParam::Blog,
    };
    let deactivation = site.gate().deactivate(kind);
    let mut response = SiteResponse::redirect(&deactivation.location);
    response.push_header("Set-Cookie", &deactivation.cookie);
    response
}

fn serve_asset(site: &Site, relative: &str) -> Result<SiteResponse, SiteError> {
    let path = public_path(&site.config().build.public_dir, relative).ok_or(SiteError::NotFound)?;
    if !path.is_file() {
        return Err(SiteError::NotFound);
    }
    let content = fs::read(&path).map_err(|e| SiteError::unexpected(&e))?;
    Ok(SiteResponse::new(200, guess_content_type(&path), content))
}

/// Resolve `relative` under `root`, refusing anything that would escape it.
fn public_path(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

fn error_response(
    site: &Site,
    route: &Route,
    err: &SiteError,
    path: &str,
    preview: PreviewState,
) -> SiteResponse {
    if let SiteError::Unexpected { .. } = err {
        site.logger().error("request failed", err, &[("path", path)]);
    }
    let mut response = if route.is_api() {
        let envelope = err.to_envelope(path, site.config().mode);
        SiteResponse::new(err.status(), "application/json", envelope.to_json())
    } else {
        SiteResponse::html(err.status(), site.error_page(err, path, preview))
    };
    response.push_header("X-Error-ID", &error_id());
    response
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Server Entry Point
// ============================================================================

/// Bind, install the Ctrl+C handler, and serve until interrupted.
pub fn serve(site: Site) -> Result<(), ServerError> {
    let server_config = &site.config().server;
    let interface: IpAddr = server_config.interface.parse()?;
    let (server, addr) = try_bind_port(interface, server_config.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    let logger = site.logger().clone();
    ctrlc::set_handler(move || {
        logger.info("shutting down...");
        server_for_signal.unblock();
    })?;

    site.logger().info(&format!("serving on http://{addr}"));
    if !site.gate().is_configured() {
        site.logger()
            .info("preview disabled: set preview.secret or PREVIEW_SECRET to enable it");
    }

    for mut request in server.incoming_requests() {
        let started = Instant::now();
        let site_request = read_request(&mut request);
        let response = handle(&site, &site_request, unix_now());
        let status = response.status;
        if let Err(e) = request.respond(to_tiny_response(response)) {
            site.logger()
                .warn(&format!("responding to {}: {e}", site_request.url));
        }
        site.logger().request(
            &site_request.method,
            &site_request.url,
            status,
            started.elapsed(),
        );
    }

    Ok(())
}

fn read_request(request: &mut tiny_http::Request) -> SiteRequest {
    let headers = request
        .headers()
        .iter()
        .map(|h| (h.field.to_string(), h.value.to_string()))
        .collect();
    let mut body = Vec::new();
    if let Err(e) = request
        .as_reader()
        .take(MAX_BODY_BYTES)
        .read_to_end(&mut body)
    {
        tracing::debug!("reading request body: {e}");
    }
    SiteRequest {
        method: request.method().as_str().to_ascii_uppercase(),
        url: request.url().to_string(),
        headers,
        body,
    }
}

fn to_tiny_response(response: SiteResponse) -> Response<Cursor<Vec<u8>>> {
    let mut out =
        Response::from_data(response.body).with_status_code(StatusCode(response.status));
    for (name, value) in &response.headers {
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            out.add_header(header);
        }
    }
    out
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr), ServerError> {
    let mut last_error = String::new();
    let mut last_port = base_port;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        last_port = port;
        let addr = SocketAddr::new(interface, port);
        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    tracing::info!("port {base_port} in use, using {port} instead");
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(ServerError::Bind {
        attempts: max_retries,
        first: base_port,
        last: last_port,
        message: last_error,
    })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
