/// Request/response model for the asset origin.
///
/// The origin plays the role a static file server plays for a web page:
/// root-relative URL paths resolve to files under the asset directory,
/// with content types derived from extensions. A missing file is a 404
/// *response*; an unreachable asset directory is a fetch *error*. That
/// distinction is what the offline worker's fallback logic keys on.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ── Requests ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Method {
    Get,
    Head,
    Post,
}

impl Method {
    /// Only plain reads are served from the offline cache.
    pub fn is_read(self) -> bool {
        matches!(self, Method::Get)
    }
}

/// Navigations load a page document; everything else is a subresource.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FetchMode {
    Navigate,
    Asset,
}

/// Whether the offline cache may answer this request.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CachePolicy {
    Default,
    /// Skip cache lookup entirely (used when fetching the worker script
    /// for registration and update checks).
    Bypass,
}

#[derive(Clone, Debug)]
pub struct Request {
    pub url: String,
    pub method: Method,
    pub mode: FetchMode,
    pub cache: CachePolicy,
}

impl Request {
    pub fn get(url: &str) -> Self {
        Request {
            url: url.to_string(),
            method: Method::Get,
            mode: FetchMode::Asset,
            cache: CachePolicy::Default,
        }
    }

    pub fn navigate(url: &str) -> Self {
        Request { mode: FetchMode::Navigate, ..Request::get(url) }
    }

    pub fn head(url: &str) -> Self {
        Request { method: Method::Head, ..Request::get(url) }
    }

    pub fn bypass_cache(mut self) -> Self {
        self.cache = CachePolicy::Bypass;
        self
    }

    /// URL path with any query string (e.g. a cache-busting `?v=`)
    /// stripped.
    pub fn path(&self) -> &str {
        match self.url.split_once('?') {
            Some((path, _)) => path,
            None => &self.url,
        }
    }
}

// ── Responses ──

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    /// Served by our own origin (as opposed to an opaque third party).
    pub same_origin: bool,
    /// Set by the worker when the response came out of the offline cache.
    pub from_cache: bool,
}

impl Response {
    pub fn ok(content_type: &str, body: Vec<u8>) -> Self {
        Response {
            status: 200,
            content_type: Some(content_type.to_string()),
            body,
            same_origin: true,
            from_cache: false,
        }
    }

    pub fn with_status(status: u16, body: &str) -> Self {
        Response {
            status,
            content_type: Some("text/plain".to_string()),
            body: body.as_bytes().to_vec(),
            same_origin: true,
            from_cache: false,
        }
    }

    /// The synthesized last-resort answer for an unreachable origin.
    pub fn network_error() -> Self {
        Response::with_status(503, "network error")
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Eligible for opportunistic caching: successful, same-origin, full.
    pub fn cacheable(&self) -> bool {
        self.is_success() && self.same_origin
    }
}

// ── Origin ──

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("origin unreachable: {0}")]
    Unreachable(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub trait Origin {
    fn fetch(&self, req: &Request) -> Result<Response, FetchError>;
}

/// Static-server origin over a local asset directory.
pub struct DirOrigin {
    root: PathBuf,
}

impl DirOrigin {
    pub fn new(root: PathBuf) -> Self {
        DirOrigin { root }
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        // "/" serves the root document, like any static server.
        let rel = match path {
            "/" => "index.html",
            other => other.trim_start_matches('/'),
        };
        if rel.split('/').any(|seg| seg == "..") {
            return None;
        }
        Some(self.root.join(rel))
    }
}

impl Origin for DirOrigin {
    fn fetch(&self, req: &Request) -> Result<Response, FetchError> {
        if !self.root.is_dir() {
            return Err(FetchError::Unreachable(format!(
                "asset directory missing: {}",
                self.root.display()
            )));
        }
        let file = match self.resolve(req.path()) {
            Some(f) => f,
            None => return Ok(Response::with_status(403, "forbidden")),
        };
        if !file.is_file() {
            return Ok(Response::with_status(404, "not found"));
        }
        let body = match req.method {
            Method::Head => Vec::new(),
            _ => fs::read(&file)?,
        };
        Ok(Response::ok(content_type_for(req.path()), body))
    }
}

/// Content type from the URL extension, the way a static server's type
/// map would.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    match path {
        "/" => "text/html",
        _ => match ext {
            "html" => "text/html",
            "json" => "application/json",
            "js" => "text/javascript",
            "toml" => "application/toml",
            "png" => "image/png",
            _ => "application/octet-stream",
        },
    }
}

// ══════════════════════════════════════════════════════════════
// Test origin
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
pub mod test_origin {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Scriptable origin: URL path → canned outcome, plus a request log
    /// for asserting what was fetched (and in what order).
    pub struct FakeOrigin {
        routes: HashMap<String, Response>,
        pub offline: bool,
        pub log: RefCell<Vec<String>>,
    }

    impl FakeOrigin {
        pub fn new() -> Self {
            FakeOrigin {
                routes: HashMap::new(),
                offline: false,
                log: RefCell::new(Vec::new()),
            }
        }

        pub fn route(mut self, path: &str, resp: Response) -> Self {
            self.routes.insert(path.to_string(), resp);
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    impl Origin for FakeOrigin {
        fn fetch(&self, req: &Request) -> Result<Response, FetchError> {
            self.log.borrow_mut().push(req.url.clone());
            if self.offline {
                return Err(FetchError::Unreachable("offline".into()));
            }
            match self.routes.get(req.path()) {
                Some(resp) => {
                    let mut resp = resp.clone();
                    if req.method == Method::Head {
                        resp.body.clear();
                    }
                    Ok(resp)
                }
                None => Ok(Response::with_status(404, "not found")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn origin_with_assets() -> (tempfile::TempDir, DirOrigin) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>charades</h1>").unwrap();
        fs::write(dir.path().join("manifest.json"), "{}").unwrap();
        let origin = DirOrigin::new(dir.path().to_path_buf());
        (dir, origin)
    }

    #[test]
    fn root_serves_the_index_document() {
        let (_dir, origin) = origin_with_assets();
        let resp = origin.fetch(&Request::navigate("/")).unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type.as_deref(), Some("text/html"));
        assert_eq!(resp.body, b"<h1>charades</h1>");
    }

    #[test]
    fn missing_file_is_a_404_response_not_an_error() {
        let (_dir, origin) = origin_with_assets();
        let resp = origin.fetch(&Request::get("/nope.png")).unwrap();
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn missing_root_is_a_fetch_error() {
        let origin = DirOrigin::new(PathBuf::from("/definitely/not/here"));
        assert!(matches!(
            origin.fetch(&Request::get("/")),
            Err(FetchError::Unreachable(_))
        ));
    }

    #[test]
    fn query_string_does_not_change_the_resolved_file() {
        let (_dir, origin) = origin_with_assets();
        let resp = origin.fetch(&Request::get("/manifest.json?v=1234")).unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn head_omits_the_body() {
        let (_dir, origin) = origin_with_assets();
        let resp = origin.fetch(&Request::head("/index.html")).unwrap();
        assert_eq!(resp.status, 200);
        assert!(resp.body.is_empty());
        assert_eq!(resp.content_type.as_deref(), Some("text/html"));
    }

    #[test]
    fn parent_traversal_is_refused() {
        let (_dir, origin) = origin_with_assets();
        let resp = origin.fetch(&Request::get("/../etc/passwd")).unwrap();
        assert_eq!(resp.status, 403);
    }
}
