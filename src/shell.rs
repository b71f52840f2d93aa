/// App shell: where the page-root composition lives.
///
/// Every asset the app reads goes through `fetch()`: when an offline
/// worker is registered the request is intercepted by it, otherwise it
/// goes straight to the origin. Either way the caller always gets a
/// response; total network failure degrades to a synthesized one.

use log::{debug, info, warn};
use serde::Deserialize;

use crate::platform::host::Platform;
use crate::worker::bootstrap::{self, Registration};
use crate::worker::cache::CacheStorage;
use crate::worker::fetch::{Origin, Request, Response};

pub const MANIFEST_PATH: &str = "/manifest.json";

// ── App manifest ──

/// The installable-app manifest served by the origin.
#[derive(Clone, Debug, Deserialize)]
pub struct AppManifest {
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub icons: Vec<ManifestIcon>,
}

/// One icon declaration; carried whole for the diagnostics panel even
/// though only presence matters to the app itself.
#[derive(Clone, Debug, Deserialize)]
#[allow(dead_code)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type", default)]
    pub mime: String,
}

impl AppManifest {
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        match serde_json::from_slice(bytes) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("manifest unreadable: {e}");
                None
            }
        }
    }

    /// Title for the window chrome: short name when present.
    pub fn title(&self) -> &str {
        if self.short_name.is_empty() {
            &self.name
        } else {
            &self.short_name
        }
    }
}

// ── Shell ──

pub struct AppShell {
    origin: Box<dyn Origin>,
    store: Box<dyn CacheStorage>,
    registration: Option<Registration>,
}

impl AppShell {
    pub fn new(origin: Box<dyn Origin>, store: Box<dyn CacheStorage>) -> Self {
        AppShell { origin, store, registration: None }
    }

    /// Run the registration chain and, on success, the one-time update
    /// check against the hosted script.
    pub fn bootstrap(&mut self, platform: &dyn Platform) {
        self.registration =
            bootstrap::register_offline_worker(platform, &*self.origin, &mut *self.store);
        if let Some(reg) = &self.registration {
            bootstrap::check_for_update(reg, &*self.origin);
        }
    }

    /// Fetch through the worker when one controls the shell.
    pub fn fetch(&mut self, req: &Request) -> Response {
        match &self.registration {
            Some(reg) => reg.worker().handle_fetch(req, &mut *self.store, &*self.origin),
            None => match self.origin.fetch(req) {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("fetch failed for {} (no worker): {e}", req.url);
                    Response::network_error()
                }
            },
        }
    }

    /// Load and parse the app manifest (possibly a cached copy).
    pub fn load_manifest(&mut self) -> Option<AppManifest> {
        let resp = self.fetch(&Request::get(MANIFEST_PATH));
        if !resp.is_success() {
            debug!("manifest fetch got status {}", resp.status);
            return None;
        }
        AppManifest::parse(&resp.body)
    }

    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    /// Debug-panel action: drop every live registration.
    pub fn unregister_all(&mut self) {
        if self.registration.take().is_some() {
            info!("worker registrations cleared");
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::host::test_host::FakePlatform;
    use crate::worker::cache::test_store::MemCacheStore;
    use crate::worker::fetch::test_origin::FakeOrigin;

    const MANIFEST: &str = r#"{
        "name": "Dumb Charades",
        "short_name": "Charades",
        "icons": [{"src": "/icons/icon-72.png", "sizes": "72x72", "type": "image/png"}]
    }"#;

    fn live_origin() -> FakeOrigin {
        FakeOrigin::new()
            .route("/", Response::ok("text/html", b"<root>".to_vec()))
            .route("/index.html", Response::ok("text/html", b"<index>".to_vec()))
            .route("/manifest.json", Response::ok("application/json", MANIFEST.as_bytes().to_vec()))
    }

    #[test]
    fn manifest_parses_name_and_icons() {
        let m = AppManifest::parse(MANIFEST.as_bytes()).unwrap();
        assert_eq!(m.name, "Dumb Charades");
        assert_eq!(m.title(), "Charades");
        assert_eq!(m.icons.len(), 1);
        assert_eq!(m.icons[0].sizes, "72x72");
    }

    #[test]
    fn shell_without_worker_fetches_straight_from_origin() {
        let mut shell = AppShell::new(Box::new(live_origin()), Box::new(MemCacheStore::new()));
        let resp = shell.fetch(&Request::get("/index.html"));
        assert_eq!(resp.body, b"<index>");
        assert!(!resp.from_cache);
    }

    #[test]
    fn bootstrapped_shell_survives_going_offline() {
        let mut shell = AppShell::new(Box::new(live_origin()), Box::new(MemCacheStore::new()));
        shell.bootstrap(&FakePlatform::windowed());
        assert!(shell.registration().is_some());

        // Same shell, origin gone: cached copies still serve.
        let mut offline = FakeOrigin::new();
        offline.offline = true;
        shell.origin = Box::new(offline);

        let manifest = shell.load_manifest().unwrap();
        assert_eq!(manifest.name, "Dumb Charades");

        let resp = shell.fetch(&Request::navigate("/"));
        assert!(resp.from_cache);
        assert_eq!(resp.body, b"<root>");
    }

    #[test]
    fn unregister_all_drops_interception() {
        let mut shell = AppShell::new(Box::new(live_origin()), Box::new(MemCacheStore::new()));
        shell.bootstrap(&FakePlatform::windowed());
        shell.unregister_all();
        assert!(shell.registration().is_none());

        let resp = shell.fetch(&Request::get("/index.html"));
        assert!(!resp.from_cache);
    }
}
