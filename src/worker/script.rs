/// The offline worker and its script format.
///
/// A worker script is a small TOML document declaring the cache version,
/// the essential URLs to pre-populate, and the path prefixes it must
/// never intercept. "Running" a script means instantiating an
/// [`OfflineWorker`] from it; the worker then answers every shell fetch,
/// serving cached copies when the origin is unreachable.

use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::worker::cache::{CacheError, CacheStorage};
use crate::worker::fetch::{CachePolicy, FetchError, FetchMode, Origin, Request, Response};

/// Where the hosted copy of the worker script lives.
pub const WORKER_SCRIPT_PATH: &str = "/sw.toml";

/// The root document every navigation falls back to when offline.
pub const ROOT_URL: &str = "/";

/// In-memory copy of the script, registered when the hosted copy cannot
/// be (content-type mismatches, missing file).
pub const EMBEDDED_WORKER_SCRIPT: &str = "\
version = \"dumb-charades-v3\"\n\
precache = [\"/\", \"/index.html\", \"/manifest.json\"]\n\
reserved = [\"/sw.toml\", \"/src/\"]\n";

// ── Script ──

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("worker script is not UTF-8")]
    Encoding,
    #[error("worker script parse: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("worker script declares an empty version")]
    EmptyVersion,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WorkerScript {
    /// Cache name; bumping it replaces the whole cache on activation.
    pub version: String,
    /// Essential URLs, pre-populated on install.
    pub precache: Vec<String>,
    /// Path prefixes that always go straight to the origin.
    #[serde(default)]
    pub reserved: Vec<String>,
}

impl WorkerScript {
    pub fn parse(bytes: &[u8]) -> Result<Self, ScriptError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ScriptError::Encoding)?;
        let script: WorkerScript = toml::from_str(text)?;
        if script.version.is_empty() {
            return Err(ScriptError::EmptyVersion);
        }
        Ok(script)
    }
}

// ── Worker ──

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("precache of {url} got status {status}")]
    PrecacheStatus { url: String, status: u16 },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug)]
pub struct OfflineWorker {
    script: WorkerScript,
}

impl OfflineWorker {
    pub fn new(script: WorkerScript) -> Self {
        OfflineWorker { script }
    }

    /// The cache version this worker serves from.
    pub fn version(&self) -> &str {
        &self.script.version
    }

    /// Install step: make sure every essential URL is cached.
    /// All-or-nothing: one failure fails the install. URLs already in
    /// the cache are kept as-is, so an offline relaunch still installs.
    pub fn install(
        &self,
        store: &mut dyn CacheStorage,
        origin: &dyn Origin,
    ) -> Result<(), WorkerError> {
        for url in &self.script.precache {
            if store.lookup(&self.script.version, url)?.is_some() {
                continue;
            }
            let resp = origin.fetch(&Request::get(url))?;
            if !resp.is_success() {
                return Err(WorkerError::PrecacheStatus {
                    url: url.clone(),
                    status: resp.status,
                });
            }
            store.put(&self.script.version, url, &resp)?;
        }
        Ok(())
    }

    /// Activate step: delete every cache whose name is not the current
    /// version.
    pub fn activate(&self, store: &mut dyn CacheStorage) -> Result<(), CacheError> {
        for name in store.names()? {
            if name != self.script.version {
                store.delete(&name)?;
                info!("stale cache removed: {name}");
            }
        }
        Ok(())
    }

    /// Answer one intercepted fetch. Never fails outward: every error
    /// path degrades to a cached copy or a synthesized response.
    pub fn handle_fetch(
        &self,
        req: &Request,
        store: &mut dyn CacheStorage,
        origin: &dyn Origin,
    ) -> Response {
        // Reserved paths and non-read requests go straight through.
        if !req.method.is_read() || self.is_reserved(req.path()) {
            return match origin.fetch(req) {
                Ok(resp) => resp,
                Err(e) => self.offline_fallback(req, store, &e),
            };
        }

        if req.cache == CachePolicy::Default {
            if let Ok(Some(mut hit)) = store.lookup(&self.script.version, req.path()) {
                hit.from_cache = true;
                return hit;
            }
        }

        match origin.fetch(req) {
            Ok(resp) => {
                if req.cache == CachePolicy::Default && resp.cacheable() {
                    // Opportunistic copy for next time; failure to store
                    // never fails the fetch.
                    if let Err(e) = store.put(&self.script.version, req.path(), &resp) {
                        warn!("could not cache {}: {e}", req.path());
                    }
                }
                resp
            }
            Err(e) => self.offline_fallback(req, store, &e),
        }
    }

    fn is_reserved(&self, path: &str) -> bool {
        self.script.reserved.iter().any(|p| path.starts_with(p.as_str()))
    }

    fn offline_fallback(
        &self,
        req: &Request,
        store: &mut dyn CacheStorage,
        err: &FetchError,
    ) -> Response {
        warn!("fetch failed for {}: {err}", req.url);
        if req.mode == FetchMode::Navigate {
            if let Ok(Some(mut root)) = store.lookup(&self.script.version, ROOT_URL) {
                root.from_cache = true;
                return root;
            }
        }
        Response::network_error()
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════
