/// Offline worker bootstrap.
///
/// Registration is best-effort: an ordered list of strategies is walked
/// by one attempt/continue loop, stopping at the first success. Every
/// failure (content-type mismatch, security restriction, missing
/// script, storage trouble) is logged and the next strategy tried; if
/// the whole chain fails the app simply runs without offline support.
///
/// Strategy order:
///   (a) the in-memory script, via a temporary local reference, which
///       no origin content-type problem can touch;
///   (b) the hosted script URL with a cache-busting query and
///       cache-bypass fetch, after a HEAD probe of its content type;
///   (c) the hosted URL without cache-busting;
///   (d) the hosted URL with no options at all.

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};
use thiserror::Error;

use crate::platform::host::Platform;
use crate::worker::cache::{CacheError, CacheStorage};
use crate::worker::fetch::{CachePolicy, FetchError, Origin, Request};
use crate::worker::script::{
    OfflineWorker, ScriptError, WorkerError, WorkerScript, EMBEDDED_WORKER_SCRIPT,
    WORKER_SCRIPT_PATH,
};

#[derive(Error, Debug)]
pub enum RegisterError {
    #[error("offline workers unsupported on this platform")]
    Unsupported,
    #[error("worker script fetch got status {status}")]
    MissingScript { status: u16 },
    #[error("worker script served as {found}")]
    ContentType { found: String },
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Strategy {
    InMemory,
    CacheBustedUrl,
    PlainUrl,
    Bare,
}

pub const STRATEGY_ORDER: [Strategy; 4] = [
    Strategy::InMemory,
    Strategy::CacheBustedUrl,
    Strategy::PlainUrl,
    Strategy::Bare,
];

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Strategy::InMemory => "in-memory",
            Strategy::CacheBustedUrl => "cache-busted url",
            Strategy::PlainUrl => "plain url",
            Strategy::Bare => "bare",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WorkerState {
    Installing,
    Activated,
}

impl WorkerState {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Installing => "installing",
            WorkerState::Activated => "activated",
        }
    }
}

/// A live registration: the worker plus how it got here.
#[derive(Debug)]
pub struct Registration {
    pub strategy: Strategy,
    pub state: WorkerState,
    script_bytes: Vec<u8>,
    worker: OfflineWorker,
}

impl Registration {
    pub fn worker(&self) -> &OfflineWorker {
        &self.worker
    }
}

/// One row of the chain's outcome, for tests and diagnostics.
pub struct AttemptReport {
    pub strategy: Strategy,
    pub error: Option<String>,
}

/// Entry point used by the shell. Success and total failure are both
/// quiet: one log line either way, never an error to the caller.
pub fn register_offline_worker(
    platform: &dyn Platform,
    origin: &dyn Origin,
    store: &mut dyn CacheStorage,
) -> Option<Registration> {
    if !platform.worker_supported() {
        debug!("{}", RegisterError::Unsupported);
        return None;
    }
    let (registration, attempts) =
        run_strategies(&STRATEGY_ORDER, origin, store, EMBEDDED_WORKER_SCRIPT, bust_tag());
    match &registration {
        Some(reg) => info!(
            "offline worker registered ({}, version {})",
            reg.strategy.label(),
            reg.worker.version()
        ),
        None => {
            for a in &attempts {
                debug!(
                    "  {} -> {}",
                    a.strategy.label(),
                    a.error.as_deref().unwrap_or("ok")
                );
            }
            warn!("all worker registration strategies failed; no offline support");
        }
    }
    registration
}

/// The attempt/continue combinator. Walks `order`, returns the first
/// success plus a report of every attempt made.
fn run_strategies(
    order: &[Strategy],
    origin: &dyn Origin,
    store: &mut dyn CacheStorage,
    embedded: &str,
    bust: u64,
) -> (Option<Registration>, Vec<AttemptReport>) {
    let mut attempts = Vec::new();
    for &strategy in order {
        match attempt(strategy, origin, store, embedded, bust) {
            Ok(reg) => {
                attempts.push(AttemptReport { strategy, error: None });
                return (Some(reg), attempts);
            }
            Err(e) => {
                warn!("worker registration ({}) failed: {e}", strategy.label());
                attempts.push(AttemptReport { strategy, error: Some(e.to_string()) });
            }
        }
    }
    (None, attempts)
}

fn attempt(
    strategy: Strategy,
    origin: &dyn Origin,
    store: &mut dyn CacheStorage,
    embedded: &str,
    bust: u64,
) -> Result<Registration, RegisterError> {
    let script_bytes = match strategy {
        Strategy::InMemory => embedded.as_bytes().to_vec(),
        Strategy::CacheBustedUrl => {
            let url = format!("{WORKER_SCRIPT_PATH}?v={bust}");
            // Probe first: an HTML answer means the origin routes unknown
            // paths to the page document, and registration would pick up
            // the wrong bytes.
            let probe = origin.fetch(&Request::head(&url).bypass_cache())?;
            check_content_type(&probe.content_type)?;
            fetch_script(origin, &url, CachePolicy::Bypass)?
        }
        Strategy::PlainUrl => fetch_script(origin, WORKER_SCRIPT_PATH, CachePolicy::Bypass)?,
        Strategy::Bare => fetch_script(origin, WORKER_SCRIPT_PATH, CachePolicy::Default)?,
    };

    let script = WorkerScript::parse(&script_bytes)?;
    let worker = OfflineWorker::new(script);
    let mut registration = Registration {
        strategy,
        state: WorkerState::Installing,
        script_bytes,
        worker,
    };
    registration.worker.install(store, origin)?;
    registration.worker.activate(store)?;
    registration.state = WorkerState::Activated;
    Ok(registration)
}

fn fetch_script(
    origin: &dyn Origin,
    url: &str,
    policy: CachePolicy,
) -> Result<Vec<u8>, RegisterError> {
    let mut req = Request::get(url);
    req.cache = policy;
    let resp = origin.fetch(&req)?;
    if !resp.is_success() {
        return Err(RegisterError::MissingScript { status: resp.status });
    }
    check_content_type(&resp.content_type)?;
    Ok(resp.body)
}

fn check_content_type(content_type: &Option<String>) -> Result<(), RegisterError> {
    if let Some(ct) = content_type {
        if ct.contains("text/html") {
            return Err(RegisterError::ContentType { found: ct.clone() });
        }
    }
    Ok(())
}

fn bust_tag() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Compare the hosted script against the registered bytes. A difference
/// is only surfaced as a log line; no auto-reload.
pub fn check_for_update(registration: &Registration, origin: &dyn Origin) -> bool {
    let req = Request::get(WORKER_SCRIPT_PATH).bypass_cache();
    match origin.fetch(&req) {
        Ok(resp) if resp.is_success() => {
            if resp.body != registration.script_bytes {
                info!("worker update available; will apply on next launch");
                true
            } else {
                false
            }
        }
        Ok(resp) => {
            debug!("update check got status {}", resp.status);
            false
        }
        Err(e) => {
            debug!("update check failed: {e}");
            false
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
    use crate::worker::fetch::Response;

    fn hosted_script_origin() -> FakeOrigin {
        FakeOrigin::new()
            .route("/", Response::ok("text/html", b"<root>".to_vec()))
            .route("/index.html", Response::ok("text/html", b"<index>".to_vec()))
            .route("/manifest.json", Response::ok("application/json", b"{}".to_vec()))
            .route(
                "/sw.toml",
                Response::ok("application/toml", EMBEDDED_WORKER_SCRIPT.as_bytes().to_vec()),
            )
    }

    fn attempted(attempts: &[AttemptReport]) -> Vec<Strategy> {
        attempts.iter().map(|a| a.strategy).collect()
    }

    #[test]
    fn first_strategy_wins_and_stops_the_chain() {
        let origin = hosted_script_origin();
        let mut store = MemCacheStore::new();
        let (reg, attempts) =
            run_strategies(&STRATEGY_ORDER, &origin, &mut store, EMBEDDED_WORKER_SCRIPT, 1);
        let reg = reg.unwrap();
        assert_eq!(reg.strategy, Strategy::InMemory);
        assert_eq!(reg.state, WorkerState::Activated);
        assert_eq!(attempted(&attempts), vec![Strategy::InMemory]);
    }

    #[test]
    fn in_memory_failure_falls_through_to_the_busted_url() {
        // (a) fails on an unparseable in-memory script; (b) must be the
        // very next attempt, and succeeds.
        let origin = hosted_script_origin();
        let mut store = MemCacheStore::new();
        let (reg, attempts) =
            run_strategies(&STRATEGY_ORDER, &origin, &mut store, "not a script", 77);
        let reg = reg.unwrap();
        assert_eq!(reg.strategy, Strategy::CacheBustedUrl);
        assert_eq!(
            attempted(&attempts),
            vec![Strategy::InMemory, Strategy::CacheBustedUrl]
        );
        // The busted URL actually carried the query parameter.
        assert!(origin.requests().iter().any(|u| u == "/sw.toml?v=77"));
    }

    #[test]
    fn security_failure_continues_in_order_not_skipping() {
        // Denied cache storage fails every strategy at the install step;
        // the chain must still walk (a) → (b) → (c) → (d) in order.
        let origin = hosted_script_origin();
        let mut store = MemCacheStore::new();
        store.deny = true;
        let (reg, attempts) =
            run_strategies(&STRATEGY_ORDER, &origin, &mut store, EMBEDDED_WORKER_SCRIPT, 1);
        assert!(reg.is_none());
        assert_eq!(attempted(&attempts), STRATEGY_ORDER.to_vec());
        for a in &attempts {
            assert!(a.error.as_deref().unwrap().contains("denied"), "{:?}", a.error);
        }
    }

    #[test]
    fn html_content_type_fails_hosted_strategies() {
        // The origin answers every path with the page document (SPA-style
        // fallback): the probe rejects (b), and (c)/(d) reject on fetch.
        let origin = FakeOrigin::new()
            .route("/sw.toml", Response::ok("text/html", b"<!DOCTYPE html>".to_vec()));
        let mut store = MemCacheStore::new();
        let (reg, attempts) =
            run_strategies(&STRATEGY_ORDER[1..], &origin, &mut store, "", 1);
        assert!(reg.is_none());
        assert_eq!(
            attempted(&attempts),
            vec![Strategy::CacheBustedUrl, Strategy::PlainUrl, Strategy::Bare]
        );
        for a in &attempts {
            assert!(a.error.as_deref().unwrap().contains("text/html"));
        }
    }

    #[test]
    fn missing_hosted_script_reports_the_status() {
        let origin = FakeOrigin::new();
        let mut store = MemCacheStore::new();
        let err = attempt(Strategy::PlainUrl, &origin, &mut store, "", 1).unwrap_err();
        assert!(matches!(err, RegisterError::MissingScript { status: 404 }));
    }

    #[test]
    fn unsupported_platform_registers_nothing() {
        let mut platform = FakePlatform::windowed();
        platform.supported = false;
        let origin = hosted_script_origin();
        let mut store = MemCacheStore::new();
        assert!(register_offline_worker(&platform, &origin, &mut store).is_none());
        assert!(origin.requests().is_empty());
    }

    #[test]
    fn update_check_flags_changed_hosted_script() {
        let origin = hosted_script_origin();
        let mut store = MemCacheStore::new();
        let (reg, _) =
            run_strategies(&STRATEGY_ORDER, &origin, &mut store, EMBEDDED_WORKER_SCRIPT, 1);
        let reg = reg.unwrap();
        assert!(!check_for_update(&reg, &origin));

        let changed = hosted_script_origin().route(
            "/sw.toml",
            Response::ok(
                "application/toml",
                b"version = \"dumb-charades-v4\"\nprecache = []\n".to_vec(),
            ),
        );
        assert!(check_for_update(&reg, &changed));
    }
}
