/// Read-only diagnostics for the install/offline layer.
///
/// Gathered once each time the panel opens: platform facts, the current
/// registration, and two single-shot liveness probes (manifest and
/// worker script; no retries, no backoff). The two destructive actions
/// the panel offers (force reload, unregister workers) live with the
/// shell and the main loop; this module only observes.

use crate::platform::host::{DisplayMode, Platform};
use crate::shell::{AppManifest, AppShell, MANIFEST_PATH};
use crate::worker::fetch::Request;
use crate::worker::script::WORKER_SCRIPT_PATH;

pub struct ProbeResult {
    pub ok: bool,
    pub status: u16,
    pub content_type: Option<String>,
}

pub struct DebugReport {
    pub worker_supported: bool,
    pub standalone: bool,
    pub registered: bool,
    pub worker_state: Option<&'static str>,
    pub strategy: Option<&'static str>,
    pub cache_version: Option<String>,
    pub manifest_declared: bool,
    pub icons_declared: bool,
    pub manifest_probe: ProbeResult,
    pub script_probe: ProbeResult,
}

pub fn gather(
    platform: &dyn Platform,
    shell: &mut AppShell,
    manifest: Option<&AppManifest>,
) -> DebugReport {
    let manifest_probe = probe(shell, MANIFEST_PATH);
    let script_probe = probe(shell, WORKER_SCRIPT_PATH);

    let registration = shell.registration();
    DebugReport {
        worker_supported: platform.worker_supported(),
        standalone: platform.display_mode() == DisplayMode::Standalone,
        registered: registration.is_some(),
        worker_state: registration.map(|r| r.state.as_str()),
        strategy: registration.map(|r| r.strategy.label()),
        cache_version: registration.map(|r| r.worker().version().to_string()),
        manifest_declared: manifest.is_some(),
        icons_declared: manifest.map_or(false, |m| !m.icons.is_empty()),
        manifest_probe,
        script_probe,
    }
}

/// Exactly one fetch per probe per panel open.
fn probe(shell: &mut AppShell, url: &str) -> ProbeResult {
    let resp = shell.fetch(&Request::get(url));
    ProbeResult {
        ok: resp.is_success(),
        status: resp.status,
        content_type: resp.content_type,
    }
}

impl DebugReport {
    /// Key/value rows for the overlay renderer.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        fn yn(v: bool) -> String {
            if v { "yes".into() } else { "no".into() }
        }
        fn probe_row(p: &ProbeResult) -> String {
            format!(
                "{} ({} / {})",
                if p.ok { "reachable" } else { "unreachable" },
                p.status,
                p.content_type.as_deref().unwrap_or("-")
            )
        }
        vec![
            ("worker support", yn(self.worker_supported)),
            ("standalone", yn(self.standalone)),
            ("registered", yn(self.registered)),
            ("worker state", self.worker_state.unwrap_or("none").to_string()),
            ("strategy", self.strategy.unwrap_or("-").to_string()),
            (
                "cache version",
                self.cache_version.clone().unwrap_or_else(|| "-".to_string()),
            ),
            ("manifest", yn(self.manifest_declared)),
            ("icons", yn(self.icons_declared)),
            ("manifest probe", probe_row(&self.manifest_probe)),
            ("script probe", probe_row(&self.script_probe)),
        ]
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
    use crate::worker::script::EMBEDDED_WORKER_SCRIPT;

    fn live_shell() -> AppShell {
        let origin = FakeOrigin::new()
            .route("/", Response::ok("text/html", b"<root>".to_vec()))
            .route("/index.html", Response::ok("text/html", b"<index>".to_vec()))
            .route("/manifest.json", Response::ok("application/json", b"{}".to_vec()))
            .route(
                "/sw.toml",
                Response::ok("application/toml", EMBEDDED_WORKER_SCRIPT.as_bytes().to_vec()),
            );
        AppShell::new(Box::new(origin), Box::new(MemCacheStore::new()))
    }

    #[test]
    fn report_reflects_a_registered_worker() {
        let platform = FakePlatform::windowed();
        let mut shell = live_shell();
        shell.bootstrap(&platform);

        let report = gather(&platform, &mut shell, None);
        assert!(report.worker_supported);
        assert!(!report.standalone);
        assert!(report.registered);
        assert_eq!(report.worker_state, Some("activated"));
        assert_eq!(report.cache_version.as_deref(), Some("dumb-charades-v3"));
        assert!(report.manifest_probe.ok);
        assert_eq!(
            report.manifest_probe.content_type.as_deref(),
            Some("application/json")
        );
        assert!(report.script_probe.ok);
    }

    #[test]
    fn report_without_worker_or_manifest() {
        let platform = FakePlatform::windowed();
        let mut shell = AppShell::new(
            Box::new(FakeOrigin::new()),
            Box::new(MemCacheStore::new()),
        );
        let report = gather(&platform, &mut shell, None);
        assert!(!report.registered);
        assert_eq!(report.worker_state, None);
        assert!(!report.manifest_declared);
        assert!(!report.manifest_probe.ok);
        assert_eq!(report.manifest_probe.status, 404);
    }

    #[test]
    fn icon_declaration_comes_from_the_parsed_manifest() {
        let manifest = AppManifest::parse(
            br#"{"name": "x", "icons": [{"src": "/i.png", "sizes": "72x72"}]}"#,
        )
        .unwrap();
        let platform = FakePlatform::windowed();
        let mut shell = live_shell();
        let report = gather(&platform, &mut shell, Some(&manifest));
        assert!(report.manifest_declared);
        assert!(report.icons_declared);
    }
}
