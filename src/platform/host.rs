/// Desktop platform host.
///
/// The concrete source of installability signals for the terminal build.
/// "Installed" means a desktop launcher entry exists; "standalone" means
/// the process was started through that launcher, which marks itself with
/// an environment variable on its Exec line. The host announces
/// installability once per run, and only when the app is eligible
/// (windowed display context, no launcher entry yet).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::platform::events::{EventHub, PlatformEvent};
use crate::platform::install::{InstallPrompt, PromptAction, PromptOutcome};

/// Set by the installed launcher's Exec line; its presence marks the
/// standalone display context.
pub const STANDALONE_ENV: &str = "DUMB_CHARADES_STANDALONE";

const LAUNCHER_FILE: &str = "dumb-charades.desktop";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DisplayMode {
    /// Launched via the installed entry.
    Standalone,
    /// Plain terminal launch.
    Windowed,
}

/// What the install controller and worker bootstrap need from the
/// platform; injected so tests can script it.
pub trait Platform {
    fn display_mode(&self) -> DisplayMode;
    fn events(&self) -> &EventHub;
    /// Whether this runtime can host an offline worker at all.
    fn worker_supported(&self) -> bool;
}

pub struct DesktopHost {
    hub: EventHub,
    display_mode: DisplayMode,
    launcher_path: PathBuf,
}

impl DesktopHost {
    pub fn new(applications_dir: &Path) -> Self {
        let display_mode = if env::var_os(STANDALONE_ENV).is_some() {
            DisplayMode::Standalone
        } else {
            DisplayMode::Windowed
        };
        DesktopHost {
            hub: EventHub::new(),
            display_mode,
            launcher_path: applications_dir.join(LAUNCHER_FILE),
        }
    }

    /// Emit the installability signal when the app is eligible. Call once
    /// at startup, after interested controllers have subscribed. The
    /// platform does not re-offer within a run (its cooldown).
    pub fn announce_installability(&self) {
        if self.display_mode == DisplayMode::Standalone {
            return;
        }
        if self.launcher_path.exists() {
            debug!("launcher entry present; not offering install");
            return;
        }
        let action = LauncherInstall {
            hub: self.hub.clone(),
            launcher_path: self.launcher_path.clone(),
        };
        self.hub.emit(PlatformEvent::PromptAvailable(InstallPrompt::new(Box::new(action))));
    }
}

impl Platform for DesktopHost {
    fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    fn events(&self) -> &EventHub {
        &self.hub
    }

    fn worker_supported(&self) -> bool {
        true
    }
}

// ── The deferred install action ──

/// Writes the launcher entry on accept, then reports installation back
/// through the hub. Failure degrades silently (logged); the app keeps
/// running either way.
struct LauncherInstall {
    hub: EventHub,
    launcher_path: PathBuf,
}

impl PromptAction for LauncherInstall {
    fn perform(&mut self, outcome: PromptOutcome) {
        if outcome != PromptOutcome::Accepted {
            debug!("install declined; launcher not written");
            return;
        }
        match write_launcher(&self.launcher_path) {
            Ok(()) => {
                debug!("launcher entry written: {}", self.launcher_path.display());
                self.hub.emit(PlatformEvent::AppInstalled);
            }
            Err(e) => warn!("could not write launcher entry: {e}"),
        }
    }
}

fn write_launcher(path: &Path) -> std::io::Result<()> {
    let exe = env::current_exe()?;
    let exe = exe.canonicalize().unwrap_or(exe);
    let entry = format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Dumb Charades\n\
         Comment=Two-team party game\n\
         Exec=env {STANDALONE_ENV}=1 {}\n\
         Terminal=true\n\
         Categories=Game;\n",
        exe.display()
    );
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, entry)
}

// ══════════════════════════════════════════════════════════════
// Test platform
// ══════════════════════════════════════════════════════════════


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launcher_entry_marks_standalone_exec() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LAUNCHER_FILE);
        write_launcher(&path).unwrap();
        let entry = fs::read_to_string(&path).unwrap();
        assert!(entry.starts_with("[Desktop Entry]"));
        assert!(entry.contains(&format!("Exec=env {STANDALONE_ENV}=1 ")));
    }

    #[test]
    fn no_offer_when_already_installed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LAUNCHER_FILE), "[Desktop Entry]\n").unwrap();
        let host = DesktopHost::new(dir.path());
        let sub = host.events().subscribe();
        host.announce_installability();
        assert!(sub.poll().is_none());
    }

    #[test]
    fn accepting_the_offer_installs_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let host = DesktopHost::new(dir.path());
        let sub = host.events().subscribe();
        host.announce_installability();

        let prompt = match sub.poll() {
            Some(PlatformEvent::PromptAvailable(p)) => p,
            other => panic!("expected prompt, got {other:?}"),
        };
        prompt.respond(PromptOutcome::Accepted);

        assert!(dir.path().join(LAUNCHER_FILE).exists());
        assert!(matches!(sub.poll(), Some(PlatformEvent::AppInstalled)));
    }
}
