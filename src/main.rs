/// Entry point and game loop.

mod config;
mod debug;
mod domain;
mod platform;
mod shell;
mod ui;
mod worker;

use std::time::Duration;

use crossterm::event::KeyCode;
use rand::rngs::ThreadRng;

use config::GameConfig;
use debug::DebugReport;
use domain::catalog::{CatalogError, PhraseCatalog};
use domain::match_state::{MatchEvent, MatchState, Team};
use platform::host::DesktopHost;
use platform::install::{InstallController, InstallState};
use shell::{AppManifest, AppShell};
use ui::input::InputState;
use ui::renderer::{Frame, Renderer};
use ui::sound::SoundEngine;
use worker::cache::DirCacheStore;
use worker::fetch::{DirOrigin, Request};

const FRAME_SLEEP: Duration = Duration::from_millis(33);
const MESSAGE_TICKS: u32 = 90;

const FALLBACK_TITLE: &str = "Dumb Charades";

struct App {
    host: DesktopHost,
    shell: AppShell,
    install: InstallController,
    catalog: PhraseCatalog,
    rng: ThreadRng,
    match_state: MatchState,
    manifest: Option<AppManifest>,
    title: String,
    /// The root document came out of the offline cache this session.
    offline_copy: bool,
    debug: Option<DebugReport>,
    message: String,
    message_timer: u32,
}

impl App {
    fn set_message(&mut self, msg: &str) {
        self.message = msg.to_string();
        self.message_timer = MESSAGE_TICKS;
    }

    /// Load the shell assets through the worker: the root document (a
    /// navigation) plus the manifest for the window title.
    fn load_shell(&mut self) {
        let root = self.shell.fetch(&Request::navigate("/"));
        self.offline_copy = root.from_cache;
        self.manifest = self.shell.load_manifest();
        self.title = match &self.manifest {
            Some(manifest) => manifest.title().to_string(),
            None => FALLBACK_TITLE.to_string(),
        };
    }

    fn gather_debug(&mut self) -> DebugReport {
        debug::gather(&self.host, &mut self.shell, self.manifest.as_ref())
    }

    /// Debug-panel action: start the whole page over.
    fn force_reload(&mut self) -> Result<(), CatalogError> {
        self.shell.bootstrap(&self.host);
        self.load_shell();
        self.match_state = MatchState::new(&self.catalog, &mut self.rng)?;
        self.debug = None;
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let config = GameConfig::load();
    let host = DesktopHost::new(&config.applications_dir);

    let mut shell = AppShell::new(
        Box::new(DirOrigin::new(config.assets_dir.clone())),
        Box::new(DirCacheStore::new(config.cache_dir.clone())),
    );
    shell.bootstrap(&host);

    // Subscribe the controller before the host announces, or the
    // signal is lost.
    let install = InstallController::new(&host);
    host.announce_installability();

    let catalog = PhraseCatalog::embedded();
    let mut rng = rand::thread_rng();
    let match_state = match MatchState::new(&catalog, &mut rng) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Cannot start a match: {e}");
            return;
        }
    };

    let mut app = App {
        host,
        shell,
        install,
        catalog,
        rng,
        match_state,
        manifest: None,
        title: FALLBACK_TITLE.to_string(),
        offline_copy: false,
        debug: None,
        message: String::new(),
        message_timer: 0,
    };
    app.load_shell();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut app, &mut renderer, sound.as_ref());

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing!");
    println!(
        "Final score: Team A {} | Team B {}",
        app.match_state.score(Team::A),
        app.match_state.score(Team::B),
    );
}

// ── Key Constants ──

const KEYS_GUESSED: &[KeyCode] = &[KeyCode::Char('g'), KeyCode::Char('G')];
const KEYS_SKIP: &[KeyCode] = &[KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_REVEAL: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R'), KeyCode::Char(' ')];
const KEYS_LANGUAGE: &[KeyCode] = &[KeyCode::Char('l'), KeyCode::Char('L')];
const KEYS_CATEGORY: &[KeyCode] = &[KeyCode::Char('c'), KeyCode::Char('C')];
const KEYS_INSTALL: &[KeyCode] = &[KeyCode::Char('i'), KeyCode::Char('I')];
const KEYS_DISMISS: &[KeyCode] = &[KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UNREGISTER: &[KeyCode] = &[KeyCode::Char('u'), KeyCode::Char('U')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc];

fn game_loop(
    app: &mut App,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) {
            break;
        }

        // Platform lifecycle events (installability, installed).
        app.install.pump();

        if app.debug.is_some() {
            handle_debug_keys(app, &kb);
        } else {
            handle_game_keys(app, &kb, sound);
        }

        // F10 toggles the diagnostics overlay; facts and probes are
        // gathered once per open.
        if kb.any_pressed(&[KeyCode::F(10)]) {
            app.debug = match app.debug.take() {
                Some(_) => None,
                None => Some(app.gather_debug()),
            };
        }

        if app.message_timer > 0 {
            app.message_timer -= 1;
            if app.message_timer == 0 {
                app.message.clear();
            }
        }

        let frame = Frame {
            title: &app.title,
            match_state: &app.match_state,
            install: app.install.state(),
            offline_copy: app.offline_copy,
            message: &app.message,
            debug: app.debug.as_ref(),
        };
        renderer.render(&frame)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn handle_game_keys(app: &mut App, kb: &InputState, sound: Option<&SoundEngine>) {
    let action = if kb.any_pressed(KEYS_GUESSED) {
        app.match_state.guess_correct(&app.catalog, &mut app.rng)
    } else if kb.any_pressed(KEYS_SKIP) {
        app.match_state.skip(&app.catalog, &mut app.rng)
    } else if kb.any_pressed(KEYS_REVEAL) {
        Ok(app.match_state.toggle_reveal())
    } else if kb.any_pressed(KEYS_LANGUAGE) {
        // Selection changes re-draw silently.
        let next = app.match_state.language.next();
        if let Err(e) = app.match_state.set_language(next, &app.catalog, &mut app.rng) {
            app.set_message(&e.to_string());
        }
        return;
    } else if kb.any_pressed(KEYS_CATEGORY) {
        let next = app.match_state.category.next();
        if let Err(e) = app.match_state.set_category(next, &app.catalog, &mut app.rng) {
            app.set_message(&e.to_string());
        }
        return;
    } else {
        handle_install_keys(app, kb);
        return;
    };

    match action {
        Ok(event) => play_event(sound, event),
        // The embedded catalog never produces this; surface it instead
        // of guessing at a phrase.
        Err(e) => app.set_message(&e.to_string()),
    }
}

fn handle_install_keys(app: &mut App, kb: &InputState) {
    if kb.any_pressed(KEYS_INSTALL) {
        match app.install.state() {
            InstallState::Installed => app.set_message("Already installed"),
            InstallState::PromptAvailable => {
                if app.install.accept() {
                    app.set_message("Installed! Launch it from your applications menu");
                }
            }
            // Direct polled path: waits up to 5s for the signal.
            InstallState::NoPrompt => {
                if app.install.install_now() {
                    app.set_message("Installed! Launch it from your applications menu");
                } else {
                    app.set_message("Install not available right now");
                }
            }
        }
    } else if kb.any_pressed(KEYS_DISMISS)
        && app.install.state() == InstallState::PromptAvailable
    {
        app.install.dismiss();
        app.set_message("Maybe later");
    }
}

fn handle_debug_keys(app: &mut App, kb: &InputState) {
    if kb.any_pressed(&[KeyCode::F(5)]) {
        match app.force_reload() {
            Ok(()) => app.set_message("Reloaded"),
            Err(e) => app.set_message(&e.to_string()),
        }
    } else if kb.any_pressed(KEYS_UNREGISTER) {
        app.shell.unregister_all();
        // Refresh the panel so the cleared registration shows.
        app.debug = Some(app.gather_debug());
        app.set_message("Worker registrations cleared");
    }
}

fn play_event(sound: Option<&SoundEngine>, event: MatchEvent) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    match event {
        MatchEvent::Point { .. } => sfx.play_point(),
        MatchEvent::Skipped => sfx.play_skip(),
        MatchEvent::RevealToggled { .. } => sfx.play_tap(),
    }
}
