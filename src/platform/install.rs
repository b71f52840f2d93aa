/// Install prompt controller.
///
/// Tracks installability as a three-state machine:
///
///   NoPrompt ──signal──▶ PromptAvailable ──accept──▶ Installed (terminal)
///      ▲                        │
///      └───────dismiss──────────┘   (token discarded either way)
///
/// The deferred prompt is an owned single-use token: the first response
/// runs the underlying platform action, every later response is a no-op
/// that just reports the recorded outcome. A controller constructed while
/// already running in the standalone display context short-circuits to
/// Installed and registers no listeners.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info};

use crate::platform::events::{PlatformEvent, Subscription};
use crate::platform::host::{DisplayMode, Platform};

/// How long a direct polled wait holds out for an installability signal
/// before giving up.
pub const PROMPT_WAIT: Duration = Duration::from_secs(5);

// ── The one-shot token ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PromptOutcome {
    Accepted,
    Dismissed,
}

/// The platform-side effect behind the prompt: performing the actual
/// installation when the user accepts.
pub trait PromptAction: Send {
    fn perform(&mut self, outcome: PromptOutcome);
}

struct PromptInner {
    action: Option<Box<dyn PromptAction>>,
    outcome: Option<PromptOutcome>,
}

/// Deferred install prompt. Clones share one underlying action and its
/// at-most-once guard, like a single native event object handed to every
/// listener.
#[derive(Clone)]
pub struct InstallPrompt {
    inner: Arc<Mutex<PromptInner>>,
}

impl InstallPrompt {
    pub fn new(action: Box<dyn PromptAction>) -> Self {
        InstallPrompt {
            inner: Arc::new(Mutex::new(PromptInner {
                action: Some(action),
                outcome: None,
            })),
        }
    }

    /// Deliver the user's decision. The first call consumes the action;
    /// any later call is a no-op returning the already-recorded outcome.
    pub fn respond(&self, choice: PromptOutcome) -> PromptOutcome {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(recorded) = inner.outcome {
            debug!("install prompt already used ({recorded:?}); ignoring {choice:?}");
            return recorded;
        }
        if let Some(mut action) = inner.action.take() {
            action.perform(choice);
        }
        inner.outcome = Some(choice);
        choice
    }

    /// Has a decision already been made on this token?
    pub fn consumed(&self) -> bool {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).outcome.is_some()
    }
}

impl fmt::Debug for InstallPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallPrompt")
            .field("consumed", &self.consumed())
            .finish()
    }
}

// ── The controller ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InstallState {
    /// Not installed, no prompt captured.
    NoPrompt,
    /// A prompt token is held and can be offered to the user.
    PromptAvailable,
    /// Terminal: installed (or already running standalone).
    Installed,
}

pub struct InstallController {
    state: InstallState,
    prompt: Option<InstallPrompt>,
    subscription: Option<Subscription>,
}

impl InstallController {
    pub fn new(platform: &dyn Platform) -> Self {
        // Already running from the installed launcher: terminal state,
        // nothing to listen for.
        if platform.display_mode() == DisplayMode::Standalone {
            debug!("standalone display context; install controller starts Installed");
            return InstallController {
                state: InstallState::Installed,
                prompt: None,
                subscription: None,
            };
        }
        InstallController {
            state: InstallState::NoPrompt,
            prompt: None,
            subscription: Some(platform.events().subscribe()),
        }
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    /// Drain pending platform events; call once per frame.
    pub fn pump(&mut self) {
        loop {
            let event = match &self.subscription {
                Some(sub) => sub.poll(),
                None => None,
            };
            match event {
                Some(ev) => self.on_event(ev),
                None => break,
            }
        }
    }

    fn on_event(&mut self, event: PlatformEvent) {
        match event {
            PlatformEvent::PromptAvailable(prompt) => {
                if self.state == InstallState::NoPrompt {
                    debug!("install prompt captured");
                    self.prompt = Some(prompt);
                    self.state = InstallState::PromptAvailable;
                }
            }
            PlatformEvent::AppInstalled => self.enter_installed(),
        }
    }

    /// User accepted the offer. Returns false when no prompt is held.
    pub fn accept(&mut self) -> bool {
        match self.prompt.take() {
            Some(prompt) => {
                prompt.respond(PromptOutcome::Accepted);
                info!("install prompt accepted");
                self.enter_installed();
                true
            }
            None => false,
        }
    }

    /// User declined. The token is discarded; the platform will not
    /// re-offer until its own cooldown.
    pub fn dismiss(&mut self) {
        if let Some(prompt) = self.prompt.take() {
            prompt.respond(PromptOutcome::Dismissed);
            info!("install prompt dismissed");
        }
        if self.state == InstallState::PromptAvailable {
            self.state = InstallState::NoPrompt;
        }
    }

    /// Direct polled install: if no prompt is held yet, wait up to
    /// [`PROMPT_WAIT`] for the signal, then accept. Returns whether the
    /// installation was triggered.
    pub fn install_now(&mut self) -> bool {
        if self.state == InstallState::Installed {
            return false;
        }
        if self.state == InstallState::NoPrompt {
            let waited = match &self.subscription {
                Some(sub) => sub.wait(PROMPT_WAIT),
                None => None,
            };
            match waited {
                Some(ev) => self.on_event(ev),
                None => {
                    debug!("no installability signal within {PROMPT_WAIT:?}");
                    return false;
                }
            }
        }
        self.accept()
    }

    /// Terminal transition: discard the token, stop listening.
    fn enter_installed(&mut self) {
        self.state = InstallState::Installed;
        self.prompt = None;
        self.subscription = None;
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════
