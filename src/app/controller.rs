//! Owns the shared services and the active stage, and drives the stage
//! lifecycle: enter → run → teardown → exit fade → next stage.

use tracing::{error, info};

use crate::config::ExhibitSettings;
use crate::fade::{FadeCoordinator, FadeTicket};
use crate::hardware::ConsoleBridge;
use crate::input::{FrameInput, InputGate};
use crate::media::{ClipPlayer, MediaPlayer};
use crate::render::{self, StageView, TextureCache};
use crate::stage::{self, Stage, StageContext, StageKind, StageToken, StageTransition};

#[derive(Clone, Copy)]
enum RunState {
    Running,
    Exiting { ticket: FadeTicket, next: StageKind },
}

pub struct ExhibitController {
    settings: ExhibitSettings,
    bridge: ConsoleBridge,
    fade: FadeCoordinator,
    gate: InputGate,
    player: ClipPlayer,
    current: Box<dyn Stage>,
    token: StageToken,
    state: RunState,
    /// False while entering and after a failed `init` (fail-soft: the
    /// stage stays up but accepts no input).
    stage_ready: bool,
    inactivity_secs: f32,
    last_seen_press_ms: u64,
}

impl ExhibitController {
    /// Build the controller and enter the title stage behind an opaque
    /// overlay.
    pub fn new(settings: ExhibitSettings, bridge: ConsoleBridge) -> Self {
        let fade = FadeCoordinator::new(settings.displays.len());
        let mut controller = Self {
            settings,
            bridge,
            fade,
            gate: InputGate::new(),
            player: ClipPlayer::new(),
            current: stage::create(StageKind::Title),
            token: StageToken::new(),
            state: RunState::Running,
            stage_ready: false,
            inactivity_secs: 0.0,
            last_seen_press_ms: 0,
        };
        controller.enter(StageKind::Title);
        controller
    }

    pub fn current_kind(&self) -> StageKind {
        self.current.kind()
    }

    pub fn is_stage_ready(&self) -> bool {
        self.stage_ready
    }

    pub fn fade(&self) -> &FadeCoordinator {
        &self.fade
    }

    /// One frame of exhibit logic.
    pub fn update(&mut self, frame: FrameInput, dt: f32) {
        match self.state {
            RunState::Running => self.update_running(frame, dt),
            RunState::Exiting { ticket, next } => {
                self.gate.set_enabled(false);
                self.player.tick(dt);
                self.fade.tick(dt);
                if self.fade.is_complete(ticket) {
                    self.enter(next);
                }
            }
        }
    }

    fn update_running(&mut self, frame: FrameInput, dt: f32) {
        self.gate
            .set_enabled(self.stage_ready && !self.fade.any_blocking());

        // Inactivity bookkeeping reads the bridge's monotonic press stamp
        // so a press consumed later this same frame still counts.
        let press_ms = self.bridge.last_press_ms();
        let saw_input = frame.any_pressed || press_ms > self.last_seen_press_ms;
        self.last_seen_press_ms = self.last_seen_press_ms.max(press_ms);
        if self.current.kind().is_home() || saw_input {
            self.inactivity_secs = 0.0;
        } else {
            self.inactivity_secs += dt;
        }

        let mut ctx = StageContext {
            settings: &self.settings,
            bridge: &mut self.bridge,
            fade: &mut self.fade,
            gate: &mut self.gate,
            player: &mut self.player,
            frame,
            dt,
            token: self.token.clone(),
        };
        let transition = self.current.update(&mut ctx);

        self.player.tick(dt);
        self.fade.tick(dt);

        if !self.current.kind().is_home() && self.inactivity_secs >= self.settings.inactivity_secs
        {
            info!("no visitor input for {:.0}s, returning to title", self.inactivity_secs);
            self.begin_exit(StageKind::Title);
            return;
        }

        match transition {
            StageTransition::None => {}
            StageTransition::Advance => {
                let next = self.current.kind().next();
                self.begin_exit(next);
            }
            StageTransition::Home => self.begin_exit(StageKind::Title),
        }
    }

    /// Tear the current stage down, then fade out and load `next`.
    ///
    /// Teardown and token cancellation come first so nothing the old stage
    /// started can fire into the exit fade or the next stage's init.
    fn begin_exit(&mut self, next: StageKind) {
        if matches!(self.state, RunState::Exiting { .. }) {
            return;
        }
        self.gate.set_enabled(false);

        let mut ctx = StageContext {
            settings: &self.settings,
            bridge: &mut self.bridge,
            fade: &mut self.fade,
            gate: &mut self.gate,
            player: &mut self.player,
            frame: FrameInput::default(),
            dt: 0.0,
            token: self.token.clone(),
        };
        self.current.teardown(&mut ctx);
        self.token.cancel();
        self.player.stop();

        let targets = self.settings.display_slots();
        let from = self.fade.alpha(0);
        let ticket = self
            .fade
            .begin(from, 1.0, self.settings.fade_secs, &targets, None);
        self.state = RunState::Exiting { ticket, next };
    }

    /// Enter a stage: fresh cancellation scope, stale presses flushed,
    /// input gated off until its entry fade has run.
    fn enter(&mut self, kind: StageKind) {
        self.token = StageToken::new();
        self.bridge.flush_all();
        self.gate.reset_latch();
        self.gate.set_enabled(false);
        self.inactivity_secs = 0.0;
        self.current = stage::create(kind);

        let mut ctx = StageContext {
            settings: &self.settings,
            bridge: &mut self.bridge,
            fade: &mut self.fade,
            gate: &mut self.gate,
            player: &mut self.player,
            frame: FrameInput::default(),
            dt: 0.0,
            token: self.token.clone(),
        };
        match self.current.init(&mut ctx) {
            Ok(()) => {
                info!("stage {:?} ready", kind);
                self.stage_ready = true;
            }
            Err(e) => {
                // Fail-soft: the exhibit stays up, input stays disabled,
                // the operator reads the log.
                error!("stage {:?} init failed: {:#}", kind, e);
                self.stage_ready = false;
            }
        }
        self.state = RunState::Running;
    }

    pub fn draw(&self, cache: &mut TextureCache) {
        render::clear_frame();
        let mut view = StageView {
            settings: &self.settings,
            cache,
            fade: &self.fade,
        };
        self.current.draw(&mut view);
        render::draw_primary_overlay(&self.fade);
        if self.settings.verbose && !self.bridge.is_connected() {
            render::draw_status_line("console offline - direct input only");
        }
    }

    /// Turn the console dark and release it. Called once at exit.
    pub fn shutdown(&mut self) {
        self.bridge.set_led_all(false);
        self.bridge.shutdown();
    }
}
