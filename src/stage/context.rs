//! Services a stage borrows for one frame, plus its cancellation scope.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::ExhibitSettings;
use crate::fade::{FadeCoordinator, FadeTicket};
use crate::hardware::ConsoleBridge;
use crate::input::{FrameInput, InputGate};
use crate::media::MediaPlayer;

/// Cancellation scope of one stage instance.
///
/// Created at stage entry, cancelled at teardown before the next stage is
/// built. Every ticking primitive holds a clone and checks it at each
/// frame boundary, so nothing a stage started can outlive it.
#[derive(Debug, Clone, Default)]
pub struct StageToken(Arc<AtomicBool>);

impl StageToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-frame view of the shared services, lent to the active stage.
pub struct StageContext<'a> {
    pub settings: &'a ExhibitSettings,
    pub bridge: &'a mut ConsoleBridge,
    pub fade: &'a mut FadeCoordinator,
    pub gate: &'a mut InputGate,
    pub player: &'a mut dyn MediaPlayer,
    pub frame: FrameInput,
    pub dt: f32,
    pub token: StageToken,
}

impl StageContext<'_> {
    /// Direct input through the single-consumption latch.
    pub fn try_consume_single_input(&mut self) -> bool {
        self.gate.try_consume(self.frame.any_pressed)
    }

    /// Any visitor input: a pending console press or latched direct input.
    /// Both respect the gate; both consume.
    pub fn try_consume_visitor_input(&mut self) -> bool {
        if self.gate.is_enabled() && self.bridge.try_consume_any_press().is_some() {
            return true;
        }
        self.try_consume_single_input()
    }

    /// Drop buffered console presses and re-arm the latch; called around
    /// step transitions so input accumulated mid-fade cannot double-fire.
    pub fn flush_and_rearm(&mut self) {
        self.bridge.flush_all();
        self.gate.reset_latch();
    }

    /// Overlay slots for every configured display.
    pub fn all_displays(&self) -> Vec<usize> {
        self.settings.display_slots()
    }

    /// Stage-scoped entry fade (opaque → clear).
    pub fn fade_in(&mut self, targets: &[usize]) -> FadeTicket {
        let secs = self.settings.fade_secs;
        self.fade.begin(1.0, 0.0, secs, targets, Some(&self.token))
    }

    /// Stage-scoped cover fade (clear → opaque).
    pub fn fade_out(&mut self, targets: &[usize]) -> FadeTicket {
        let secs = self.settings.fade_secs;
        self.fade.begin(0.0, 1.0, secs, targets, Some(&self.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_cancel_is_sticky() {
        let token = StageToken::new();
        assert!(!token.is_cancelled());

        let observer = token.clone();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(observer.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_fresh_token_is_independent() {
        let old = StageToken::new();
        old.cancel();
        let new = StageToken::new();
        assert!(!new.is_cancelled());
    }
}
