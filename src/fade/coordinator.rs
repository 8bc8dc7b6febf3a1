//! Shared fullscreen fade overlays.
//!
//! One overlay per configured display, all driven from a single
//! interpolation clock so multi-display fades stay visually synchronized.
//! An overlay intercepts input while visible; once faded fully out it is
//! pushed behind interactive content so it cannot swallow stray input.

use crate::stage::StageToken;

const TRANSPARENT_EPS: f32 = 0.001;
const OPAQUE_EPS: f32 = 0.999;

/// Handle for one fade; completion is observed, never awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeTicket(u64);

#[derive(Debug)]
struct Overlay {
    alpha: f32,
    intercepts: bool,
}

#[derive(Debug)]
struct ActiveFade {
    ticket: FadeTicket,
    from: f32,
    to: f32,
    secs: f32,
    elapsed: f32,
    targets: Vec<usize>,
    token: Option<StageToken>,
}

#[derive(Debug)]
pub struct FadeCoordinator {
    overlays: Vec<Overlay>,
    active: Option<ActiveFade>,
    next_ticket: u64,
    last_completed: u64,
}

impl FadeCoordinator {
    /// Overlays start fully opaque: the exhibit boots behind black and the
    /// first stage fades in from it.
    pub fn new(display_count: usize) -> Self {
        Self {
            overlays: (0..display_count.max(1))
                .map(|_| Overlay {
                    alpha: 1.0,
                    intercepts: true,
                })
                .collect(),
            active: None,
            next_ticket: 1,
            last_completed: 0,
        }
    }

    pub fn display_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn alpha(&self, display: usize) -> f32 {
        self.overlays.get(display).map(|o| o.alpha).unwrap_or(0.0)
    }

    /// Whether the overlay currently sits in front of interactive content.
    pub fn intercepting(&self, display: usize) -> bool {
        self.overlays
            .get(display)
            .map(|o| o.intercepts)
            .unwrap_or(false)
    }

    /// A fade is in flight; callers must keep visitor input gated off.
    pub fn any_blocking(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_complete(&self, ticket: FadeTicket) -> bool {
        ticket.0 <= self.last_completed
    }

    /// Start a linear alpha fade over `secs` on the given overlays.
    ///
    /// Only one fade runs at a time; a fade started while another is in
    /// flight snaps the old one straight to its end state first. A
    /// non-positive duration completes on the next tick without dividing
    /// by zero. Token-scoped fades freeze (no further alpha writes) once
    /// the token is cancelled.
    pub fn begin(
        &mut self,
        from: f32,
        to: f32,
        secs: f32,
        targets: &[usize],
        token: Option<&StageToken>,
    ) -> FadeTicket {
        if self.active.is_some() {
            self.finish_active();
        }

        let ticket = FadeTicket(self.next_ticket);
        self.next_ticket += 1;

        let targets: Vec<usize> = targets
            .iter()
            .copied()
            .filter(|&t| t < self.overlays.len())
            .collect();
        for &t in &targets {
            // While the fade runs the overlay sits in front and blocks input.
            self.overlays[t].intercepts = true;
            self.overlays[t].alpha = from.clamp(0.0, 1.0);
        }

        self.active = Some(ActiveFade {
            ticket,
            from: from.clamp(0.0, 1.0),
            to: to.clamp(0.0, 1.0),
            secs,
            elapsed: 0.0,
            targets,
            token: token.cloned(),
        });
        ticket
    }

    /// Advance the shared fade clock by one frame.
    pub fn tick(&mut self, dt: f32) {
        let Some(fade) = self.active.as_mut() else {
            return;
        };

        // A cancelled scope freezes the overlays exactly where they are.
        if fade.token.as_ref().is_some_and(|t| t.is_cancelled()) {
            self.active = None;
            return;
        }

        fade.elapsed += dt.max(0.0);
        let t = if fade.secs <= 0.0 {
            1.0
        } else {
            (fade.elapsed / fade.secs).min(1.0)
        };
        let alpha = fade.from + (fade.to - fade.from) * t;
        for &target in &fade.targets {
            self.overlays[target].alpha = alpha;
        }

        if t >= 1.0 {
            self.finish_active();
        }
    }

    /// Snap every overlay to a fixed alpha and drop any active fade.
    /// Used at stage-boundary resets, never mid-stage.
    pub fn snap_all(&mut self, alpha: f32) {
        self.active = None;
        let alpha = alpha.clamp(0.0, 1.0);
        for overlay in &mut self.overlays {
            overlay.alpha = alpha;
            overlay.intercepts = alpha > TRANSPARENT_EPS;
        }
    }

    fn finish_active(&mut self) {
        let Some(fade) = self.active.take() else {
            return;
        };
        // A cancelled scope gets no completion snap either; its overlays
        // stay exactly where the last tick left them.
        if fade.token.as_ref().is_some_and(|t| t.is_cancelled()) {
            return;
        }
        for &target in &fade.targets {
            let overlay = &mut self.overlays[target];
            overlay.alpha = fade.to;
            if fade.to <= TRANSPARENT_EPS {
                overlay.intercepts = false;
            } else if fade.to >= OPAQUE_EPS {
                overlay.intercepts = true;
            }
        }
        self.last_completed = fade.ticket.0;
    }
}
