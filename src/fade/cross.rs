//! Two-surface cross-fade owned by a stage.
//!
//! The destination becomes active (drawn, interactable) at swap start; the
//! source is deactivated only once fully transparent. Alphas swap linearly
//! over the same clock: source 1→0 while destination 0→1.

use crate::stage::StageToken;

#[derive(Debug)]
pub struct CrossFade {
    secs: f32,
    elapsed: f32,
    done: bool,
    token: StageToken,
}

impl CrossFade {
    pub fn new(secs: f32, token: StageToken) -> Self {
        Self {
            secs,
            elapsed: 0.0,
            done: false,
            token,
        }
    }

    /// Advance one frame; returns `true` when the swap has completed.
    /// A cancelled stage scope freezes the swap where it is.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.done || self.token.is_cancelled() {
            return self.done;
        }
        self.elapsed += dt.max(0.0);
        if self.secs <= 0.0 || self.elapsed >= self.secs {
            self.done = true;
        }
        self.done
    }

    fn progress(&self) -> f32 {
        if self.done {
            return 1.0;
        }
        if self.secs <= 0.0 {
            return 0.0;
        }
        (self.elapsed / self.secs).min(1.0)
    }

    pub fn source_alpha(&self) -> f32 {
        1.0 - self.progress()
    }

    pub fn destination_alpha(&self) -> f32 {
        self.progress()
    }

    /// The destination is visible from the first frame of the swap.
    pub fn destination_active(&self) -> bool {
        true
    }

    /// The source stays active until it is fully transparent.
    pub fn source_active(&self) -> bool {
        self.source_alpha() > 0.0
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}
