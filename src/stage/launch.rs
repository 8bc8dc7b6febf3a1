//! Launch stage: LEDs invite the press, then a per-digit countdown and
//! liftoff.

use anyhow::Result;
use serde::Deserialize;
use tracing::info;

use super::{Stage, StageContext, StageKind, StageTransition};
use crate::config::{ImageSetting, load_stage_settings};
use crate::render::StageView;

/// Seconds each countdown digit stays on screen while fading out.
const DIGIT_SECS: f32 = 1.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LaunchSetting {
    pub main_image: ImageSetting,
    pub sub_image: ImageSetting,
    pub countdown_from: u32,
    /// Seconds of liftoff imagery before moving on.
    pub liftoff_secs: f32,
}

impl Default for LaunchSetting {
    fn default() -> Self {
        Self {
            main_image: ImageSetting::default(),
            sub_image: ImageSetting::default(),
            countdown_from: 5,
            liftoff_secs: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Waiting,
    Countdown { value: u32, digit_elapsed: f32 },
    Liftoff { remaining: f32 },
}

pub struct LaunchStage {
    setting: LaunchSetting,
    phase: Phase,
}

impl LaunchStage {
    pub fn new() -> Self {
        Self {
            setting: LaunchSetting::default(),
            phase: Phase::Waiting,
        }
    }
}

impl Stage for LaunchStage {
    fn kind(&self) -> StageKind {
        StageKind::Launch
    }

    fn init(&mut self, ctx: &mut StageContext<'_>) -> Result<()> {
        self.setting = load_stage_settings(&ctx.settings.assets_dir, "LaunchSetting.json")?;
        self.setting.countdown_from = self.setting.countdown_from.max(1);
        ctx.bridge.set_led_all(true);
        ctx.fade_in(&ctx.all_displays());
        Ok(())
    }

    fn update(&mut self, ctx: &mut StageContext<'_>) -> StageTransition {
        match &mut self.phase {
            Phase::Waiting => {
                if ctx.try_consume_visitor_input() {
                    ctx.bridge.set_led_all(false);
                    info!("countdown started");
                    self.phase = Phase::Countdown {
                        value: self.setting.countdown_from,
                        digit_elapsed: 0.0,
                    };
                }
                StageTransition::None
            }
            Phase::Countdown {
                value,
                digit_elapsed,
            } => {
                *digit_elapsed += ctx.dt;
                if *digit_elapsed >= DIGIT_SECS {
                    *digit_elapsed = 0.0;
                    *value -= 1;
                    if *value == 0 {
                        info!("liftoff");
                        self.phase = Phase::Liftoff {
                            remaining: self.setting.liftoff_secs,
                        };
                    }
                }
                StageTransition::None
            }
            Phase::Liftoff { remaining } => {
                *remaining -= ctx.dt;
                if *remaining <= 0.0 {
                    StageTransition::Advance
                } else {
                    StageTransition::None
                }
            }
        }
    }

    fn draw(&self, view: &mut StageView<'_>) {
        view.draw_image(&self.setting.main_image);
        view.draw_image(&self.setting.sub_image);
        if let Phase::Countdown {
            value,
            digit_elapsed,
        } = self.phase
        {
            // Each digit snaps in fully opaque and fades to nothing.
            let alpha = 1.0 - (digit_elapsed / DIGIT_SECS).clamp(0.0, 1.0);
            let w = macroquad::prelude::screen_width();
            let h = macroquad::prelude::screen_height();
            view.draw_plain_text(&value.to_string(), w * 0.5 - 40.0, h * 0.5, 160.0, alpha);
        }
    }
}
