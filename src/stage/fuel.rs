//! Fuel-fill stage: hold a button to fill each of the three tanks in turn.
//!
//! Console buttons deliver presses, not hold state, so each consumed press
//! adds a fixed pulse of fuel; the keyboard stand-ins fill continuously
//! while held.

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use super::{Stage, StageContext, StageKind, StageTransition};
use crate::config::{ImageSetting, load_stage_settings};
use crate::hardware::BUTTON_COUNT;
use crate::render::StageView;

/// Fill added per consumed console press, as a fraction of one tank.
const PRESS_PULSE: f32 = 0.12;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FuelSetting {
    pub main_image: ImageSetting,
    /// Instruction popup shown until the first fill input.
    pub popup_image: ImageSetting,
    pub tank_images: Vec<ImageSetting>,
    pub popup_fade_secs: f32,
    /// Tank fraction filled per second of held input.
    pub fill_speed: f32,
}

impl Default for FuelSetting {
    fn default() -> Self {
        Self {
            main_image: ImageSetting::default(),
            popup_image: ImageSetting::default(),
            tank_images: Vec::new(),
            popup_fade_secs: 0.5,
            fill_speed: 0.4,
        }
    }
}

pub struct FuelStage {
    setting: FuelSetting,
    fills: [f32; BUTTON_COUNT],
    tank: usize,
    /// None until the first fill input, then counts up to popup_fade_secs.
    popup_fade_elapsed: Option<f32>,
}

impl FuelStage {
    pub fn new() -> Self {
        Self {
            setting: FuelSetting::default(),
            fills: [0.0; BUTTON_COUNT],
            tank: 0,
            popup_fade_elapsed: None,
        }
    }

    fn popup_alpha(&self) -> f32 {
        match self.popup_fade_elapsed {
            None => 1.0,
            Some(elapsed) => {
                let secs = self.setting.popup_fade_secs.max(0.001);
                (1.0 - elapsed / secs).clamp(0.0, 1.0)
            }
        }
    }
}

impl Stage for FuelStage {
    fn kind(&self) -> StageKind {
        StageKind::Fuel
    }

    fn init(&mut self, ctx: &mut StageContext<'_>) -> Result<()> {
        self.setting = load_stage_settings(&ctx.settings.assets_dir, "FuelSetting.json")?;
        ctx.fade_in(&ctx.all_displays());
        Ok(())
    }

    fn update(&mut self, ctx: &mut StageContext<'_>) -> StageTransition {
        if let Some(elapsed) = &mut self.popup_fade_elapsed {
            *elapsed += ctx.dt;
        }

        if self.tank >= BUTTON_COUNT {
            return StageTransition::Advance;
        }
        if !ctx.gate.is_enabled() {
            return StageTransition::None;
        }

        let mut gained = 0.0;
        if ctx.frame.held[self.tank] {
            gained += self.setting.fill_speed * ctx.dt;
        }
        // A console press of the matching button adds one pulse; presses
        // of the other buttons are consumed but do nothing.
        if let Some(button) = ctx.bridge.try_consume_any_press() {
            if button.index() == self.tank {
                gained += PRESS_PULSE;
            }
        }

        if gained > 0.0 {
            if self.popup_fade_elapsed.is_none() {
                self.popup_fade_elapsed = Some(0.0);
            }
            self.fills[self.tank] = (self.fills[self.tank] + gained).min(1.0);
            if self.fills[self.tank] >= 1.0 {
                debug!("tank {} full", self.tank + 1);
                self.tank += 1;
                if self.tank >= BUTTON_COUNT {
                    return StageTransition::Advance;
                }
            }
        }
        StageTransition::None
    }

    fn draw(&self, view: &mut StageView<'_>) {
        view.draw_image(&self.setting.main_image);
        for (i, image) in self.setting.tank_images.iter().enumerate() {
            // Tanks render as a fill bar clipped by their fraction.
            let fill = self.fills.get(i).copied().unwrap_or(0.0);
            let mut clipped = image.clone();
            clipped.height = image.height * fill;
            clipped.position.y = image.position.y + image.height - clipped.height;
            view.draw_image(&clipped);
        }
        view.draw_image_alpha(&self.setting.popup_image, self.popup_alpha());
    }
}
