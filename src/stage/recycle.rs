//! Recycle stage: recovery popup, end screen, then back to the title.

use anyhow::Result;
use serde::Deserialize;

use super::{Stage, StageContext, StageKind, StageTransition};
use crate::config::{ImageSetting, load_stage_settings};
use crate::fade::CrossFade;
use crate::render::StageView;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecycleSetting {
    pub main_image: ImageSetting,
    pub popup_image: ImageSetting,
    pub end_background: ImageSetting,
    pub end_images: Vec<ImageSetting>,
    pub popup_fade_secs: f32,
    /// Dwell on the end screen before returning to the title.
    pub game_close_secs: f32,
}

impl Default for RecycleSetting {
    fn default() -> Self {
        Self {
            main_image: ImageSetting::default(),
            popup_image: ImageSetting::default(),
            end_background: ImageSetting::default(),
            end_images: Vec::new(),
            popup_fade_secs: 0.8,
            game_close_secs: 6.0,
        }
    }
}

#[derive(Debug)]
enum Phase {
    Waiting,
    Swapping(CrossFade),
    Dwell { remaining: f32 },
}

pub struct RecycleStage {
    setting: RecycleSetting,
    phase: Phase,
}

impl RecycleStage {
    pub fn new() -> Self {
        Self {
            setting: RecycleSetting::default(),
            phase: Phase::Waiting,
        }
    }
}

impl Stage for RecycleStage {
    fn kind(&self) -> StageKind {
        StageKind::Recycle
    }

    fn init(&mut self, ctx: &mut StageContext<'_>) -> Result<()> {
        self.setting = load_stage_settings(&ctx.settings.assets_dir, "RecycleSetting.json")?;
        ctx.fade_in(&ctx.all_displays());
        Ok(())
    }

    fn update(&mut self, ctx: &mut StageContext<'_>) -> StageTransition {
        match &mut self.phase {
            Phase::Waiting => {
                if ctx.try_consume_visitor_input() {
                    ctx.flush_and_rearm();
                    self.phase = Phase::Swapping(CrossFade::new(
                        self.setting.popup_fade_secs,
                        ctx.token.clone(),
                    ));
                }
                StageTransition::None
            }
            Phase::Swapping(swap) => {
                if swap.tick(ctx.dt) {
                    self.phase = Phase::Dwell {
                        remaining: self.setting.game_close_secs,
                    };
                }
                StageTransition::None
            }
            Phase::Dwell { remaining } => {
                *remaining -= ctx.dt;
                if *remaining <= 0.0 {
                    StageTransition::Home
                } else {
                    StageTransition::None
                }
            }
        }
    }

    fn draw(&self, view: &mut StageView<'_>) {
        view.draw_image(&self.setting.main_image);
        match &self.phase {
            Phase::Waiting => view.draw_image(&self.setting.popup_image),
            Phase::Swapping(swap) => {
                if swap.source_active() {
                    view.draw_image_alpha(&self.setting.popup_image, swap.source_alpha());
                }
                view.draw_image_alpha(&self.setting.end_background, swap.destination_alpha());
                for image in &self.setting.end_images {
                    view.draw_image_alpha(image, swap.destination_alpha());
                }
            }
            Phase::Dwell { .. } => {
                view.draw_image(&self.setting.end_background);
                for image in &self.setting.end_images {
                    view.draw_image(image);
                }
            }
        }
    }
}
