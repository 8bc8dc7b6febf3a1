//! Tutorial stage: steps through instruction images with cross-fades.
//!
//! Input is ignored while a step swap is in flight, and the console queue
//! is flushed on both sides of the swap so presses buffered mid-fade cannot
//! advance two steps.

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use super::{Stage, StageContext, StageKind, StageTransition};
use crate::config::{ImageSetting, TextSetting, load_stage_settings};
use crate::fade::CrossFade;
use crate::render::StageView;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TutorialSetting {
    pub info_text: TextSetting,
    pub images: Vec<ImageSetting>,
    pub step_fade_secs: f32,
}

impl Default for TutorialSetting {
    fn default() -> Self {
        Self {
            info_text: TextSetting::default(),
            images: Vec::new(),
            step_fade_secs: 0.5,
        }
    }
}

pub struct TutorialStage {
    setting: TutorialSetting,
    step: usize,
    swap: Option<CrossFade>,
}

impl TutorialStage {
    pub fn new() -> Self {
        Self {
            setting: TutorialSetting::default(),
            step: 0,
            swap: None,
        }
    }
}

impl Stage for TutorialStage {
    fn kind(&self) -> StageKind {
        StageKind::Tutorial
    }

    fn init(&mut self, ctx: &mut StageContext<'_>) -> Result<()> {
        self.setting = load_stage_settings(&ctx.settings.assets_dir, "TutorialSetting.json")?;
        if self.setting.images.is_empty() {
            anyhow::bail!("tutorial has no images");
        }
        ctx.fade_in(&ctx.all_displays());
        Ok(())
    }

    fn update(&mut self, ctx: &mut StageContext<'_>) -> StageTransition {
        if let Some(swap) = &mut self.swap {
            if swap.tick(ctx.dt) {
                self.swap = None;
                self.step += 1;
                debug!("tutorial step {}", self.step);
                // Presses accumulated during the swap are stale.
                ctx.flush_and_rearm();
            }
            return StageTransition::None;
        }

        if ctx.try_consume_visitor_input() {
            if self.step + 1 >= self.setting.images.len() {
                return StageTransition::Advance;
            }
            ctx.flush_and_rearm();
            self.swap = Some(CrossFade::new(
                self.setting.step_fade_secs,
                ctx.token.clone(),
            ));
        }
        StageTransition::None
    }

    fn draw(&self, view: &mut StageView<'_>) {
        match &self.swap {
            Some(swap) => {
                if swap.source_active() {
                    if let Some(image) = self.setting.images.get(self.step) {
                        view.draw_image_alpha(image, swap.source_alpha());
                    }
                }
                if let Some(image) = self.setting.images.get(self.step + 1) {
                    view.draw_image_alpha(image, swap.destination_alpha());
                }
            }
            None => {
                if let Some(image) = self.setting.images.get(self.step) {
                    view.draw_image(image);
                }
            }
        }
        view.draw_text_setting(&self.setting.info_text);
    }
}
