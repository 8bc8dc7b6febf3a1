//! Title (attract) stage: LEDs lit, blinking start prompt, waits for any
//! visitor input.

use anyhow::Result;
use serde::Deserialize;

use super::{Stage, StageContext, StageKind, StageTransition};
use crate::config::{ImageSetting, load_stage_settings};
use crate::render::StageView;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TitleSetting {
    pub title_image: ImageSetting,
    pub info_image: ImageSetting,
    /// Full on/off cycle of the start prompt, in seconds.
    pub blink_secs: f32,
}

impl Default for TitleSetting {
    fn default() -> Self {
        Self {
            title_image: ImageSetting::default(),
            info_image: ImageSetting::default(),
            blink_secs: 1.2,
        }
    }
}

pub struct TitleStage {
    setting: TitleSetting,
    blink_elapsed: f32,
}

impl TitleStage {
    pub fn new() -> Self {
        Self {
            setting: TitleSetting::default(),
            blink_elapsed: 0.0,
        }
    }

    fn prompt_lit(&self) -> bool {
        let period = self.setting.blink_secs.max(0.1);
        (self.blink_elapsed % period) < period * 0.5
    }
}

impl Stage for TitleStage {
    fn kind(&self) -> StageKind {
        StageKind::Title
    }

    fn init(&mut self, ctx: &mut StageContext<'_>) -> Result<()> {
        self.setting = load_stage_settings(&ctx.settings.assets_dir, "TitleSetting.json")?;
        ctx.bridge.set_led_all(true);
        ctx.fade_in(&ctx.all_displays());
        Ok(())
    }

    fn update(&mut self, ctx: &mut StageContext<'_>) -> StageTransition {
        self.blink_elapsed += ctx.dt;

        if ctx.try_consume_visitor_input() {
            ctx.bridge.set_led_all(false);
            return StageTransition::Advance;
        }
        StageTransition::None
    }

    fn draw(&self, view: &mut StageView<'_>) {
        view.draw_image(&self.setting.title_image);
        if self.prompt_lit() {
            view.draw_image(&self.setting.info_image);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FrameInput;
    use crate::test_utils::harness::{ServiceRig, write_stage_json};

    fn fixture(dir: &std::path::Path) {
        write_stage_json(
            dir,
            "TitleSetting.json",
            r#"{
                "title_image": { "source_image": "title.png", "width": 1200.0, "height": 400.0 },
                "info_image": { "source_image": "press_any.png", "width": 600.0, "height": 120.0 },
                "blink_secs": 1.0
            }"#,
        );
    }

    #[test]
    fn test_init_without_settings_fails_soft() {
        let dir = tempfile::tempdir().unwrap();
        let mut rig = ServiceRig::with_assets(dir.path());
        let mut stage = TitleStage::new();
        let mut ctx = rig.ctx(FrameInput::default(), 0.0);
        assert!(stage.init(&mut ctx).is_err());
    }

    #[test]
    fn test_advances_on_input() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());
        let mut rig = ServiceRig::with_assets(dir.path());
        let mut stage = TitleStage::new();

        let mut ctx = rig.ctx(FrameInput::default(), 0.0);
        stage.init(&mut ctx).unwrap();

        // Quiet frames keep waiting.
        let mut ctx = rig.ctx(FrameInput::default(), 0.016);
        assert_eq!(stage.update(&mut ctx), StageTransition::None);

        let mut ctx = rig.ctx(FrameInput::any(), 0.016);
        assert_eq!(stage.update(&mut ctx), StageTransition::Advance);
    }

    #[test]
    fn test_prompt_blinks() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());
        let mut rig = ServiceRig::with_assets(dir.path());
        let mut stage = TitleStage::new();
        let mut ctx = rig.ctx(FrameInput::default(), 0.0);
        stage.init(&mut ctx).unwrap();

        assert!(stage.prompt_lit());
        let mut ctx = rig.ctx(FrameInput::default(), 0.6);
        stage.update(&mut ctx);
        assert!(!stage.prompt_lit());
        let mut ctx = rig.ctx(FrameInput::default(), 0.5);
        stage.update(&mut ctx);
        assert!(stage.prompt_lit());
    }
}
