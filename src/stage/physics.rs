//! Physics explainer: an intro clip followed by the three laws of motion,
//! each skippable once half-watched.

use anyhow::Result;
use serde::Deserialize;

use super::{MediaSequence, SeqEvent, Stage, StageContext, StageKind, StageTransition};
use crate::config::{MediaSetting, TextSetting, load_stage_settings};
use crate::media::MediaPlayer;
use crate::render::StageView;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhysicsSetting {
    pub title_text: TextSetting,
    /// Skip prompt, revealed once a law clip is half played.
    pub info_text: TextSetting,
    pub intro_clip: MediaSetting,
    pub law_clips: Vec<MediaSetting>,
}

pub struct PhysicsStage {
    setting: PhysicsSetting,
    seq: Option<MediaSequence>,
}

impl PhysicsStage {
    pub fn new() -> Self {
        Self {
            setting: PhysicsSetting::default(),
            seq: None,
        }
    }
}

impl Stage for PhysicsStage {
    fn kind(&self) -> StageKind {
        StageKind::Physics
    }

    fn init(&mut self, ctx: &mut StageContext<'_>) -> Result<()> {
        self.setting = load_stage_settings(&ctx.settings.assets_dir, "PhysicsSetting.json")?;

        let mut items = vec![self.setting.intro_clip.clone()];
        items.extend(self.setting.law_clips.iter().cloned());

        // The swap cutaway covers the primary display only; the reveal
        // opens every display back up.
        let mut seq =
            MediaSequence::new(items, vec![0], ctx.all_displays()).with_unskippable_prefix(1);
        seq.start(ctx)?;
        self.seq = Some(seq);

        ctx.fade_in(&ctx.all_displays());
        Ok(())
    }

    fn update(&mut self, ctx: &mut StageContext<'_>) -> StageTransition {
        let Some(seq) = &mut self.seq else {
            return StageTransition::None;
        };
        if seq.tick(ctx) == Some(SeqEvent::Completed) {
            return StageTransition::Advance;
        }
        StageTransition::None
    }

    fn draw(&self, view: &mut StageView<'_>) {
        view.draw_text_setting(&self.setting.title_text);
        if self.seq.as_ref().is_some_and(|s| s.prompt_visible()) {
            view.draw_text_setting(&self.setting.info_text);
        }
    }

    fn teardown(&mut self, ctx: &mut StageContext<'_>) {
        // Drop the sequence so a queued swap cannot touch the player, and
        // make sure the skip prompt disappears with it.
        self.seq = None;
        ctx.player.stop();
    }
}
