//! Rocket-build stage: pick a rocket, pick a satellite, then watch the
//! launch-site and assembly clips.

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{MediaSequence, SeqEvent, Stage, StageContext, StageKind, StageTransition};
use crate::config::{ImageSetting, MediaSetting, TextSetting, load_stage_settings};
use crate::hardware::ButtonId;
use crate::media::MediaPlayer;
use crate::render::StageView;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildSetting {
    pub info_text: TextSetting,
    pub rockets: Vec<ImageSetting>,
    pub satellites: Vec<ImageSetting>,
    pub site_clip: MediaSetting,
    pub assembly_clip: MediaSetting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    PickRocket,
    PickSatellite,
    Clips,
}

pub struct BuildStage {
    setting: BuildSetting,
    phase: Phase,
    rocket: usize,
    satellite: usize,
    seq: Option<MediaSequence>,
}

/// Per-frame picker intent decoded from both input paths.
#[derive(Debug, Default, Clone, Copy)]
struct PickerInput {
    prev: bool,
    next: bool,
    confirm: bool,
}

impl BuildStage {
    pub fn new() -> Self {
        Self {
            setting: BuildSetting::default(),
            phase: Phase::PickRocket,
            rocket: 0,
            satellite: 0,
            seq: None,
        }
    }

    /// Button1 steps back, Button3 steps forward, Button2 confirms; the
    /// arrow keys mirror the console layout.
    fn picker_input(ctx: &mut StageContext<'_>) -> PickerInput {
        if !ctx.gate.is_enabled() {
            return PickerInput::default();
        }
        let pressed = ctx.bridge.try_consume_any_press();
        PickerInput {
            prev: ctx.frame.pressed[0] || pressed == Some(ButtonId::Button1),
            confirm: ctx.frame.pressed[1] || pressed == Some(ButtonId::Button2),
            next: ctx.frame.pressed[2] || pressed == Some(ButtonId::Button3),
        }
    }

    fn start_clips(&mut self, ctx: &mut StageContext<'_>) {
        let items = vec![
            self.setting.site_clip.clone(),
            self.setting.assembly_clip.clone(),
        ];
        let mut seq = MediaSequence::new(items, vec![0], ctx.all_displays());
        match seq.start(ctx) {
            Ok(()) => {
                self.seq = Some(seq);
                self.phase = Phase::Clips;
            }
            Err(e) => {
                // Selection stays on screen; the visitor is not locked out
                // but the stage needs the operator to fix the clips.
                warn!("build stage clips failed to start: {}", e);
            }
        }
    }
}

impl Stage for BuildStage {
    fn kind(&self) -> StageKind {
        StageKind::Build
    }

    fn init(&mut self, ctx: &mut StageContext<'_>) -> Result<()> {
        self.setting = load_stage_settings(&ctx.settings.assets_dir, "BuildSetting.json")?;
        if self.setting.rockets.is_empty() || self.setting.satellites.is_empty() {
            anyhow::bail!("build stage needs at least one rocket and one satellite");
        }
        ctx.fade_in(&ctx.all_displays());
        Ok(())
    }

    fn update(&mut self, ctx: &mut StageContext<'_>) -> StageTransition {
        match self.phase {
            Phase::PickRocket | Phase::PickSatellite => {
                let input = Self::picker_input(ctx);
                let (index, len) = match self.phase {
                    Phase::PickRocket => (&mut self.rocket, self.setting.rockets.len()),
                    _ => (&mut self.satellite, self.setting.satellites.len()),
                };

                if input.prev && *index > 0 {
                    *index -= 1;
                }
                if input.next && *index + 1 < len {
                    *index += 1;
                }
                if input.confirm {
                    match self.phase {
                        Phase::PickRocket => {
                            debug!("rocket {} locked", self.rocket);
                            self.phase = Phase::PickSatellite;
                            ctx.flush_and_rearm();
                        }
                        Phase::PickSatellite => {
                            debug!("satellite {} locked", self.satellite);
                            ctx.flush_and_rearm();
                            self.start_clips(ctx);
                        }
                        Phase::Clips => unreachable!(),
                    }
                }
                StageTransition::None
            }
            Phase::Clips => {
                let Some(seq) = &mut self.seq else {
                    return StageTransition::None;
                };
                if seq.tick(ctx) == Some(SeqEvent::Completed) {
                    return StageTransition::Advance;
                }
                StageTransition::None
            }
        }
    }

    fn draw(&self, view: &mut StageView<'_>) {
        match self.phase {
            Phase::PickRocket => {
                if let Some(image) = self.setting.rockets.get(self.rocket) {
                    view.draw_image(image);
                }
                view.draw_text_setting(&self.setting.info_text);
            }
            Phase::PickSatellite => {
                if let Some(image) = self.setting.satellites.get(self.satellite) {
                    view.draw_image(image);
                }
                view.draw_text_setting(&self.setting.info_text);
            }
            Phase::Clips => {
                if self.seq.as_ref().is_some_and(|s| s.prompt_visible()) {
                    view.draw_text_setting(&self.setting.info_text);
                }
            }
        }
    }

    fn teardown(&mut self, ctx: &mut StageContext<'_>) {
        self.seq = None;
        ctx.player.stop();
    }
}
