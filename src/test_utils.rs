//! Test utilities: a service rig for driving stage logic headless and
//! helpers for writing per-stage JSON fixtures.

#[cfg(test)]
pub mod harness {
    use std::path::{Path, PathBuf};

    use crate::config::ExhibitSettings;
    use crate::fade::FadeCoordinator;
    use crate::hardware::ConsoleBridge;
    use crate::input::{FrameInput, InputGate};
    use crate::media::ClipPlayer;
    use crate::stage::{StageContext, StageToken};

    /// All services a stage borrows, wired for headless tests: a
    /// disconnected bridge, short fades, cleared overlays, open gate.
    pub struct ServiceRig {
        pub settings: ExhibitSettings,
        pub bridge: ConsoleBridge,
        pub fade: FadeCoordinator,
        pub gate: InputGate,
        pub player: ClipPlayer,
        pub token: StageToken,
    }

    impl ServiceRig {
        pub fn new() -> Self {
            let mut settings = ExhibitSettings::default();
            settings.fade_secs = 0.1;
            let mut fade = FadeCoordinator::new(settings.displays.len());
            fade.snap_all(0.0);
            let mut gate = InputGate::new();
            gate.set_enabled(true);
            Self {
                settings,
                bridge: ConsoleBridge::disconnected(),
                fade,
                gate,
                player: ClipPlayer::new(),
                token: StageToken::new(),
            }
        }

        pub fn with_assets(assets_dir: &Path) -> Self {
            let mut rig = Self::new();
            rig.settings.assets_dir = assets_dir.to_path_buf();
            rig
        }

        pub fn ctx(&mut self, frame: FrameInput, dt: f32) -> StageContext<'_> {
            StageContext {
                settings: &self.settings,
                bridge: &mut self.bridge,
                fade: &mut self.fade,
                gate: &mut self.gate,
                player: &mut self.player,
                frame,
                dt,
                token: self.token.clone(),
            }
        }
    }

    /// Write one stage-settings fixture under `<dir>/JSON/<file>`.
    pub fn write_stage_json(dir: &Path, file: &str, json: &str) -> PathBuf {
        let json_dir = dir.join("JSON");
        std::fs::create_dir_all(&json_dir).unwrap();
        let path = json_dir.join(file);
        std::fs::write(&path, json).unwrap();
        path
    }
}
