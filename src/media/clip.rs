//! Duration-clock clip player.
//!
//! The exhibit treats video decode as an external capability; this player
//! advances a clip by wall-clock duration declared in configuration, which
//! is all the progress/finished signal the stage layer needs.

use tracing::debug;

use super::{MediaError, MediaPlayer, Playback};
use crate::config::MediaSetting;

#[derive(Debug, Default)]
pub struct ClipPlayer {
    name: String,
    duration_secs: f32,
    elapsed_secs: f32,
    state: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Idle,
    Prepared,
    Playing,
    Finished,
}

impl ClipPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_clip(&self) -> Option<&str> {
        if self.state == State::Idle {
            None
        } else {
            Some(&self.name)
        }
    }
}

impl MediaPlayer for ClipPlayer {
    fn prepare(&mut self, clip: &MediaSetting) -> Result<(), MediaError> {
        if clip.file_name.is_empty() {
            return Err(MediaError::Prepare {
                name: clip.file_name.clone(),
                reason: "empty file name".to_string(),
            });
        }
        if clip.duration_secs <= 0.0 {
            return Err(MediaError::Prepare {
                name: clip.file_name.clone(),
                reason: format!("non-positive duration {}", clip.duration_secs),
            });
        }

        debug!("prepared clip '{}' ({}s)", clip.file_name, clip.duration_secs);
        self.name = clip.file_name.clone();
        self.duration_secs = clip.duration_secs;
        self.elapsed_secs = 0.0;
        self.state = State::Prepared;
        Ok(())
    }

    fn play(&mut self) {
        if matches!(self.state, State::Prepared | State::Finished) {
            if self.state == State::Finished {
                self.elapsed_secs = 0.0;
            }
            self.state = State::Playing;
        }
    }

    fn stop(&mut self) {
        if self.state != State::Idle {
            self.state = State::Prepared;
            self.elapsed_secs = 0.0;
        }
    }

    fn tick(&mut self, dt: f32) {
        if self.state != State::Playing {
            return;
        }
        self.elapsed_secs += dt.max(0.0);
        if self.elapsed_secs >= self.duration_secs {
            self.elapsed_secs = self.duration_secs;
            self.state = State::Finished;
        }
    }

    fn playback(&self) -> Playback {
        match self.state {
            State::Idle | State::Prepared => Playback::Idle,
            State::Playing => Playback::Playing,
            State::Finished => Playback::Finished,
        }
    }

    fn progress(&self) -> Option<f32> {
        match self.state {
            State::Idle => None,
            State::Prepared => Some(0.0),
            State::Playing | State::Finished => Some(self.elapsed_secs / self.duration_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(duration: f32) -> MediaSetting {
        MediaSetting {
            file_name: "clip.mp4".to_string(),
            duration_secs: duration,
            ..MediaSetting::default()
        }
    }

    #[test]
    fn test_progress_tracks_duration() {
        let mut player = ClipPlayer::new();
        player.prepare(&clip(10.0)).unwrap();
        player.play();

        player.tick(2.5);
        assert_eq!(player.playback(), Playback::Playing);
        assert!((player.progress().unwrap() - 0.25).abs() < 1e-5);

        player.tick(10.0);
        assert_eq!(player.playback(), Playback::Finished);
        assert_eq!(player.progress(), Some(1.0));
    }

    #[test]
    fn test_stop_rewinds() {
        let mut player = ClipPlayer::new();
        player.prepare(&clip(4.0)).unwrap();
        player.play();
        player.tick(2.0);

        player.stop();
        assert_eq!(player.playback(), Playback::Idle);
        assert_eq!(player.progress(), Some(0.0));
    }

    #[test]
    fn test_prepare_rejects_bad_clips() {
        let mut player = ClipPlayer::new();
        assert!(player.prepare(&MediaSetting::default()).is_err());
        assert!(player.prepare(&clip(0.0)).is_err());
        assert_eq!(player.progress(), None);
    }

    #[test]
    fn test_no_progress_until_prepared() {
        let player = ClipPlayer::new();
        assert_eq!(player.playback(), Playback::Idle);
        assert_eq!(player.progress(), None);
        assert_eq!(player.current_clip(), None);
    }
}
