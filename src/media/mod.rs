mod clip;

pub use clip::ClipPlayer;

use thiserror::Error;

use crate::config::MediaSetting;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to prepare clip '{name}': {reason}")]
    Prepare { name: String, reason: String },
}

/// Coarse playback state, polled once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Nothing prepared or playback stopped.
    Idle,
    Playing,
    /// Reached the natural end of the clip. Stays `Finished` until the
    /// next prepare or stop; callers track their own edges.
    Finished,
}

/// Opaque clip-playback capability consumed by the stage layer.
///
/// Decode and presentation live behind this seam. There are no completion
/// callbacks: the sequence logic polls `playback()` each frame and races it
/// against visitor input, so nothing can fire across a stage boundary.
pub trait MediaPlayer {
    /// Load a clip and leave it paused at the start.
    fn prepare(&mut self, clip: &MediaSetting) -> Result<(), MediaError>;

    fn play(&mut self);

    fn stop(&mut self);

    /// Advance playback by one frame.
    fn tick(&mut self, dt: f32);

    fn playback(&self) -> Playback;

    /// Fractional progress in [0,1]; `None` until a clip is prepared.
    fn progress(&self) -> Option<f32>;
}
