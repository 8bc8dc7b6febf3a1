//! Phase-sequenced clip progression.
//!
//! Plays an ordered list of clips. Once a clip passes the skip threshold a
//! prompt is revealed and two terminating conditions race: natural end of
//! the clip against fresh visitor input. Whichever fires first advances the
//! sequence exactly once; the advance runs fade-to-cutaway → source swap →
//! fade-back so no raw clip transition is ever visible.

use tracing::warn;

use super::StageContext;
use crate::config::MediaSetting;
use crate::fade::FadeTicket;
use crate::media::{MediaPlayer, Playback};

/// Progress fraction at which the skip prompt is revealed.
const SKIP_THRESHOLD: f32 = 0.5;

/// Notable sequence moments surfaced to the owning stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqEvent {
    /// The skip prompt became visible for the current clip.
    PromptShown,
    /// Playback of clip `i` started after a swap.
    ItemStarted(usize),
    /// The last clip ended (naturally or skipped).
    Completed,
}

#[derive(Debug)]
enum SeqPhase {
    /// Current clip is playing; `armed_ms` is set once the skip prompt is
    /// visible and holds the instant from which presses count.
    Playing { armed_ms: Option<u64> },
    /// Cutaway fade covering the swap.
    CoverOut(FadeTicket),
    /// Overlays opaque; swap the clip source this frame.
    Swap,
    /// Fade back in on the freshly started clip.
    Reveal(FadeTicket),
    Complete,
    /// A swap failed to prepare its clip; the sequence cannot proceed but
    /// input stays usable.
    Faulted,
}

pub struct MediaSequence {
    items: Vec<MediaSetting>,
    index: usize,
    phase: SeqPhase,
    /// Clips before this index play to their natural end with no prompt.
    first_skippable: usize,
    /// Displays covered while swapping sources.
    cutaway: Vec<usize>,
    /// Displays revealed after a swap.
    reveal: Vec<usize>,
}

impl MediaSequence {
    pub fn new(items: Vec<MediaSetting>, cutaway: Vec<usize>, reveal: Vec<usize>) -> Self {
        Self {
            items,
            index: 0,
            phase: SeqPhase::Playing { armed_ms: None },
            first_skippable: 0,
            cutaway,
            reveal,
        }
    }

    /// Make the first `count` clips unskippable (e.g. an intro clip).
    pub fn with_unskippable_prefix(mut self, count: usize) -> Self {
        self.first_skippable = count;
        self
    }

    /// Prepare and start the first clip. The owning stage provides the
    /// entry fade; the sequence only manages swaps between items.
    pub fn start(&mut self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        let first = self
            .items
            .first()
            .ok_or_else(|| anyhow::anyhow!("media sequence has no clips"))?;
        ctx.player.prepare(first)?;
        ctx.player.play();
        self.phase = SeqPhase::Playing { armed_ms: None };
        self.index = 0;
        Ok(())
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn prompt_visible(&self) -> bool {
        matches!(self.phase, SeqPhase::Playing { armed_ms: Some(_) })
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, SeqPhase::Complete)
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self.phase, SeqPhase::Faulted)
    }

    /// One frame of sequence logic. Call every frame while the stage runs;
    /// a cancelled stage token makes this a no-op.
    pub fn tick(&mut self, ctx: &mut StageContext<'_>) -> Option<SeqEvent> {
        if ctx.token.is_cancelled() {
            return None;
        }

        match &self.phase {
            SeqPhase::Playing { armed_ms } => {
                let armed_ms = *armed_ms;

                // Reveal the prompt once the threshold is crossed.
                if armed_ms.is_none()
                    && self.index >= self.first_skippable
                    && ctx.player.progress().unwrap_or(0.0) >= SKIP_THRESHOLD
                {
                    let now = ctx.bridge.now_ms();
                    // Re-arm the latch so input that arrived while the
                    // prompt was hidden cannot satisfy the race.
                    ctx.gate.reset_latch();
                    self.phase = SeqPhase::Playing { armed_ms: Some(now) };
                    return Some(SeqEvent::PromptShown);
                }

                // Race: fresh visitor input against natural end of clip.
                // Checked in one place per frame, so the decision to
                // advance is made at most once per clip.
                let skipped = match armed_ms {
                    Some(since) => {
                        (ctx.gate.is_enabled()
                            && ctx.bridge.try_consume_press_newer_than(since).is_some())
                            || ctx.try_consume_single_input()
                    }
                    None => false,
                };

                if skipped || ctx.player.playback() == Playback::Finished {
                    return self.advance(ctx);
                }
                None
            }
            SeqPhase::CoverOut(ticket) => {
                if ctx.fade.is_complete(*ticket) {
                    ctx.player.stop();
                    self.phase = SeqPhase::Swap;
                }
                None
            }
            SeqPhase::Swap => {
                let next = self.index + 1;
                match ctx.player.prepare(&self.items[next]) {
                    Ok(()) => {
                        ctx.player.play();
                        self.index = next;
                        let ticket = ctx.fade_in(&self.reveal);
                        self.phase = SeqPhase::Reveal(ticket);
                        Some(SeqEvent::ItemStarted(next))
                    }
                    Err(e) => {
                        warn!("clip swap failed: {}", e);
                        // Uncover the screen so the visitor is not stuck
                        // behind the cutaway; the sequence itself is done.
                        ctx.fade_in(&self.reveal);
                        self.phase = SeqPhase::Faulted;
                        None
                    }
                }
            }
            SeqPhase::Reveal(ticket) => {
                if ctx.fade.is_complete(*ticket) {
                    // Presses buffered during the swap are stale.
                    ctx.flush_and_rearm();
                    self.phase = SeqPhase::Playing { armed_ms: None };
                }
                None
            }
            SeqPhase::Complete | SeqPhase::Faulted => None,
        }
    }

    fn advance(&mut self, ctx: &mut StageContext<'_>) -> Option<SeqEvent> {
        if self.index + 1 >= self.items.len() {
            ctx.player.stop();
            self.phase = SeqPhase::Complete;
            return Some(SeqEvent::Completed);
        }
        let ticket = ctx.fade_out(&self.cutaway);
        self.phase = SeqPhase::CoverOut(ticket);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FrameInput;
    use crate::media::{MediaPlayer, Playback};
    use crate::test_utils::harness::ServiceRig as Rig;

    trait RigStep {
        fn step(&mut self, seq: &mut MediaSequence, frame: FrameInput, dt: f32)
        -> Option<SeqEvent>;
    }

    impl RigStep for Rig {
        /// One frame: advance player, sequence, fades.
        fn step(
            &mut self,
            seq: &mut MediaSequence,
            frame: FrameInput,
            dt: f32,
        ) -> Option<SeqEvent> {
            self.player.tick(dt);
            let mut ctx = self.ctx(frame, dt);
            let event = seq.tick(&mut ctx);
            self.fade.tick(dt);
            event
        }
    }

    fn clips(n: usize, secs: f32) -> Vec<MediaSetting> {
        (0..n)
            .map(|i| MediaSetting {
                file_name: format!("clip{}.mp4", i),
                duration_secs: secs,
                ..MediaSetting::default()
            })
            .collect()
    }

    fn started_sequence(rig: &mut Rig, n: usize, secs: f32) -> MediaSequence {
        let mut seq = MediaSequence::new(clips(n, secs), vec![0], vec![0, 2]);
        let mut ctx = rig.ctx(FrameInput::default(), 0.0);
        seq.start(&mut ctx).unwrap();
        seq
    }

    /// Run quiet frames until the sequence is playing again (or give up).
    fn settle(rig: &mut Rig, seq: &mut MediaSequence) {
        for _ in 0..50 {
            rig.step(seq, FrameInput::default(), 0.05);
            if matches!(seq.phase, SeqPhase::Playing { .. }) {
                return;
            }
        }
        panic!("sequence never settled back into playback");
    }

    #[test]
    fn test_prompt_revealed_at_threshold() {
        let mut rig = Rig::new();
        let mut seq = started_sequence(&mut rig, 2, 10.0);

        assert!(rig.step(&mut seq, FrameInput::default(), 4.0).is_none());
        assert!(!seq.prompt_visible());

        let event = rig.step(&mut seq, FrameInput::default(), 1.5);
        assert_eq!(event, Some(SeqEvent::PromptShown));
        assert!(seq.prompt_visible());
    }

    #[test]
    fn test_input_before_prompt_does_not_skip() {
        let mut rig = Rig::new();
        let mut seq = started_sequence(&mut rig, 2, 10.0);

        // Mash input well before the threshold: nothing advances.
        for _ in 0..5 {
            assert!(rig.step(&mut seq, FrameInput::any(), 0.2).is_none());
        }
        assert_eq!(seq.current_index(), 0);
    }

    #[test]
    fn test_skip_advances_to_next_item() {
        let mut rig = Rig::new();
        let mut seq = started_sequence(&mut rig, 3, 10.0);

        // Cross the threshold, see the prompt.
        rig.step(&mut seq, FrameInput::default(), 6.0);
        assert!(seq.prompt_visible());

        // Fresh input starts the cutaway.
        rig.step(&mut seq, FrameInput::any(), 0.016);
        settle(&mut rig, &mut seq);
        assert_eq!(seq.current_index(), 1);
        assert!(!seq.prompt_visible());
    }

    #[test]
    fn test_natural_end_advances_without_input() {
        let mut rig = Rig::new();
        let mut seq = started_sequence(&mut rig, 2, 1.0);

        // Play clip 0 to its end with no input at all.
        let mut saw_start = false;
        for _ in 0..60 {
            if rig.step(&mut seq, FrameInput::default(), 0.1) == Some(SeqEvent::ItemStarted(1)) {
                saw_start = true;
                break;
            }
        }
        assert!(saw_start);
        assert_eq!(seq.current_index(), 1);
    }

    #[test]
    fn test_simultaneous_skip_and_end_advance_once() {
        let mut rig = Rig::new();
        let mut seq = started_sequence(&mut rig, 3, 1.0);

        // Arm the prompt.
        rig.step(&mut seq, FrameInput::default(), 0.6);
        assert!(seq.prompt_visible());

        // This frame both finishes the clip (progress 1.0) and carries
        // visitor input: exactly one advance may result.
        rig.player.tick(1.0);
        assert_eq!(rig.player.playback(), Playback::Finished);
        let mut ctx = rig.ctx(FrameInput::any(), 0.016);
        seq.tick(&mut ctx);

        // Ticking further frames (clip still reports Finished) must not
        // schedule a second advance.
        settle(&mut rig, &mut seq);
        assert_eq!(seq.current_index(), 1);
        for _ in 0..3 {
            rig.step(&mut seq, FrameInput::default(), 0.016);
        }
        assert_eq!(seq.current_index(), 1);
    }

    #[test]
    fn test_last_item_completes_sequence() {
        let mut rig = Rig::new();
        let mut seq = started_sequence(&mut rig, 1, 1.0);

        let mut completed = false;
        for _ in 0..30 {
            if rig.step(&mut seq, FrameInput::default(), 0.1) == Some(SeqEvent::Completed) {
                completed = true;
                break;
            }
        }
        assert!(completed);
        assert!(seq.is_complete());
        assert_eq!(rig.player.playback(), Playback::Idle);
    }

    #[test]
    fn test_unskippable_prefix_never_prompts() {
        let mut rig = Rig::new();
        let mut seq = MediaSequence::new(clips(2, 1.0), vec![0], vec![0]).with_unskippable_prefix(1);
        let mut ctx = rig.ctx(FrameInput::default(), 0.0);
        seq.start(&mut ctx).unwrap();

        // Intro clip: no prompt even at 90%, input ignored.
        rig.step(&mut seq, FrameInput::default(), 0.9);
        assert!(!seq.prompt_visible());
        rig.step(&mut seq, FrameInput::any(), 0.016);
        assert_eq!(seq.current_index(), 0);

        // It still advances at its natural end.
        let mut started = false;
        for _ in 0..40 {
            if rig.step(&mut seq, FrameInput::default(), 0.1) == Some(SeqEvent::ItemStarted(1)) {
                started = true;
                break;
            }
        }
        assert!(started);
        // The follow-up clip prompts normally once past the threshold.
        let mut prompted = false;
        for _ in 0..10 {
            if rig.step(&mut seq, FrameInput::default(), 0.1) == Some(SeqEvent::PromptShown) {
                prompted = true;
                break;
            }
        }
        assert!(prompted);
    }

    #[test]
    fn test_bad_clip_faults_and_uncovers() {
        let mut rig = Rig::new();
        let mut bad = clips(2, 10.0);
        bad[1].duration_secs = 0.0;
        let mut seq = MediaSequence::new(bad, vec![0], vec![0]);
        let mut ctx = rig.ctx(FrameInput::default(), 0.0);
        seq.start(&mut ctx).unwrap();

        // Skip into the broken second clip.
        rig.step(&mut seq, FrameInput::default(), 6.0);
        rig.step(&mut seq, FrameInput::any(), 0.016);
        for _ in 0..50 {
            rig.step(&mut seq, FrameInput::default(), 0.05);
            if seq.is_faulted() {
                break;
            }
        }
        assert!(seq.is_faulted());
        // The reveal fade ran, so the visitor is not left behind black.
        for _ in 0..10 {
            rig.step(&mut seq, FrameInput::default(), 0.05);
        }
        assert_eq!(rig.fade.alpha(0), 0.0);
    }

    #[test]
    fn test_cancelled_token_stops_sequence() {
        let mut rig = Rig::new();
        let mut seq = started_sequence(&mut rig, 2, 1.0);

        rig.token.cancel();
        for _ in 0..30 {
            assert!(rig.step(&mut seq, FrameInput::any(), 0.1).is_none());
        }
        assert_eq!(seq.current_index(), 0);
    }

    #[test]
    fn test_empty_sequence_fails_to_start() {
        let mut rig = Rig::new();
        let mut seq = MediaSequence::new(Vec::new(), vec![0], vec![0]);
        let mut ctx = rig.ctx(FrameInput::default(), 0.0);
        assert!(seq.start(&mut ctx).is_err());
    }
}
