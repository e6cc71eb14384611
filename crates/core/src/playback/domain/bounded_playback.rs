use thiserror::Error;

use crate::timeline::domain::segment_list::SegmentList;

use super::audio_player::AudioPlayer;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("cannot play range [{start}, {end}]: end must be after start")]
    InvalidRange { start: f64, end: f64 },
    #[error("segment {index} does not exist")]
    UnknownSegment { index: usize },
    #[error("audio unavailable for this job")]
    AudioUnavailable,
}

/// Stop-condition monitor. At most one bounded play is armed per player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Idle,
    Playing { end: f64 },
}

/// Result of feeding one playhead tick through the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub active: Option<usize>,
    /// The armed bounded play reached its end and the player was paused.
    pub stopped: bool,
}

/// Plays exactly one segment's audio and stops at its end.
///
/// Driven by a single tick source ([`on_time_update`]); arming a new range,
/// pausing, seeking or shutting down all disarm the previous monitor first.
///
/// [`on_time_update`]: BoundedPlayback::on_time_update
pub struct BoundedPlayback {
    player: Box<dyn AudioPlayer>,
    state: PlaybackState,
    active: Option<usize>,
}

impl BoundedPlayback {
    pub fn new(player: Box<dyn AudioPlayer>) -> Self {
        Self {
            player,
            state: PlaybackState::Idle,
            active: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn active_segment(&self) -> Option<usize> {
        self.active
    }

    pub fn current_time(&self) -> f64 {
        self.player.current_time()
    }

    /// Seeks to `start`, plays, and arms a stop at `end`.
    pub fn play_range(&mut self, start: f64, end: f64) -> Result<(), PlaybackError> {
        if !start.is_finite() || !end.is_finite() || end <= start {
            return Err(PlaybackError::InvalidRange { start, end });
        }
        self.disarm();
        self.player.seek(start);
        self.player.play();
        self.state = PlaybackState::Playing { end };
        log::debug!("bounded play armed: [{start:.3}, {end:.3})");
        Ok(())
    }

    pub fn play_segment(&mut self, segments: &SegmentList, index: usize) -> Result<(), PlaybackError> {
        let segment = segments
            .get(index)
            .ok_or(PlaybackError::UnknownSegment { index })?;
        self.play_range(segment.start, segment.end)
    }

    /// Handles a playhead update: refreshes the active segment and fires the
    /// stop condition when the armed end is reached.
    pub fn on_time_update(&mut self, time: f64, segments: &SegmentList) -> Tick {
        self.active = segments.segment_at(time);

        let mut stopped = false;
        if let PlaybackState::Playing { end } = self.state {
            if time >= end {
                self.player.pause();
                self.state = PlaybackState::Idle;
                stopped = true;
                log::debug!("bounded play reached {end:.3}, paused");
            }
        }

        Tick {
            active: self.active,
            stopped,
        }
    }

    /// Unbounded playback from the current position.
    pub fn play(&mut self) {
        self.disarm();
        self.player.play();
    }

    pub fn pause(&mut self) {
        self.disarm();
        self.player.pause();
    }

    pub fn seek(&mut self, seconds: f64) {
        self.disarm();
        self.player.seek(seconds);
    }

    /// Drops the active indicator, e.g. after the timeline was replaced.
    pub fn clear_active(&mut self) {
        self.active = None;
    }

    /// Disarms the monitor and pauses if a bounded play was running.
    pub fn shutdown(&mut self) {
        if matches!(self.state, PlaybackState::Playing { .. }) {
            self.player.pause();
        }
        self.disarm();
        self.active = None;
    }

    fn disarm(&mut self) {
        if let PlaybackState::Playing { end } = self.state {
            log::debug!("bounded play to {end:.3} cancelled");
        }
        self.state = PlaybackState::Idle;
    }
}

impl Drop for BoundedPlayback {
    fn drop(&mut self) {
        self.shutdown();
    }
}
