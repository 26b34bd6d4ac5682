/// Types shared by the playback controller and its observers
use std::fmt;

/// Coarse lifecycle of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// The discrete playback rates offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackSpeed {
    Half,
    ThreeQuarters,
    #[default]
    Normal,
    OneAndQuarter,
    OneAndHalf,
    Double,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 6] = [
        PlaybackSpeed::Half,
        PlaybackSpeed::ThreeQuarters,
        PlaybackSpeed::Normal,
        PlaybackSpeed::OneAndQuarter,
        PlaybackSpeed::OneAndHalf,
        PlaybackSpeed::Double,
    ];

    pub fn rate(&self) -> f32 {
        match self {
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::ThreeQuarters => 0.75,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::OneAndQuarter => 1.25,
            PlaybackSpeed::OneAndHalf => 1.5,
            PlaybackSpeed::Double => 2.0,
        }
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.rate())
    }
}

/// Everything the view layer renders for one player. Published as a single
/// value, so a reader never observes a partially applied change.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    pub is_playing: bool,
    /// Seconds, never negative and never past `duration` once it is known.
    pub current_time: f64,
    /// Seconds; zero until the engine reports the item ready.
    pub duration: f64,
    /// Share of the media already buffered, in `[0, 1]`.
    pub buffered_fraction: f64,
    pub playback_speed: PlaybackSpeed,
    pub is_seeking: bool,
    pub controls_visible: bool,
    /// Present only while `phase` is `Failed`.
    pub error_message: Option<String>,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            buffered_fraction: 0.0,
            playback_speed: PlaybackSpeed::Normal,
            is_seeking: false,
            controls_visible: true,
            error_message: None,
        }
    }
}

impl PlaybackSnapshot {
    pub fn is_ready(&self) -> bool {
        self.phase == PlaybackPhase::Ready
    }

    pub fn has_duration(&self) -> bool {
        self.duration > 0.0
    }

    /// Clamps a target position to the playable range. The upper bound only
    /// applies once a duration is known.
    pub fn clamp_time(&self, time: f64) -> f64 {
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        if self.has_duration() {
            time.min(self.duration)
        } else {
            time
        }
    }

    /// Playback progress in `[0, 1]` for progress bars.
    pub fn progress(&self) -> f64 {
        if self.has_duration() {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
