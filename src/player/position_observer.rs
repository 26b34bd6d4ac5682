use std::time::Duration;
use tracing::{debug, trace};

use super::engine::{EngineSession, ObserverToken};
use super::types::{PlaybackPhase, PlaybackSnapshot};

/// Forwards engine position and buffering samples into the snapshot.
///
/// Position samples are dropped while a seek is in flight so a late sample
/// cannot pull the progress indicator back to the pre-seek position.
#[derive(Debug)]
pub struct PeriodicPositionObserver {
    interval: Duration,
    token: Option<ObserverToken>,
}

impl PeriodicPositionObserver {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            token: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_attached(&self) -> bool {
        self.token.is_some()
    }

    /// Subscribes to the session's position stream. A second call while
    /// attached does nothing.
    pub fn attach(&mut self, session: &mut dyn EngineSession) {
        if self.token.is_some() {
            return;
        }
        let token = session.add_periodic_observer(self.interval);
        debug!("Position observer attached every {:?}", self.interval);
        self.token = Some(token);
    }

    pub fn detach(&mut self, session: &mut dyn EngineSession) {
        if let Some(token) = self.token.take() {
            session.remove_periodic_observer(token);
            debug!("Position observer detached");
        }
    }

    /// Applies a position sample. Returns whether `current_time` changed.
    pub fn apply_position(snapshot: &mut PlaybackSnapshot, sample: f64) -> bool {
        if snapshot.phase != PlaybackPhase::Ready {
            trace!("Ignoring position sample {:.3}s outside Ready", sample);
            return false;
        }
        if snapshot.is_seeking {
            trace!("Ignoring position sample {:.3}s during seek", sample);
            return false;
        }
        let position = snapshot.clamp_time(sample);
        if position == snapshot.current_time {
            return false;
        }
        snapshot.current_time = position;
        true
    }

    /// Applies a buffered-range update. Returns whether the fraction changed.
    pub fn apply_buffered_range(snapshot: &mut PlaybackSnapshot, _start: f64, end: f64) -> bool {
        let fraction = buffered_fraction(end, snapshot.duration);
        if fraction == snapshot.buffered_fraction {
            return false;
        }
        snapshot.buffered_fraction = fraction;
        true
    }
}

/// `buffered_end / duration` clamped to `[0, 1]`; zero while the duration
/// is unknown.
pub fn buffered_fraction(buffered_end: f64, duration: f64) -> f64 {
    if duration.is_nan() || duration <= 0.0 || !buffered_end.is_finite() {
        return 0.0;
    }
    (buffered_end / duration).clamp(0.0, 1.0)
}
