use tracing::{debug, trace};

use super::engine::SeekId;

/// An engine-level seek the caller must issue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekCommand {
    pub id: SeekId,
    pub target: f64,
}

/// Result of feeding an engine completion back into the coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekCompletion {
    /// The engine reached the latest requested position; seeking is over.
    Settled { target: f64 },
    /// A newer target arrived while the engine was busy; issue it next.
    Reissue(SeekCommand),
    /// Completion for a seek that is no longer tracked (abandoned or stale).
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct InFlightSeek {
    id: SeekId,
    target: f64,
}

/// Coalesces rapid seek requests so at most one seek is outstanding against
/// the engine. Requests that arrive while a seek is in flight only replace
/// the pending target; the engine is sent straight to the latest one once
/// the in-flight seek completes.
#[derive(Debug, Default)]
pub struct SeekCoordinator {
    next_id: u64,
    in_flight: Option<InFlightSeek>,
    pending: Option<f64>,
}

impl SeekCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_seeking(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight_id(&self) -> Option<SeekId> {
        self.in_flight.map(|seek| seek.id)
    }

    /// Latest target not yet handed to the engine.
    pub fn pending_target(&self) -> Option<f64> {
        self.pending
    }

    /// Registers a request. Returns the seek to issue, or `None` when the
    /// request was folded into the pending target.
    pub fn request(&mut self, target: f64) -> Option<SeekCommand> {
        if let Some(in_flight) = self.in_flight {
            trace!(
                "Seek to {:.3}s queued behind {} ({:.3}s)",
                target, in_flight.id, in_flight.target
            );
            self.pending = Some(target);
            return None;
        }
        Some(self.issue(target))
    }

    pub fn complete(&mut self, id: SeekId) -> SeekCompletion {
        let Some(in_flight) = self.in_flight.filter(|seek| seek.id == id) else {
            debug!("Completion for untracked {}", id);
            return SeekCompletion::Ignored;
        };
        self.in_flight = None;

        match self.pending.take() {
            Some(target) if target != in_flight.target => SeekCompletion::Reissue(self.issue(target)),
            _ => SeekCompletion::Settled {
                target: in_flight.target,
            },
        }
    }

    /// Gives up on the in-flight seek `id` along with any pending target.
    /// Returns the abandoned target, or `None` when `id` is not in flight.
    pub fn abandon(&mut self, id: SeekId) -> Option<f64> {
        let in_flight = self.in_flight.filter(|seek| seek.id == id)?;
        self.in_flight = None;
        self.pending = None;
        Some(in_flight.target)
    }

    /// Forgets all seek state. Ids keep increasing so completions from a
    /// previous session can never match a new seek.
    pub fn reset(&mut self) {
        self.in_flight = None;
        self.pending = None;
    }

    fn issue(&mut self, target: f64) -> SeekCommand {
        self.next_id += 1;
        let id = SeekId(self.next_id);
        self.in_flight = Some(InFlightSeek { id, target });
        SeekCommand { id, target }
    }
}
