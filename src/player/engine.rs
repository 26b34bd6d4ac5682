use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::trace;
use url::Url;

use super::controller::ControllerEvent;

/// Load status of the item an engine session was opened with.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineStatus {
    Loading,
    ReadyToPlay { duration: f64 },
    Failed { reason: String },
}

/// Identifies one engine-level seek so its completion can be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeekId(pub u64);

impl fmt::Display for SeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seek#{}", self.0)
    }
}

/// Handle returned by [`EngineSession::add_periodic_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(pub u64);

/// Everything an engine reports back about a session.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Status(EngineStatus),
    /// Periodic position sample, in seconds.
    Position(f64),
    /// Buffered range of the media, in seconds.
    BufferedRange { start: f64, end: f64 },
    /// Fires exactly once per [`EngineSession::seek`] call. `finished` is false
    /// when the engine interrupted or could not complete the seek.
    SeekCompleted { id: SeekId, finished: bool },
    RateChanged(f32),
    PlaybackEnded,
}

/// Callback sink handed to the engine when a session is opened.
///
/// Engines may call it from any thread. Each event is stamped with the
/// session generation and queued onto the controller task, which is the
/// only place snapshot state is mutated.
#[derive(Clone)]
pub struct EngineEvents {
    generation: u64,
    sender: mpsc::UnboundedSender<ControllerEvent>,
}

impl fmt::Debug for EngineEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineEvents")
            .field("generation", &self.generation)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl EngineEvents {
    pub(crate) fn new(generation: u64, sender: mpsc::UnboundedSender<ControllerEvent>) -> Self {
        Self { generation, sender }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once the controller stopped listening; engines can stop emitting.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub fn emit(&self, event: EngineEvent) {
        let delivered = self
            .sender
            .send(ControllerEvent::Engine {
                generation: self.generation,
                event,
            })
            .is_ok();
        if !delivered {
            trace!("Engine event dropped, controller is gone");
        }
    }

    pub fn status(&self, status: EngineStatus) {
        self.emit(EngineEvent::Status(status));
    }

    pub fn position(&self, seconds: f64) {
        self.emit(EngineEvent::Position(seconds));
    }

    pub fn buffered_range(&self, start: f64, end: f64) {
        self.emit(EngineEvent::BufferedRange { start, end });
    }

    pub fn seek_completed(&self, id: SeekId, finished: bool) {
        self.emit(EngineEvent::SeekCompleted { id, finished });
    }

    pub fn rate_changed(&self, rate: f32) {
        self.emit(EngineEvent::RateChanged(rate));
    }

    pub fn playback_ended(&self) {
        self.emit(EngineEvent::PlaybackEnded);
    }
}

/// Factory for media sessions. Opening never fails synchronously: a resource
/// that cannot be played reports `EngineStatus::Failed` through the sink.
pub trait MediaEngine: Send + Sync {
    fn open(&self, url: &Url, events: EngineEvents) -> Box<dyn EngineSession>;
}

/// One opened media resource. All calls are fire-and-forget; results come
/// back through the [`EngineEvents`] sink given to [`MediaEngine::open`].
pub trait EngineSession: Send {
    /// Starts emitting [`EngineEvent::Position`] every `interval`.
    fn add_periodic_observer(&mut self, interval: Duration) -> ObserverToken;
    fn remove_periodic_observer(&mut self, token: ObserverToken);
    /// Resumes playback at the default rate.
    fn play(&mut self);
    fn pause(&mut self);
    fn set_rate(&mut self, rate: f32);
    /// Moves the playhead to `to` seconds; completion is reported with `id`.
    fn seek(&mut self, to: f64, id: SeekId);
    /// Releases every engine resource. Safe to call after `pause`.
    fn release(&mut self);
}
