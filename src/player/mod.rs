pub mod controller;
pub mod controls;
pub mod engine;
pub mod position_observer;
pub mod seek;
pub mod simulated;
pub mod types;

pub use controller::{ControllerSettings, PlaybackController, PlaybackHandle, PlayerCommand};
pub use controls::ControlsVisibilityTimer;
pub use engine::{
    EngineEvent, EngineEvents, EngineSession, EngineStatus, MediaEngine, ObserverToken, SeekId,
};
pub use position_observer::{PeriodicPositionObserver, buffered_fraction};
pub use seek::{SeekCommand, SeekCompletion, SeekCoordinator};
pub use simulated::{SimulatedEngine, SimulatedMedia};
pub use types::{PlaybackPhase, PlaybackSnapshot, PlaybackSpeed};
