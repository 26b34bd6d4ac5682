use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::controls::ControlsVisibilityTimer;
use super::engine::{EngineEvent, EngineEvents, EngineSession, EngineStatus, MediaEngine, SeekId};
use super::position_observer::PeriodicPositionObserver;
use super::seek::{SeekCommand, SeekCompletion, SeekCoordinator};
use super::types::{PlaybackPhase, PlaybackSnapshot, PlaybackSpeed};
use crate::config::PlaybackConfig;
use crate::constants;
use crate::core::viewmodels::{Property, PropertySubscriber};
use crate::models::{Video, VideoId};
use crate::utils::PlaybackError;

/// Commands that can be sent to the playback controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    /// Open the engine session; ignored while one is open
    Load,
    TogglePlayPause,
    SetPlaybackSpeed(PlaybackSpeed),
    /// Seek to an absolute position in seconds
    Seek(f64),
    SkipForward,
    SkipBackward,
    /// Pause without releasing the session
    Stop,
    /// Tear the session down and load again
    Retry,
    ShowControls,
    ToggleControls,
    /// Release everything and stop the controller
    Dispose,
}

/// Messages produced inside the controller's own machinery: engine
/// callbacks and timer expiries.
#[derive(Debug)]
pub(crate) enum ControllerEvent {
    Engine { generation: u64, event: EngineEvent },
    ControlsExpired { token: u64 },
    SeekTimedOut { generation: u64, id: SeekId },
}

type Envelope = (PlayerCommand, oneshot::Sender<()>);

/// Timing knobs of a controller
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub position_interval: Duration,
    pub controls_timeout: Duration,
    /// Skip distance in seconds
    pub skip_interval: f64,
    pub seek_timeout: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            position_interval: Duration::from_millis(constants::POSITION_INTERVAL_MS),
            controls_timeout: Duration::from_secs(constants::CONTROLS_HIDE_SECS),
            skip_interval: constants::SKIP_INTERVAL_SECS,
            seek_timeout: Duration::from_millis(constants::SEEK_TIMEOUT_MS),
        }
    }
}

impl From<&PlaybackConfig> for ControllerSettings {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            position_interval: config.position_interval(),
            controls_timeout: config.controls_timeout(),
            skip_interval: config.skip_interval_secs,
            seek_timeout: config.seek_timeout(),
        }
    }
}

/// Owns the engine session and every piece of playback state for one video.
///
/// The controller runs as a single task. Commands from [`PlaybackHandle`] and
/// engine/timer events are applied one at a time on that task, each followed
/// by at most one snapshot publication.
pub struct PlaybackController {
    video: Video,
    engine: Arc<dyn MediaEngine>,
    settings: ControllerSettings,
    session: Option<Box<dyn EngineSession>>,
    generation: u64,
    load_attempts: u32,
    disposed: bool,

    snapshot: PlaybackSnapshot,
    state: Property<PlaybackSnapshot>,

    observer: PeriodicPositionObserver,
    seeks: SeekCoordinator,
    seek_timeout: Option<CancellationToken>,
    /// Seek requested before the duration was known
    deferred_seek: Option<f64>,
    controls: ControlsVisibilityTimer,

    receiver: mpsc::UnboundedReceiver<Envelope>,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
    shutdown: CancellationToken,
}

impl PlaybackController {
    pub fn new(
        video: Video,
        engine: Arc<dyn MediaEngine>,
        settings: ControllerSettings,
    ) -> (PlaybackHandle, PlaybackController) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let snapshot = PlaybackSnapshot::default();
        let state = Property::new(snapshot.clone(), format!("playback:{}", video.id));

        let handle = PlaybackHandle {
            sender,
            state: state.clone(),
            video_id: video.id.clone(),
        };
        let controller = PlaybackController {
            observer: PeriodicPositionObserver::new(settings.position_interval),
            controls: ControlsVisibilityTimer::new(
                settings.controls_timeout,
                events_tx.clone(),
                shutdown.clone(),
            ),
            video,
            engine,
            settings,
            session: None,
            generation: 0,
            load_attempts: 0,
            disposed: false,
            snapshot,
            state,
            seeks: SeekCoordinator::new(),
            seek_timeout: None,
            deferred_seek: None,
            receiver,
            events_tx,
            events_rx,
            shutdown,
        };

        (handle, controller)
    }

    /// Creates a controller and runs it on the current tokio runtime.
    pub fn spawn(
        video: Video,
        engine: Arc<dyn MediaEngine>,
        settings: ControllerSettings,
    ) -> PlaybackHandle {
        let (handle, controller) = Self::new(video, engine, settings);
        tokio::spawn(controller.run());
        handle
    }

    /// Run the controller event loop. Loads the video first.
    pub async fn run(mut self) {
        debug!(video_id = %self.video.id, "PlaybackController event loop started");

        self.load();
        self.publish();

        loop {
            tokio::select! {
                // Engine events queued ahead of a command are applied first
                biased;

                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event);
                    self.publish();
                }
                message = self.receiver.recv() => {
                    let Some((command, respond_to)) = message else {
                        debug!("All playback handles dropped");
                        self.dispose();
                        break;
                    };
                    let flow = self.handle_command(command);
                    if flow.is_continue() {
                        self.publish();
                    }
                    let _ = respond_to.send(());
                    if flow.is_break() {
                        break;
                    }
                }
            }
        }

        debug!(video_id = %self.video.id, "PlaybackController event loop terminated");
    }

    fn handle_command(&mut self, command: PlayerCommand) -> ControlFlow<()> {
        trace!("Handling {:?}", command);
        match command {
            PlayerCommand::Load => self.load(),
            PlayerCommand::TogglePlayPause => self.toggle_play_pause(),
            PlayerCommand::SetPlaybackSpeed(speed) => self.set_playback_speed(speed),
            PlayerCommand::Seek(time) => self.seek(time),
            PlayerCommand::SkipForward => self.skip(self.settings.skip_interval),
            PlayerCommand::SkipBackward => self.skip(-self.settings.skip_interval),
            PlayerCommand::Stop => self.stop(),
            PlayerCommand::Retry => self.retry(),
            PlayerCommand::ShowControls => self.controls.show(),
            PlayerCommand::ToggleControls => {
                self.controls.toggle();
            }
            PlayerCommand::Dispose => {
                self.dispose();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Engine { generation, event } => {
                if generation != self.generation {
                    debug!(
                        "Dropping {:?} from stale session {} (current {})",
                        event, generation, self.generation
                    );
                    return;
                }
                self.handle_engine_event(event);
            }
            ControllerEvent::ControlsExpired { token } => {
                self.controls.on_expired(token);
            }
            ControllerEvent::SeekTimedOut { generation, id } => {
                if generation == self.generation {
                    self.on_seek_timeout(id);
                }
            }
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Status(status) => self.on_status(status),
            EngineEvent::Position(seconds) => {
                PeriodicPositionObserver::apply_position(&mut self.snapshot, seconds);
            }
            EngineEvent::BufferedRange { start, end } => {
                PeriodicPositionObserver::apply_buffered_range(&mut self.snapshot, start, end);
            }
            EngineEvent::SeekCompleted { id, finished } => self.on_seek_completed(id, finished),
            EngineEvent::RateChanged(rate) => {
                if self.snapshot.is_ready() {
                    self.snapshot.is_playing = rate > 0.0;
                }
            }
            EngineEvent::PlaybackEnded => {
                if self.snapshot.is_ready() {
                    debug!(video_id = %self.video.id, "Reached end of media");
                    self.snapshot.is_playing = false;
                    self.controls.show();
                }
            }
        }
    }

    fn on_status(&mut self, status: EngineStatus) {
        if self.snapshot.phase == PlaybackPhase::Failed {
            debug!("Ignoring {:?} after failure", status);
            return;
        }

        match status {
            EngineStatus::Loading => trace!("Engine still loading"),
            EngineStatus::ReadyToPlay { duration } => {
                self.snapshot.duration = if duration.is_finite() {
                    duration.max(0.0)
                } else {
                    0.0
                };
                self.snapshot.current_time = self.snapshot.clamp_time(self.snapshot.current_time);
                if self.snapshot.is_ready() {
                    trace!("Duration refreshed to {:.3}s", self.snapshot.duration);
                    return;
                }

                info!(
                    video_id = %self.video.id,
                    "Ready to play ({:.1}s)", self.snapshot.duration
                );
                self.snapshot.phase = PlaybackPhase::Ready;
                self.snapshot.error_message = None;
                self.start_playback();
                self.controls.show();
                if let Some(target) = self.deferred_seek.take() {
                    debug!("Applying deferred seek to {:.3}s", target);
                    self.begin_seek(target);
                }
            }
            EngineStatus::Failed { reason } => {
                warn!(
                    video_id = %self.video.id,
                    "{}", PlaybackError::LoadFailure(reason.clone())
                );
                self.cancel_seek_timeout();
                self.seeks.reset();
                self.deferred_seek = None;
                self.snapshot.phase = PlaybackPhase::Failed;
                self.snapshot.is_playing = false;
                self.snapshot.error_message = Some(reason);
            }
        }
    }

    fn load(&mut self) {
        if self.disposed {
            return;
        }
        if self.session.is_some() {
            trace!("Session already open, load ignored");
            return;
        }

        self.generation += 1;
        self.load_attempts += 1;
        info!(
            video_id = %self.video.id,
            generation = self.generation,
            "Loading {}", self.video.media_url
        );

        let events = EngineEvents::new(self.generation, self.events_tx.clone());
        let mut session = self.engine.open(&self.video.media_url, events);
        self.observer.attach(session.as_mut());
        self.session = Some(session);
        self.snapshot.phase = PlaybackPhase::Loading;
    }

    fn toggle_play_pause(&mut self) {
        if !self.snapshot.is_ready() {
            trace!("Play/pause ignored in {:?}", self.snapshot.phase);
            return;
        }

        if self.snapshot.is_playing {
            if let Some(session) = self.session.as_deref_mut() {
                session.pause();
            }
            self.snapshot.is_playing = false;
        } else {
            self.start_playback();
        }
        self.controls.show();
    }

    fn start_playback(&mut self) {
        let speed = self.snapshot.playback_speed;
        if let Some(session) = self.session.as_deref_mut() {
            session.play();
            if speed != PlaybackSpeed::Normal {
                session.set_rate(speed.rate());
            }
        }
        self.snapshot.is_playing = true;
    }

    fn set_playback_speed(&mut self, speed: PlaybackSpeed) {
        self.snapshot.playback_speed = speed;
        if !self.snapshot.is_ready() {
            return;
        }

        if self.snapshot.is_playing
            && let Some(session) = self.session.as_deref_mut()
        {
            session.set_rate(speed.rate());
        }
        self.controls.show();
    }

    fn seek(&mut self, time: f64) {
        match self.snapshot.phase {
            PlaybackPhase::Ready => self.begin_seek(time),
            PlaybackPhase::Idle | PlaybackPhase::Loading => {
                let target = if time.is_finite() { time.max(0.0) } else { 0.0 };
                debug!("Deferring seek to {:.3}s until ready", target);
                self.deferred_seek = Some(target);
            }
            PlaybackPhase::Failed => trace!("Seek ignored after failure"),
        }
    }

    fn skip(&mut self, offset: f64) {
        match self.snapshot.phase {
            PlaybackPhase::Ready => self.begin_seek(self.snapshot.current_time + offset),
            phase => trace!("Skip ignored in {:?}", phase),
        }
    }

    fn begin_seek(&mut self, time: f64) {
        let target = self.snapshot.clamp_time(time);
        self.snapshot.current_time = target;
        if let Some(command) = self.seeks.request(target) {
            self.issue_seek(command);
        }
        self.controls.show();
    }

    fn issue_seek(&mut self, command: SeekCommand) {
        let Some(session) = self.session.as_deref_mut() else {
            return;
        };
        debug!("Issuing {} to {:.3}s", command.id, command.target);
        session.seek(command.target, command.id);
        self.arm_seek_timeout(command.id);
    }

    fn arm_seek_timeout(&mut self, id: SeekId) {
        self.cancel_seek_timeout();

        let cancel = self.shutdown.child_token();
        let task_cancel = cancel.clone();
        let events = self.events_tx.clone();
        let generation = self.generation;
        let deadline = Instant::now() + self.settings.seek_timeout;

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_cancel.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    let _ = events.send(ControllerEvent::SeekTimedOut { generation, id });
                }
            }
        });

        self.seek_timeout = Some(cancel);
    }

    fn cancel_seek_timeout(&mut self) {
        if let Some(cancel) = self.seek_timeout.take() {
            cancel.cancel();
        }
    }

    fn on_seek_completed(&mut self, id: SeekId, finished: bool) {
        if !finished {
            debug!("{} reported as interrupted", id);
        }

        match self.seeks.complete(id) {
            SeekCompletion::Settled { target } => {
                self.cancel_seek_timeout();
                debug!("Seek settled at {:.3}s", target);
            }
            SeekCompletion::Reissue(command) => self.issue_seek(command),
            SeekCompletion::Ignored => {}
        }
    }

    fn on_seek_timeout(&mut self, id: SeekId) {
        let Some(target) = self.seeks.abandon(id) else {
            trace!("Timeout for {} that is no longer in flight", id);
            return;
        };
        self.seek_timeout = None;
        let error = PlaybackError::SeekTimeout {
            target,
            waited_ms: self.settings.seek_timeout.as_millis() as u64,
        };
        warn!(video_id = %self.video.id, "{}", error);
    }

    fn stop(&mut self) {
        if self.snapshot.is_ready()
            && let Some(session) = self.session.as_deref_mut()
        {
            session.pause();
        }
        self.snapshot.is_playing = false;
    }

    fn retry(&mut self) {
        info!(
            video_id = %self.video.id,
            attempt = self.load_attempts + 1,
            "Retrying playback"
        );

        self.cancel_seek_timeout();
        self.seeks.reset();
        self.deferred_seek = None;
        if let Some(mut session) = self.session.take() {
            self.observer.detach(session.as_mut());
            self.controls.cancel();
            session.pause();
            session.release();
        }

        self.controls.reset();
        self.snapshot = PlaybackSnapshot::default();
        self.load();
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        info!(video_id = %self.video.id, "Disposing playback controller");

        let session = self.session.take();
        if let Some(mut session) = session {
            self.observer.detach(session.as_mut());
            self.controls.invalidate();
            self.cancel_seek_timeout();
            session.release();
        } else {
            self.controls.invalidate();
            self.cancel_seek_timeout();
        }
        self.shutdown.cancel();
    }

    fn publish(&mut self) {
        self.snapshot.is_seeking = self.seeks.is_seeking();
        self.snapshot.controls_visible = self.controls.is_visible();
        if self.state.set_if_changed(self.snapshot.clone()) {
            trace!("Published {:?}", self.snapshot);
        }
    }
}

/// Handle to send commands to the playback controller.
///
/// Each async method resolves once the command has been applied to the
/// snapshot; engine work started by the command completes later and shows up
/// as further snapshot changes. Calls made after the controller stopped are
/// no-ops.
#[derive(Clone)]
pub struct PlaybackHandle {
    sender: mpsc::UnboundedSender<Envelope>,
    state: Property<PlaybackSnapshot>,
    video_id: VideoId,
}

impl std::fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("video_id", &self.video_id)
            .field("running", &self.is_running())
            .finish()
    }
}

impl PlaybackHandle {
    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.state.get()
    }

    pub fn subscribe(&self) -> PropertySubscriber {
        self.state.subscribe()
    }

    pub fn snapshot_property(&self) -> &Property<PlaybackSnapshot> {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    pub async fn load(&self) {
        self.send(PlayerCommand::Load).await
    }

    pub async fn toggle_play_pause(&self) {
        self.send(PlayerCommand::TogglePlayPause).await
    }

    pub async fn set_playback_speed(&self, speed: PlaybackSpeed) {
        self.send(PlayerCommand::SetPlaybackSpeed(speed)).await
    }

    pub async fn seek(&self, time: f64) {
        self.send(PlayerCommand::Seek(time)).await
    }

    pub async fn skip_forward(&self) {
        self.send(PlayerCommand::SkipForward).await
    }

    pub async fn skip_backward(&self) {
        self.send(PlayerCommand::SkipBackward).await
    }

    pub async fn stop(&self) {
        self.send(PlayerCommand::Stop).await
    }

    pub async fn retry(&self) {
        self.send(PlayerCommand::Retry).await
    }

    pub async fn show_controls(&self) {
        self.send(PlayerCommand::ShowControls).await
    }

    pub async fn toggle_controls(&self) {
        self.send(PlayerCommand::ToggleControls).await
    }

    pub async fn dispose(&self) {
        self.send(PlayerCommand::Dispose).await
    }

    async fn send(&self, command: PlayerCommand) {
        let (respond_to, response) = oneshot::channel();
        if self.sender.send((command, respond_to)).is_err() {
            trace!("{:?} dropped: {}", command, PlaybackError::Disconnected);
            return;
        }
        if response.await.is_err() {
            trace!("{:?} not acknowledged: {}", command, PlaybackError::Disconnected);
        }
    }
}
