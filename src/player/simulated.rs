use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};
use url::Url;

use super::engine::{EngineEvents, EngineSession, EngineStatus, MediaEngine, ObserverToken, SeekId};
use crate::models::Video;

const DEFAULT_LOAD_LATENCY: Duration = Duration::from_millis(300);
const DEFAULT_SEEK_LATENCY: Duration = Duration::from_millis(150);
const DEFAULT_TICK: Duration = Duration::from_millis(100);
/// Seconds of media fetched per wall-clock second
const DEFAULT_BUFFER_RATE: f64 = 8.0;

/// What the simulated engine finds behind a URL
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedMedia {
    Playable { duration: f64 },
    Broken { reason: String },
}

/// In-process media engine with a virtual playhead.
///
/// Every session runs on its own tokio task: it reports `ReadyToPlay` (or
/// `Failed`) after the load latency, then advances the playhead by
/// `elapsed * rate` on each tick, grows the buffered range, delivers periodic
/// position samples and completes seeks after the seek latency. Driving it
/// with a paused tokio clock makes it fully deterministic.
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    media: HashMap<Url, SimulatedMedia>,
    load_latency: Duration,
    seek_latency: Duration,
    tick: Duration,
    buffer_rate: f64,
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self {
            media: HashMap::new(),
            load_latency: DEFAULT_LOAD_LATENCY,
            seek_latency: DEFAULT_SEEK_LATENCY,
            tick: DEFAULT_TICK,
            buffer_rate: DEFAULT_BUFFER_RATE,
        }
    }
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every catalog video becomes playable with its advertised duration.
    pub fn from_videos(videos: &[Video]) -> Self {
        videos.iter().fold(Self::new(), |engine, video| {
            engine.with_media(
                video.media_url.clone(),
                SimulatedMedia::Playable {
                    duration: video.duration,
                },
            )
        })
    }

    pub fn with_media(mut self, url: Url, media: SimulatedMedia) -> Self {
        self.media.insert(url, media);
        self
    }

    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    pub fn with_seek_latency(mut self, latency: Duration) -> Self {
        self.seek_latency = latency;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    fn lookup(&self, url: &Url) -> SimulatedMedia {
        self.media
            .get(url)
            .cloned()
            .unwrap_or_else(|| SimulatedMedia::Broken {
                reason: format!("The requested URL was not found on this server: {}", url),
            })
    }
}

impl MediaEngine for SimulatedEngine {
    fn open(&self, url: &Url, events: EngineEvents) -> Box<dyn EngineSession> {
        let media = self.lookup(url);
        debug!(generation = events.generation(), "Simulated open of {} as {:?}", url, media);

        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let task = SessionTask {
            media,
            events,
            ops: ops_rx,
            ready_at: Instant::now() + self.load_latency,
            seek_latency: self.seek_latency,
            tick: self.tick,
            buffer_rate: self.buffer_rate,
        };
        tokio::spawn(task.run());

        Box::new(SimulatedSession {
            ops: ops_tx,
            next_observer: 0,
        })
    }
}

#[derive(Debug)]
enum SessionOp {
    AddObserver { token: ObserverToken, interval: Duration },
    RemoveObserver(ObserverToken),
    Play,
    Pause,
    SetRate(f32),
    Seek { to: f64, id: SeekId },
    Release,
}

struct SimulatedSession {
    ops: mpsc::UnboundedSender<SessionOp>,
    next_observer: u64,
}

impl SimulatedSession {
    fn send(&self, op: SessionOp) {
        if self.ops.send(op).is_err() {
            trace!("Simulated session task already finished");
        }
    }
}

impl EngineSession for SimulatedSession {
    fn add_periodic_observer(&mut self, interval: Duration) -> ObserverToken {
        self.next_observer += 1;
        let token = ObserverToken(self.next_observer);
        self.send(SessionOp::AddObserver { token, interval });
        token
    }

    fn remove_periodic_observer(&mut self, token: ObserverToken) {
        self.send(SessionOp::RemoveObserver(token));
    }

    fn play(&mut self) {
        self.send(SessionOp::Play);
    }

    fn pause(&mut self) {
        self.send(SessionOp::Pause);
    }

    fn set_rate(&mut self, rate: f32) {
        self.send(SessionOp::SetRate(rate));
    }

    fn seek(&mut self, to: f64, id: SeekId) {
        self.send(SessionOp::Seek { to, id });
    }

    fn release(&mut self) {
        self.send(SessionOp::Release);
    }
}

struct SessionTask {
    media: SimulatedMedia,
    events: EngineEvents,
    ops: mpsc::UnboundedReceiver<SessionOp>,
    ready_at: Instant,
    seek_latency: Duration,
    tick: Duration,
    buffer_rate: f64,
}

impl SessionTask {
    async fn run(mut self) {
        self.events.status(EngineStatus::Loading);

        let duration = match &self.media {
            SimulatedMedia::Playable { duration } => *duration,
            SimulatedMedia::Broken { .. } => 0.0,
        };
        let mut playhead = Playhead::new(duration, self.seek_latency, Instant::now());

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(self.ready_at) => break,
                op = self.ops.recv() => match op {
                    None | Some(SessionOp::Release) => {
                        trace!("Simulated session released while loading");
                        return;
                    }
                    Some(op) => playhead.apply(op, &self.events, Instant::now()),
                },
            }
        }

        if let SimulatedMedia::Broken { reason } = &self.media {
            self.events.status(EngineStatus::Failed {
                reason: reason.clone(),
            });
            // Stay around until the owner lets go
            while let Some(op) = self.ops.recv().await {
                if matches!(op, SessionOp::Release) {
                    break;
                }
            }
            return;
        }

        self.events.status(EngineStatus::ReadyToPlay { duration });
        playhead.start_clock(Instant::now());

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                op = self.ops.recv() => match op {
                    None | Some(SessionOp::Release) => break,
                    Some(op) => playhead.apply(op, &self.events, Instant::now()),
                },
                _ = ticker.tick() => {
                    if self.events.is_closed() {
                        break;
                    }
                    playhead.tick(Instant::now(), self.buffer_rate, &self.events);
                }
            }
        }

        trace!(generation = self.events.generation(), "Simulated session finished");
    }
}

#[derive(Debug)]
struct PendingSeek {
    to: f64,
    id: SeekId,
    due: Instant,
}

#[derive(Debug)]
struct Observer {
    interval: Duration,
    next_due: Instant,
}

/// The virtual media clock of one session
#[derive(Debug)]
struct Playhead {
    duration: f64,
    position: f64,
    rate: f32,
    buffered_end: f64,
    seek_latency: Duration,
    seek: Option<PendingSeek>,
    observers: HashMap<ObserverToken, Observer>,
    last_tick: Instant,
}

impl Playhead {
    fn new(duration: f64, seek_latency: Duration, now: Instant) -> Self {
        Self {
            duration,
            position: 0.0,
            rate: 0.0,
            buffered_end: 0.0,
            seek_latency,
            seek: None,
            observers: HashMap::new(),
            last_tick: now,
        }
    }

    fn start_clock(&mut self, now: Instant) {
        self.last_tick = now;
        for observer in self.observers.values_mut() {
            observer.next_due = now + observer.interval;
        }
    }

    fn apply(&mut self, op: SessionOp, events: &EngineEvents, now: Instant) {
        match op {
            SessionOp::AddObserver { token, interval } => {
                let interval = interval.max(Duration::from_millis(1));
                self.observers.insert(
                    token,
                    Observer {
                        interval,
                        next_due: now + interval,
                    },
                );
            }
            SessionOp::RemoveObserver(token) => {
                self.observers.remove(&token);
            }
            SessionOp::Play => self.change_rate(1.0, events, now),
            SessionOp::Pause => self.change_rate(0.0, events, now),
            SessionOp::SetRate(rate) => self.change_rate(rate.max(0.0), events, now),
            SessionOp::Seek { to, id } => {
                if let Some(previous) = self.seek.take() {
                    // A newer seek interrupts the one in progress
                    events.seek_completed(previous.id, false);
                }
                let to = if to.is_finite() { to.clamp(0.0, self.duration) } else { 0.0 };
                self.seek = Some(PendingSeek {
                    to,
                    id,
                    due: now + self.seek_latency,
                });
            }
            SessionOp::Release => {}
        }
    }

    fn change_rate(&mut self, rate: f32, events: &EngineEvents, now: Instant) {
        self.advance(now, events);
        if rate > 0.0 && self.position >= self.duration {
            // Stays ended; report the stop again
            trace!("Ignoring rate {} at end of media", rate);
            self.rate = 0.0;
            events.rate_changed(0.0);
            events.playback_ended();
            return;
        }
        if self.rate != rate {
            self.rate = rate;
            events.rate_changed(rate);
        }
    }

    /// Moves the playhead by the time elapsed since the last update.
    fn advance(&mut self, now: Instant, events: &EngineEvents) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;

        if self.rate > 0.0 && self.seek.is_none() {
            self.position += elapsed * f64::from(self.rate);
            if self.position >= self.duration {
                self.position = self.duration;
                self.rate = 0.0;
                events.rate_changed(0.0);
                events.playback_ended();
            }
        }
        elapsed
    }

    fn tick(&mut self, now: Instant, buffer_rate: f64, events: &EngineEvents) {
        let elapsed = self.advance(now, events);

        if let Some(seek) = self.seek.take_if(|seek| seek.due <= now) {
            self.position = seek.to;
            events.seek_completed(seek.id, true);
        }

        let buffered_end = (self.buffered_end.max(self.position) + elapsed * buffer_rate)
            .min(self.duration);
        if buffered_end != self.buffered_end {
            self.buffered_end = buffered_end;
            events.buffered_range(0.0, buffered_end);
        }

        let position = self.position;
        for observer in self.observers.values_mut() {
            if observer.next_due <= now {
                events.position(position);
                while observer.next_due <= now {
                    observer.next_due += observer.interval;
                }
            }
        }
    }
}
