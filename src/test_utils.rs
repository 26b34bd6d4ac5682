#![cfg(test)]

pub use common::{sample_video, wait_for_async, wait_for_snapshot};
pub use recording_engine::{EngineCall, RecordingEngine};

/// Common test utilities
pub mod common {
    use std::future::Future;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};
    use url::Url;

    use crate::models::{Difficulty, Video, VideoId};
    use crate::player::{PlaybackHandle, PlaybackSnapshot};

    /// Wait for an async condition to become true
    pub async fn wait_for_async<F, Fut>(mut condition: F, max_wait: Duration) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let start = tokio::time::Instant::now();

        while start.elapsed() < max_wait {
            if condition().await {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }

        false
    }

    /// Waits until a published snapshot satisfies `predicate` and returns it.
    pub async fn wait_for_snapshot<F>(handle: &PlaybackHandle, mut predicate: F) -> PlaybackSnapshot
    where
        F: FnMut(&PlaybackSnapshot) -> bool,
    {
        let mut receiver = handle.snapshot_property().watch();
        timeout(Duration::from_secs(2), async move {
            receiver
                .wait_for(|snapshot| predicate(snapshot))
                .await
                .map(|snapshot| snapshot.clone())
        })
        .await
        .expect("timed out waiting for snapshot")
        .expect("snapshot property closed")
    }

    pub fn sample_video() -> Video {
        Video {
            id: VideoId::new("test-1"),
            title: "Test Lesson".to_string(),
            description: "A lesson used by unit tests".to_string(),
            thumbnail_url: Url::parse("https://example.com/thumb.jpg").unwrap(),
            media_url: Url::parse("https://example.com/lesson.m3u8").unwrap(),
            duration: 120.0,
            difficulty: Difficulty::Beginner,
        }
    }
}

/// Engine double that records every call and hands out the event sinks
pub mod recording_engine {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use url::Url;

    use crate::player::{EngineEvents, EngineSession, MediaEngine, ObserverToken, SeekId};

    #[derive(Debug, Clone, PartialEq)]
    pub enum EngineCall {
        Open(Url),
        AddObserver(Duration),
        RemoveObserver(ObserverToken),
        Play,
        Pause,
        SetRate(f32),
        Seek { to: f64, id: SeekId },
        Release,
    }

    #[derive(Default)]
    struct Recorded {
        calls: Vec<EngineCall>,
        sinks: Vec<EngineEvents>,
        next_observer: u64,
    }

    #[derive(Clone, Default)]
    pub struct RecordingEngine {
        recorded: Arc<Mutex<Recorded>>,
    }

    impl RecordingEngine {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<EngineCall> {
            self.recorded.lock().unwrap().calls.clone()
        }

        pub fn sessions_opened(&self) -> usize {
            self.recorded.lock().unwrap().sinks.len()
        }

        /// Event sink of the most recently opened session
        pub fn events(&self) -> EngineEvents {
            self.recorded
                .lock()
                .unwrap()
                .sinks
                .last()
                .cloned()
                .expect("no session opened yet")
        }

        pub fn seeks(&self) -> Vec<(f64, SeekId)> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    EngineCall::Seek { to, id } => Some((to, id)),
                    _ => None,
                })
                .collect()
        }

        pub fn last_seek(&self) -> Option<(f64, SeekId)> {
            self.seeks().last().copied()
        }

        fn record(&self, call: EngineCall) {
            self.recorded.lock().unwrap().calls.push(call);
        }
    }

    impl MediaEngine for RecordingEngine {
        fn open(&self, url: &Url, events: EngineEvents) -> Box<dyn EngineSession> {
            {
                let mut recorded = self.recorded.lock().unwrap();
                recorded.calls.push(EngineCall::Open(url.clone()));
                recorded.sinks.push(events);
            }
            Box::new(RecordingSession {
                engine: self.clone(),
            })
        }
    }

    struct RecordingSession {
        engine: RecordingEngine,
    }

    impl EngineSession for RecordingSession {
        fn add_periodic_observer(&mut self, interval: Duration) -> ObserverToken {
            let mut recorded = self.engine.recorded.lock().unwrap();
            recorded.next_observer += 1;
            recorded.calls.push(EngineCall::AddObserver(interval));
            ObserverToken(recorded.next_observer)
        }

        fn remove_periodic_observer(&mut self, token: ObserverToken) {
            self.engine.record(EngineCall::RemoveObserver(token));
        }

        fn play(&mut self) {
            self.engine.record(EngineCall::Play);
        }

        fn pause(&mut self) {
            self.engine.record(EngineCall::Pause);
        }

        fn set_rate(&mut self, rate: f32) {
            self.engine.record(EngineCall::SetRate(rate));
        }

        fn seek(&mut self, to: f64, id: SeekId) {
            self.engine.record(EngineCall::Seek { to, id });
        }

        fn release(&mut self) {
            self.engine.record(EngineCall::Release);
        }
    }
}
