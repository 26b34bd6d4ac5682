use std::sync::Arc;
use std::time::Duration;
use url::Url;

use video_player::models::{Difficulty, Video, VideoId};
use video_player::player::{SimulatedEngine, SimulatedMedia};

pub struct Fixtures;

impl Fixtures {
    pub fn lesson(id: &str, duration: f64) -> Video {
        Video {
            id: VideoId::new(id),
            title: format!("Lesson {}", id),
            description: format!("Fixture lesson {}", id),
            thumbnail_url: Url::parse(&format!("https://cdn.example.com/{}.jpg", id)).unwrap(),
            media_url: Url::parse(&format!("https://cdn.example.com/{}.m3u8", id)).unwrap(),
            duration,
            difficulty: Difficulty::Intermediate,
        }
    }

    /// A lesson whose media the engine cannot open
    pub fn broken_lesson() -> Video {
        Self::lesson("broken", 30.0)
    }

    /// Engine that can play `videos` and fails everything else
    pub fn engine_for(videos: &[Video]) -> Arc<SimulatedEngine> {
        Arc::new(
            SimulatedEngine::from_videos(videos)
                .with_load_latency(Duration::from_millis(300))
                .with_seek_latency(Duration::from_millis(150)),
        )
    }

    pub fn engine_with_broken(video: &Video, reason: &str) -> Arc<SimulatedEngine> {
        Arc::new(SimulatedEngine::new().with_media(
            video.media_url.clone(),
            SimulatedMedia::Broken {
                reason: reason.to_string(),
            },
        ))
    }
}
