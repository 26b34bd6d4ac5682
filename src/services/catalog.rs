use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::models::{Difficulty, Video, VideoId};
use crate::utils::{AppError, AppResult};

/// Source of catalog videos
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// All videos in catalog order
    async fn list_videos(&self) -> AppResult<Vec<Video>>;

    async fn find_video(&self, id: &VideoId) -> AppResult<Video> {
        self.list_videos()
            .await?
            .into_iter()
            .find(|video| &video.id == id)
            .ok_or_else(|| AppError::VideoNotFound(id.to_string()))
    }
}

struct SampleEntry {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    thumbnail: &'static str,
    media: &'static str,
    duration: f64,
    difficulty: Difficulty,
}

const SAMPLES: [SampleEntry; 6] = [
    SampleEntry {
        id: "1",
        title: "Basic English Conversation",
        description: "Learn essential English phrases for everyday conversations",
        thumbnail: "https://via.placeholder.com/300x200/4285F4/FFFFFF?text=Basic+English",
        media: "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4",
        duration: 596.0,
        difficulty: Difficulty::Beginner,
    },
    SampleEntry {
        id: "2",
        title: "Business English Presentation",
        description: "Professional English skills for workplace presentations",
        thumbnail: "https://via.placeholder.com/300x200/34A853/FFFFFF?text=Business+English",
        media: "https://devstreaming-cdn.apple.com/videos/streaming/examples/bipbop_4x3/bipbop_4x3_variant.m3u8",
        duration: 1024.0,
        difficulty: Difficulty::Intermediate,
    },
    SampleEntry {
        id: "3",
        title: "Advanced Grammar Structures",
        description: "Master complex English grammar patterns",
        thumbnail: "https://via.placeholder.com/300x200/EA4335/FFFFFF?text=Advanced+Grammar",
        media: "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ElephantsDream.mp4",
        duration: 653.0,
        difficulty: Difficulty::Advanced,
    },
    SampleEntry {
        id: "4",
        title: "Travel English Essentials",
        description: "Essential English phrases for traveling abroad",
        thumbnail: "https://via.placeholder.com/300x200/FBBC04/FFFFFF?text=Travel+English",
        media: "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerBlazes.mp4",
        duration: 15.0,
        difficulty: Difficulty::Beginner,
    },
    SampleEntry {
        id: "5",
        title: "Academic English Writing",
        description: "Improve your academic writing skills in English",
        thumbnail: "https://via.placeholder.com/300x200/9C27B0/FFFFFF?text=Academic+Writing",
        media: "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerEscapes.mp4",
        duration: 15.0,
        difficulty: Difficulty::Intermediate,
    },
    SampleEntry {
        id: "6",
        title: "Pronunciation Masterclass",
        description: "Perfect your English pronunciation with expert guidance",
        thumbnail: "https://via.placeholder.com/300x200/FF5722/FFFFFF?text=Pronunciation",
        media: "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerFun.mp4",
        duration: 60.0,
        difficulty: Difficulty::Advanced,
    },
];

impl SampleEntry {
    fn to_video(&self) -> AppResult<Video> {
        let parse = |raw: &str| {
            Url::parse(raw).map_err(|e| AppError::Catalog(format!("invalid URL {}: {}", raw, e)))
        };
        Ok(Video {
            id: VideoId::new(self.id),
            title: self.title.to_string(),
            description: self.description.to_string(),
            thumbnail_url: parse(self.thumbnail)?,
            media_url: parse(self.media)?,
            duration: self.duration,
            difficulty: self.difficulty,
        })
    }
}

static SAMPLE_VIDEOS: Lazy<Vec<Video>> = Lazy::new(|| {
    SAMPLES
        .iter()
        .filter_map(|entry| match entry.to_video() {
            Ok(video) => Some(video),
            Err(e) => {
                warn!("Skipping sample video {}: {}", entry.id, e);
                None
            }
        })
        .collect()
});

/// The built-in lesson catalog, served after a simulated network delay.
#[derive(Debug, Clone)]
pub struct SampleCatalog {
    latency: Duration,
}

impl SampleCatalog {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// The catalog contents without the simulated delay.
    pub fn videos() -> &'static [Video] {
        &SAMPLE_VIDEOS
    }
}

#[async_trait]
impl VideoRepository for SampleCatalog {
    async fn list_videos(&self) -> AppResult<Vec<Video>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        debug!("Serving {} sample videos", SAMPLE_VIDEOS.len());
        Ok(SAMPLE_VIDEOS.clone())
    }
}

/// Keeps the videos matching `difficulty`; `None` keeps everything.
pub fn filter_by_difficulty(videos: &[Video], difficulty: Option<Difficulty>) -> Vec<Video> {
    videos
        .iter()
        .filter(|video| difficulty.is_none_or(|d| video.difficulty == d))
        .cloned()
        .collect()
}
