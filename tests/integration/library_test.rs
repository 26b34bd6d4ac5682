use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use video_player::models::{Difficulty, VideoId};
use video_player::player::SimulatedEngine;
use video_player::services::{
    FavoritesService, JsonFavoritesStore, SampleCatalog, VideoRepository, filter_by_difficulty,
};

use crate::common::{spawn_player, wait_until};

#[tokio::test]
async fn test_catalog_filters_by_difficulty() {
    let catalog = SampleCatalog::new(Duration::ZERO);
    let videos = catalog.list_videos().await.unwrap();

    for difficulty in Difficulty::ALL {
        let filtered = filter_by_difficulty(&videos, Some(difficulty));
        assert_eq!(filtered.len(), 2, "{} lessons", difficulty);
        assert!(filtered.iter().all(|v| v.difficulty == difficulty));
    }
}

#[tokio::test]
async fn test_favorites_survive_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("favorites.json");
    let videos = SampleCatalog::new(Duration::ZERO).list_videos().await.unwrap();

    let service = FavoritesService::new(Arc::new(JsonFavoritesStore::open(&path).unwrap()));
    assert!(service.toggle(&VideoId::new("6")).unwrap());
    assert!(service.toggle(&VideoId::new("2")).unwrap());
    assert!(!service.toggle(&VideoId::new("6")).unwrap());

    let reopened = FavoritesService::new(Arc::new(JsonFavoritesStore::open(&path).unwrap()));
    let favorites = reopened.favorite_videos(&videos).unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].title, "Business English Presentation");
}

#[tokio::test(start_paused = true)]
async fn test_every_catalog_video_plays_on_simulated_engine() {
    let videos = SampleCatalog::new(Duration::ZERO).list_videos().await.unwrap();
    let engine = Arc::new(SimulatedEngine::from_videos(&videos));

    for video in videos {
        let expected = video.duration;
        let handle = spawn_player(video, engine.clone());
        let ready = wait_until(&handle, |s| s.is_ready()).await;
        assert_eq!(ready.duration, expected);
        handle.dispose().await;
    }
}
