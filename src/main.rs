use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use video_player::config::Config;
use video_player::player::{ControllerSettings, PlaybackController, PlaybackSpeed, SimulatedEngine};
use video_player::services::{
    FavoritesService, JsonFavoritesStore, SampleCatalog, VideoRepository,
};
use video_player::utils::format_time;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("video_player=debug")),
        )
        .init();

    info!("Starting video player");

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Falling back to default config: {:#}", e);
        Config::default()
    });

    let catalog = SampleCatalog::new(config.catalog.simulated_latency());
    let videos = catalog.list_videos().await.context("Failed to load catalog")?;
    info!("Catalog has {} videos", videos.len());

    let favorites_path = config.favorites_path()?;
    let store = JsonFavoritesStore::open(&favorites_path)
        .with_context(|| format!("Failed to open favorites at {:?}", favorites_path))?;
    let favorites = FavoritesService::new(Arc::new(store));

    let video = videos.first().cloned().context("Catalog is empty")?;
    if !favorites.is_favorite(&video.id)? {
        favorites.toggle(&video.id)?;
    }
    info!(
        "Favorites: {:?}",
        favorites
            .favorite_videos(&videos)?
            .iter()
            .map(|v| v.title.as_str())
            .collect::<Vec<_>>()
    );

    let engine = Arc::new(SimulatedEngine::from_videos(&videos));
    let settings = ControllerSettings::from(&config.playback);
    let handle = PlaybackController::spawn(video.clone(), engine, settings);

    // Log every published snapshot
    let mut updates = handle.snapshot_property().watch();
    let logger = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            info!(
                "{:?} {} / {} playing={} seeking={} buffered={:.0}% speed={} controls={}",
                snapshot.phase,
                format_time(snapshot.current_time),
                format_time(snapshot.duration),
                snapshot.is_playing,
                snapshot.is_seeking,
                snapshot.buffered_fraction * 100.0,
                snapshot.playback_speed,
                snapshot.controls_visible,
            );
        }
    });

    let mut subscriber = handle.subscribe();
    while !handle.snapshot().is_ready() {
        if !subscriber.wait_for_change().await {
            break;
        }
    }
    info!("Playing \"{}\"", video.title);

    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    handle.seek(120.0).await;
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    handle.skip_forward().await;
    handle.set_playback_speed(PlaybackSpeed::OneAndHalf).await;
    tokio::time::sleep(std::time::Duration::from_secs(4)).await;
    handle.toggle_play_pause().await;
    handle.skip_backward().await;
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;

    handle.dispose().await;
    let snapshot = handle.snapshot();
    info!(
        "Stopped at {} of {}",
        format_time(snapshot.current_time),
        format_time(snapshot.duration)
    );

    logger.abort();
    Ok(())
}
