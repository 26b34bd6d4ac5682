use std::time::Duration;

use video_player::player::{PlaybackPhase, PlaybackSpeed};

use crate::common::fixtures::Fixtures;
use crate::common::{spawn_player, wait_until};

#[tokio::test(start_paused = true)]
async fn test_load_autoplays_and_reports_progress() {
    let video = Fixtures::lesson("intro", 60.0);
    let handle = spawn_player(video.clone(), Fixtures::engine_for(&[video]));

    let ready = wait_until(&handle, |s| s.is_ready()).await;
    assert_eq!(ready.duration, 60.0);
    assert!(ready.is_playing);
    assert!(ready.controls_visible);
    assert_eq!(ready.error_message, None);

    let playing = wait_until(&handle, |s| s.current_time >= 2.0).await;
    assert!(playing.buffered_fraction > 0.0);
    assert!(playing.progress() > 0.0);

    handle.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_broken_media_fails_and_retry_reloads() {
    let video = Fixtures::broken_lesson();
    let engine = Fixtures::engine_with_broken(&video, "The operation could not be completed");
    let handle = spawn_player(video, engine);

    let failed = wait_until(&handle, |s| s.phase == PlaybackPhase::Failed).await;
    assert_eq!(
        failed.error_message.as_deref(),
        Some("The operation could not be completed")
    );
    assert!(!failed.is_playing);

    // Nothing happens while failed
    handle.toggle_play_pause().await;
    handle.seek(10.0).await;
    let snapshot = handle.snapshot();
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.current_time, 0.0);

    handle.retry().await;
    let retried = handle.snapshot();
    assert_eq!(retried.phase, PlaybackPhase::Loading);
    assert_eq!(retried.error_message, None);

    let failed_again = wait_until(&handle, |s| s.phase == PlaybackPhase::Failed).await;
    assert!(failed_again.error_message.is_some());

    handle.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_seek_settles_and_playback_resumes_from_target() {
    let video = Fixtures::lesson("seek", 120.0);
    let handle = spawn_player(video.clone(), Fixtures::engine_for(&[video]));
    wait_until(&handle, |s| s.is_ready()).await;

    handle.seek(45.0).await;
    let seeking = handle.snapshot();
    assert!(seeking.is_seeking);
    assert_eq!(seeking.current_time, 45.0);

    let settled = wait_until(&handle, |s| !s.is_seeking).await;
    assert_eq!(settled.current_time, 45.0);

    let resumed = wait_until(&handle, |s| s.current_time > 46.0).await;
    assert!(resumed.current_time < 50.0);

    handle.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_rapid_seeks_land_on_latest_target() {
    let video = Fixtures::lesson("scrub", 120.0);
    let handle = spawn_player(video.clone(), Fixtures::engine_for(&[video]));
    wait_until(&handle, |s| s.is_ready()).await;

    handle.seek(10.0).await;
    handle.seek(12.0).await;
    handle.seek(15.0).await;
    assert_eq!(handle.snapshot().current_time, 15.0);

    let settled = wait_until(&handle, |s| !s.is_seeking).await;
    assert_eq!(settled.current_time, 15.0);

    // Samples after the seek continue from the latest target
    let next = wait_until(&handle, |s| s.current_time != 15.0).await;
    assert!(next.current_time > 15.0 && next.current_time < 17.0);

    handle.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_skip_buttons_clamp_to_media_bounds() {
    let video = Fixtures::lesson("skip", 25.0);
    let handle = spawn_player(video.clone(), Fixtures::engine_for(&[video]));
    wait_until(&handle, |s| s.is_ready()).await;
    handle.toggle_play_pause().await;

    handle.skip_backward().await;
    assert_eq!(handle.snapshot().current_time, 0.0);
    wait_until(&handle, |s| !s.is_seeking).await;

    handle.skip_forward().await;
    assert_eq!(handle.snapshot().current_time, 10.0);
    wait_until(&handle, |s| !s.is_seeking).await;

    handle.skip_forward().await;
    wait_until(&handle, |s| !s.is_seeking).await;
    handle.skip_forward().await;
    assert_eq!(handle.snapshot().current_time, 25.0);

    handle.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_speed_change_scales_progress() {
    let video = Fixtures::lesson("speed", 300.0);
    let handle = spawn_player(video.clone(), Fixtures::engine_for(&[video]));
    wait_until(&handle, |s| s.is_ready()).await;

    handle.set_playback_speed(PlaybackSpeed::Double).await;
    assert_eq!(handle.snapshot().playback_speed, PlaybackSpeed::Double);

    let start = wait_until(&handle, |s| s.current_time > 0.0).await.current_time;
    tokio::time::sleep(Duration::from_secs(4)).await;
    let advanced = handle.snapshot().current_time - start;

    assert!(advanced > 6.5 && advanced < 9.5, "advanced {}", advanced);

    handle.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_controls_hide_after_inactivity_and_toggle_back() {
    let video = Fixtures::lesson("controls", 120.0);
    let handle = spawn_player(video.clone(), Fixtures::engine_for(&[video]));
    wait_until(&handle, |s| s.is_ready()).await;
    let shown_at = tokio::time::Instant::now();

    wait_until(&handle, |s| !s.controls_visible).await;
    assert!(shown_at.elapsed() >= Duration::from_secs(3));

    handle.toggle_controls().await;
    assert!(handle.snapshot().controls_visible);

    handle.toggle_controls().await;
    assert!(!handle.snapshot().controls_visible);

    handle.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_playback_ends_at_duration() {
    let video = Fixtures::lesson("short", 5.0);
    let handle = spawn_player(video.clone(), Fixtures::engine_for(&[video]));
    wait_until(&handle, |s| s.is_ready()).await;

    let ended = wait_until(&handle, |s| !s.is_playing && s.current_time >= 5.0).await;
    assert_eq!(ended.current_time, 5.0);
    assert!(ended.controls_visible);

    handle.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_play_after_end_settles_back_to_paused() {
    let video = Fixtures::lesson("rewatch", 3.0);
    let handle = spawn_player(video.clone(), Fixtures::engine_for(&[video]));
    wait_until(&handle, |s| s.is_ready()).await;
    wait_until(&handle, |s| !s.is_playing && s.current_time >= 3.0).await;

    handle.toggle_play_pause().await;
    let settled = wait_until(&handle, |s| !s.is_playing).await;
    assert_eq!(settled.current_time, 3.0);

    tokio::time::sleep(Duration::from_secs(5)).await;
    let later = handle.snapshot();
    assert!(!later.is_playing);
    assert_eq!(later.current_time, 3.0);

    handle.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_retry_while_ready_restarts_from_zero() {
    let video = Fixtures::lesson("again", 90.0);
    let handle = spawn_player(video.clone(), Fixtures::engine_for(&[video]));
    wait_until(&handle, |s| s.is_ready()).await;
    handle.set_playback_speed(PlaybackSpeed::OneAndHalf).await;
    wait_until(&handle, |s| s.current_time >= 3.0).await;

    handle.retry().await;
    let reset = handle.snapshot();
    assert_eq!(reset.phase, PlaybackPhase::Loading);
    assert_eq!(reset.current_time, 0.0);
    assert_eq!(reset.duration, 0.0);
    assert_eq!(reset.playback_speed, PlaybackSpeed::Normal);
    assert!(!reset.is_playing);

    let ready = wait_until(&handle, |s| s.is_ready()).await;
    assert!(ready.is_playing);
    assert!(ready.current_time < 1.0);

    handle.dispose().await;
}

#[tokio::test(start_paused = true)]
async fn test_dispose_freezes_snapshot() {
    let video = Fixtures::lesson("bye", 120.0);
    let handle = spawn_player(video.clone(), Fixtures::engine_for(&[video]));
    wait_until(&handle, |s| s.current_time >= 1.0).await;

    handle.dispose().await;
    let frozen = handle.snapshot();

    tokio::time::sleep(Duration::from_secs(5)).await;
    handle.toggle_play_pause().await;
    handle.dispose().await;

    assert_eq!(handle.snapshot(), frozen);
    assert!(!handle.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_each_transition() {
    let video = Fixtures::lesson("watch", 60.0);
    let handle = spawn_player(video.clone(), Fixtures::engine_for(&[video]));
    let mut subscriber = handle.subscribe();

    wait_until(&handle, |s| s.is_ready()).await;
    assert!(subscriber.try_recv());

    handle.dispose().await;
}
