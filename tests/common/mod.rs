pub mod fixtures;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use video_player::models::Video;
use video_player::player::{
    ControllerSettings, MediaEngine, PlaybackController, PlaybackHandle, PlaybackSnapshot,
};

/// Generous virtual-time budget; the tests run on a paused clock
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(60);

pub fn spawn_player(video: Video, engine: Arc<dyn MediaEngine>) -> PlaybackHandle {
    PlaybackController::spawn(video, engine, ControllerSettings::default())
}

/// Waits until a published snapshot satisfies `predicate` and returns it
pub async fn wait_until<F>(handle: &PlaybackHandle, mut predicate: F) -> PlaybackSnapshot
where
    F: FnMut(&PlaybackSnapshot) -> bool,
{
    let mut receiver = handle.snapshot_property().watch();
    timeout(SNAPSHOT_TIMEOUT, async move {
        receiver
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map(|snapshot| snapshot.clone())
    })
    .await
    .expect("Snapshot condition not reached within timeout")
    .expect("Snapshot property closed")
}
