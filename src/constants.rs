// Playback tuning defaults. Every value here can be overridden in config.toml.

/// Cadence of engine position samples forwarded into the snapshot.
pub const POSITION_INTERVAL_MS: u64 = 500;

/// Inactivity window before the on-screen controls hide.
pub const CONTROLS_HIDE_SECS: u64 = 3;

/// Distance covered by the skip forward/backward buttons.
pub const SKIP_INTERVAL_SECS: f64 = 10.0;

/// How long a seek may stay unanswered before it is abandoned.
pub const SEEK_TIMEOUT_MS: u64 = 5_000;

// === Catalog ===
pub const CATALOG_LATENCY_MS: u64 = 500;

// === Favorites ===
pub const FAVORITES_KEY: &str = "favoriteVideos";
pub const FAVORITES_FILE_NAME: &str = "favorites.json";
