//! End-to-end tests of the playback controller against the simulated engine,
//! plus the catalog and favorites services.
//!
//! Playback tests run on a paused tokio clock: waiting on a snapshot lets the
//! runtime jump straight to the next engine or timer deadline.

mod library_test;
mod playback_test;
