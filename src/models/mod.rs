mod identifiers;
mod video;

pub use identifiers::VideoId;
pub use video::{Difficulty, Video};
