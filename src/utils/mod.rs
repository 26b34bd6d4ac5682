pub mod errors;
pub mod time_format;

pub use errors::{AppError, AppResult, PlaybackError};
pub use time_format::{format_short_time, format_time};
