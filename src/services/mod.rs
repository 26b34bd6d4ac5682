pub mod catalog;
pub mod favorites;

pub use catalog::{SampleCatalog, VideoRepository, filter_by_difficulty};
pub use favorites::{FavoritesService, FavoritesStore, JsonFavoritesStore, MemoryFavoritesStore};
