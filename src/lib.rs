pub mod canvas;
pub mod config;
pub mod emulator;
pub mod input;
pub mod maps;
pub mod overlay;
pub mod pet;
pub mod web;

pub use config::AppConfig;
pub use emulator::{Emulator, Side};
pub use maps::{MapCatalog, MapDefinition};
pub use overlay::{compute_bounding_box, to_pixel_rect, OverlayPlan};
pub use pet::{compute_stats, compute_unallocated, PetAttributes, PetResult};
