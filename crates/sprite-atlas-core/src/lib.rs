//! Core library for packing sprites into texture atlas bins.
//!
//! - Algorithms: horizontal skyline, rectangle slices (exact free-area tiling), and an
//!   advanced skyline that turns the skyline's leftover gaps into nested slice regions
//! - Allocation: bins start at 32x32 and double toward square before new bins are opened
//! - Pipeline: sprites are grouped by quality tier and transparency, each group packed into
//!   its own bins, and every sprite gets a stable id unique within the atlas
//! - Data model is serde-serializable; persistence is left to the caller (see the CLI crate).
//!
//! Quick example:
//! ```ignore
//! use sprite_atlas_core::{PackSetting, SpriteDesc, pack_layout};
//! # fn main() -> anyhow::Result<()> {
//! let sprites = vec![
//!     SpriteDesc::new("hero/idle", 100, 50),
//!     SpriteDesc::new("hero/run", 50, 50),
//! ];
//! let setting = PackSetting::builder().max_atlas_size(256).padding(0).build();
//! let atlas = pack_layout(&sprites, setting)?;
//! println!("bins: {}", atlas.bins.len());
//! # Ok(()) }
//! ```

pub mod allocator;
pub mod compositing;
pub mod config;
pub mod error;
pub mod ids;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod tier;

pub use allocator::*;
pub use compositing::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use tier::*;

/// Convenience prelude for common types and functions.
/// Importing `sprite_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::compositing::{BinCanvas, ImageSprite, RgbaCanvas, list_atlas_sprites};
    pub use crate::config::{AlgorithmKind, PackSetting, PackSettingBuilder};
    pub use crate::model::{Area, AtlasBin, AtlasDescription, PackStats, PlacedSprite, Rect};
    pub use crate::tier::{QualityTier, TierProfile, TierRegistry};
    pub use crate::{AtlasPacker, PackOutput, SpriteDesc, SpriteSource, pack_images, pack_layout};
}
