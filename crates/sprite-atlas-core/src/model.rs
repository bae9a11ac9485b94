use serde::{Deserialize, Serialize};

use crate::config::scale_to_pot;
use crate::tier::QualityTier;

/// Requested size of something to place (pixels).
///
/// A packer's bin is also an `Area`: the current packable surface, which only grows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Area {
    pub width: u32,
    pub height: u32,
}

impl Area {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
    /// True if `other` fits inside `self` without rotation.
    pub fn fits(&self, other: &Area) -> bool {
        other.width <= self.width && other.height <= self.height
    }
}

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    pub fn size(&self) -> Area {
        Area::new(self.w, self.h)
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// True if the two rectangles share at least one pixel.
    pub fn overlaps(&self, r: &Rect) -> bool {
        if self.is_empty() || r.is_empty() {
            return false;
        }
        let ax2 = self.x + self.w;
        let ay2 = self.y + self.h;
        let bx2 = r.x + r.w;
        let by2 = r.y + r.h;
        !(self.x >= bx2 || r.x >= ax2 || self.y >= by2 || r.y >= ay2)
    }
    /// Same rectangle moved by `(dx, dy)`.
    pub fn offset(&self, dx: u32, dy: u32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }
}

/// A placed sprite inside an atlas bin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacedSprite {
    /// Sprite name (path separators normalised to `/`).
    pub name: String,
    /// Stable numeric id in `[1, 65535)`, unique within the atlas.
    pub id: u16,
    /// Index of the owning bin within `AtlasDescription::bins`.
    pub bin: usize,
    /// Placed rectangle within the bin (unpadded).
    pub rect: Rect,
    /// Nine-slice border (left, bottom, right, top). Pass-through metadata.
    pub border: [f32; 4],
    /// Pivot point. Pass-through metadata.
    pub pivot: [f32; 2],
}

/// One output texture-sized packing surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtlasBin {
    pub width: u32,
    pub height: u32,
    pub quality: QualityTier,
    pub transparent: bool,
    /// Sprites in placement order.
    pub sprites: Vec<PlacedSprite>,
}

impl AtlasBin {
    /// Power-of-two texture size hint for this bin, clamped to the size ladder.
    pub fn max_texture_size(&self) -> u32 {
        scale_to_pot(self.width.max(self.height))
    }

    /// Human-readable label, e.g. `atlas_0  [256x128]  [full]`.
    pub fn display_name(&self, base: &str) -> String {
        format!(
            "{}  [{}x{}]  [{}]",
            base, self.width, self.height, self.quality
        )
    }

    pub fn find_sprite(&self, name: &str) -> Option<&PlacedSprite> {
        self.sprites.iter().find(|s| s.name == name)
    }
}

/// Result of one pack/repack invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtlasDescription {
    /// Random id, assigned once and preserved across repacks.
    pub id: u32,
    pub max_size: u32,
    pub padding: u32,
    pub power_of_two: bool,
    pub force_square: bool,
    pub bins: Vec<AtlasBin>,
}

impl AtlasDescription {
    /// All placed sprites in bin order.
    pub fn sprites(&self) -> impl Iterator<Item = &PlacedSprite> {
        self.bins.iter().flat_map(|b| b.sprites.iter())
    }

    pub fn sprite_count(&self) -> usize {
        self.bins.iter().map(|b| b.sprites.len()).sum()
    }

    pub fn find_sprite(&self, name: &str) -> Option<&PlacedSprite> {
        self.bins.iter().find_map(|b| b.find_sprite(name))
    }

    /// Case-insensitive substring search over sprite names.
    pub fn search_sprites(&self, word: &str) -> Vec<&PlacedSprite> {
        let word = word.to_lowercase();
        self.sprites()
            .filter(|s| s.name.to_lowercase().contains(&word))
            .collect()
    }

    /// Returns `(bin index, slot within bin)` for the named sprite.
    pub fn index_of(&self, name: &str) -> Option<(usize, usize)> {
        self.bins.iter().enumerate().find_map(|(i, b)| {
            b.sprites
                .iter()
                .position(|s| s.name == name)
                .map(|slot| (i, slot))
        })
    }

    /// Computes packing statistics for this atlas.
    pub fn stats(&self) -> PackStats {
        let num_bins = self.bins.len();
        let mut num_sprites = 0;
        let mut total_bin_area = 0u64;
        let mut used_sprite_area = 0u64;
        let mut max_bin_width = 0u32;
        let mut max_bin_height = 0u32;

        for bin in &self.bins {
            total_bin_area += bin.width as u64 * bin.height as u64;
            max_bin_width = max_bin_width.max(bin.width);
            max_bin_height = max_bin_height.max(bin.height);
            for sprite in &bin.sprites {
                num_sprites += 1;
                used_sprite_area += sprite.rect.area();
            }
        }

        let occupancy = if total_bin_area > 0 {
            used_sprite_area as f64 / total_bin_area as f64
        } else {
            0.0
        };

        PackStats {
            num_bins,
            num_sprites,
            total_bin_area,
            used_sprite_area,
            occupancy,
            max_bin_width,
            max_bin_height,
        }
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    pub num_bins: usize,
    pub num_sprites: usize,
    /// Sum of `width * height` over all bins.
    pub total_bin_area: u64,
    /// Sum of placed sprite areas.
    pub used_sprite_area: u64,
    /// `used_sprite_area / total_bin_area` (0.0 to 1.0). Higher is better.
    pub occupancy: f64,
    pub max_bin_width: u32,
    pub max_bin_height: u32,
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Bins: {}, Sprites: {}, Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px²",
            self.num_bins,
            self.num_sprites,
            self.occupancy * 100.0,
            self.total_bin_area,
            self.used_sprite_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_bin_area.saturating_sub(self.used_sprite_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.total_bin_area > 0 {
            (self.wasted_area() as f64 / self.total_bin_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
