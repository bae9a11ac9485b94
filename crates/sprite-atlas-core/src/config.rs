use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{AtlasError, Result};

/// Bin sizes a bin may take. New bins start at the first entry and grow by doubling.
pub const ATLAS_SIZE_LADDER: [u32; 8] = [32, 64, 128, 256, 512, 1024, 2048, 4096];

/// Hard cap on the number of sprites in one atlas (sprite ids live in `[1, 65535)`).
pub const MAX_SPRITES_PER_ATLAS: usize = 65535;

/// Single-bin packing algorithms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    /// Horizontal skyline; low-lying gaps under a placement are left as patches.
    HorizontalSkyline,
    /// Exact free-area tiling with first-fit over slices sorted by area.
    RectangleSlice,
    /// Skyline whose patches are promoted into nested rectangle-slice packers.
    AdvancedHorizontalSkyline,
}

impl FromStr for AlgorithmKind {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skyline" | "horizontal_skyline" => Ok(Self::HorizontalSkyline),
            "slice" | "rectangle_slice" => Ok(Self::RectangleSlice),
            "advanced" | "advanced_horizontal_skyline" => Ok(Self::AdvancedHorizontalSkyline),
            _ => Err(()),
        }
    }
}

/// Global packing configuration.
///
/// Per-group `power_of_two`/`force_square` are OR-ed with the group's tier profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackSetting {
    /// Maximum bin side in pixels; must be an entry of [`ATLAS_SIZE_LADDER`].
    #[serde(default = "default_max_atlas_size")]
    pub max_atlas_size: u32,
    /// Pixels reserved right of and below each sprite.
    #[serde(default = "default_padding")]
    pub padding: u32,
    /// Keep bins at their power-of-two packer size instead of shrinking them.
    #[serde(default)]
    pub power_of_two: bool,
    /// Grow bins in both dimensions at once so they stay square.
    #[serde(default)]
    pub force_square: bool,
}

impl Default for PackSetting {
    fn default() -> Self {
        Self {
            max_atlas_size: default_max_atlas_size(),
            padding: default_padding(),
            power_of_two: false,
            force_square: false,
        }
    }
}

impl PackSetting {
    pub fn new(max_atlas_size: u32, padding: u32, power_of_two: bool, force_square: bool) -> Self {
        Self {
            max_atlas_size,
            padding,
            power_of_two,
            force_square,
        }
    }

    /// Validates the configuration parameters.
    ///
    /// Returns an error if `max_atlas_size` is not on the size ladder.
    pub fn validate(&self) -> Result<()> {
        if !ATLAS_SIZE_LADDER.contains(&self.max_atlas_size) {
            return Err(AtlasError::InvalidConfig(format!(
                "max_atlas_size ({}) must be one of {:?}",
                self.max_atlas_size, ATLAS_SIZE_LADDER
            )));
        }
        if self.padding >= self.max_atlas_size {
            return Err(AtlasError::InvalidConfig(format!(
                "padding ({}) leaves no usable space in a {}x{} bin",
                self.padding, self.max_atlas_size, self.max_atlas_size
            )));
        }
        Ok(())
    }

    /// Create a fluent builder for `PackSetting`.
    pub fn builder() -> PackSettingBuilder {
        PackSettingBuilder::new()
    }
}

fn default_max_atlas_size() -> u32 {
    1024
}
fn default_padding() -> u32 {
    1
}

/// Builder for `PackSetting` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackSettingBuilder {
    setting: PackSetting,
}

impl PackSettingBuilder {
    pub fn new() -> Self {
        Self {
            setting: PackSetting::default(),
        }
    }
    pub fn max_atlas_size(mut self, v: u32) -> Self {
        self.setting.max_atlas_size = v;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.setting.padding = v;
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.setting.power_of_two = v;
        self
    }
    pub fn square(mut self, v: bool) -> Self {
        self.setting.force_square = v;
        self
    }
    pub fn build(self) -> PackSetting {
        self.setting
    }
}

/// Smallest ladder entry that is `>= size`, clamped to the largest entry.
pub fn scale_to_pot(size: u32) -> u32 {
    let top = ATLAS_SIZE_LADDER[ATLAS_SIZE_LADDER.len() - 1];
    let mut i = ATLAS_SIZE_LADDER[0];
    while i < size && i < top {
        i *= 2;
    }
    i
}
