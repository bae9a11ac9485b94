//! Multi-bin allocation: grow existing bins by doubling before opening new ones.

use tracing::{debug, trace};

use crate::config::{ATLAS_SIZE_LADDER, AlgorithmKind, PackSetting};
use crate::error::{AtlasError, Result};
use crate::model::{Area, Rect};
use crate::packer::{PackAlgorithm, create_packer};
use crate::tier::TierProfile;

/// Effective constraints for one `(tier, transparency)` group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSetting {
    pub max_size: u32,
    pub padding: u32,
    pub power_of_two: bool,
    pub force_square: bool,
    pub algorithm: AlgorithmKind,
}

impl GroupSetting {
    /// Global flags OR-ed with the tier's requirements.
    pub fn resolve(setting: &PackSetting, profile: &TierProfile) -> Self {
        Self {
            max_size: setting.max_atlas_size,
            padding: setting.padding,
            power_of_two: setting.power_of_two || profile.force_power_of_two,
            force_square: setting.force_square || profile.force_square,
            algorithm: profile.algorithm,
        }
    }

    /// Final bins keep the packer's (power-of-two) size instead of the tight bounds.
    pub fn keeps_packer_size(&self) -> bool {
        self.power_of_two || self.force_square
    }
}

/// Bin packers for one group, in creation order.
pub struct Allocator {
    setting: GroupSetting,
    packers: Vec<Box<dyn PackAlgorithm>>,
    placed: Vec<Vec<Rect>>,
}

impl Allocator {
    pub fn new(setting: GroupSetting) -> Self {
        Self {
            setting,
            packers: Vec::new(),
            placed: Vec::new(),
        }
    }

    pub fn setting(&self) -> &GroupSetting {
        &self.setting
    }

    /// Current packer-internal size of every bin.
    pub fn bins(&self) -> Vec<Area> {
        self.packers.iter().map(|p| p.bin()).collect()
    }

    /// Rects placed so far, per bin.
    pub fn placed(&self) -> &[Vec<Rect>] {
        &self.placed
    }

    /// Places `area` into the first bin that accepts it (growing as needed), opening a
    /// new bin if none does. Returns `None` if the area cannot fit even a fresh bin.
    pub fn place(&mut self, area: Area) -> Option<(usize, Rect)> {
        let max = self.setting.max_size;
        if area.width > max || area.height > max {
            return None;
        }
        for bin in 0..self.packers.len() {
            if let Some(rect) = self.pack_growing(bin, area) {
                return self.record(bin, rect);
            }
        }

        let start = ATLAS_SIZE_LADDER[0].min(max);
        let bin = self.packers.len();
        trace!(bin, start, "opening bin");
        self.packers.push(create_packer(
            self.setting.algorithm,
            Area::new(start, start),
            self.setting.padding,
        ));
        self.placed.push(Vec::new());
        let rect = self.pack_growing(bin, area)?;
        self.record(bin, rect)
    }

    fn record(&mut self, bin: usize, rect: Rect) -> Option<(usize, Rect)> {
        self.placed[bin].push(rect);
        Some((bin, rect))
    }

    fn pack_growing(&mut self, bin: usize, area: Area) -> Option<Rect> {
        let max = self.setting.max_size;
        let packer = &mut self.packers[bin];
        loop {
            if let Some(rect) = packer.pack(area) {
                return Some(rect);
            }
            let next = grow(packer.bin(), self.setting.force_square);
            if next.width > max || next.height > max {
                return None;
            }
            trace!(bin, width = next.width, height = next.height, "growing bin");
            packer.extend(next);
        }
    }

    /// Final bin sizes: the packer size for power-of-two/square groups, otherwise the
    /// exclusive bounds of the placed rects rounded up to a multiple of 4.
    pub fn finish(self) -> Vec<Area> {
        if self.setting.keeps_packer_size() {
            return self.packers.iter().map(|p| p.bin()).collect();
        }
        self.placed
            .iter()
            .map(|rects| {
                let w = rects.iter().map(|r| r.x + r.w).max().unwrap_or(0);
                let h = rects.iter().map(|r| r.y + r.h).max().unwrap_or(0);
                Area::new(round_up_4(w), round_up_4(h))
            })
            .collect()
    }
}

/// Next bin size: both sides when square, otherwise the lagging side (width on ties).
fn grow(bin: Area, force_square: bool) -> Area {
    if force_square {
        Area::new(bin.width * 2, bin.height * 2)
    } else if bin.width > bin.height {
        Area::new(bin.width, bin.height * 2)
    } else {
        Area::new(bin.width * 2, bin.height)
    }
}

fn round_up_4(v: u32) -> u32 {
    v.div_ceil(4) * 4
}

/// Output of [`allocate`]: final bin sizes and one `(bin, rect)` per input item, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub bins: Vec<Area>,
    pub placements: Vec<(usize, Rect)>,
}

/// Allocates `items` (already in placement order) into bins.
///
/// Fails with `PackImpossible` naming the first item that fits no bin.
pub fn allocate<'a, I>(items: I, setting: GroupSetting) -> Result<Allocation>
where
    I: IntoIterator<Item = (&'a str, Area)>,
{
    let mut allocator = Allocator::new(setting);
    let mut placements = Vec::new();
    for (name, area) in items {
        let placed = allocator
            .place(area)
            .ok_or_else(|| AtlasError::PackImpossible {
                name: name.to_string(),
                width: area.width,
                height: area.height,
                max_size: setting.max_size,
            })?;
        placements.push(placed);
    }
    let bins = allocator.finish();
    debug!(
        bins = bins.len(),
        sprites = placements.len(),
        "group allocated"
    );
    Ok(Allocation { bins, placements })
}
