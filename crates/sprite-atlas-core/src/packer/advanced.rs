use super::{PackAlgorithm, SkylinePacker, SlicePacker, padded_footprint};
use crate::model::{Area, Rect};

/// Skyline packer that reuses the gaps it leaves behind.
///
/// Every patch produced by a skyline placement becomes a nested [`SlicePacker`] region.
/// Later requests try those regions (in creation order) before touching the skyline.
pub struct AdvancedSkylinePacker {
    skyline: SkylinePacker,
    regions: Vec<(Rect, SlicePacker)>,
}

impl AdvancedSkylinePacker {
    pub fn new(bin: Area, padding: u32) -> Self {
        Self {
            skyline: SkylinePacker::new(bin, padding),
            regions: Vec::new(),
        }
    }

    pub fn skyline(&self) -> &SkylinePacker {
        &self.skyline
    }

    /// Nested regions as `(bounds in bin coordinates, packer)`.
    pub fn regions(&self) -> &[(Rect, SlicePacker)] {
        &self.regions
    }

    fn pack_in_regions(&mut self, area: Area) -> Option<Rect> {
        let fp = padded_footprint(area, self.skyline.padding(), self.skyline.bin());
        self.regions
            .iter_mut()
            .filter(|(bounds, _)| bounds.w >= fp.width && bounds.h >= fp.height)
            .find_map(|(bounds, packer)| {
                packer.pack(area).map(|r| r.offset(bounds.x, bounds.y))
            })
    }
}

impl PackAlgorithm for AdvancedSkylinePacker {
    fn pack(&mut self, area: Area) -> Option<Rect> {
        if let Some(r) = self.pack_in_regions(area) {
            return Some(r);
        }
        let placed = self.skyline.pack(area)?;
        let padding = self.skyline.padding();
        for patch in self.skyline.take_patches() {
            let packer = SlicePacker::new(patch.size(), padding);
            self.regions.push((patch, packer));
        }
        Some(placed)
    }

    /// Only the skyline grows; regions are bounded by the gaps they were cut from.
    fn extend(&mut self, bin: Area) {
        self.skyline.extend(bin);
    }

    fn bin(&self) -> Area {
        self.skyline.bin()
    }
}
