use super::{PackAlgorithm, padded_footprint};
use crate::model::{Area, Rect};

/// Free-rectangle packer over a disjoint set of slices.
///
/// Slices exactly tile the unused part of the bin and are kept in ascending area order,
/// so a first-fit scan lands in the tightest slices first.
pub struct SlicePacker {
    bin: Area,
    padding: u32,
    slices: Vec<Rect>,
}

impl SlicePacker {
    pub fn new(bin: Area, padding: u32) -> Self {
        let mut packer = Self {
            bin,
            padding,
            slices: Vec::new(),
        };
        packer.insert(Rect::new(0, 0, bin.width, bin.height));
        packer
    }

    /// Free slices in ascending area order.
    pub fn slices(&self) -> &[Rect] {
        &self.slices
    }

    /// Inserts after any slice of equal area, keeping insertion order among ties.
    fn insert(&mut self, r: Rect) {
        if r.is_empty() {
            return;
        }
        let at = self.slices.partition_point(|s| s.area() <= r.area());
        self.slices.insert(at, r);
    }

    /// Removes `node` from every slice it touches and re-inserts the residuals.
    fn claim(&mut self, node: &Rect) {
        let mut residuals = Vec::new();
        self.slices.retain(|fr| {
            if !fr.overlaps(node) {
                return true;
            }
            subtract(fr, node, &mut residuals);
            false
        });
        for r in residuals {
            self.insert(r);
        }
        debug_assert!(self.slices.iter().all(|s| !s.overlaps(node)));
    }
}

/// Pushes the parts of `fr` not covered by `node`: full-width strips above and below,
/// then left and right strips limited to the overlap band.
fn subtract(fr: &Rect, node: &Rect, out: &mut Vec<Rect>) {
    let fr_x2 = fr.x + fr.w;
    let fr_y2 = fr.y + fr.h;
    let ix1 = fr.x.max(node.x);
    let iy1 = fr.y.max(node.y);
    let ix2 = fr_x2.min(node.x + node.w);
    let iy2 = fr_y2.min(node.y + node.h);

    if iy1 > fr.y {
        out.push(Rect::new(fr.x, fr.y, fr.w, iy1 - fr.y));
    }
    if iy2 < fr_y2 {
        out.push(Rect::new(fr.x, iy2, fr.w, fr_y2 - iy2));
    }
    let band = iy2.saturating_sub(iy1);
    if band > 0 {
        if ix1 > fr.x {
            out.push(Rect::new(fr.x, iy1, ix1 - fr.x, band));
        }
        if ix2 < fr_x2 {
            out.push(Rect::new(ix2, iy1, fr_x2 - ix2, band));
        }
    }
}

impl PackAlgorithm for SlicePacker {
    fn pack(&mut self, area: Area) -> Option<Rect> {
        if area.width == 0 || area.height == 0 || !self.bin.fits(&area) {
            return None;
        }
        let fp = padded_footprint(area, self.padding, self.bin);
        let slot = self
            .slices
            .iter()
            .find(|s| s.w >= fp.width && s.h >= fp.height)
            .copied()?;
        self.claim(&Rect::new(slot.x, slot.y, fp.width, fp.height));
        Some(Rect::new(slot.x, slot.y, area.width, area.height))
    }

    fn extend(&mut self, bin: Area) {
        let old = self.bin;
        let new = Area::new(old.width.max(bin.width), old.height.max(bin.height));
        if new.width > old.width {
            self.insert(Rect::new(old.width, 0, new.width - old.width, old.height));
        }
        if new.height > old.height {
            self.insert(Rect::new(0, old.height, new.width, new.height - old.height));
        }
        self.bin = new;
    }

    fn bin(&self) -> Area {
        self.bin
    }
}
