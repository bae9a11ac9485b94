use super::{PackAlgorithm, padded_footprint};
use crate::model::{Area, Rect};

/// A horizontal span `[from, to]` (inclusive) of the bin's top profile at a uniform height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkylineSegment {
    pub from: u32,
    pub to: u32,
    pub height: u32,
}

impl SkylineSegment {
    fn new(from: u32, to: u32, height: u32) -> Self {
        Self { from, to, height }
    }
    #[inline]
    pub fn width(&self) -> u32 {
        self.to - self.from + 1
    }
}

/// Horizontal skyline packer.
///
/// Each placement picks the span of segments giving the lowest resulting top, leftmost
/// on ties. Segments lying below the chosen start height leave a gap under the placement;
/// those gaps are recorded as patches and never reused by this packer itself.
pub struct SkylinePacker {
    bin: Area,
    padding: u32,
    segments: Vec<SkylineSegment>,
    patches: Vec<Rect>,
}

impl SkylinePacker {
    pub fn new(bin: Area, padding: u32) -> Self {
        let segments = if bin.width > 0 {
            vec![SkylineSegment::new(0, bin.width - 1, 0)]
        } else {
            Vec::new()
        };
        Self {
            bin,
            padding,
            segments,
            patches: Vec::new(),
        }
    }

    pub fn padding(&self) -> u32 {
        self.padding
    }

    /// Current top profile, sorted by `from` and contiguous over `[0, bin.width)`.
    pub fn segments(&self) -> &[SkylineSegment] {
        &self.segments
    }

    /// Gaps left under placements since the last `take_patches`.
    pub fn patches(&self) -> &[Rect] {
        &self.patches
    }

    pub fn take_patches(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.patches)
    }

    /// Returns `(first, last, top)` of the best span for a padded footprint.
    fn find_span(&self, fp: Area) -> Option<(usize, usize, u32)> {
        let mut best: Option<(usize, usize, u32)> = None;
        for i in 0..self.segments.len() {
            let to = self.segments[i].from + fp.width - 1;
            if to >= self.bin.width {
                // `from` only grows from here on
                break;
            }
            let mut top = 0;
            for j in i..self.segments.len() {
                let seg = &self.segments[j];
                let h = seg.height + fp.height;
                if h > self.bin.height {
                    break;
                }
                top = top.max(h);
                if to <= seg.to {
                    if best.is_none_or(|(_, _, best_top)| top < best_top) {
                        best = Some((i, j, top));
                    }
                    break;
                }
            }
        }
        best
    }

    /// Raises segments `first..=last` to `top` over the footprint and returns the start height.
    fn place(&mut self, first: usize, last: usize, top: u32, fp: Area) -> u32 {
        let from = self.segments[first].from;
        let to = from + fp.width - 1;
        let tail = self.segments[last];
        let start = top - fp.height;

        for k in first..=last {
            let seg = self.segments[k];
            if seg.height < start {
                let w = seg.to.min(to) - seg.from + 1;
                self.patches
                    .push(Rect::new(seg.from, seg.height, w, start - seg.height));
            }
        }

        let mut replacement = vec![SkylineSegment::new(from, to, top)];
        if to < tail.to {
            replacement.push(SkylineSegment::new(to + 1, tail.to, tail.height));
        }
        self.segments.splice(first..=last, replacement);
        debug_assert!(self.is_contiguous());
        start
    }

    fn is_contiguous(&self) -> bool {
        let starts_at_zero = self.segments.first().is_none_or(|s| s.from == 0);
        let ends_at_edge = self
            .segments
            .last()
            .is_none_or(|s| s.to + 1 == self.bin.width);
        let linked = self
            .segments
            .windows(2)
            .all(|w| w[0].to + 1 == w[1].from);
        let below_top = self.segments.iter().all(|s| s.height <= self.bin.height);
        starts_at_zero && ends_at_edge && linked && below_top
    }
}

impl PackAlgorithm for SkylinePacker {
    fn pack(&mut self, area: Area) -> Option<Rect> {
        if area.width == 0 || area.height == 0 || !self.bin.fits(&area) {
            return None;
        }
        let fp = padded_footprint(area, self.padding, self.bin);
        let (first, last, top) = self.find_span(fp)?;
        let x = self.segments[first].from;
        let y = self.place(first, last, top, fp);
        Some(Rect::new(x, y, area.width, area.height))
    }

    fn extend(&mut self, bin: Area) {
        if self.bin.width < bin.width {
            self.segments
                .push(SkylineSegment::new(self.bin.width, bin.width - 1, 0));
            self.bin.width = bin.width;
        }
        if self.bin.height < bin.height {
            self.bin.height = bin.height;
        }
    }

    fn bin(&self) -> Area {
        self.bin
    }
}
