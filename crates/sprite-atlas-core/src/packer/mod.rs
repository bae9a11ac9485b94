use crate::config::AlgorithmKind;
use crate::model::{Area, Rect};

pub mod advanced;
pub mod skyline;
pub mod slice;

pub use advanced::AdvancedSkylinePacker;
pub use skyline::{SkylinePacker, SkylineSegment};
pub use slice::SlicePacker;

/// A packer places rectangles into a single growable bin.
///
/// Implementations must ensure no overlaps and reserve `padding` pixels to the right of
/// and below every placement (clamped to the bin size). `pack` returns `None` when the
/// area does not fit; the caller decides whether to `extend` the bin and retry.
pub trait PackAlgorithm {
    fn pack(&mut self, area: Area) -> Option<Rect>;
    /// Grows the bin. Dimensions never shrink; smaller values are ignored.
    fn extend(&mut self, bin: Area);
    fn bin(&self) -> Area;
}

/// Creates a boxed packer of the requested kind.
pub fn create_packer(kind: AlgorithmKind, bin: Area, padding: u32) -> Box<dyn PackAlgorithm> {
    match kind {
        AlgorithmKind::HorizontalSkyline => Box::new(SkylinePacker::new(bin, padding)),
        AlgorithmKind::RectangleSlice => Box::new(SlicePacker::new(bin, padding)),
        AlgorithmKind::AdvancedHorizontalSkyline => {
            Box::new(AdvancedSkylinePacker::new(bin, padding))
        }
    }
}

/// Footprint of `area` once padding is added, clamped so it never exceeds `bin`.
#[inline]
pub(crate) fn padded_footprint(area: Area, padding: u32, bin: Area) -> Area {
    Area::new(
        area.width.saturating_add(padding).min(bin.width),
        area.height.saturating_add(padding).min(bin.height),
    )
}
