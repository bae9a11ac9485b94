use std::borrow::Cow;

use image::{RgbaImage, imageops};

use crate::error::{AtlasError, Result};
use crate::model::{Area, AtlasBin, AtlasDescription, PlacedSprite, Rect};
use crate::pipeline::SpriteSource;
use crate::tier::QualityTier;

/// Destination surface for bin pixels.
///
/// Returning `Err(AtlasError::Cancelled)` from either method aborts the pack.
pub trait BinCanvas {
    /// Called once per bin, in order, before any of its sprites are blitted.
    fn create_bin(&mut self, index: usize, bin: &AtlasBin) -> Result<()>;
    /// Copies `pixels` (exactly `rect`-sized) into bin `bin` at `rect`.
    fn blit(&mut self, bin: usize, rect: Rect, pixels: &RgbaImage) -> Result<()>;
}

/// In-memory canvas with one transparent RGBA image per bin.
#[derive(Debug, Default, Clone)]
pub struct RgbaCanvas {
    bins: Vec<RgbaImage>,
}

impl RgbaCanvas {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn bins(&self) -> &[RgbaImage] {
        &self.bins
    }
    pub fn into_bins(self) -> Vec<RgbaImage> {
        self.bins
    }
}

impl BinCanvas for RgbaCanvas {
    fn create_bin(&mut self, index: usize, bin: &AtlasBin) -> Result<()> {
        let image = RgbaImage::new(bin.width, bin.height);
        if index < self.bins.len() {
            self.bins[index] = image;
        } else {
            self.bins.resize(index, RgbaImage::new(0, 0));
            self.bins.push(image);
        }
        Ok(())
    }

    fn blit(&mut self, bin: usize, rect: Rect, pixels: &RgbaImage) -> Result<()> {
        let bins = self.bins.len();
        let canvas = self
            .bins
            .get_mut(bin)
            .ok_or(AtlasError::BinOutOfRange { bin, bins })?;
        blit_rgba(pixels, canvas, rect.x, rect.y, 0, 0, rect.w, rect.h);
        Ok(())
    }
}

/// Blit the sub-rectangle `(sx, sy, sw, sh)` of `src` into `canvas` at `(dx, dy)`.
/// Pixels falling outside either image are skipped.
#[allow(clippy::too_many_arguments)]
pub fn blit_rgba(
    src: &RgbaImage,
    canvas: &mut RgbaImage,
    dx: u32,
    dy: u32,
    sx: u32,
    sy: u32,
    sw: u32,
    sh: u32,
) {
    let (cw, ch) = canvas.dimensions();
    let (iw, ih) = src.dimensions();
    for yy in 0..sh {
        for xx in 0..sw {
            let (ix, iy) = (sx + xx, sy + yy);
            if ix < iw && iy < ih && dx + xx < cw && dy + yy < ch {
                canvas.put_pixel(dx + xx, dy + yy, *src.get_pixel(ix, iy));
            }
        }
    }
}

/// True if any pixel is not fully opaque.
pub fn has_transparency(image: &RgbaImage) -> bool {
    image.pixels().any(|p| p[3] < u8::MAX)
}

/// A decoded image to pack.
#[derive(Debug, Clone)]
pub struct ImageSprite {
    pub name: String,
    pub image: RgbaImage,
    pub quality: QualityTier,
    pub transparent: bool,
    pub border: [f32; 4],
    pub pivot: [f32; 2],
    pub id: Option<u16>,
}

impl ImageSprite {
    /// Sprite at the default tier; transparency is detected from the alpha channel.
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Self {
        let transparent = has_transparency(&image);
        Self {
            name: name.into(),
            image,
            quality: QualityTier::default(),
            transparent,
            border: [0.0; 4],
            pivot: [0.5, 0.5],
            id: None,
        }
    }
    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }
    pub fn with_id(mut self, id: u16) -> Self {
        self.id = Some(id);
        self
    }
}

impl SpriteSource for ImageSprite {
    fn name(&self) -> &str {
        &self.name
    }
    fn size(&self) -> Area {
        Area::new(self.image.width(), self.image.height())
    }
    fn quality(&self) -> QualityTier {
        self.quality
    }
    fn transparent(&self) -> bool {
        self.transparent
    }
    fn border(&self) -> [f32; 4] {
        self.border
    }
    fn pivot(&self) -> [f32; 2] {
        self.pivot
    }
    fn id(&self) -> Option<u16> {
        self.id
    }
    fn read(&self) -> Result<Cow<'_, RgbaImage>> {
        Ok(Cow::Borrowed(&self.image))
    }
}

/// A sprite cut back out of an existing atlas, carrying its previous placement.
#[derive(Debug, Clone)]
pub struct AtlasSprite {
    pub placed: PlacedSprite,
    pub quality: QualityTier,
    pub transparent: bool,
    pub image: RgbaImage,
}

impl SpriteSource for AtlasSprite {
    fn name(&self) -> &str {
        &self.placed.name
    }
    fn size(&self) -> Area {
        self.placed.rect.size()
    }
    fn quality(&self) -> QualityTier {
        self.quality
    }
    fn transparent(&self) -> bool {
        self.transparent
    }
    fn border(&self) -> [f32; 4] {
        self.placed.border
    }
    fn pivot(&self) -> [f32; 2] {
        self.placed.pivot
    }
    fn id(&self) -> Option<u16> {
        Some(self.placed.id)
    }
    fn read(&self) -> Result<Cow<'_, RgbaImage>> {
        Ok(Cow::Borrowed(&self.image))
    }
}

impl From<AtlasSprite> for ImageSprite {
    fn from(s: AtlasSprite) -> Self {
        Self {
            name: s.placed.name,
            image: s.image,
            quality: s.quality,
            transparent: s.transparent,
            border: s.placed.border,
            pivot: s.placed.pivot,
            id: Some(s.placed.id),
        }
    }
}

/// Extracts every sprite of `atlas` from its bin images (`bins[i]` backs `atlas.bins[i]`).
pub fn list_atlas_sprites(atlas: &AtlasDescription, bins: &[RgbaImage]) -> Result<Vec<AtlasSprite>> {
    let mut out = Vec::with_capacity(atlas.sprite_count());
    for (index, bin) in atlas.bins.iter().enumerate() {
        let image = bins.get(index).ok_or(AtlasError::BinOutOfRange {
            bin: index,
            bins: bins.len(),
        })?;
        for sprite in &bin.sprites {
            let r = sprite.rect;
            if r.x + r.w > image.width() || r.y + r.h > image.height() {
                return Err(AtlasError::PixelSizeMismatch {
                    name: sprite.name.clone(),
                    expected: (bin.width, bin.height),
                    actual: image.dimensions(),
                });
            }
            out.push(AtlasSprite {
                placed: sprite.clone(),
                quality: bin.quality,
                transparent: bin.transparent,
                image: imageops::crop_imm(image, r.x, r.y, r.w, r.h).to_image(),
            });
        }
    }
    Ok(out)
}
