use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use image::RgbaImage;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::allocator::{Allocation, GroupSetting, allocate};
use crate::compositing::{BinCanvas, RgbaCanvas};
use crate::config::{MAX_SPRITES_PER_ATLAS, PackSetting};
use crate::error::{AtlasError, Result};
use crate::ids::{assign_sprite_ids, generate_atlas_id, reserve_atlas_id};
use crate::model::{Area, AtlasBin, AtlasDescription, PackStats, PlacedSprite};
use crate::tier::{QualityTier, TierRegistry};

/// A sprite to be packed.
///
/// Everything but `read` is consulted during layout; `read` is called once per sprite,
/// only when its pixels are copied into a bin.
pub trait SpriteSource {
    fn name(&self) -> &str;
    fn size(&self) -> Area;
    fn quality(&self) -> QualityTier {
        QualityTier::Full
    }
    fn transparent(&self) -> bool {
        true
    }
    /// Nine-slice border (left, bottom, right, top).
    fn border(&self) -> [f32; 4] {
        [0.0; 4]
    }
    fn pivot(&self) -> [f32; 2] {
        [0.5, 0.5]
    }
    /// Previously assigned id, kept when still unique.
    fn id(&self) -> Option<u16> {
        None
    }
    fn read(&self) -> Result<Cow<'_, RgbaImage>>;
}

/// Layout-only sprite description. Reading it yields a transparent image of its size.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub quality: QualityTier,
    pub transparent: bool,
    pub border: [f32; 4],
    pub pivot: [f32; 2],
    pub id: Option<u16>,
}

impl SpriteDesc {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            quality: QualityTier::default(),
            transparent: true,
            border: [0.0; 4],
            pivot: [0.5, 0.5],
            id: None,
        }
    }
    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }
    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }
    pub fn with_id(mut self, id: u16) -> Self {
        self.id = Some(id);
        self
    }
    pub fn with_border(mut self, border: [f32; 4]) -> Self {
        self.border = border;
        self
    }
    pub fn with_pivot(mut self, pivot: [f32; 2]) -> Self {
        self.pivot = pivot;
        self
    }
}

impl SpriteSource for SpriteDesc {
    fn name(&self) -> &str {
        &self.name
    }
    fn size(&self) -> Area {
        Area::new(self.width, self.height)
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
        Ok(Cow::Owned(RgbaImage::new(self.width, self.height)))
    }
}

/// Output of [`pack_images`]: atlas metadata and one RGBA image per bin.
pub struct PackOutput {
    pub atlas: AtlasDescription,
    pub bins: Vec<RgbaImage>,
}

impl PackOutput {
    /// Convenience for `atlas.stats()`.
    pub fn stats(&self) -> PackStats {
        self.atlas.stats()
    }
}

/// Groups, places and identifies sprites.
#[derive(Debug, Clone)]
pub struct AtlasPacker {
    setting: PackSetting,
    registry: TierRegistry,
}

struct Entry {
    source: usize,
    name: String,
    size: Area,
}

struct GroupJob {
    tier: QualityTier,
    transparent: bool,
    setting: GroupSetting,
    entries: Vec<Entry>,
}

/// Bins with unidentified sprites, and the source index behind every sprite slot.
struct Plan {
    bins: Vec<AtlasBin>,
    sources: Vec<Vec<usize>>,
}

impl AtlasPacker {
    /// Packer using the built-in tier registry.
    pub fn new(setting: PackSetting) -> Self {
        Self {
            setting,
            registry: TierRegistry::builtin(),
        }
    }

    /// Packer configured like `previous` was.
    pub fn for_atlas(previous: &AtlasDescription) -> Self {
        Self::new(PackSetting::new(
            previous.max_size,
            previous.padding,
            previous.power_of_two,
            previous.force_square,
        ))
    }

    pub fn with_registry(mut self, registry: TierRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn setting(&self) -> &PackSetting {
        &self.setting
    }

    pub fn registry(&self) -> &TierRegistry {
        &self.registry
    }

    /// Computes bins and placements without touching pixels.
    #[instrument(skip_all, fields(sprites = sprites.len()))]
    pub fn layout<S: SpriteSource>(&self, sprites: &[S]) -> Result<AtlasDescription> {
        let plan = self.plan(sprites, None)?;
        self.finish(plan.bins, generate_atlas_id())
    }

    /// Lays out `sprites` and copies their pixels into `canvas`.
    #[instrument(skip_all, fields(sprites = sprites.len()))]
    pub fn pack<S, C>(&self, sprites: &[S], canvas: &mut C) -> Result<AtlasDescription>
    where
        S: SpriteSource,
        C: BinCanvas,
    {
        let plan = self.plan(sprites, None)?;
        composite(&plan, sprites, canvas)?;
        self.finish(plan.bins, generate_atlas_id())
    }

    /// Packs `sprites` as a new version of `previous`, keeping its atlas id and the ids
    /// of sprites it already contained (matched by name when a source carries no id).
    #[instrument(skip_all, fields(atlas = previous.id, sprites = sprites.len()))]
    pub fn repack<S, C>(
        &self,
        previous: &AtlasDescription,
        sprites: &[S],
        canvas: &mut C,
    ) -> Result<AtlasDescription>
    where
        S: SpriteSource,
        C: BinCanvas,
    {
        let plan = self.plan(sprites, Some(previous))?;
        composite(&plan, sprites, canvas)?;
        reserve_atlas_id(previous.id);
        self.finish(plan.bins, previous.id)
    }

    fn plan<S: SpriteSource>(
        &self,
        sprites: &[S],
        previous: Option<&AtlasDescription>,
    ) -> Result<Plan> {
        if sprites.len() > MAX_SPRITES_PER_ATLAS {
            return Err(AtlasError::TooManySprites {
                count: sprites.len(),
                limit: MAX_SPRITES_PER_ATLAS,
            });
        }
        self.setting.validate()?;

        let max = self.setting.max_atlas_size;
        let mut groups: BTreeMap<(QualityTier, bool), Vec<Entry>> = BTreeMap::new();
        for (source, sprite) in sprites.iter().enumerate() {
            let name = normalize_name(sprite.name());
            let size = sprite.size();
            if size.width == 0 || size.height == 0 {
                return Err(AtlasError::EmptySprite { name });
            }
            if size.width > max || size.height > max {
                return Err(AtlasError::SpriteTooLarge {
                    name,
                    width: size.width,
                    height: size.height,
                    max_size: max,
                });
            }
            groups
                .entry((sprite.quality(), sprite.transparent()))
                .or_default()
                .push(Entry { source, name, size });
        }

        let mut jobs = Vec::with_capacity(groups.len());
        for ((tier, transparent), mut entries) in groups {
            let profile = self.registry.profile(tier)?;
            entries.sort_by(placement_order);
            jobs.push(GroupJob {
                tier,
                transparent,
                setting: GroupSetting::resolve(&self.setting, profile),
                entries,
            });
        }
        let allocations = allocate_groups(&jobs)?;

        let previous_ids: HashMap<&str, u16> = previous
            .map(|atlas| atlas.sprites().map(|s| (s.name.as_str(), s.id)).collect())
            .unwrap_or_default();

        let mut bins: Vec<AtlasBin> = Vec::new();
        let mut sources: Vec<Vec<usize>> = Vec::new();
        for (job, allocation) in jobs.iter().zip(allocations) {
            let offset = bins.len();
            for size in &allocation.bins {
                bins.push(AtlasBin {
                    width: size.width,
                    height: size.height,
                    quality: job.tier,
                    transparent: job.transparent,
                    sprites: Vec::new(),
                });
                sources.push(Vec::new());
            }
            for (entry, (bin, rect)) in job.entries.iter().zip(allocation.placements) {
                let sprite = &sprites[entry.source];
                let index = offset + bin;
                let id = sprite
                    .id()
                    .or_else(|| previous_ids.get(entry.name.as_str()).copied())
                    .unwrap_or(0);
                bins[index].sprites.push(PlacedSprite {
                    name: entry.name.clone(),
                    id,
                    bin: index,
                    rect,
                    border: sprite.border(),
                    pivot: sprite.pivot(),
                });
                sources[index].push(entry.source);
            }
        }
        debug!(groups = jobs.len(), bins = bins.len(), "layout complete");
        Ok(Plan { bins, sources })
    }

    fn finish(&self, mut bins: Vec<AtlasBin>, id: u32) -> Result<AtlasDescription> {
        assign_sprite_ids(&mut bins)?;
        Ok(AtlasDescription {
            id,
            max_size: self.setting.max_atlas_size,
            padding: self.setting.padding,
            power_of_two: self.setting.power_of_two,
            force_square: self.setting.force_square,
            bins,
        })
    }
}

/// Width descending, then height descending, then name ascending.
fn placement_order(a: &Entry, b: &Entry) -> Ordering {
    b.size
        .width
        .cmp(&a.size.width)
        .then(b.size.height.cmp(&a.size.height))
        .then_with(|| a.name.cmp(&b.name))
}

fn normalize_name(name: &str) -> String {
    name.replace('\\', "/")
}

fn allocate_groups(jobs: &[GroupJob]) -> Result<Vec<Allocation>> {
    let run = |job: &GroupJob| {
        allocate(
            job.entries.iter().map(|e| (e.name.as_str(), e.size)),
            job.setting,
        )
    };
    // groups are independent; collect keeps their order either way
    #[cfg(feature = "parallel")]
    let jobs = jobs.par_iter();
    #[cfg(not(feature = "parallel"))]
    let jobs = jobs.iter();
    jobs.map(run).collect()
}

fn composite<S, C>(plan: &Plan, sprites: &[S], canvas: &mut C) -> Result<()>
where
    S: SpriteSource,
    C: BinCanvas,
{
    for (index, (bin, sources)) in plan.bins.iter().zip(&plan.sources).enumerate() {
        canvas.create_bin(index, bin)?;
        for (placed, &source) in bin.sprites.iter().zip(sources) {
            let pixels = sprites[source].read()?;
            let expected = (placed.rect.w, placed.rect.h);
            if pixels.dimensions() != expected {
                return Err(AtlasError::PixelSizeMismatch {
                    name: placed.name.clone(),
                    expected,
                    actual: pixels.dimensions(),
                });
            }
            canvas.blit(index, placed.rect, &pixels)?;
        }
    }
    Ok(())
}

/// Lays out `sprites` with the built-in tier registry; no pixels are read.
pub fn pack_layout<S: SpriteSource>(sprites: &[S], setting: PackSetting) -> Result<AtlasDescription> {
    AtlasPacker::new(setting).layout(sprites)
}

#[instrument(skip_all)]
/// Packs `sprites` into in-memory RGBA bins with the built-in tier registry.
pub fn pack_images<S: SpriteSource>(sprites: &[S], setting: PackSetting) -> Result<PackOutput> {
    let mut canvas = RgbaCanvas::new();
    let atlas = AtlasPacker::new(setting).pack(sprites, &mut canvas)?;
    Ok(PackOutput {
        atlas,
        bins: canvas.into_bins(),
    })
}
