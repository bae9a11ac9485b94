use rand::{Rng, SeedableRng};
use sprite_atlas_core::config::AlgorithmKind;
use sprite_atlas_core::model::{Area, Rect};
use sprite_atlas_core::packer::{AdvancedSkylinePacker, PackAlgorithm, create_packer};

/// Leaves a 16x16 step gap at (32, 0) in a 64x64 bin.
fn stepped() -> AdvancedSkylinePacker {
    let mut p = AdvancedSkylinePacker::new(Area::new(64, 64), 0);
    assert_eq!(p.pack(Area::new(32, 16)), Some(Rect::new(0, 0, 32, 16)));
    assert_eq!(p.pack(Area::new(48, 8)), Some(Rect::new(0, 16, 48, 8)));
    p
}

#[test]
fn patches_become_regions() {
    let p = stepped();
    assert!(p.skyline().patches().is_empty());
    let bounds: Vec<Rect> = p.regions().iter().map(|(r, _)| *r).collect();
    assert_eq!(bounds, vec![Rect::new(32, 0, 16, 16)]);
}

#[test]
fn small_item_reuses_the_patch() {
    let mut p = stepped();
    let r = p.pack(Area::new(16, 16)).unwrap();
    assert_eq!(r, Rect::new(32, 0, 16, 16));
    assert!(p.regions()[0].0.contains(&r));
    // skyline untouched by the reused placement
    assert_eq!(p.skyline().segments().len(), 2);
}

#[test]
fn several_items_share_a_region() {
    let mut p = stepped();
    let a = p.pack(Area::new(8, 8)).unwrap();
    let b = p.pack(Area::new(8, 8)).unwrap();
    let region = p.regions()[0].0;
    assert!(region.contains(&a) && region.contains(&b));
    assert!(!a.overlaps(&b));
}

#[test]
fn too_big_for_regions_falls_back_to_skyline() {
    let mut p = stepped();
    let r = p.pack(Area::new(20, 20)).unwrap();
    assert_eq!(r, Rect::new(0, 24, 20, 20));
    assert!(!p.regions()[0].0.overlaps(&r));
}

#[test]
fn extend_only_grows_the_skyline() {
    let mut p = stepped();
    p.extend(Area::new(128, 64));
    assert_eq!(p.bin(), Area::new(128, 64));
    assert_eq!(p.regions()[0].1.bin(), Area::new(16, 16));
    // leftmost span reaching the new ground level starts on the old 0-high segment
    assert_eq!(p.pack(Area::new(64, 64)), Some(Rect::new(48, 0, 64, 64)));
}

#[test]
fn all_kinds_keep_padded_placements_disjoint() {
    let pad = 2;
    let bin = Area::new(256, 256);
    for kind in [
        AlgorithmKind::HorizontalSkyline,
        AlgorithmKind::RectangleSlice,
        AlgorithmKind::AdvancedHorizontalSkyline,
    ] {
        let mut p = create_packer(kind, bin, pad);
        let mut rng = rand::rngs::StdRng::seed_from_u64(99);
        let mut padded: Vec<Rect> = Vec::new();
        for _ in 0..500 {
            let a = Area::new(rng.gen_range(4..=24), rng.gen_range(4..=24));
            if let Some(r) = p.pack(a) {
                assert!(r.x + r.w + pad <= bin.width, "{kind:?} {r:?}");
                assert!(r.y + r.h + pad <= bin.height, "{kind:?} {r:?}");
                let fp = Rect::new(r.x, r.y, r.w + pad, r.h + pad);
                for other in &padded {
                    assert!(!fp.overlaps(other), "{kind:?}: {fp:?} vs {other:?}");
                }
                padded.push(fp);
            }
        }
        assert!(padded.len() > 50, "{kind:?} placed {}", padded.len());
    }
}
