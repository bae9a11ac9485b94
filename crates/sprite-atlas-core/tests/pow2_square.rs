use rand::{Rng, SeedableRng};
use sprite_atlas_core::prelude::*;

fn is_pow2(v: u32) -> bool {
    v != 0 && (v & (v - 1)) == 0
}

fn max_content_extents(bin: &AtlasBin) -> (u32, u32) {
    let mut w = 0u32;
    let mut h = 0u32;
    for s in &bin.sprites {
        w = w.max(s.rect.right() + 1);
        h = h.max(s.rect.bottom() + 1);
    }
    (w, h)
}

#[test]
fn pow2_keeps_power_of_two_bins() {
    let setting = PackSetting::builder()
        .max_atlas_size(512)
        .padding(4)
        .pow2(true)
        .build();
    let sprites = vec![
        SpriteDesc::new("a", 64, 32),
        SpriteDesc::new("b", 40, 80),
        SpriteDesc::new("c", 10, 10),
    ];
    let atlas = pack_layout(&sprites, setting).expect("pack");
    assert_eq!(atlas.bins.len(), 1);
    let bin = &atlas.bins[0];
    let (min_w, min_h) = max_content_extents(bin);
    assert!(is_pow2(bin.width));
    assert!(is_pow2(bin.height));
    assert!(bin.width >= min_w && bin.height >= min_h);
    assert!(atlas.power_of_two);
}

#[test]
fn square_keeps_square_bins() {
    let setting = PackSetting::builder()
        .max_atlas_size(256)
        .padding(2)
        .square(true)
        .build();
    let sprites = vec![SpriteDesc::new("a", 120, 16), SpriteDesc::new("b", 40, 40)];
    let atlas = pack_layout(&sprites, setting).expect("pack");
    let bin = &atlas.bins[0];
    assert_eq!(bin.width, bin.height);
    let (min_w, min_h) = max_content_extents(bin);
    assert!(bin.width >= min_w.max(min_h));
}

#[test]
fn tier_forces_pow2_square() {
    let setting = PackSetting::builder().max_atlas_size(512).padding(0).build();
    let sprites = vec![
        SpriteDesc::new("x", 123, 77).with_quality(QualityTier::AlphaSplit),
        SpriteDesc::new("y", 200, 20).with_quality(QualityTier::AlphaSplit),
    ];
    let atlas = pack_layout(&sprites, setting).expect("pack");
    let bin = &atlas.bins[0];
    assert_eq!(bin.width, bin.height);
    assert!(is_pow2(bin.width));
    let (min_w, min_h) = max_content_extents(bin);
    assert!(bin.width >= min_w.max(min_h));
    // global flags are not rewritten by the tier
    assert!(!atlas.power_of_two && !atlas.force_square);
}

#[test]
fn tight_bins_round_up_to_multiple_of_four() {
    let setting = PackSetting::builder().max_atlas_size(256).padding(0).build();
    let atlas = pack_layout(&[SpriteDesc::new("odd", 13, 7)], setting).expect("pack");
    let bin = &atlas.bins[0];
    assert_eq!((bin.width, bin.height), (16, 8));
    assert_eq!(bin.max_texture_size(), 32);
}

#[test]
fn random_no_overlap_pow2_square() {
    let setting = PackSetting::builder()
        .max_atlas_size(512)
        .padding(1)
        .pow2(true)
        .square(true)
        .build();
    let mut rng = rand::rngs::StdRng::seed_from_u64(2024);
    let sprites: Vec<SpriteDesc> = (0..200u32)
        .map(|i| SpriteDesc::new(format!("r{}", i), rng.gen_range(1..=64), rng.gen_range(1..=64)))
        .collect();
    let atlas = pack_layout(&sprites, setting).expect("pack");
    for bin in &atlas.bins {
        // no overlap between placed sprites
        for i in 0..bin.sprites.len() {
            for j in (i + 1)..bin.sprites.len() {
                let a = &bin.sprites[i].rect;
                let b = &bin.sprites[j].rect;
                assert!(!a.overlaps(b), "sprites overlap: {:?} vs {:?}", a, b);
            }
        }
        // within bin bounds
        for s in &bin.sprites {
            assert!(s.rect.right() < bin.width);
            assert!(s.rect.bottom() < bin.height);
        }
        assert_eq!(bin.width, bin.height);
        assert!(is_pow2(bin.width));
    }
}
