use image::RgbaImage;
use sprite_atlas_core::prelude::*;

fn setting(max: u32) -> PackSetting {
    PackSetting::builder().max_atlas_size(max).padding(0).build()
}

#[test]
fn test_pack_stats_basic() {
    // 4 sprites of 64x64 each
    let sprites: Vec<ImageSprite> = (0..4)
        .map(|i| ImageSprite::new(format!("tex_{}", i), RgbaImage::new(64, 64)))
        .collect();

    let result = pack_images(&sprites, setting(256)).expect("packing should succeed");
    let stats = result.stats();

    assert_eq!(stats.num_sprites, 4);
    assert_eq!(stats.num_bins, 1);
    assert_eq!(stats.used_sprite_area, 4 * 64 * 64);
    // 2x2 grid, tight bin
    assert_eq!(stats.total_bin_area, 128 * 128);
    assert!((stats.occupancy - 1.0).abs() < 1e-9);
    assert_eq!(stats.wasted_area(), 0);
    assert_eq!((stats.max_bin_width, stats.max_bin_height), (128, 128));
}

#[test]
fn test_pack_stats_waste() {
    let sprites = vec![SpriteDesc::new("a", 30, 30)];
    let pot = PackSetting::builder().max_atlas_size(256).pow2(true).padding(0).build();
    let stats = pack_layout(&sprites, pot).unwrap().stats();
    assert_eq!(stats.total_bin_area, 32 * 32);
    assert_eq!(stats.wasted_area(), 32 * 32 - 30 * 30);
    let expected = (32.0 * 32.0 - 900.0) / (32.0 * 32.0) * 100.0;
    assert!((stats.waste_percentage() - expected).abs() < 1e-9);
}

#[test]
fn test_pack_stats_empty() {
    let sprites: Vec<SpriteDesc> = Vec::new();
    let stats = pack_layout(&sprites, setting(64)).unwrap().stats();
    assert_eq!(stats.num_bins, 0);
    assert_eq!(stats.occupancy, 0.0);
    assert_eq!(stats.waste_percentage(), 0.0);
}

#[test]
fn test_pack_stats_summary() {
    let sprites: Vec<SpriteDesc> = (0..3).map(|i| SpriteDesc::new(format!("s{i}"), 10, 10)).collect();
    let stats = pack_layout(&sprites, setting(64)).unwrap().stats();
    let summary = stats.summary();
    assert!(summary.contains("Bins: 1"));
    assert!(summary.contains("Sprites: 3"));
    assert!(summary.contains("Occupancy:"));
}

#[test]
fn test_atlas_queries() {
    let sprites = vec![
        SpriteDesc::new("ui/button_ok", 20, 10),
        SpriteDesc::new("ui/Button_Cancel", 20, 10),
        SpriteDesc::new("hero/idle", 40, 40).with_quality(QualityTier::Normal),
    ];
    let atlas = pack_layout(&sprites, setting(256)).unwrap();
    assert_eq!(atlas.sprite_count(), 3);
    assert_eq!(atlas.sprites().count(), 3);

    let found = atlas.search_sprites("BUTTON");
    assert_eq!(found.len(), 2);
    assert!(atlas.search_sprites("villain").is_empty());

    // Normal sorts before Full, so the hero owns bin 0
    assert_eq!(atlas.index_of("hero/idle"), Some((0, 0)));
    assert_eq!(atlas.index_of("ui/button_ok").map(|(bin, _)| bin), Some(1));
    assert_eq!(atlas.index_of("missing"), None);

    let hero_bin = &atlas.bins[0];
    assert!(hero_bin.find_sprite("hero/idle").is_some());
    assert_eq!(hero_bin.display_name("atlas_0"), "atlas_0  [64x64]  [normal]");
    assert_eq!(hero_bin.max_texture_size(), 64);
}

#[test]
fn test_atlas_serializes() {
    let atlas = pack_layout(&[SpriteDesc::new("a", 8, 8)], setting(64)).unwrap();
    let json = serde_json::to_string(&atlas).unwrap();
    let back: AtlasDescription = serde_json::from_str(&json).unwrap();
    assert_eq!(back, atlas);
    assert!(json.contains("\"quality\":\"full\""));
}
