use sprite_atlas_core::config::{ATLAS_SIZE_LADDER, AlgorithmKind, PackSetting, scale_to_pot};
use sprite_atlas_core::error::AtlasError;
use sprite_atlas_core::tier::QualityTier;
use sprite_atlas_core::{SpriteDesc, pack_layout};

/// Test a max size that is not on the ladder
#[test]
fn test_max_size_off_ladder() {
    let setting = PackSetting {
        max_atlas_size: 1000,
        ..Default::default()
    };

    let result = setting.validate();
    match result {
        Err(AtlasError::InvalidConfig(msg)) => {
            assert!(msg.contains("1000"));
        }
        _ => panic!("Expected InvalidConfig error"),
    }
}

#[test]
fn test_every_ladder_size_is_valid() {
    for size in ATLAS_SIZE_LADDER {
        let setting = PackSetting::builder().max_atlas_size(size).padding(0).build();
        assert!(setting.validate().is_ok(), "{size}");
    }
}

/// Padding that leaves no room at all
#[test]
fn test_padding_fills_bin() {
    let setting = PackSetting::builder().max_atlas_size(32).padding(32).build();
    assert!(matches!(setting.validate(), Err(AtlasError::InvalidConfig(_))));
}

#[test]
fn test_invalid_setting_fails_packing() {
    let setting = PackSetting::builder().max_atlas_size(100).build();
    let result = pack_layout(&[SpriteDesc::new("a", 1, 1)], setting);
    assert!(matches!(result, Err(AtlasError::InvalidConfig(_))));
}

#[test]
fn test_default_setting() {
    let setting = PackSetting::default();
    assert_eq!(setting.max_atlas_size, 1024);
    assert_eq!(setting.padding, 1);
    assert!(!setting.power_of_two);
    assert!(!setting.force_square);
    assert!(setting.validate().is_ok());
}

/// Zero-sized sprites cannot be placed
#[test]
fn test_zero_sized_sprite() {
    let result = pack_layout(&[SpriteDesc::new("empty", 0, 8)], PackSetting::default());
    match result {
        Err(AtlasError::EmptySprite { name }) => assert_eq!(name, "empty"),
        _ => panic!("Expected EmptySprite error"),
    }
}

/// A sprite exactly the max size still fits, padding is clamped to the bin
#[test]
fn test_sprite_exactly_max_size() {
    let setting = PackSetting::builder().max_atlas_size(64).padding(4).build();
    let sprites = vec![SpriteDesc::new("full", 64, 64), SpriteDesc::new("next", 64, 64)];
    let atlas = pack_layout(&sprites, setting).expect("pack");
    assert_eq!(atlas.bins.len(), 2);
    for bin in &atlas.bins {
        assert_eq!((bin.width, bin.height), (64, 64));
    }
}

#[test]
fn test_sprite_one_pixel_too_wide() {
    let setting = PackSetting::builder().max_atlas_size(64).build();
    let result = pack_layout(&[SpriteDesc::new("wide", 65, 1)], setting);
    assert!(matches!(result, Err(AtlasError::SpriteTooLarge { width: 65, .. })));
}

#[test]
fn test_smallest_ladder_size() {
    let setting = PackSetting::builder().max_atlas_size(32).padding(0).build();
    let sprites: Vec<SpriteDesc> = (0..8).map(|i| SpriteDesc::new(format!("t{i}"), 16, 16)).collect();
    let atlas = pack_layout(&sprites, setting).expect("pack");
    assert_eq!(atlas.bins.len(), 2);
    assert!(atlas.bins.iter().all(|b| b.sprites.len() == 4));
}

#[test]
fn test_scale_to_pot() {
    assert_eq!(scale_to_pot(0), 32);
    assert_eq!(scale_to_pot(32), 32);
    assert_eq!(scale_to_pot(33), 64);
    assert_eq!(scale_to_pot(1000), 1024);
    assert_eq!(scale_to_pot(9000), 4096);
}

#[test]
fn test_enum_parsing() {
    assert_eq!("skyline".parse(), Ok(AlgorithmKind::HorizontalSkyline));
    assert_eq!("Slice".parse(), Ok(AlgorithmKind::RectangleSlice));
    assert_eq!(
        "advanced_horizontal_skyline".parse(),
        Ok(AlgorithmKind::AdvancedHorizontalSkyline)
    );
    assert!("maxrects".parse::<AlgorithmKind>().is_err());

    for tier in QualityTier::ALL {
        assert_eq!(tier.to_string().parse(), Ok(tier));
    }
    assert!("ultra".parse::<QualityTier>().is_err());
}

#[test]
fn test_setting_serde_defaults() {
    let setting: PackSetting = serde_json::from_str("{}").unwrap();
    assert_eq!(setting, PackSetting::default());
    let setting: PackSetting =
        serde_json::from_str(r#"{"max_atlas_size":256,"force_square":true}"#).unwrap();
    assert_eq!(setting.max_atlas_size, 256);
    assert_eq!(setting.padding, 1);
    assert!(setting.force_square);
}
