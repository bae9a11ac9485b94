use rand::{Rng, SeedableRng};
use sprite_atlas_core::model::{Area, Rect};
use sprite_atlas_core::packer::PackAlgorithm;
use sprite_atlas_core::packer::skyline::{SkylinePacker, SkylineSegment};

fn seg(from: u32, to: u32, height: u32) -> SkylineSegment {
    SkylineSegment { from, to, height }
}

fn disjoint(rects: &[Rect]) -> bool {
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if rects[i].overlaps(&rects[j]) {
                return false;
            }
        }
    }
    true
}

fn contiguous(p: &SkylinePacker) -> bool {
    let segs = p.segments();
    segs.first().map(|s| s.from) == Some(0)
        && segs.last().map(|s| s.to + 1) == Some(p.bin().width)
        && segs.windows(2).all(|w| w[0].to + 1 == w[1].from)
}

#[test]
fn starts_with_one_flat_segment() {
    let p = SkylinePacker::new(Area::new(64, 32), 0);
    assert_eq!(p.segments(), &[seg(0, 63, 0)]);
    assert!(p.patches().is_empty());
}

#[test]
fn picks_lowest_top_then_leftmost() {
    let mut p = SkylinePacker::new(Area::new(256, 128), 0);
    assert_eq!(p.pack(Area::new(200, 10)), Some(Rect::new(0, 0, 200, 10)));
    assert_eq!(p.pack(Area::new(100, 50)), Some(Rect::new(0, 10, 100, 50)));
    // (100..199) would top out at 60, (200..255) at 50
    assert_eq!(p.pack(Area::new(50, 50)), Some(Rect::new(200, 0, 50, 50)));
    assert_eq!(
        p.segments(),
        &[seg(0, 99, 60), seg(100, 199, 10), seg(200, 249, 50), seg(250, 255, 0)]
    );
    assert!(p.patches().is_empty());
}

#[test]
fn equal_tops_prefer_leftmost() {
    let mut p = SkylinePacker::new(Area::new(32, 32), 0);
    assert_eq!(p.pack(Area::new(16, 16)), Some(Rect::new(0, 0, 16, 16)));
    assert_eq!(p.pack(Area::new(16, 16)), Some(Rect::new(16, 0, 16, 16)));
    assert_eq!(p.pack(Area::new(16, 16)), Some(Rect::new(0, 16, 16, 16)));
}

#[test]
fn spanning_a_step_records_a_patch() {
    let mut p = SkylinePacker::new(Area::new(64, 64), 0);
    p.pack(Area::new(32, 16)).unwrap();
    let r = p.pack(Area::new(48, 8)).unwrap();
    assert_eq!(r, Rect::new(0, 16, 48, 8));
    assert_eq!(p.patches(), &[Rect::new(32, 0, 16, 16)]);
    assert_eq!(p.segments(), &[seg(0, 47, 24), seg(48, 63, 0)]);

    let taken = p.take_patches();
    assert_eq!(taken.len(), 1);
    assert!(p.patches().is_empty());
}

#[test]
fn span_height_is_the_max_over_all_segments() {
    let mut p = SkylinePacker::new(Area::new(64, 64), 0);
    p.pack(Area::new(16, 8)).unwrap();
    p.pack(Area::new(16, 30)).unwrap(); // lands right of the first
    p.pack(Area::new(16, 4)).unwrap();
    // a 64-wide item must clear the 30-high middle segment
    let r = p.pack(Area::new(64, 10)).unwrap();
    assert_eq!(r.y, 30);
    assert!(p.patches().iter().all(|patch| patch.bottom() < 30));
}

#[test]
fn fails_when_no_span_fits() {
    let mut p = SkylinePacker::new(Area::new(32, 32), 0);
    assert!(p.pack(Area::new(33, 1)).is_none());
    assert!(p.pack(Area::new(32, 32)).is_some());
    assert!(p.pack(Area::new(1, 1)).is_none());
}

#[test]
fn padding_reserves_space_right_and_below() {
    let mut p = SkylinePacker::new(Area::new(64, 64), 2);
    assert_eq!(p.pack(Area::new(10, 10)), Some(Rect::new(0, 0, 10, 10)));
    assert_eq!(p.segments()[0], seg(0, 11, 12));
    assert_eq!(p.pack(Area::new(10, 10)), Some(Rect::new(12, 0, 10, 10)));
}

#[test]
fn padding_is_clamped_to_the_bin() {
    let mut p = SkylinePacker::new(Area::new(32, 32), 4);
    assert_eq!(p.pack(Area::new(30, 30)), Some(Rect::new(0, 0, 30, 30)));
    assert_eq!(p.segments(), &[seg(0, 31, 32)]);
}

#[test]
fn extend_width_appends_a_ground_segment() {
    let mut p = SkylinePacker::new(Area::new(32, 32), 0);
    p.pack(Area::new(32, 10)).unwrap();
    p.extend(Area::new(64, 32));
    assert_eq!(p.segments(), &[seg(0, 31, 10), seg(32, 63, 0)]);
    assert_eq!(p.pack(Area::new(32, 32)), Some(Rect::new(32, 0, 32, 32)));
}

#[test]
fn extend_height_adds_headroom_only() {
    let mut p = SkylinePacker::new(Area::new(32, 32), 0);
    p.pack(Area::new(32, 32)).unwrap();
    assert!(p.pack(Area::new(32, 32)).is_none());
    p.extend(Area::new(32, 64));
    assert_eq!(p.segments().len(), 1);
    assert_eq!(p.pack(Area::new(32, 32)), Some(Rect::new(0, 32, 32, 32)));
}

#[test]
fn extend_never_shrinks() {
    let mut p = SkylinePacker::new(Area::new(64, 64), 0);
    p.extend(Area::new(32, 32));
    assert_eq!(p.bin(), Area::new(64, 64));
    assert_eq!(p.segments(), &[seg(0, 63, 0)]);
}

#[test]
fn random_padded_placements_stay_disjoint() {
    let pad = 2;
    let bin = Area::new(256, 256);
    let mut p = SkylinePacker::new(bin, pad);
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let mut padded = Vec::new();
    for _ in 0..400 {
        let a = Area::new(rng.gen_range(4..=24), rng.gen_range(4..=24));
        if let Some(r) = p.pack(a) {
            assert_eq!((r.w, r.h), (a.width, a.height));
            assert!(r.x + r.w + pad <= bin.width && r.y + r.h + pad <= bin.height);
            padded.push(Rect::new(r.x, r.y, r.w + pad, r.h + pad));
        }
        assert!(contiguous(&p));
    }
    assert!(padded.len() > 50);
    assert!(disjoint(&padded));
    // patches are free space
    for patch in p.patches() {
        assert!(padded.iter().all(|r| !r.overlaps(patch)));
    }
}
