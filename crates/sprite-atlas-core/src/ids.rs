//! Atlas and sprite identifiers.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::{Mutex, OnceLock};

use rand::Rng;

use crate::error::{AtlasError, Result};
use crate::model::AtlasBin;

/// Valid sprite ids: `[1, 65535)`.
pub const SPRITE_ID_RANGE: Range<u16> = 1..u16::MAX;

fn issued_atlas_ids() -> &'static Mutex<HashSet<u32>> {
    static ISSUED: OnceLock<Mutex<HashSet<u32>>> = OnceLock::new();
    ISSUED.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Returns a random atlas id in `[1, i32::MAX)` not handed out before in this process.
pub fn generate_atlas_id() -> u32 {
    let mut issued = issued_atlas_ids()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut rng = rand::thread_rng();
    loop {
        let id = rng.gen_range(1..i32::MAX as u32);
        if issued.insert(id) {
            return id;
        }
    }
}

/// Marks an existing atlas id as taken so `generate_atlas_id` never returns it.
pub fn reserve_atlas_id(id: u32) {
    issued_atlas_ids()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(id);
}

/// Makes every sprite id in `bins` unique and valid.
///
/// Walking sprites in bin order, the first sprite holding a valid id keeps it. Later
/// duplicates and out-of-range ids (including 0, "unassigned") are given the lowest unused id.
pub fn assign_sprite_ids(bins: &mut [AtlasBin]) -> Result<()> {
    let mut used: HashSet<u16> = HashSet::new();
    let mut pending: Vec<(usize, usize)> = Vec::new();
    for (b, bin) in bins.iter().enumerate() {
        for (s, sprite) in bin.sprites.iter().enumerate() {
            if !(SPRITE_ID_RANGE.contains(&sprite.id) && used.insert(sprite.id)) {
                pending.push((b, s));
            }
        }
    }

    let mut ids = SPRITE_ID_RANGE.filter(|id| !used.contains(id));
    let count = used.len() + pending.len();
    for (b, s) in pending {
        let id = ids.next().ok_or(AtlasError::TooManySprites {
            count,
            limit: SPRITE_ID_RANGE.len(),
        })?;
        bins[b].sprites[s].id = id;
    }
    Ok(())
}
