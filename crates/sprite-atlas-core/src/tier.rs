//! Quality tiers and the table that maps each tier to its packing constraints.
//!
//! Sprites sharing a `(tier, transparency)` key are packed into their own bin sequence.
//! A tier's profile can force power-of-two and square bins regardless of the global
//! `PackSetting`; the effective flags are the OR of both.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::AlgorithmKind;
use crate::error::{AtlasError, Result};

/// Named compression/format profile. Declaration order is the group order in the output.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// RGB4 with a separate 4-bit alpha plane.
    Normal,
    /// Platform-native compressed RGBA (DXT5 / RGBA16 / ETC2-RGBA8).
    Legacy,
    /// RGB16 with a separate alpha plane.
    Half,
    /// Uncompressed RGBA32 / RGB24.
    #[default]
    Full,
    /// Compressed RGB with alpha split into an additional texture.
    AlphaSplit,
}

impl QualityTier {
    pub const ALL: [QualityTier; 5] = [
        QualityTier::Normal,
        QualityTier::Legacy,
        QualityTier::Half,
        QualityTier::Full,
        QualityTier::AlphaSplit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Normal => "normal",
            QualityTier::Legacy => "legacy",
            QualityTier::Half => "half",
            QualityTier::Full => "full",
            QualityTier::AlphaSplit => "alpha_split",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "legacy" => Ok(Self::Legacy),
            "half" | "rgb16a4" => Ok(Self::Half),
            "full" => Ok(Self::Full),
            "alpha_split" | "alphasplit" => Ok(Self::AlphaSplit),
            _ => Err(()),
        }
    }
}

/// Packing constraints attached to a quality tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierProfile {
    pub force_power_of_two: bool,
    pub force_square: bool,
    /// Single-bin algorithm used for this tier's bins.
    pub algorithm: AlgorithmKind,
}

impl TierProfile {
    /// No constraints beyond the global setting.
    pub const fn unconstrained() -> Self {
        Self {
            force_power_of_two: false,
            force_square: false,
            algorithm: AlgorithmKind::AdvancedHorizontalSkyline,
        }
    }

    /// Power-of-two square bins (block-compressed formats need them).
    pub const fn pot_square() -> Self {
        Self {
            force_power_of_two: true,
            force_square: true,
            algorithm: AlgorithmKind::AdvancedHorizontalSkyline,
        }
    }
}

/// Explicit tier → profile table.
#[derive(Debug, Clone, Default)]
pub struct TierRegistry {
    profiles: BTreeMap<QualityTier, TierProfile>,
}

impl TierRegistry {
    /// An empty registry. Every tier used by the input must be registered before packing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in profile for every tier.
    pub fn builtin() -> Self {
        Self::new()
            .with(QualityTier::Normal, TierProfile::pot_square())
            .with(QualityTier::Legacy, TierProfile::unconstrained())
            .with(QualityTier::Half, TierProfile::pot_square())
            .with(QualityTier::Full, TierProfile::unconstrained())
            .with(QualityTier::AlphaSplit, TierProfile::pot_square())
    }

    /// Registers (or replaces) the profile for `tier`.
    pub fn register(&mut self, tier: QualityTier, profile: TierProfile) -> Option<TierProfile> {
        self.profiles.insert(tier, profile)
    }

    pub fn with(mut self, tier: QualityTier, profile: TierProfile) -> Self {
        self.register(tier, profile);
        self
    }

    pub fn profile(&self, tier: QualityTier) -> Result<&TierProfile> {
        self.profiles
            .get(&tier)
            .ok_or(AtlasError::UnregisteredTier(tier))
    }

    pub fn contains(&self, tier: QualityTier) -> bool {
        self.profiles.contains_key(&tier)
    }
}
