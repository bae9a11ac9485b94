use thiserror::Error;

use crate::tier::QualityTier;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Sprites in excess of {limit}: got {count}")]
    TooManySprites { count: usize, limit: usize },
    #[error("Sprite `{name}` has an empty size")]
    EmptySprite { name: String },
    #[error("Sprite `{name}` is {width}x{height}, size should be lower than {max_size}")]
    SpriteTooLarge {
        name: String,
        width: u32,
        height: u32,
        max_size: u32,
    },
    #[error("Cannot pack sprite `{name}` ({width}x{height}) into a bin of at most {max_size}x{max_size}")]
    PackImpossible {
        name: String,
        width: u32,
        height: u32,
        max_size: u32,
    },
    #[error("No profile registered for quality tier `{0}`")]
    UnregisteredTier(QualityTier),
    #[error("Pixel data for `{name}` is {}x{}, expected {}x{}", .actual.0, .actual.1, .expected.0, .expected.1)]
    PixelSizeMismatch {
        name: String,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("Bin index {bin} out of range ({bins} bins)")]
    BinOutOfRange { bin: usize, bins: usize },
    #[error("Packing cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, AtlasError>;
