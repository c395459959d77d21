use std::io;

use thiserror::Error;

/// Errors raised while building or validating a scene.
///
/// These are all fatal; they are reported before any ray is cast.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The eye point and the target point coincide.
    #[error("camera `from` and `to` points coincide; no line of sight")]
    DegenerateView,

    /// Up, Over and the line of sight do not span three dimensions.
    #[error("camera up, over and line-of-sight vectors are not orthogonal ({0} basis vector vanished)")]
    NotOrthogonal(&'static str),

    #[error("directional light has a zero-length direction")]
    ZeroLightDirection,

    /// The vertices of a primitive do not span its hyperplane or plane.
    #[error("degenerate {0}: vertices do not span a valid hyperplane")]
    DegeneratePrimitive(&'static str),

    #[error("sphere radius must be positive (got {0})")]
    NonPositiveRadius(f64),

    #[error("index of refraction must be positive (got {0})")]
    NonPositiveIndexOfRefraction(f64),

    #[error("field of view must lie strictly between 0 and 180 degrees (got {0})")]
    InvalidAngle(f64),

    #[error("resolution must lie between 1 and 65536 along every axis (got {0:?})")]
    InvalidResolution([usize; 3]),

    #[error("aspect ratio must be non-zero along every axis (got {0:?})")]
    ZeroAspect([u16; 3]),

    /// A render region that does not fit inside the resolution.
    #[error("render region {start:?}..={end:?} lies outside resolution {resolution:?}")]
    InvalidRegion { start: [usize; 3], end: [usize; 3], resolution: [usize; 3] },

    #[error("object refers to unknown attributes `{0}`")]
    UnknownAttributes(String),

    #[error("failed to read scene file")]
    Io(#[from] io::Error),

    #[error("failed to parse scene description")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while decoding a scanline image.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("not a 4D ray tracer image (magic {0:#010x})")]
    BadMagic(u32),

    #[error("unsupported image version {0}")]
    UnsupportedVersion(u8),

    #[error("unsupported pixel depth of {0} bits")]
    UnsupportedBitsPerPixel(u8),

    #[error("image region {first:?}..={last:?} is empty")]
    EmptyRegion { first: [u16; 3], last: [u16; 3] },

    /// The region holds more pixels than this platform can address.
    #[error("image region {first:?}..={last:?} is too large")]
    TooLarge { first: [u16; 3], last: [u16; 3] },

    #[error("image I/O failed")]
    Io(#[from] io::Error),
}
