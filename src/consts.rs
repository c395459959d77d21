// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.0001;

// Degeneracy threshold for parallel rays and singular projections
pub const EPSILON: f64 = 1.0e-15;

// Vectors shorter than this (squared) cannot be normalized
pub const NORMALIZE_EPSILON: f64 = 1.0e-30;

// Closest hit accepted once a previous hit exists
pub const MINDIST: f64 = 1.0e-7;

// Distance ray origins are pushed off a surface before tracing
pub const NUDGE: f64 = 1.0e-10;

// Colors whose components sum below this count as absent
pub const COLOR_EPSILON: f64 = 1.0e-5;

// Lights transmitted with less than this total intensity are skipped
pub const MIN_LIGHT: f64 = 0.001;

// Scene defaults
pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_BITS_PER_PIXEL: u8 = 24;
pub const DEFAULT_OUT_FILE: &str = "out.r4";

// Image file format
pub const IMAGE_MAGIC: u32 = 0x5261_7934;
pub const IMAGE_VERSION: u8 = 2;

// Common refraction indices
pub const VACUUM_RI: f64 = 1.0;
pub const GLASS_RI: f64 = 1.52;
