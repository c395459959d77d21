pub mod consts;
pub mod error;

pub mod vector;
pub mod ray;
pub mod color;

pub mod material;
pub mod light;
pub mod shape;

pub mod stats;
pub mod world;
pub mod camera;

pub mod canvas;
pub mod scene;

use crate::consts::FEQ_EPSILON;

pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}
