use std::ops::{ Add, Sub, Neg, Mul, Div, Index, IndexMut };

use crate::feq;
use crate::consts::NORMALIZE_EPSILON;

/// A vector in 4-space.
///
/// Positions and displacements share one representation; `Point4D` is an
/// alias used where a value names a location rather than a direction.
///
/// Equality is approximate, component-wise, within `FEQ_EPSILON`.
#[derive(Debug, Default, Copy, Clone, PartialOrd)]
pub struct Vector4D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64
}

/// A position in 4-space.
pub type Point4D = Vector4D;

impl PartialEq for Vector4D {
    fn eq(&self, other: &Vector4D) -> bool {
        feq(self.x, other.x) &&
            feq(self.y, other.y) &&
            feq(self.z, other.z) &&
            feq(self.w, other.w)
    }
}

impl From<[f64; 4]> for Vector4D {
    fn from(v: [f64; 4]) -> Vector4D {
        Vector4D { x: v[0], y: v[1], z: v[2], w: v[3] }
    }
}

impl Vector4D {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Vector4D {
        Vector4D { x, y, z, w }
    }

    pub fn zero() -> Vector4D {
        Default::default()
    }

    pub fn norm_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    pub fn dot(&self, other: &Vector4D) -> f64 {
        self.x * other.x
            + self.y * other.y
            + self.z * other.z
            + self.w * other.w
    }

    /// Adds `scale * other` to this vector.
    pub fn add_scaled(&self, other: &Vector4D, scale: f64) -> Vector4D {
        *self + (*other * scale)
    }

    /// Divides every component by `divisor` in place.
    pub fn div_assign(&mut self, divisor: f64) {
        self.x /= divisor;
        self.y /= divisor;
        self.z /= divisor;
        self.w /= divisor;
    }

    /// Scales this vector to unit length in place.
    ///
    /// Returns `false` and leaves the vector untouched if it is too short to
    /// have a direction.
    pub fn normalize(&mut self) -> bool {
        let norm_squared = self.norm_squared();
        if norm_squared < NORMALIZE_EPSILON {
            return false;
        }

        self.div_assign(norm_squared.sqrt());
        true
    }

    /// Returns a unit-length copy, or `None` for a degenerate vector.
    pub fn normalized(&self) -> Option<Vector4D> {
        let mut unit = *self;
        if unit.normalize() {
            Some(unit)
        } else {
            None
        }
    }

    /// The generalized cross product of three vectors in 4-space.
    ///
    /// The result is orthogonal to `u`, `v` and `w`, and its length is the
    /// volume of the parallelepiped they span. Computed by cofactor expansion
    /// of the 4x4 determinant with the basis vectors in the first row.
    ///
    /// ```
    /// use ray4d::vector::Vector4D;
    ///
    /// let x = Vector4D::new(1.0, 0.0, 0.0, 0.0);
    /// let y = Vector4D::new(0.0, 1.0, 0.0, 0.0);
    /// let z = Vector4D::new(0.0, 0.0, 1.0, 0.0);
    ///
    /// assert_eq!(Vector4D::cross(&x, &y, &z), Vector4D::new(0.0, 0.0, 0.0, -1.0));
    /// ```
    pub fn cross(u: &Vector4D, v: &Vector4D, w: &Vector4D) -> Vector4D {
        let a = v.x * w.y - v.y * w.x;
        let b = v.x * w.z - v.z * w.x;
        let c = v.x * w.w - v.w * w.x;
        let d = v.y * w.z - v.z * w.y;
        let e = v.y * w.w - v.w * w.y;
        let f = v.z * w.w - v.w * w.z;

        Vector4D {
            x:   u.y * f - u.z * e + u.w * d,
            y: - u.x * f + u.z * c - u.w * b,
            z:   u.x * e - u.y * c + u.w * a,
            w: - u.x * d + u.y * b - u.z * a,
        }
    }

    /// Reflects a vector across a normal.
    pub fn reflect(&self, normal: &Vector4D) -> Vector4D {
        *self - (*normal * 2.0 * self.dot(normal))
    }

    /// Index of the component with the largest magnitude.
    pub fn dominant_axis(&self) -> usize {
        (1..4).fold(0, |best, axis| {
            if self[axis].abs() > self[best].abs() { axis } else { best }
        })
    }
}

impl Index<usize> for Vector4D {
    type Output = f64;

    fn index(&self, axis: usize) -> &f64 {
        match axis {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            3 => &self.w,
            _ => panic!("Axis {} out of range for a 4D vector.", axis),
        }
    }
}

impl IndexMut<usize> for Vector4D {
    fn index_mut(&mut self, axis: usize) -> &mut f64 {
        match axis {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            3 => &mut self.w,
            _ => panic!("Axis {} out of range for a 4D vector.", axis),
        }
    }
}

impl Add for Vector4D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
            w: self.w + other.w
        }
    }
}

impl Sub for Vector4D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            w: self.w - other.w
        }
    }
}

impl Neg for Vector4D {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: -self.w
        }
    }
}

/// Implements scalar right-multiplication for a 4D vector.
///
/// ```
/// use ray4d::vector::Vector4D;
///
/// let v = Vector4D::new(1.0, 2.0, 3.0, 4.0);
///
/// // (notice how the scalar is on the right)
/// assert_eq!(v * 5.0, Vector4D::new(5.0, 10.0, 15.0, 20.0));
/// ```
impl Mul<f64> for Vector4D {
    type Output = Self;

    fn mul(self, other: f64) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
            z: self.z * other,
            w: self.w * other
        }
    }
}

impl Mul<Vector4D> for f64 {
    type Output = Vector4D;

    fn mul(self, other: Vector4D) -> Vector4D {
        other * self
    }
}

impl Div<f64> for Vector4D {
    type Output = Self;

    fn div(mut self, other: f64) -> Self {
        self.div_assign(other);
        self
    }
}

/* Tests */

#[test]
fn add_vectors() {
    let a1 = Vector4D::new(3.0, -2.0, 5.0, 1.0);
    let a2 = Vector4D::new(-2.0, 3.0, 1.0, 0.0);

    assert_eq!(a1 + a2, Vector4D::new(1.0, 1.0, 6.0, 1.0));
}

#[test]
fn sub_vectors() {
    let p1 = Vector4D::new(3.0, 2.0, 1.0, 4.0);
    let p2 = Vector4D::new(5.0, 6.0, 7.0, 1.0);

    assert_eq!(p1 - p2, Vector4D::new(-2.0, -4.0, -6.0, 3.0));
}

#[test]
fn neg_vector() {
    let a = Vector4D::new(1.0, -2.0, 3.0, -4.0);

    assert_eq!(-a, Vector4D::new(-1.0, 2.0, -3.0, 4.0));
}

#[test]
fn add_scaled_vector() {
    let p = Vector4D::new(1.0, 1.0, 1.0, 1.0);
    let d = Vector4D::new(0.0, 0.0, 0.0, 2.0);

    assert_eq!(p.add_scaled(&d, 1.5), Vector4D::new(1.0, 1.0, 1.0, 4.0));
}

#[test]
fn norm_of_vector() {
    let v = Vector4D::new(1.0, 2.0, 2.0, 4.0);

    assert_eq!(v.norm_squared(), 25.0);
    assert_eq!(v.norm(), 5.0);
}

#[test]
fn normalize_dirty() {
    let mut v = Vector4D::new(1.0, 2.0, 2.0, 4.0);

    assert!(v.normalize());
    assert_eq!(v, Vector4D::new(0.2, 0.4, 0.4, 0.8));
    assert!(feq(v.norm(), 1.0));
}

#[test]
fn normalize_degenerate_leaves_vector() {
    let mut v = Vector4D::new(1.0e-16, 0.0, -1.0e-16, 0.0);
    let before = v;

    assert!(!v.normalize());
    assert_eq!(v.x, before.x);
    assert_eq!(v.z, before.z);
    assert!(Vector4D::zero().normalized().is_none());
}

#[test]
fn dot_vectors() {
    let a = Vector4D::new(1.0, 2.0, 3.0, 4.0);
    let b = Vector4D::new(2.0, 3.0, 4.0, 5.0);

    assert_eq!(a.dot(&b), 40.0);
}

#[test]
fn cross_is_orthogonal_to_inputs() {
    let u = Vector4D::new(1.0, 2.0, -1.0, 0.5);
    let v = Vector4D::new(-3.0, 0.0, 2.0, 1.0);
    let w = Vector4D::new(0.25, 4.0, 1.0, -2.0);

    let c = Vector4D::cross(&u, &v, &w);

    assert!(feq(c.dot(&u), 0.0));
    assert!(feq(c.dot(&v), 0.0));
    assert!(feq(c.dot(&w), 0.0));
    assert!(c.norm() > 1.0);
}

#[test]
fn cross_of_basis_vectors() {
    let x = Vector4D::new(1.0, 0.0, 0.0, 0.0);
    let y = Vector4D::new(0.0, 1.0, 0.0, 0.0);
    let z = Vector4D::new(0.0, 0.0, 1.0, 0.0);
    let w = Vector4D::new(0.0, 0.0, 0.0, 1.0);

    assert_eq!(Vector4D::cross(&y, &z, &w), x);
    assert_eq!(Vector4D::cross(&x, &y, &z), -w);
}

#[test]
fn cross_with_aliased_arguments() {
    let mut u = Vector4D::new(1.0, 0.0, 0.0, 0.0);
    let v = Vector4D::new(0.0, 1.0, 0.0, 0.0);
    let w = Vector4D::new(0.0, 0.0, 0.0, 1.0);

    u = Vector4D::cross(&u, &v, &w);
    assert_eq!(u, Vector4D::new(0.0, 0.0, 1.0, 0.0));
}

#[test]
fn cross_of_dependent_vectors_vanishes() {
    let u = Vector4D::new(1.0, 2.0, 3.0, 4.0);
    let v = u * 2.0;
    let w = Vector4D::new(0.0, 1.0, 0.0, 0.0);

    assert_eq!(Vector4D::cross(&u, &v, &w), Vector4D::zero());
}

#[test]
fn reflect_45() {
    let v = Vector4D::new(1.0, -1.0, 0.0, 0.0);
    let n = Vector4D::new(0.0, 1.0, 0.0, 0.0);

    assert_eq!(v.reflect(&n), Vector4D::new(1.0, 1.0, 0.0, 0.0));
}

#[test]
fn dominant_axis_of_vector() {
    assert_eq!(Vector4D::new(0.1, -0.9, 0.3, 0.2).dominant_axis(), 1);
    assert_eq!(Vector4D::new(0.0, 0.0, 0.0, -2.0).dominant_axis(), 3);
}

#[test]
fn index_components() {
    let mut v = Vector4D::new(1.0, 2.0, 3.0, 4.0);
    v[2] = 7.0;

    assert_eq!(v[0], 1.0);
    assert_eq!(v[2], 7.0);
    assert_eq!(v[3], 4.0);
}
