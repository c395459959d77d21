use crate::vector::{ Point4D, Vector4D };

/// A ray in 4-space.
///
/// The direction is expected to be unit length; intersection routines rely on
/// it and never renormalize.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray4D {
    pub origin: Point4D,
    pub direction: Vector4D,
}

impl Ray4D {
    pub fn new(origin: Point4D, direction: Vector4D) -> Ray4D {
        Ray4D { origin, direction }
    }

    pub fn position(&self, t: f64) -> Point4D {
        self.origin.add_scaled(&self.direction, t)
    }

    /// Moves the origin `distance` along `along`, keeping the direction.
    pub fn nudged(&self, along: &Vector4D, distance: f64) -> Ray4D {
        Ray4D {
            origin: self.origin.add_scaled(along, distance),
            direction: self.direction,
        }
    }
}

#[test]
fn ray_position() {
    let r = Ray4D::new(
                Vector4D::new(2.0, 3.0, 4.0, 1.0),
                Vector4D::new(1.0, 0.0, 0.0, 0.0)
            );

    assert_eq!(r.position(0.0), Vector4D::new(2.0, 3.0, 4.0, 1.0));
    assert_eq!(r.position(1.0), Vector4D::new(3.0, 3.0, 4.0, 1.0));
    assert_eq!(r.position(-1.0), Vector4D::new(1.0, 3.0, 4.0, 1.0));
    assert_eq!(r.position(2.5), Vector4D::new(4.5, 3.0, 4.0, 1.0));
}

#[test]
fn ray_nudged_along_normal() {
    let r = Ray4D::new(
                Vector4D::new(0.0, 0.0, 0.0, 1.0),
                Vector4D::new(0.0, 1.0, 0.0, 0.0)
            );
    let n = Vector4D::new(0.0, 0.0, 0.0, 1.0);
    let nudged = r.nudged(&n, 0.5);

    assert_eq!(nudged.origin, Vector4D::new(0.0, 0.0, 0.0, 1.5));
    assert_eq!(nudged.direction, r.direction);
}
