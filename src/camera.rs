use log::debug;

use crate::ray::Ray4D;
use crate::vector::{ Point4D, Vector4D };
use crate::world::World;
use crate::canvas::{ Canvas, Region };
use crate::stats::RenderStats;
use crate::error::SceneError;

/// Largest resolution along one axis; pixel coordinates must fit in a `u16`.
const MAX_RESOLUTION: usize = 1 << 16;

/// A camera record for generating a canvas.
///
/// The camera looks from `from` toward `to`. `up` and `over` orient the
/// image cube; they need not be orthogonal to the line of sight or to each
/// other, only independent of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub from: Point4D,
    pub to: Point4D,
    pub up: Vector4D,
    pub over: Vector4D,

    /// The viewing angle across the X axis of the image, in degrees.
    pub angle: f64,

    /// Pixels along X, Y and Z of the image cube.
    pub resolution: [usize; 3],

    /// Relative pixel extent along X, Y and Z.
    pub aspect: [u16; 3],
}

/// The grid of pixel centers rays are fired through.
///
/// `origin` is the center of pixel (0, 0, 0); stepping one pixel along an
/// image axis adds `gx`, `gy` or `gz`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayGrid {
    pub eye: Point4D,
    pub origin: Point4D,
    pub gx: Vector4D,
    pub gy: Vector4D,
    pub gz: Vector4D,
}

impl RayGrid {
    /// The primary ray through the center of pixel `(x, y, z)`.
    pub fn ray_for_pixel(&self, x: usize, y: usize, z: usize) -> Ray4D {
        let target = self.origin
            + self.gx * x as f64
            + self.gy * y as f64
            + self.gz * z as f64;

        // The grid lies in a hyperplane away from the eye, so this never
        // degenerates.
        let mut direction = target - self.eye;
        direction.normalize();

        Ray4D::new(self.eye, direction)
    }
}

impl Camera {
    /// Computes the ray grid for this camera.
    ///
    /// The grid spans the hyperplane through `to` orthogonal to the line of
    /// sight. Its X extent is set by the viewing angle; Y and Z follow from
    /// the resolution and aspect ratio so that pixels have the requested
    /// shape.
    pub fn ray_grid(&self) -> Result<RayGrid, SceneError> {
        if self.resolution.iter().any(|&r| r == 0 || r > MAX_RESOLUTION) {
            return Err(SceneError::InvalidResolution(self.resolution));
        }

        if self.aspect.iter().any(|&a| a == 0) {
            return Err(SceneError::ZeroAspect(self.aspect));
        }

        if !(self.angle > 0.0 && self.angle < 180.0) {
            return Err(SceneError::InvalidAngle(self.angle));
        }

        let mut los = self.to - self.from;
        let los_norm = los.norm();
        if !los.normalize() {
            return Err(SceneError::DegenerateView);
        }

        let gz = Vector4D::cross(&self.over, &self.up, &los)
            .normalized()
            .ok_or(SceneError::NotOrthogonal("z"))?;
        let gy = Vector4D::cross(&gz, &los, &self.over)
            .normalized()
            .ok_or(SceneError::NotOrthogonal("y"))?;

        // Unit length already: its operands are orthonormal.
        let gx = Vector4D::cross(&gy, &gz, &los);

        let res = [
            self.resolution[0] as f64,
            self.resolution[1] as f64,
            self.resolution[2] as f64,
        ];
        let aspect = [
            f64::from(self.aspect[0]),
            f64::from(self.aspect[1]),
            f64::from(self.aspect[2]),
        ];

        let width = 2.0 * los_norm * (self.angle.to_radians() / 2.0).tan();
        let x_extent = res[0] * aspect[0];

        let gx = gx * width;
        let gy = gy * (width * res[1] * aspect[1] / x_extent);
        let gz = gz * (width * res[2] * aspect[2] / x_extent);

        let corner = self.to - gx / 2.0 - gy / 2.0 - gz / 2.0;

        let gx = gx / res[0];
        let gy = gy / res[1];
        let gz = gz / res[2];

        Ok(RayGrid {
            eye: self.from,
            origin: corner + (gx + gy + gz) / 2.0,
            gx,
            gy,
            gz,
        })
    }

    /// Renders a region of the image cube.
    ///
    /// Pixels are traced slice by slice along Z, then row by row along Y.
    pub fn render(&self, world: &World, region: &Region,
        stats: &mut RenderStats) -> Result<Canvas, SceneError> {
        region.validate(self.resolution)?;
        let grid = self.ray_grid()?;
        let mut image = Canvas::new(*region);

        for z in region.start[2]..=region.end[2] {
            for y in region.start[1]..=region.end[1] {
                for x in region.start[0]..=region.end[0] {
                    let ray = grid.ray_for_pixel(x, y, z);
                    let color = world.trace(&ray, 0, stats);
                    image.write_pixel(x, y, z, &color);
                }
            }

            debug!("Finished slice {} of {}.", z + 1, self.resolution[2]);
        }

        Ok(image)
    }
}

/* Tests */

#[cfg(test)]
fn v(x: f64, y: f64, z: f64, w: f64) -> Vector4D {
    Vector4D::new(x, y, z, w)
}

/// Looks down the W axis at the origin from five units away.
#[cfg(test)]
fn axial_camera(resolution: [usize; 3]) -> Camera {
    Camera {
        from: v(0.0, 0.0, 0.0, 5.0),
        to: Vector4D::zero(),
        up: v(0.0, 1.0, 0.0, 0.0),
        over: v(0.0, 0.0, 1.0, 0.0),
        angle: 45.0,
        resolution,
        aspect: [1, 1, 1],
    }
}

#[test]
fn grid_basis_is_orthogonal() {
    use crate::feq;

    let c = axial_camera([20, 10, 5]);
    let grid = c.ray_grid().unwrap();
    let los = v(0.0, 0.0, 0.0, -1.0);

    assert!(feq(grid.gx.dot(&grid.gy), 0.0));
    assert!(feq(grid.gx.dot(&grid.gz), 0.0));
    assert!(feq(grid.gy.dot(&grid.gz), 0.0));
    for g in [grid.gx, grid.gy, grid.gz].iter() {
        assert!(feq(g.dot(&los), 0.0));
    }
}

#[test]
fn square_pixels_for_unit_aspect() {
    use crate::feq;

    let c = axial_camera([100, 100, 1]);
    let grid = c.ray_grid().unwrap();
    let width = 10.0 * (22.5f64).to_radians().tan();

    assert!(feq(grid.gx.norm(), grid.gy.norm()));
    assert!(feq(grid.gx.norm(), width / 100.0));
    assert!(feq(grid.gz.norm(), grid.gx.norm()));
}

#[test]
fn aspect_stretches_pixels() {
    use crate::feq;

    let mut c = axial_camera([40, 40, 4]);
    c.aspect = [1, 2, 3];
    let grid = c.ray_grid().unwrap();

    assert!(feq(grid.gy.norm(), 2.0 * grid.gx.norm()));
    assert!(feq(grid.gz.norm(), 3.0 * grid.gx.norm()));
}

#[test]
fn center_pixel_looks_at_target() {
    let c = axial_camera([11, 11, 1]);
    let grid = c.ray_grid().unwrap();
    let r = grid.ray_for_pixel(5, 5, 0);

    assert_eq!(r.origin, v(0.0, 0.0, 0.0, 5.0));
    assert_eq!(r.direction, v(0.0, 0.0, 0.0, -1.0));
}

#[test]
fn grid_spans_viewing_angle() {
    use crate::feq;

    // With one pixel along X, that pixel's center sits on the line of sight
    // and its neighbour is a full view-width away.
    let c = axial_camera([1, 1, 1]);
    let grid = c.ray_grid().unwrap();
    let half_angle = 22.5f64.to_radians();

    assert_eq!(grid.origin, Vector4D::zero());
    assert!(feq(grid.gx.norm(), 10.0 * half_angle.tan()));
}

#[test]
fn coincident_from_and_to_rejected() {
    let mut c = axial_camera([10, 10, 10]);
    c.to = c.from;

    assert!(matches!(c.ray_grid(), Err(SceneError::DegenerateView)));
}

#[test]
fn up_along_line_of_sight_rejected() {
    let mut c = axial_camera([10, 10, 10]);
    c.up = v(0.0, 0.0, 0.0, 1.0);

    assert!(matches!(c.ray_grid(), Err(SceneError::NotOrthogonal("z"))));
}

#[test]
fn up_parallel_to_over_rejected() {
    let mut c = axial_camera([10, 10, 10]);
    c.over = c.up * 3.0;

    assert!(matches!(c.ray_grid(), Err(SceneError::NotOrthogonal(_))));
}

#[test]
fn invalid_camera_parameters_rejected() {
    let mut c = axial_camera([10, 0, 10]);
    assert!(matches!(c.ray_grid(), Err(SceneError::InvalidResolution(_))));

    c.resolution = [10, 10, 10];
    c.aspect = [1, 0, 1];
    assert!(matches!(c.ray_grid(), Err(SceneError::ZeroAspect(_))));

    c.aspect = [1, 1, 1];
    c.angle = 180.0;
    assert!(matches!(c.ray_grid(), Err(SceneError::InvalidAngle(_))));
}

#[test]
fn render_lit_sphere() {
    use std::rc::Rc;
    use crate::color::Color;
    use crate::light::Light;
    use crate::material::Attributes;
    use crate::shape::Shape;

    let mut w = World::empty();
    w.ambient = Color::rgb(0.2, 0.2, 0.2);
    w.background = Color::rgb(0.0, 0.1, 0.3);
    w.lights.push(
        Light::directional(Color::white(), v(0.0, 0.0, 0.0, 1.0)).unwrap()
    );
    w.objects.push(Shape::sphere(
        Vector4D::zero(), 1.0,
        Rc::new(Attributes::matte(Color::white(), Color::rgb(0.5, 0.5, 0.5))),
    ).unwrap());

    let c = axial_camera([11, 11, 1]);
    let region = Region::full(c.resolution);
    let mut stats = RenderStats::new();
    let image = c.render(&w, &region, &mut stats).unwrap();

    // Ambient plus a full-strength diffuse term where the normal faces the
    // camera and the light head on.
    assert_eq!(image.read_pixel(5, 5, 0).unwrap(), Color::rgb(0.7, 0.7, 0.7));

    for &(x, y) in [(0, 0), (10, 0), (0, 10), (10, 10)].iter() {
        let corner = image.read_pixel(x, y, 0).unwrap();
        assert_eq!(corner.r, 0.0);
        assert_eq!(corner.g, 0.1);
        assert_eq!(corner.b, 0.3);
    }

    assert_eq!(stats.rays_cast, 121);
    assert_eq!(stats.max_depth, 0);
}

#[test]
fn render_partial_region() {
    use crate::color::Color;

    let mut w = World::empty();
    w.background = Color::white();

    let c = axial_camera([8, 8, 4]);
    let region = Region { start: [2, 3, 1], end: [4, 3, 2] };
    let mut stats = RenderStats::new();
    let image = c.render(&w, &region, &mut stats).unwrap();

    assert_eq!(stats.rays_cast, 6);
    assert_eq!(image.read_pixel(2, 3, 1), Some(Color::white()));
    assert_eq!(image.read_pixel(0, 0, 0), None);

    let outside = Region { start: [0, 0, 0], end: [8, 0, 0] };
    assert!(matches!(c.render(&w, &outside, &mut stats),
        Err(SceneError::InvalidRegion { .. })));
}
