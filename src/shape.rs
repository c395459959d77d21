use std::cmp::Ordering;
use std::rc::Rc;

use crate::consts::{ EPSILON, MINDIST };
use crate::vector::{ Point4D, Vector4D };
use crate::ray::Ray4D;
use crate::material::Attributes;
use crate::error::SceneError;

/// Barycentric coordinates of a hit, per primitive kind.
///
/// Tetrahedra and triangles carry one weight per vertex (the weights sum to
/// one). Parallelepipeds carry the three edge coordinates of the hit, each in
/// the unit interval.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Barycentric {
    Triangle([f64; 3]),
    Tetrahedron([f64; 4]),
    Parallelepiped([f64; 3]),
}

/// Surface geometry recorded for an accepted hit.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SurfaceHit {
    pub point: Point4D,

    /// Unit surface normal. Not oriented toward the ray.
    pub normal: Vector4D,

    pub coords: Option<Barycentric>,
}

/// A hypersphere.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SphereInfo {
    pub center: Point4D,
    pub radius: f64,
    pub radius_squared: f64,
}

/// Geometry shared by tetrahedra and parallelepipeds.
///
/// Both are spanned by three edges leaving vertex 0 and lie in a hyperplane
/// `normal . p + plane_const = 0`. Containment is tested in barycentric
/// coordinates, computed by Cramer's rule after projecting onto the three
/// axes other than the normal's dominant one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TetParInfo {
    pub vertices: [Point4D; 4],
    pub edges: [Vector4D; 3],
    pub normal: Vector4D,
    pub plane_const: f64,
    pub axes: [usize; 3],
    pub cramer_div: f64,
}

/// A triangle embedded in 4-space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleInfo {
    pub vertices: [Point4D; 3],
    pub edges: [Vector4D; 2],
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ShapeType {
    Sphere(SphereInfo),
    Tetrahedron(TetParInfo),

    /// Spanned by a corner vertex and its three neighbours.
    Parallelepiped(TetParInfo),

    Triangle(TriangleInfo),
}

/// A scene object: a primitive plus the (shared) material it is made of.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub ty: ShapeType,
    pub attributes: Rc<Attributes>,
}

/// Determinant of the 3x3 matrix with columns `a`, `b`, `c` restricted to
/// `axes`.
fn det3(a: &Vector4D, b: &Vector4D, c: &Vector4D, axes: &[usize; 3]) -> f64 {
    let [x, y, z] = *axes;

    a[x] * (b[y] * c[z] - b[z] * c[y])
        - a[y] * (b[x] * c[z] - b[z] * c[x])
        + a[z] * (b[x] * c[y] - b[y] * c[x])
}

/// The two axes along which `v` has the smallest magnitude.
fn least_dominant_axes(v: &Vector4D) -> (usize, usize) {
    let mut axes = [0, 1, 2, 3];
    axes.sort_by(|&a, &b| {
        v[a].abs().partial_cmp(&v[b].abs()).unwrap_or(Ordering::Equal)
    });

    (axes[0], axes[1])
}

/// Signed area of the parallelogram `e1`, `e2` projected onto axes `a0`, `a1`.
fn projected_area(e1: &Vector4D, e2: &Vector4D, a0: usize, a1: usize) -> f64 {
    e1[a0] * e2[a1] - e1[a1] * e2[a0]
}

/// The axis pair on which `e1`, `e2` project to the largest area, and that
/// area.
fn widest_projection(e1: &Vector4D, e2: &Vector4D) -> (usize, usize, f64) {
    let mut best = (0, 1, projected_area(e1, e2, 0, 1));

    for a0 in 0..4 {
        for a1 in (a0 + 1)..4 {
            let det = projected_area(e1, e2, a0, a1);
            if det.abs() > best.2.abs() {
                best = (a0, a1, det);
            }
        }
    }

    best
}

fn unit_interval(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Applies the shared distance policy to a candidate at `t`.
///
/// Hits behind the origin are always rejected. Once `mindist` holds a
/// previous hit, candidates closer than `MINDIST` or farther than that hit are
/// rejected too.
fn rejects(t: f64, mindist: &Option<&mut f64>) -> bool {
    if t < 0.0 {
        return true;
    }

    match mindist {
        Some(best) => **best > 0.0 && (t < MINDIST || t > **best),
        None => false,
    }
}

/// Records an accepted hit at `t`.
///
/// The surface geometry is only computed when the caller asked for it.
fn accept<F>(t: f64, mindist: Option<&mut f64>, surface: Option<&mut SurfaceHit>,
    fill: F) -> bool where F: FnOnce() -> SurfaceHit {
    if let Some(best) = mindist {
        *best = t;
        if let Some(surface) = surface {
            *surface = fill();
        }
    }

    true
}

impl SphereInfo {
    pub fn new(center: Point4D, radius: f64) -> Result<SphereInfo, SceneError> {
        if radius <= 0.0 {
            return Err(SceneError::NonPositiveRadius(radius));
        }

        Ok(SphereInfo { center, radius, radius_squared: radius * radius })
    }

    fn intersect(&self, ray: &Ray4D, mindist: Option<&mut f64>,
        surface: Option<&mut SurfaceHit>) -> bool {
        let cdir = self.center - ray.origin;
        let b = cdir.dot(&ray.direction);
        let radical = b * b - cdir.norm_squared() + self.radius_squared;

        if radical < 0.0 {
            return false;
        }

        let root = radical.sqrt();
        let t1 = b + root;
        let t2 = b - root;

        // Prefer the nearer root unless it lies behind the origin.
        let t = if t1 < 0.0 || (t2 > 0.0 && t2 < t1) { t2 } else { t1 };
        if t <= 0.0 || rejects(t, &mindist) {
            return false;
        }

        accept(t, mindist, surface, || {
            let point = ray.position(t);
            SurfaceHit {
                point,
                normal: (point - self.center) / self.radius,
                coords: None,
            }
        })
    }
}

impl TetParInfo {
    /// Precomputes the hyperplane and projection data for four vertices.
    ///
    /// `what` names the primitive in the error raised for degenerate input.
    pub fn new(vertices: [Point4D; 4], what: &'static str)
        -> Result<TetParInfo, SceneError> {
        let edges = [
            vertices[1] - vertices[0],
            vertices[2] - vertices[0],
            vertices[3] - vertices[0],
        ];

        let normal = Vector4D::cross(&edges[0], &edges[1], &edges[2])
            .normalized()
            .ok_or(SceneError::DegeneratePrimitive(what))?;
        let plane_const = -normal.dot(&vertices[0]);

        let dominant = normal.dominant_axis();
        let mut axes = [0; 3];
        for (slot, axis) in (0..4).filter(|&a| a != dominant).enumerate() {
            axes[slot] = axis;
        }

        let det = det3(&edges[0], &edges[1], &edges[2], &axes);
        if det.abs() < EPSILON {
            return Err(SceneError::DegeneratePrimitive(what));
        }

        Ok(TetParInfo {
            vertices,
            edges,
            normal,
            plane_const,
            axes,
            cramer_div: 1.0 / det,
        })
    }

    /// Edge coordinates of `point`, which must lie in the hyperplane.
    fn edge_coords(&self, point: &Point4D) -> [f64; 3] {
        let q = *point - self.vertices[0];
        let [e1, e2, e3] = &self.edges;

        [
            det3(&q, e2, e3, &self.axes) * self.cramer_div,
            det3(e1, &q, e3, &self.axes) * self.cramer_div,
            det3(e1, e2, &q, &self.axes) * self.cramer_div,
        ]
    }

    fn intersect(&self, simplex: bool, ray: &Ray4D, mindist: Option<&mut f64>,
        surface: Option<&mut SurfaceHit>) -> bool {
        let value = self.normal.dot(&ray.direction);
        if value.abs() < EPSILON {
            return false;
        }

        let t = (-self.plane_const - self.normal.dot(&ray.origin)) / value;
        if rejects(t, &mindist) {
            return false;
        }

        let point = ray.position(t);
        let bc = self.edge_coords(&point);
        if !bc.iter().all(|&c| unit_interval(c)) {
            return false;
        }

        let bc_sum = bc[0] + bc[1] + bc[2];
        if simplex && bc_sum > 1.0 {
            return false;
        }

        let coords = if simplex {
            Barycentric::Tetrahedron([1.0 - bc_sum, bc[0], bc[1], bc[2]])
        } else {
            Barycentric::Parallelepiped(bc)
        };

        accept(t, mindist, surface, || SurfaceHit {
            point,
            normal: self.normal,
            coords: Some(coords),
        })
    }
}

impl TriangleInfo {
    pub fn new(vertices: [Point4D; 3]) -> Result<TriangleInfo, SceneError> {
        let edges = [vertices[1] - vertices[0], vertices[2] - vertices[0]];

        // Squared area of the spanned parallelogram (Gram determinant).
        let gram = edges[0].norm_squared() * edges[1].norm_squared()
            - edges[0].dot(&edges[1]).powi(2);
        if gram < EPSILON {
            return Err(SceneError::DegeneratePrimitive("triangle"));
        }

        Ok(TriangleInfo { vertices, edges })
    }

    fn intersect(&self, ray: &Ray4D, mindist: Option<&mut f64>,
        surface: Option<&mut SurfaceHit>) -> bool {
        let [e1, e2] = &self.edges;

        // Normal of the 3-flat holding the ray direction and the triangle.
        let flat_normal = Vector4D::cross(&ray.direction, e1, e2);
        let denom = flat_normal.norm_squared();
        if denom < EPSILON {
            return false;
        }

        let to_vertex = self.vertices[0] - ray.origin;
        let t = Vector4D::cross(&to_vertex, e1, e2).dot(&flat_normal) / denom;
        if rejects(t, &mindist) {
            return false;
        }

        // In 4D the triangle has a whole plane of normals; take the one
        // inside the 3-flat spanned by the ray and the triangle.
        let normal = match Vector4D::cross(&flat_normal, e1, e2).normalized() {
            Some(normal) => normal,
            None => return false,
        };

        // The least-dominant pair can still flatten the triangle when the
        // normal leans away from two axes at once.
        let (a0, a1) = least_dominant_axes(&normal);
        let (a0, a1, det) = match projected_area(e1, e2, a0, a1) {
            det if det.abs() >= EPSILON => (a0, a1, det),
            _ => widest_projection(e1, e2),
        };
        if det.abs() < EPSILON {
            return false;
        }

        let point = ray.position(t);
        let q = point - self.vertices[0];
        let bc1 = (q[a0] * e2[a1] - q[a1] * e2[a0]) / det;
        let bc2 = (e1[a0] * q[a1] - e1[a1] * q[a0]) / det;

        if !unit_interval(bc1) || !unit_interval(bc2) || bc1 + bc2 > 1.0 {
            return false;
        }

        accept(t, mindist, surface, || SurfaceHit {
            point,
            normal,
            coords: Some(Barycentric::Triangle([1.0 - bc1 - bc2, bc1, bc2])),
        })
    }
}

impl Shape {
    /// Creates a hypersphere.
    pub fn sphere(center: Point4D, radius: f64, attributes: Rc<Attributes>)
        -> Result<Shape, SceneError> {
        Ok(Shape {
            ty: ShapeType::Sphere(SphereInfo::new(center, radius)?),
            attributes,
        })
    }

    /// Creates a tetrahedron from its four vertices.
    pub fn tetrahedron(vertices: [Point4D; 4], attributes: Rc<Attributes>)
        -> Result<Shape, SceneError> {
        Ok(Shape {
            ty: ShapeType::Tetrahedron(TetParInfo::new(vertices, "tetrahedron")?),
            attributes,
        })
    }

    /// Creates a parallelepiped from a corner and the three vertices adjacent
    /// to it.
    pub fn parallelepiped(vertices: [Point4D; 4], attributes: Rc<Attributes>)
        -> Result<Shape, SceneError> {
        Ok(Shape {
            ty: ShapeType::Parallelepiped(
                TetParInfo::new(vertices, "parallelepiped")?
            ),
            attributes,
        })
    }

    /// Creates a triangle from its three vertices.
    pub fn triangle(vertices: [Point4D; 3], attributes: Rc<Attributes>)
        -> Result<Shape, SceneError> {
        Ok(Shape {
            ty: ShapeType::Triangle(TriangleInfo::new(vertices)?),
            attributes,
        })
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Name of the primitive kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self.ty {
            ShapeType::Sphere(_) => "sphere",
            ShapeType::Tetrahedron(_) => "tetrahedron",
            ShapeType::Parallelepiped(_) => "parallelepiped",
            ShapeType::Triangle(_) => "triangle",
        }
    }

    /// Intersects a ray with this shape.
    ///
    /// `ray.direction` must be unit length.
    ///
    /// With `mindist` set to `None` this is a plain occlusion test: it returns
    /// `true` for any hit in front of the origin and computes nothing else.
    ///
    /// Otherwise `mindist` is the distance of the best hit so far, or any
    /// non-positive value if there is none. A hit is accepted only if it is
    /// not behind the origin and, when a previous hit exists, lies between
    /// `MINDIST` and that hit. An accepted hit overwrites `mindist` and, if
    /// given, `surface`. Rejections leave both untouched.
    pub fn intersect(&self, ray: &Ray4D, mindist: Option<&mut f64>,
        surface: Option<&mut SurfaceHit>) -> bool {
        match self.ty {
            ShapeType::Sphere(ref info) => info.intersect(ray, mindist, surface),
            ShapeType::Tetrahedron(ref info)
                => info.intersect(true, ray, mindist, surface),
            ShapeType::Parallelepiped(ref info)
                => info.intersect(false, ray, mindist, surface),
            ShapeType::Triangle(ref info) => info.intersect(ray, mindist, surface),
        }
    }
}

/* Tests */

#[cfg(test)]
fn test_attributes() -> Rc<Attributes> {
    use crate::color::Color;

    Rc::new(Attributes::matte(Color::white(), Color::white()))
}

#[cfg(test)]
fn v(x: f64, y: f64, z: f64, w: f64) -> Vector4D {
    Vector4D::new(x, y, z, w)
}

#[cfg(test)]
fn unit_tetrahedron_vertices() -> [Point4D; 4] {
    [
        v(0.0, 0.0, 0.0, 0.0),
        v(1.0, 0.0, 0.0, 0.0),
        v(0.0, 1.0, 0.0, 0.0),
        v(0.0, 0.0, 1.0, 0.0),
    ]
}

#[cfg(test)]
fn unit_triangle() -> Shape {
    Shape::triangle(
        [v(0.0, 0.0, 0.0, 0.0), v(1.0, 0.0, 0.0, 0.0), v(0.0, 1.0, 0.0, 0.0)],
        test_attributes(),
    ).unwrap()
}

#[test]
fn ray_aimed_at_sphere_center() {
    use crate::feq;

    let s = Shape::sphere(v(1.0, 2.0, 3.0, 4.0), 1.5, test_attributes()).unwrap();
    let origin = v(1.0, 2.0, 3.0, 10.0);
    let r = Ray4D::new(origin, v(0.0, 0.0, 0.0, -1.0));

    let mut mindist = -1.0;
    let mut hit = SurfaceHit::default();
    assert!(s.intersect(&r, Some(&mut mindist), Some(&mut hit)));

    assert!(feq(mindist, 6.0 - 1.5));
    assert_eq!(hit.point, v(1.0, 2.0, 3.0, 5.5));
    assert_eq!(hit.normal, -r.direction);
    assert_eq!(hit.coords, None);
}

#[test]
fn ray_inside_sphere_hits_far_side() {
    let s = Shape::sphere(Vector4D::zero(), 2.0, test_attributes()).unwrap();
    let r = Ray4D::new(Vector4D::zero(), v(0.0, 1.0, 0.0, 0.0));

    let mut mindist = -1.0;
    let mut hit = SurfaceHit::default();
    assert!(s.intersect(&r, Some(&mut mindist), Some(&mut hit)));

    assert_eq!(mindist, 2.0);
    assert_eq!(hit.normal, v(0.0, 1.0, 0.0, 0.0));
}

#[test]
fn sphere_behind_ray() {
    let s = Shape::sphere(Vector4D::zero(), 1.0, test_attributes()).unwrap();
    let r = Ray4D::new(v(0.0, 0.0, 0.0, 5.0), v(0.0, 0.0, 0.0, 1.0));

    let mut mindist = -1.0;
    assert!(!s.intersect(&r, Some(&mut mindist), None));
    assert!(!s.intersect(&r, None, None));
}

#[test]
fn missed_sphere_leaves_outputs_untouched() {
    let s = Shape::sphere(Vector4D::zero(), 1.0, test_attributes()).unwrap();
    let r = Ray4D::new(v(0.0, 3.0, 0.0, 5.0), v(0.0, 0.0, 0.0, -1.0));

    let sentinel = SurfaceHit {
        point: v(9.0, 9.0, 9.0, 9.0),
        normal: v(1.0, 0.0, 0.0, 0.0),
        coords: None,
    };
    let mut hit = sentinel;
    let mut mindist = -1.0;

    assert!(!s.intersect(&r, Some(&mut mindist), Some(&mut hit)));
    assert_eq!(mindist, -1.0);
    assert_eq!(hit, sentinel);
}

#[test]
fn farther_hit_rejected_by_mindist() {
    let s = Shape::sphere(Vector4D::zero(), 1.0, test_attributes()).unwrap();
    let r = Ray4D::new(v(0.0, 0.0, 0.0, 5.0), v(0.0, 0.0, 0.0, -1.0));

    let mut mindist = 2.0;
    let mut hit = SurfaceHit::default();
    assert!(!s.intersect(&r, Some(&mut mindist), Some(&mut hit)));
    assert_eq!(mindist, 2.0);
    assert_eq!(hit, SurfaceHit::default());
}

#[test]
fn hit_closer_than_mindist_epsilon_rejected() {
    let s = Shape::sphere(Vector4D::zero(), 1.0, test_attributes()).unwrap();
    let r = Ray4D::new(v(0.0, 0.0, 0.0, 1.0 + 5.0e-8), v(0.0, 0.0, 0.0, -1.0));

    // Without a previous hit, the close surface is accepted.
    let mut fresh = -1.0;
    assert!(s.intersect(&r, Some(&mut fresh), None));

    // With one, it is treated as a self-intersection.
    let mut previous = 10.0;
    assert!(!s.intersect(&r, Some(&mut previous), None));
    assert_eq!(previous, 10.0);
}

#[test]
fn occlusion_test_without_mindist() {
    let s = Shape::sphere(Vector4D::zero(), 1.0, test_attributes()).unwrap();
    let r = Ray4D::new(v(0.0, 0.0, 0.0, 5.0), v(0.0, 0.0, 0.0, -1.0));
    let mut hit = SurfaceHit::default();

    assert!(s.intersect(&r, None, Some(&mut hit)));
    assert_eq!(hit, SurfaceHit::default());
}

#[test]
fn reflected_ray_does_not_hit_own_sphere() {
    use crate::consts::NUDGE;

    let s = Shape::sphere(Vector4D::zero(), 1.0, test_attributes()).unwrap();
    let incoming = Ray4D::new(v(0.3, 0.0, 0.0, 5.0), v(0.0, 0.0, 0.0, -1.0));

    let mut mindist = -1.0;
    let mut hit = SurfaceHit::default();
    assert!(s.intersect(&incoming, Some(&mut mindist), Some(&mut hit)));

    let reflected = incoming.direction.reflect(&hit.normal);
    let bounce = Ray4D::new(hit.point, reflected);
    let bounce = bounce.nudged(&bounce.direction, NUDGE);

    let mut mindist = -1.0;
    assert!(!s.intersect(&bounce, Some(&mut mindist), None));
    assert_eq!(mindist, -1.0);
}

#[test]
fn reflected_ray_does_not_hit_own_tetrahedron() {
    use crate::consts::NUDGE;

    let s = Shape::tetrahedron(unit_tetrahedron_vertices(), test_attributes())
        .unwrap();
    let mut d = v(0.1, 0.0, 0.0, -1.0);
    d.normalize();
    let incoming = Ray4D::new(v(0.1, 0.2, 0.3, 2.0), d);

    let mut mindist = -1.0;
    let mut hit = SurfaceHit::default();
    assert!(s.intersect(&incoming, Some(&mut mindist), Some(&mut hit)));

    let bounce = Ray4D::new(hit.point, d.reflect(&hit.normal));
    let bounce = bounce.nudged(&bounce.direction, NUDGE);
    assert!(!s.intersect(&bounce, Some(&mut -1.0), None));
}

#[test]
fn ray_hits_tetrahedron() {
    use crate::feq;

    let s = Shape::tetrahedron(unit_tetrahedron_vertices(), test_attributes())
        .unwrap();
    let r = Ray4D::new(v(0.1, 0.2, 0.3, 2.0), v(0.0, 0.0, 0.0, -1.0));

    let mut mindist = -1.0;
    let mut hit = SurfaceHit::default();
    assert!(s.intersect(&r, Some(&mut mindist), Some(&mut hit)));

    assert_eq!(mindist, 2.0);
    assert_eq!(hit.point, v(0.1, 0.2, 0.3, 0.0));
    assert_eq!(hit.normal, v(0.0, 0.0, 0.0, -1.0));

    match hit.coords {
        Some(Barycentric::Tetrahedron(weights)) => {
            let expected = [0.4, 0.1, 0.2, 0.3];
            for (w, e) in weights.iter().zip(expected.iter()) {
                assert!(feq(*w, *e));
                assert!(unit_interval(*w));
            }
            assert!(feq(weights.iter().sum::<f64>(), 1.0));
        },
        other => panic!("Expected tetrahedron coordinates, got {:?}.", other),
    }
}

#[test]
fn ray_misses_tetrahedron_outside_simplex() {
    let s = Shape::tetrahedron(unit_tetrahedron_vertices(), test_attributes())
        .unwrap();
    let r = Ray4D::new(v(0.5, 0.5, 0.5, 2.0), v(0.0, 0.0, 0.0, -1.0));

    assert!(!s.intersect(&r, Some(&mut -1.0), None));
    assert!(!s.intersect(&r, None, None));
}

#[test]
fn parallelepiped_accepts_whole_unit_cube() {
    let s = Shape::parallelepiped(unit_tetrahedron_vertices(), test_attributes())
        .unwrap();
    let r = Ray4D::new(v(0.5, 0.5, 0.5, -2.0), v(0.0, 0.0, 0.0, 1.0));

    let mut mindist = -1.0;
    let mut hit = SurfaceHit::default();
    assert!(s.intersect(&r, Some(&mut mindist), Some(&mut hit)));
    assert_eq!(mindist, 2.0);
    assert_eq!(hit.coords, Some(Barycentric::Parallelepiped([0.5, 0.5, 0.5])));

    let outside = Ray4D::new(v(1.5, 0.5, 0.5, -2.0), v(0.0, 0.0, 0.0, 1.0));
    assert!(!s.intersect(&outside, Some(&mut -1.0), None));
}

#[test]
fn ray_parallel_to_hyperplane_misses() {
    let s = Shape::parallelepiped(unit_tetrahedron_vertices(), test_attributes())
        .unwrap();
    let r = Ray4D::new(v(-1.0, 0.5, 0.5, 0.0), v(1.0, 0.0, 0.0, 0.0));

    assert!(!s.intersect(&r, Some(&mut -1.0), None));
}

#[test]
fn tetpar_hyperplane_precomputation() {
    let vertices = [
        v(0.0, 0.0, 0.0, 3.0),
        v(1.0, 0.0, 0.0, 3.0),
        v(0.0, 1.0, 0.0, 3.0),
        v(0.0, 0.0, 1.0, 3.0),
    ];
    let info = TetParInfo::new(vertices, "tetrahedron").unwrap();

    assert_eq!(info.axes, [0, 1, 2]);
    assert_eq!(info.normal, v(0.0, 0.0, 0.0, -1.0));
    assert_eq!(info.plane_const, 3.0);
    assert_eq!(info.cramer_div, 1.0);
}

#[test]
fn ray_hits_triangle() {
    use crate::feq;

    let s = unit_triangle();
    let r = Ray4D::new(v(0.25, 0.25, 0.0, -3.0), v(0.0, 0.0, 0.0, 1.0));

    let mut mindist = -1.0;
    let mut hit = SurfaceHit::default();
    assert!(s.intersect(&r, Some(&mut mindist), Some(&mut hit)));

    assert!(feq(mindist, 3.0));
    assert_eq!(hit.point, v(0.25, 0.25, 0.0, 0.0));
    assert!(feq(hit.normal.norm(), 1.0));
    assert!(feq(hit.normal.dot(&v(1.0, 0.0, 0.0, 0.0)), 0.0));
    assert!(feq(hit.normal.dot(&v(0.0, 1.0, 0.0, 0.0)), 0.0));

    match hit.coords {
        Some(Barycentric::Triangle(weights)) => {
            assert!(feq(weights[0], 0.5));
            assert!(feq(weights[1], 0.25));
            assert!(feq(weights[2], 0.25));
            assert!(feq(weights.iter().sum::<f64>(), 1.0));
        },
        other => panic!("Expected triangle coordinates, got {:?}.", other),
    }
}

#[test]
fn oblique_ray_hits_triangle() {
    use crate::feq;

    let s = unit_triangle();
    let mut d = v(0.0, 0.0, 0.6, 0.8);
    d.normalize();
    let r = Ray4D::new(v(0.2, 0.3, -0.6, -0.8), d);

    let mut mindist = -1.0;
    let mut hit = SurfaceHit::default();
    assert!(s.intersect(&r, Some(&mut mindist), Some(&mut hit)));

    assert!(feq(mindist, 1.0));
    assert_eq!(hit.point, v(0.2, 0.3, 0.0, 0.0));
    assert!(feq(hit.normal.dot(&d).abs(), 1.0));
}

#[test]
fn head_on_ray_hits_leaning_triangle() {
    use crate::feq;

    // The in-flat normal has no y or z component, so projecting onto the
    // least-dominant axes collapses the first edge.
    let s = Shape::triangle(
        [v(0.0, 0.0, 0.0, 0.0), v(1.0, 0.0, 0.0, 1.0), v(0.0, 1.0, 0.0, 0.0)],
        test_attributes(),
    ).unwrap();

    let mut d = v(-1.0, 0.0, 0.0, 1.0);
    d.normalize();
    let target = v(0.25, 0.25, 0.0, 0.25);
    let r = Ray4D::new(target - d * 3.0, d);

    let mut mindist = -1.0;
    let mut hit = SurfaceHit::default();
    assert!(s.intersect(&r, Some(&mut mindist), Some(&mut hit)));

    assert!(feq(mindist, 3.0));
    assert_eq!(hit.point, target);
    assert!(feq(hit.normal.dot(&d).abs(), 1.0));

    match hit.coords {
        Some(Barycentric::Triangle(weights)) => {
            assert!(feq(weights[0], 0.5));
            assert!(feq(weights[1], 0.25));
            assert!(feq(weights[2], 0.25));
        },
        other => panic!("Expected triangle coordinates, got {:?}.", other),
    }

    assert!(s.intersect(&r, None, None));
}

#[test]
fn widest_projection_of_edges() {
    let e1 = v(1.0, 0.0, 0.0, 1.0);
    let e2 = v(0.0, 1.0, 0.0, 0.0);

    assert_eq!(projected_area(&e1, &e2, 1, 2), 0.0);
    assert_eq!(widest_projection(&e1, &e2), (0, 1, 1.0));
}

#[test]
fn ray_misses_triangle_outside_edges() {
    let s = unit_triangle();
    let r = Ray4D::new(v(0.75, 0.75, 0.0, -3.0), v(0.0, 0.0, 0.0, 1.0));
    let behind = Ray4D::new(v(0.25, 0.25, 0.0, -3.0), v(0.0, 0.0, 0.0, -1.0));

    assert!(!s.intersect(&r, Some(&mut -1.0), None));
    assert!(!s.intersect(&behind, Some(&mut -1.0), None));
}

#[test]
fn ray_within_triangle_plane_misses() {
    let s = unit_triangle();
    let r = Ray4D::new(v(-1.0, 0.25, 0.0, 0.0), v(1.0, 0.0, 0.0, 0.0));

    assert!(!s.intersect(&r, Some(&mut -1.0), None));
}

#[test]
fn nearest_of_several_shapes_wins() {
    let far = Shape::sphere(v(0.0, 0.0, 0.0, -10.0), 1.0, test_attributes())
        .unwrap();
    let near = Shape::sphere(v(0.0, 0.0, 0.0, 0.0), 1.0, test_attributes())
        .unwrap();
    let middle = Shape::sphere(v(0.0, 0.0, 0.0, -5.0), 1.0, test_attributes())
        .unwrap();
    let r = Ray4D::new(v(0.0, 0.0, 0.0, 5.0), v(0.0, 0.0, 0.0, -1.0));

    let mut mindist = -1.0;
    let mut hit = SurfaceHit::default();
    let accepted: Vec<bool> = [&far, &near, &middle].iter()
        .map(|s| s.intersect(&r, Some(&mut mindist), Some(&mut hit)))
        .collect();

    assert_eq!(accepted, vec![true, true, false]);
    assert_eq!(mindist, 4.0);
    assert_eq!(hit.point, v(0.0, 0.0, 0.0, 1.0));
}

#[test]
fn degenerate_shapes_rejected() {
    let flat = [
        v(0.0, 0.0, 0.0, 0.0),
        v(1.0, 0.0, 0.0, 0.0),
        v(0.0, 1.0, 0.0, 0.0),
        v(1.0, 1.0, 0.0, 0.0),
    ];

    assert!(matches!(Shape::sphere(Vector4D::zero(), 0.0, test_attributes()),
        Err(SceneError::NonPositiveRadius(_))));
    assert!(matches!(Shape::tetrahedron(flat, test_attributes()),
        Err(SceneError::DegeneratePrimitive("tetrahedron"))));
    assert!(matches!(Shape::parallelepiped(flat, test_attributes()),
        Err(SceneError::DegeneratePrimitive("parallelepiped"))));
    assert!(matches!(
        Shape::triangle([flat[0], flat[1], v(2.0, 0.0, 0.0, 0.0)],
            test_attributes()),
        Err(SceneError::DegeneratePrimitive("triangle"))));
}

#[test]
fn least_dominant_axes_of_normal() {
    assert_eq!(least_dominant_axes(&v(0.0, 0.0, -0.6, -0.8)), (0, 1));
    assert_eq!(least_dominant_axes(&v(0.9, 0.1, 0.5, -0.05)), (3, 1));
}
