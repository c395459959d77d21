use crate::consts::{ DEFAULT_MAX_DEPTH, MIN_LIGHT, NUDGE, VACUUM_RI };
use crate::ray::Ray4D;
use crate::vector::{ Point4D, Vector4D };
use crate::color::Color;
use crate::light::Light;
use crate::material::{ AttrFlags, Attributes };
use crate::shape::{ Shape, SurfaceHit };
use crate::stats::RenderStats;

/// A world with objects and lights.
///
/// Worlds collect all objects, lights and global shading parameters for
/// rendering. A world is built once and only read while tracing.
#[derive(Clone, Debug)]
pub struct World {
    pub objects: Vec<Shape>,
    pub lights: Vec<Light>,

    /// Global ambient light, filtered by each material's ambient color.
    pub ambient: Color,

    /// Color of rays that escape the scene.
    pub background: Color,

    /// Index of refraction of the medium between objects.
    pub index_of_refraction: f64,

    /// Recursion limit for reflected and refracted rays; zero means
    /// unlimited.
    pub max_depth: usize,
}

impl Default for World {
    fn default() -> World {
        World {
            objects: Vec::new(),
            lights: Vec::new(),
            ambient: Color::black(),
            background: Color::black(),
            index_of_refraction: VACUUM_RI,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl World {
    /// Creates an empty world with no objects, no lights and default globals.
    pub fn empty() -> World {
        Default::default()
    }

    /// Finds the closest object along a ray.
    ///
    /// All objects share one running `mindist`, so each accepted hit is closer
    /// than the ones before it and the surface left behind belongs to the
    /// nearest object.
    pub fn nearest_hit(&self, ray: &Ray4D) -> Option<(&Shape, SurfaceHit)> {
        let mut mindist = -1.0;
        let mut surface = SurfaceHit::default();
        let mut nearest = None;

        for obj in self.objects.iter() {
            if obj.intersect(ray, Some(&mut mindist), Some(&mut surface)) {
                nearest = Some(obj);
            }
        }

        nearest.map(|obj| (obj, surface))
    }

    /// Determines how much of a light reaches a surface point.
    ///
    /// Returns the unit direction toward the light and the light color left
    /// after passing any transparent occluders, or `None` if an opaque object
    /// blocks the light, the light sits on the point, or too little light
    /// gets through to matter.
    ///
    /// The shadow ray starts slightly off the surface along `normal`, which
    /// must face the side being lit.
    pub fn light_transmission(&self, light: &Light, point: &Point4D,
        normal: &Vector4D) -> Option<(Vector4D, Color)> {
        let (direction, distance) = light.direction_from(point)?;
        let shadow_ray = Ray4D::new(*point, direction).nudged(normal, NUDGE);

        // Point lights only count occluders in front of them.
        let mut mindist = distance.unwrap_or(-1.0);
        let mut color = light.color;

        for obj in self.objects.iter() {
            let unblocked = mindist;
            if !obj.intersect(&shadow_ray, Some(&mut mindist), None) {
                continue;
            }

            if !obj.attributes().is_transparent() {
                return None;
            }

            // Filter the light and keep looking past this occluder.
            color = color * obj.attributes().transparent;
            mindist = unblocked;
        }

        if color.sum() < MIN_LIGHT {
            None
        } else {
            Some((direction, color))
        }
    }

    /// Diffuse and specular light at a surface point, summed over all lights.
    ///
    /// `normal` must face the incoming ray.
    fn illuminate(&self, attributes: &Attributes, point: &Point4D,
        normal: &Vector4D, direction: &Vector4D) -> Color {
        let flags = attributes.flags();
        let mut color = Color::black();

        for light in self.lights.iter() {
            let (light_dir, light_color)
                = match self.light_transmission(light, point, normal) {
                Some(lit) => lit,
                None => continue,
            };

            // Surfaces facing away from the light get nothing from it.
            let n_dot_l = normal.dot(&light_dir);
            if n_dot_l <= 0.0 {
                continue;
            }

            color += attributes.diffuse * light_color * n_dot_l;

            if flags.contains(AttrFlags::SPECULAR) {
                let reflected = -light_dir + *normal * (2.0 * n_dot_l);
                let highlight = (-*direction).dot(&reflected).max(0.0);
                color += attributes.specular * light_color
                    * highlight.powf(attributes.shininess);
            }
        }

        color
    }

    /// Whether any object spawns secondary rays, by reflection or refraction.
    pub fn has_secondary_rays(&self) -> bool {
        self.objects.iter().any(|obj| {
            obj.attributes().flags()
                .intersects(AttrFlags::REFLECT | AttrFlags::TRANSPARENT)
        })
    }

    /// Traces a ray into the world and returns the color seen along it.
    ///
    /// `ray.direction` must be unit length. `depth` is the recursion level of
    /// this ray (zero for primary rays). The result is not clamped.
    pub fn trace(&self, ray: &Ray4D, depth: usize, stats: &mut RenderStats)
        -> Color {
        stats.record_ray(depth);

        // Step off the surface this ray may have been spawned from.
        let ray = ray.nudged(&ray.direction, NUDGE);

        let (obj, surface) = match self.nearest_hit(&ray) {
            Some(hit) => hit,
            None => return self.background,
        };

        let attributes = obj.attributes();
        let flags = attributes.flags();

        let mut color = if flags.contains(AttrFlags::AMBIENT) {
            self.ambient * attributes.ambient
        } else {
            Color::black()
        };

        let mut normal = surface.normal;
        if flags.intersects(AttrFlags::DIFFUSE | AttrFlags::SPECULAR) {
            // Shade whichever side of the surface the ray arrived on.
            if normal.dot(&ray.direction) > 0.0 {
                normal = -normal;
            }

            color += self.illuminate(attributes, &surface.point, &normal,
                &ray.direction);
        }

        if self.max_depth != 0 && depth >= self.max_depth {
            return color;
        }

        if flags.contains(AttrFlags::TRANSPARENT) {
            let along_normal = normal * normal.dot(&ray.direction);
            let ratio = self.index_of_refraction / attributes.index_of_refraction;
            let refracted = along_normal + (ray.direction - along_normal) * ratio;

            if let Some(refracted) = refracted.normalized() {
                stats.refraction_rays += 1;
                let through = self.trace(&Ray4D::new(surface.point, refracted),
                    depth + 1, stats);
                color += through * attributes.transparent;
            }
        }

        if flags.contains(AttrFlags::REFLECT) {
            stats.reflection_rays += 1;
            let reflected = ray.direction.reflect(&normal);
            let mirrored = self.trace(&Ray4D::new(surface.point, reflected),
                depth + 1, stats);
            color += mirrored * attributes.specular;
        }

        color
    }
}

/* Tests */

#[cfg(test)]
use std::rc::Rc;

#[cfg(test)]
fn v(x: f64, y: f64, z: f64, w: f64) -> Vector4D {
    Vector4D::new(x, y, z, w)
}

#[cfg(test)]
fn grey(level: f64) -> Color {
    Color::rgb(level, level, level)
}

/// A unit sphere with a dim ambient light, hit off-center so that its normal
/// leans toward +x.
#[cfg(test)]
fn lit_sphere_world() -> (World, Ray4D) {
    let mut w = World::empty();
    w.ambient = grey(0.1);
    w.objects.push(Shape::sphere(
        Vector4D::zero(), 1.0,
        Rc::new(Attributes::matte(Color::white(), grey(0.5))),
    ).unwrap());

    let r = Ray4D::new(v(0.6, 0.0, 0.0, 5.0), v(0.0, 0.0, 0.0, -1.0));
    (w, r)
}

#[cfg(test)]
fn x_light() -> Light {
    Light::directional(Color::white(), v(1.0, 0.0, 0.0, 0.0)).unwrap()
}

#[cfg(test)]
fn filter(transparent: Color) -> Rc<Attributes> {
    Rc::new(Attributes::new(
        Color::black(), Color::black(), Color::black(), transparent,
        1.0, 1.0, false,
    ).unwrap())
}

#[test]
fn ray_miss_returns_background() {
    let (mut w, _) = lit_sphere_world();
    w.background = Color::rgb(0.2, 0.3, 0.4);
    let r = Ray4D::new(v(0.0, 5.0, 0.0, 5.0), v(0.0, 0.0, 0.0, -1.0));

    let mut stats = RenderStats::new();
    assert_eq!(w.trace(&r, 0, &mut stats), Color::rgb(0.2, 0.3, 0.4));
    assert_eq!(stats.rays_cast, 1);
}

#[test]
fn nearest_hit_reports_closest_object() {
    let (mut w, r) = lit_sphere_world();
    w.objects.insert(0, Shape::sphere(
        v(0.0, 0.0, 0.0, -4.0), 1.0, filter(Color::white())
    ).unwrap());

    let (obj, surface) = w.nearest_hit(&r).unwrap();
    assert!(std::ptr::eq(obj, &w.objects[1]));
    assert_eq!(surface.point, v(0.6, 0.0, 0.0, 0.8));
    assert_eq!(surface.normal, v(0.6, 0.0, 0.0, 0.8));
}

#[test]
fn ambient_only_material() {
    let mut w = World::empty();
    w.ambient = Color::rgb(0.5, 0.5, 1.0);
    w.lights.push(x_light());
    w.objects.push(Shape::sphere(
        Vector4D::zero(), 1.0,
        Rc::new(Attributes::matte(Color::rgb(0.4, 1.0, 0.5), Color::black())),
    ).unwrap());

    let r = Ray4D::new(v(0.6, 0.0, 0.0, 5.0), v(0.0, 0.0, 0.0, -1.0));
    let mut stats = RenderStats::new();
    assert_eq!(w.trace(&r, 0, &mut stats), Color::rgb(0.2, 0.5, 0.5));
}

#[test]
fn diffuse_light_on_unoccluded_surface() {
    let (mut w, r) = lit_sphere_world();
    w.lights.push(x_light());

    let mut stats = RenderStats::new();
    assert_eq!(w.trace(&r, 0, &mut stats), grey(0.4));
}

#[test]
fn opaque_occluder_casts_shadow() {
    let (mut w, r) = lit_sphere_world();
    w.lights.push(x_light());
    w.objects.push(Shape::sphere(
        v(3.0, 0.0, 0.0, 0.8), 0.5,
        Rc::new(Attributes::matte(Color::white(), Color::white())),
    ).unwrap());

    let mut stats = RenderStats::new();
    assert_eq!(w.trace(&r, 0, &mut stats), grey(0.1));
}

#[test]
fn transparent_occluder_tints_light() {
    let (mut w, r) = lit_sphere_world();
    w.lights.push(x_light());
    w.objects.push(Shape::sphere(
        v(3.0, 0.0, 0.0, 0.8), 0.5, filter(Color::rgb(0.5, 0.25, 1.0))
    ).unwrap());

    let mut stats = RenderStats::new();
    assert_eq!(w.trace(&r, 0, &mut stats), Color::rgb(0.25, 0.175, 0.4));
}

#[test]
fn stacked_transparent_occluders_multiply() {
    let (mut w, r) = lit_sphere_world();
    w.lights.push(x_light());
    for x in [3.0, 5.0].iter() {
        w.objects.push(Shape::sphere(
            v(*x, 0.0, 0.0, 0.8), 0.5, filter(grey(0.5))
        ).unwrap());
    }

    let mut stats = RenderStats::new();
    assert_eq!(w.trace(&r, 0, &mut stats), grey(0.175));
}

#[test]
fn nearly_opaque_filter_skips_light() {
    let (mut w, r) = lit_sphere_world();
    w.lights.push(x_light());
    w.objects.push(Shape::sphere(
        v(3.0, 0.0, 0.0, 0.8), 0.5, filter(Color::rgb(0.0005, 0.0, 0.0))
    ).unwrap());

    let mut stats = RenderStats::new();
    assert_eq!(w.trace(&r, 0, &mut stats), grey(0.1));
}

#[test]
fn occluder_beyond_point_light_ignored() {
    let (mut w, r) = lit_sphere_world();
    w.lights.push(Light::point(Color::white(), v(2.0, 0.0, 0.0, 0.8)));
    w.objects.push(Shape::sphere(
        v(3.0, 0.0, 0.0, 0.8), 0.5,
        Rc::new(Attributes::matte(Color::white(), Color::white())),
    ).unwrap());

    let mut stats = RenderStats::new();
    assert_eq!(w.trace(&r, 0, &mut stats), grey(0.4));
}

#[test]
fn light_behind_surface_contributes_nothing() {
    let (mut w, r) = lit_sphere_world();
    w.lights.push(
        Light::directional(Color::white(), v(-1.0, 0.0, 0.0, 0.0)).unwrap()
    );

    let mut stats = RenderStats::new();
    assert_eq!(w.trace(&r, 0, &mut stats), grey(0.1));
}

#[test]
fn back_face_is_shaded_from_ray_side() {
    let mut w = World::empty();
    w.ambient = grey(0.1);
    w.objects.push(Shape::tetrahedron(
        [
            v(0.0, 0.0, 0.0, 0.0),
            v(1.0, 0.0, 0.0, 0.0),
            v(0.0, 1.0, 0.0, 0.0),
            v(0.0, 0.0, 1.0, 0.0),
        ],
        Rc::new(Attributes::matte(Color::white(), grey(0.5))),
    ).unwrap());

    // The stored normal points toward -w; the ray arrives from +w.
    let r = Ray4D::new(v(0.1, 0.2, 0.3, 2.0), v(0.0, 0.0, 0.0, -1.0));
    let mut stats = RenderStats::new();

    w.lights = vec![
        Light::directional(Color::white(), v(0.0, 0.0, 0.0, 1.0)).unwrap()
    ];
    assert_eq!(w.trace(&r, 0, &mut stats), grey(0.6));

    w.lights = vec![
        Light::directional(Color::white(), v(0.0, 0.0, 0.0, -1.0)).unwrap()
    ];
    assert_eq!(w.trace(&r, 0, &mut stats), grey(0.1));
}

#[test]
fn phong_highlight() {
    let mut w = World::empty();
    w.lights.push(
        Light::directional(Color::white(), v(0.0, 1.0, 0.0, 1.0)).unwrap()
    );
    w.objects.push(Shape::sphere(
        Vector4D::zero(), 1.0,
        Rc::new(Attributes::new(
            Color::black(), Color::black(), Color::white(), Color::black(),
            1.0, 1.0, false,
        ).unwrap()),
    ).unwrap());

    let r = Ray4D::new(v(0.0, 0.0, 0.0, 5.0), v(0.0, 0.0, 0.0, -1.0));
    let mut stats = RenderStats::new();

    assert_eq!(w.trace(&r, 0, &mut stats), grey(0.5f64.sqrt()));
    assert_eq!(stats.reflection_rays, 0);
}

#[test]
fn transparent_sphere_passes_background() {
    let mut w = World::empty();
    w.background = Color::rgb(0.2, 0.4, 0.6);
    w.objects.push(Shape::sphere(
        Vector4D::zero(), 1.0, filter(grey(0.5))
    ).unwrap());

    let r = Ray4D::new(v(0.0, 0.0, 0.0, 5.0), v(0.0, 0.0, 0.0, -1.0));
    let mut stats = RenderStats::new();

    assert_eq!(w.trace(&r, 0, &mut stats), Color::rgb(0.05, 0.1, 0.15));
    assert_eq!(stats.refraction_rays, 2);
    assert_eq!(stats.rays_cast, 3);
    assert_eq!(stats.max_depth, 2);
}

#[test]
fn refracted_ray_continues_through_slab() {
    use crate::consts::GLASS_RI;

    let mut w = World::empty();
    let glass = Rc::new(Attributes::new(
        Color::black(), Color::black(), Color::black(), Color::white(),
        1.0, GLASS_RI, false,
    ).unwrap());
    w.objects.push(Shape::parallelepiped(
        [
            v(-10.0, -10.0, -10.0, 0.0),
            v(10.0, -10.0, -10.0, 0.0),
            v(-10.0, 10.0, -10.0, 0.0),
            v(-10.0, -10.0, 10.0, 0.0),
        ],
        glass,
    ).unwrap());

    // Only a ray bent onward through the slab escapes to the background.
    w.background = Color::white();
    let mut d = v(1.0, 0.0, 0.0, -1.0);
    d.normalize();
    let r = Ray4D::new(v(0.0, 0.0, 0.0, 1.0), d);
    let mut stats = RenderStats::new();

    assert_eq!(w.trace(&r, 0, &mut stats), Color::white());
    assert_eq!(stats.refraction_rays, 1);
}

#[test]
fn mirror_recursion_stops_at_max_depth() {
    let mirror = Rc::new(Attributes::new(
        Color::black(), Color::black(), Color::white(), Color::black(),
        1.0, 1.0, true,
    ).unwrap());

    let mut w = World::empty();
    for &plane_w in [1.0, -1.0].iter() {
        w.objects.push(Shape::parallelepiped(
            [
                v(-10.0, -10.0, -10.0, plane_w),
                v(10.0, -10.0, -10.0, plane_w),
                v(-10.0, 10.0, -10.0, plane_w),
                v(-10.0, -10.0, 10.0, plane_w),
            ],
            Rc::clone(&mirror),
        ).unwrap());
    }

    let r = Ray4D::new(Vector4D::zero(), v(0.0, 0.0, 0.0, 1.0));

    for &limit in [1usize, 4, 9].iter() {
        w.max_depth = limit;
        let mut stats = RenderStats::new();
        w.trace(&r, 0, &mut stats);

        assert_eq!(stats.max_depth, limit);
        assert_eq!(stats.reflection_rays, limit as u64);
        assert_eq!(stats.rays_cast, limit as u64 + 1);
    }
}

#[test]
fn unlimited_depth_follows_single_bounce() {
    let mirror = Rc::new(Attributes::new(
        Color::black(), Color::black(), grey(0.5), Color::black(),
        1.0, 1.0, true,
    ).unwrap());

    let mut w = World::empty();
    w.max_depth = 0;
    w.background = Color::rgb(0.2, 0.4, 0.6);
    w.objects.push(Shape::parallelepiped(
        [
            v(-10.0, -10.0, -10.0, -1.0),
            v(10.0, -10.0, -10.0, -1.0),
            v(-10.0, 10.0, -10.0, -1.0),
            v(-10.0, -10.0, 10.0, -1.0),
        ],
        mirror,
    ).unwrap());

    let r = Ray4D::new(Vector4D::zero(), v(0.0, 0.0, 0.0, -1.0));
    let mut stats = RenderStats::new();
    let c = w.trace(&r, 0, &mut stats);

    assert_eq!(c, Color::rgb(0.1, 0.2, 0.3));
    assert_eq!(stats.reflection_rays, 1);
    assert_eq!(stats.rays_cast, 2);
    assert_eq!(stats.max_depth, 1);
}

#[test]
fn faint_diffuse_still_lit_beside_specular() {
    // Kd sums below the flag threshold; the specular color opens the
    // lighting pass, and the diffuse term is added regardless.
    let faint = 3.0e-6;
    let attributes = Rc::new(Attributes::new(
        Color::black(), grey(faint), Color::white(), Color::black(),
        1000.0, 1.0, false,
    ).unwrap());
    assert!(!attributes.flags().contains(AttrFlags::DIFFUSE));

    let mut w = World::empty();
    w.lights.push(
        Light::directional(Color::white(), v(1.0, 0.0, 0.0, 1.0)).unwrap()
    );
    w.objects.push(Shape::sphere(Vector4D::zero(), 1.0, attributes).unwrap());

    let r = Ray4D::new(v(0.0, 0.0, 0.0, 5.0), v(0.0, 0.0, 0.0, -1.0));
    let mut stats = RenderStats::new();
    let c = w.trace(&r, 0, &mut stats);

    let expected = faint * 0.5f64.sqrt();
    assert!((c.r - expected).abs() < 1.0e-12);
    assert!((c.g - expected).abs() < 1.0e-12);
    assert!((c.b - expected).abs() < 1.0e-12);
}

#[test]
fn secondary_rays_detected() {
    let (mut w, _) = lit_sphere_world();
    assert!(!w.has_secondary_rays());

    w.objects.push(Shape::sphere(
        v(3.0, 0.0, 0.0, 0.0), 1.0, filter(grey(0.5)),
    ).unwrap());
    assert!(w.has_secondary_rays());
}
