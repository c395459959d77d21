use std::fmt;
use std::ops::AddAssign;

/// Counters collected while tracing.
///
/// Purely informational; nothing in the tracer branches on them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Every call into the tracer, primary or secondary.
    pub rays_cast: u64,
    pub reflection_rays: u64,
    pub refraction_rays: u64,

    /// Deepest recursion level reached.
    pub max_depth: usize,
}

impl RenderStats {
    pub fn new() -> RenderStats {
        Default::default()
    }

    /// Records one traced ray at recursion level `depth`.
    pub fn record_ray(&mut self, depth: usize) {
        self.rays_cast += 1;
        self.max_depth = self.max_depth.max(depth);
    }
}

/// Merges counters gathered separately, e.g. per slice.
impl AddAssign for RenderStats {
    fn add_assign(&mut self, other: RenderStats) {
        self.rays_cast += other.rays_cast;
        self.reflection_rays += other.reflection_rays;
        self.refraction_rays += other.refraction_rays;
        self.max_depth = self.max_depth.max(other.max_depth);
    }
}

impl fmt::Display for RenderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rays cast ({} reflected, {} refracted), max depth {}",
            self.rays_cast, self.reflection_rays, self.refraction_rays,
            self.max_depth)
    }
}

#[test]
fn record_rays() {
    let mut stats = RenderStats::new();
    stats.record_ray(0);
    stats.record_ray(3);
    stats.record_ray(1);

    assert_eq!(stats.rays_cast, 3);
    assert_eq!(stats.max_depth, 3);
}

#[test]
fn merge_stats() {
    let mut a = RenderStats { rays_cast: 5, reflection_rays: 1,
        refraction_rays: 0, max_depth: 1 };
    let b = RenderStats { rays_cast: 7, reflection_rays: 2,
        refraction_rays: 3, max_depth: 4 };
    a += b;

    assert_eq!(a, RenderStats { rays_cast: 12, reflection_rays: 3,
        refraction_rays: 3, max_depth: 4 });
    assert_eq!(a.to_string(),
        "12 rays cast (3 reflected, 3 refracted), max depth 4");
}
