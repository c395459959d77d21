use std::rc::Rc;
use std::fs;
use std::path::Path;
use std::convert::TryFrom;
use std::collections::HashMap;

use log::{ debug, warn };
use serde::Deserialize;

use crate::color::Color;
use crate::vector::Vector4D;
use crate::material::Attributes;
use crate::light::Light;
use crate::shape::Shape;
use crate::world::World;
use crate::camera::Camera;
use crate::canvas::Region;
use crate::consts::{ DEFAULT_MAX_DEPTH, VACUUM_RI };
use crate::error::SceneError;

/// A fully validated scene, ready to render.
pub struct Scene {
    pub world: World,
    pub camera: Camera,

    /// Part of the image cube to render; the whole cube unless the scene
    /// file says otherwise.
    pub region: Region,
}

impl Scene {
    /// Parses and validates a JSON scene description.
    pub fn parse(json: &str) -> Result<Scene, SceneError> {
        let scene_json: SceneJson = serde_json::from_str(json)?;
        Scene::try_from(scene_json)
    }

    /// Reads a scene description from a file.
    pub fn load(path: &Path) -> Result<Scene, SceneError> {
        let json = fs::read_to_string(path)?;
        Scene::parse(&json)
    }
}

impl TryFrom<SceneJson> for Scene {
    type Error = SceneError;

    fn try_from(scene_json: SceneJson) -> Result<Scene, SceneError> {
        let c = scene_json.camera;
        let camera = Camera {
            from: c.from.into(),
            to: c.to.into(),
            up: c.up.into(),
            over: c.over.into(),
            angle: c.angle,
            resolution: scene_json.resolution,
            aspect: scene_json.aspect,
        };

        // Reject a bad view before building anything else.
        camera.ray_grid()?;

        let region = match scene_json.region {
            Some(r) => Region { start: r.start, end: r.end },
            None => Region::full(camera.resolution),
        };
        region.validate(camera.resolution)?;

        if scene_json.index_of_refraction <= 0.0 {
            return Err(SceneError::NonPositiveIndexOfRefraction(
                scene_json.index_of_refraction
            ));
        }

        let mut materials = HashMap::new();
        for (name, a) in scene_json.attributes.into_iter() {
            let attributes = Attributes::new(
                a.ambient.into(),
                a.diffuse.into(),
                a.specular.into(),
                a.transparent.into(),
                a.shininess,
                a.index_of_refraction,
                a.reflect,
            )?;
            materials.insert(name, Rc::new(attributes));
        }

        let lookup = |name: &str| -> Result<Rc<Attributes>, SceneError> {
            materials.get(name)
                .cloned()
                .ok_or_else(|| SceneError::UnknownAttributes(name.to_string()))
        };

        let mut world = World::empty();
        world.ambient = scene_json.ambient.into();
        world.background = scene_json.background.into();
        world.index_of_refraction = scene_json.index_of_refraction;
        world.max_depth = scene_json.max_depth;

        for light in scene_json.lights.into_iter() {
            world.lights.push(light.into_light()?);
        }

        for object in scene_json.objects.into_iter() {
            let shape = match object {
                ObjectJson::Sphere { attributes, center, radius } => {
                    Shape::sphere(center.into(), radius, lookup(attributes.as_str())?)?
                },
                ObjectJson::Tetrahedron { attributes, vertices } => {
                    Shape::tetrahedron(points(vertices), lookup(attributes.as_str())?)?
                },
                ObjectJson::Parallelepiped { attributes, vertices } => {
                    Shape::parallelepiped(points(vertices), lookup(attributes.as_str())?)?
                },
                ObjectJson::Triangle { attributes, vertices } => {
                    let [a, b, c] = vertices;
                    Shape::triangle([a.into(), b.into(), c.into()],
                        lookup(attributes.as_str())?)?
                },
            };
            world.objects.push(shape);
        }

        if world.max_depth == 0 && world.has_secondary_rays() {
            warn!("Recursion depth is unlimited and some materials reflect or \
                refract; facing mirrors will recurse until the stack overflows.");
        }

        debug!("Loaded {} objects, {} lights and {} materials.",
            world.objects.len(), world.lights.len(), materials.len());

        Ok(Scene { world, camera, region })
    }
}

fn points(vertices: [[f64; 4]; 4]) -> [Vector4D; 4] {
    let [a, b, c, d] = vertices;
    [a.into(), b.into(), c.into(), d.into()]
}

fn default_aspect() -> [u16; 3] {
    [1, 1, 1]
}

fn default_index_of_refraction() -> f64 {
    VACUUM_RI
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// The on-disk form of a scene.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneJson {
    resolution: [usize; 3],
    #[serde(default = "default_aspect")]
    aspect: [u16; 3],
    #[serde(default)]
    region: Option<RegionJson>,

    camera: CameraJson,

    #[serde(default)]
    ambient: [f64; 3],
    #[serde(default)]
    background: [f64; 3],
    #[serde(default = "default_index_of_refraction")]
    index_of_refraction: f64,
    /// Zero lifts the recursion limit.
    #[serde(default = "default_max_depth")]
    max_depth: usize,

    #[serde(default)]
    attributes: HashMap<String, AttributesJson>,
    #[serde(default)]
    lights: Vec<LightJson>,
    #[serde(default)]
    objects: Vec<ObjectJson>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RegionJson {
    start: [usize; 3],
    end: [usize; 3],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CameraJson {
    from: [f64; 4],
    to: [f64; 4],
    up: [f64; 4],
    over: [f64; 4],
    /// Degrees.
    angle: f64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AttributesJson {
    #[serde(default)]
    ambient: [f64; 3],
    #[serde(default)]
    diffuse: [f64; 3],
    #[serde(default)]
    specular: [f64; 3],
    #[serde(default)]
    transparent: [f64; 3],
    #[serde(default)]
    shininess: f64,
    #[serde(default = "default_index_of_refraction")]
    index_of_refraction: f64,
    #[serde(default)]
    reflect: bool,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum LightJson {
    Point { color: [f64; 3], position: [f64; 4] },
    Directional { color: [f64; 3], direction: [f64; 4] },
}

impl LightJson {
    fn into_light(self) -> Result<Light, SceneError> {
        match self {
            LightJson::Point { color, position } => {
                Ok(Light::point(Color::from(color), position.into()))
            },
            LightJson::Directional { color, direction } => {
                Light::directional(Color::from(color), direction.into())
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ObjectJson {
    Sphere { attributes: String, center: [f64; 4], radius: f64 },
    Tetrahedron { attributes: String, vertices: [[f64; 4]; 4] },
    /// A corner followed by its three neighbours.
    Parallelepiped { attributes: String, vertices: [[f64; 4]; 4] },
    Triangle { attributes: String, vertices: [[f64; 4]; 3] },
}

/* Tests */

#[cfg(test)]
const MINIMAL: &str = r#"{
    "resolution": [16, 8, 4],
    "camera": {
        "from": [0, 0, 0, 10],
        "to": [0, 0, 0, 0],
        "up": [0, 1, 0, 0],
        "over": [0, 0, 1, 0],
        "angle": 30
    },
    "attributes": {
        "red": { "ambient": [0.1, 0, 0], "diffuse": [0.8, 0, 0] }
    },
    "lights": [
        { "type": "directional", "color": [1, 1, 1], "direction": [0, 0, 0, 2] }
    ],
    "objects": [
        { "type": "sphere", "attributes": "red", "center": [0, 0, 0, 0], "radius": 1 },
        { "type": "triangle", "attributes": "red",
          "vertices": [[0, 0, 0, 0], [1, 0, 0, 0], [0, 1, 0, 0]] }
    ]
}"#;

#[cfg(test)]
fn with_camera(rest: &str) -> String {
    format!(r#"{{
        "resolution": [4, 4, 4],
        "camera": {{
            "from": [0, 0, 0, 10], "to": [0, 0, 0, 0],
            "up": [0, 1, 0, 0], "over": [0, 0, 1, 0], "angle": 30
        }},
        {}
    }}"#, rest)
}

#[test]
fn parse_minimal_scene() {
    let scene = Scene::parse(MINIMAL).unwrap();

    assert_eq!(scene.world.objects.len(), 2);
    assert_eq!(scene.world.lights.len(), 1);
    assert_eq!(scene.world.objects[0].kind(), "sphere");
    assert_eq!(scene.world.objects[1].kind(), "triangle");

    assert_eq!(scene.camera.resolution, [16, 8, 4]);
    assert_eq!(scene.camera.aspect, [1, 1, 1]);
    assert_eq!(scene.region, Region::full([16, 8, 4]));

    assert_eq!(scene.world.ambient, Color::black());
    assert_eq!(scene.world.index_of_refraction, VACUUM_RI);
    assert_eq!(scene.world.max_depth, DEFAULT_MAX_DEPTH);
}

#[test]
fn objects_share_attributes() {
    let scene = Scene::parse(MINIMAL).unwrap();
    let a = scene.world.objects[0].attributes();
    let b = scene.world.objects[1].attributes();

    assert!(std::ptr::eq(a, b));
    assert_eq!(a.diffuse, Color::rgb(0.8, 0.0, 0.0));
}

#[test]
fn directional_light_normalized() {
    use crate::light::LightKind;

    let scene = Scene::parse(MINIMAL).unwrap();

    assert_eq!(scene.world.lights[0].kind,
        LightKind::Directional(Vector4D::new(0.0, 0.0, 0.0, 1.0)));
}

#[test]
fn explicit_globals_and_region() {
    let scene = Scene::parse(&with_camera(r#"
        "aspect": [1, 2, 1],
        "region": { "start": [1, 1, 0], "end": [2, 3, 0] },
        "ambient": [0.5, 0.5, 0.5],
        "background": [0, 0, 1],
        "index_of_refraction": 1.33,
        "max_depth": 0
    "#)).unwrap();

    assert_eq!(scene.camera.aspect, [1, 2, 1]);
    assert_eq!(scene.region, Region { start: [1, 1, 0], end: [2, 3, 0] });
    assert_eq!(scene.world.background, Color::rgb(0.0, 0.0, 1.0));
    assert_eq!(scene.world.index_of_refraction, 1.33);
    assert_eq!(scene.world.max_depth, 0);
    assert!(scene.world.objects.is_empty());
}

#[test]
fn unknown_attributes_rejected() {
    let result = Scene::parse(&with_camera(r#"
        "objects": [
            { "type": "sphere", "attributes": "chrome", "center": [0, 0, 0, 0], "radius": 1 }
        ]
    "#));

    match result {
        Err(SceneError::UnknownAttributes(name)) => assert_eq!(name, "chrome"),
        _ => panic!("expected an unknown attributes error"),
    }
}

#[test]
fn degenerate_scene_elements_rejected() {
    let flat = Scene::parse(&with_camera(r#"
        "attributes": { "m": { "diffuse": [1, 1, 1] } },
        "objects": [
            { "type": "tetrahedron", "attributes": "m",
              "vertices": [[0, 0, 0, 0], [1, 0, 0, 0], [2, 0, 0, 0], [0, 1, 0, 0]] }
        ]
    "#));
    assert!(matches!(flat, Err(SceneError::DegeneratePrimitive(_))));

    let dark = Scene::parse(&with_camera(r#"
        "lights": [ { "type": "directional", "color": [1, 1, 1], "direction": [0, 0, 0, 0] } ]
    "#));
    assert!(matches!(dark, Err(SceneError::ZeroLightDirection)));

    let flat_sphere = Scene::parse(&with_camera(r#"
        "attributes": { "m": {} },
        "objects": [
            { "type": "sphere", "attributes": "m", "center": [0, 0, 0, 0], "radius": 0 }
        ]
    "#));
    assert!(matches!(flat_sphere, Err(SceneError::NonPositiveRadius(_))));

    let vacuum = Scene::parse(&with_camera(r#""index_of_refraction": 0"#));
    assert!(matches!(vacuum, Err(SceneError::NonPositiveIndexOfRefraction(_))));
}

#[test]
fn bad_camera_rejected() {
    let blind = MINIMAL.replace("[0, 0, 0, 10]", "[0, 0, 0, 0]");
    assert!(matches!(Scene::parse(&blind), Err(SceneError::DegenerateView)));

    let tilted = MINIMAL.replace("\"up\": [0, 1, 0, 0]", "\"up\": [0, 0, 1, 0]");
    assert!(matches!(Scene::parse(&tilted), Err(SceneError::NotOrthogonal(_))));
}

#[test]
fn region_outside_resolution_rejected() {
    let result = Scene::parse(&with_camera(
        r#""region": { "start": [0, 0, 0], "end": [4, 0, 0] }"#
    ));

    assert!(matches!(result, Err(SceneError::InvalidRegion { .. })));
}

#[test]
fn malformed_json_rejected() {
    assert!(matches!(Scene::parse("{"), Err(SceneError::Json(_))));

    let unknown_light = with_camera(
        r#""lights": [ { "type": "spot", "color": [1, 1, 1] } ]"#
    );
    assert!(matches!(Scene::parse(&unknown_light), Err(SceneError::Json(_))));

    let typo = MINIMAL.replace("\"objects\"", "\"object\"");
    assert!(matches!(Scene::parse(&typo), Err(SceneError::Json(_))));
}

#[test]
fn example_scene_renders() {
    use crate::stats::RenderStats;

    let scene = Scene::parse(include_str!("../scenes/example.json")).unwrap();
    assert!(scene.world.objects.len() >= 4);

    // One pixel straight down the line of sight.
    let center = [
        scene.camera.resolution[0] / 2,
        scene.camera.resolution[1] / 2,
        scene.camera.resolution[2] / 2,
    ];
    let region = Region { start: center, end: center };
    let mut stats = RenderStats::new();
    let image = scene.camera.render(&scene.world, &region, &mut stats).unwrap();

    assert!(stats.rays_cast >= 1);
    assert!(image.read_pixel(center[0], center[1], center[2]).is_some());
}
