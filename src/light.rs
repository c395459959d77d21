use crate::color::Color;
use crate::vector::{ Point4D, Vector4D };
use crate::error::SceneError;

/// Where light arrives from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LightKind {
    /// A point source at a position in the scene.
    Point(Point4D),

    /// A source at infinity. The vector is unit length and points *toward*
    /// the light.
    Directional(Vector4D),
}

/// A light source.
///
/// A very simple light source: a color plus either a position or a
/// direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Light {
    pub color: Color,
    pub kind: LightKind,
}

impl Light {
    /// Creates a point light.
    pub fn point(color: Color, position: Point4D) -> Light {
        Light { color, kind: LightKind::Point(position) }
    }

    /// Creates a directional light shining from `toward_light`.
    ///
    /// The direction is normalized here; a zero-length direction is an error.
    pub fn directional(color: Color, toward_light: Vector4D)
        -> Result<Light, SceneError> {
        let direction = toward_light.normalized()
            .ok_or(SceneError::ZeroLightDirection)?;

        Ok(Light { color, kind: LightKind::Directional(direction) })
    }

    /// Direction toward the light from `point`, and the distance to it.
    ///
    /// Directional lights report no distance. Returns `None` when `point`
    /// coincides with a point light, which has no direction.
    pub fn direction_from(&self, point: &Point4D)
        -> Option<(Vector4D, Option<f64>)> {
        match self.kind {
            LightKind::Point(position) => {
                let to_light = position - *point;
                let distance = to_light.norm();
                to_light.normalized().map(|direction| (direction, Some(distance)))
            },
            LightKind::Directional(direction) => Some((direction, None)),
        }
    }
}

#[test]
fn directional_light_normalized() {
    let light = Light::directional(
        Color::white(), Vector4D::new(0.0, 0.0, 0.0, 4.0)
    ).unwrap();

    assert_eq!(light.kind,
        LightKind::Directional(Vector4D::new(0.0, 0.0, 0.0, 1.0)));
}

#[test]
fn zero_directional_light_rejected() {
    let light = Light::directional(Color::white(), Vector4D::zero());

    assert!(matches!(light, Err(SceneError::ZeroLightDirection)));
}

#[test]
fn point_light_direction_and_distance() {
    let light = Light::point(Color::white(), Vector4D::new(0.0, 3.0, 0.0, 4.0));
    let (direction, distance) = light.direction_from(&Vector4D::zero()).unwrap();

    assert_eq!(direction, Vector4D::new(0.0, 0.6, 0.0, 0.8));
    assert_eq!(distance, Some(5.0));
}

#[test]
fn point_light_at_shading_point_has_no_direction() {
    let p = Vector4D::new(1.0, 2.0, 3.0, 4.0);
    let light = Light::point(Color::white(), p);

    assert!(light.direction_from(&p).is_none());
}
