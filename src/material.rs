use bitflags::bitflags;

use crate::color::Color;
use crate::consts::{ COLOR_EPSILON, VACUUM_RI };
use crate::error::SceneError;

bitflags! {
    /// Which illumination terms an `Attributes` record contributes.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct AttrFlags: u8 {
        const AMBIENT     = 0b00001;
        const DIFFUSE     = 0b00010;
        const SPECULAR    = 0b00100;
        const TRANSPARENT = 0b01000;
        /// Spawns mirror rays weighted by the specular color.
        const REFLECT     = 0b10000;
    }
}

/// A surface material.
///
/// Many objects may share one record. The flag set is derived once at
/// construction so the shader never has to re-examine the colors.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Attributes {
    /// Ambient reflectance (Ka).
    pub ambient: Color,

    /// Diffuse reflectance (Kd).
    pub diffuse: Color,

    /// Specular reflectance (Ks); also weights mirror reflections.
    pub specular: Color,

    /// Transmittance (Kt).
    pub transparent: Color,

    /// Phong exponent.
    pub shininess: f64,

    pub index_of_refraction: f64,

    flags: AttrFlags,
}

impl Default for Attributes {
    fn default() -> Attributes {
        Attributes {
            ambient: Color::black(),
            diffuse: Color::black(),
            specular: Color::black(),
            transparent: Color::black(),
            shininess: 0.0,
            index_of_refraction: VACUUM_RI,
            flags: AttrFlags::empty(),
        }
    }
}

impl Attributes {
    /// Creates a material and derives its flag set.
    ///
    /// `reflect` requests mirror reflection; it only takes effect if the
    /// specular color is non-black.
    pub fn new(ambient: Color, diffuse: Color, specular: Color,
        transparent: Color, shininess: f64, index_of_refraction: f64,
        reflect: bool) -> Result<Attributes, SceneError> {
        if index_of_refraction <= 0.0 {
            return Err(SceneError::NonPositiveIndexOfRefraction(
                index_of_refraction
            ));
        }

        let mut flags = AttrFlags::empty();
        flags.set(AttrFlags::AMBIENT, ambient.sum() > COLOR_EPSILON);
        flags.set(AttrFlags::DIFFUSE, diffuse.sum() > COLOR_EPSILON);
        flags.set(AttrFlags::SPECULAR, specular.sum() > COLOR_EPSILON);
        flags.set(AttrFlags::TRANSPARENT, transparent.sum() > COLOR_EPSILON);
        flags.set(AttrFlags::REFLECT,
            reflect && flags.contains(AttrFlags::SPECULAR));

        Ok(Attributes {
            ambient,
            diffuse,
            specular,
            transparent,
            shininess,
            index_of_refraction,
            flags,
        })
    }

    /// A purely diffuse, ambient-lit material.
    pub fn matte(ambient: Color, diffuse: Color) -> Attributes {
        let mut attributes = Attributes {
            ambient,
            diffuse,
            ..Default::default()
        };

        attributes.flags.set(AttrFlags::AMBIENT, ambient.sum() > COLOR_EPSILON);
        attributes.flags.set(AttrFlags::DIFFUSE, diffuse.sum() > COLOR_EPSILON);
        attributes
    }

    pub fn flags(&self) -> AttrFlags {
        self.flags
    }

    pub fn is_transparent(&self) -> bool {
        self.flags.contains(AttrFlags::TRANSPARENT)
    }
}

#[test]
fn flags_follow_colors() {
    let attributes = Attributes::new(
        Color::rgb(0.1, 0.1, 0.1),
        Color::rgb(0.7, 0.0, 0.0),
        Color::black(),
        Color::rgb(0.0, 0.0, 0.5),
        10.0, 1.5, false,
    ).unwrap();

    assert_eq!(attributes.flags(),
        AttrFlags::AMBIENT | AttrFlags::DIFFUSE | AttrFlags::TRANSPARENT);
    assert!(attributes.is_transparent());
}

#[test]
fn reflect_requires_specular() {
    let dull = Attributes::new(
        Color::black(), Color::white(), Color::black(), Color::black(),
        1.0, 1.0, true,
    ).unwrap();
    let mirror = Attributes::new(
        Color::black(), Color::black(), Color::white(), Color::black(),
        1.0, 1.0, true,
    ).unwrap();

    assert!(!dull.flags().contains(AttrFlags::REFLECT));
    assert_eq!(mirror.flags(), AttrFlags::SPECULAR | AttrFlags::REFLECT);
}

#[test]
fn tiny_colors_do_not_set_flags() {
    let attributes = Attributes::new(
        Color::rgb(1.0e-7, 0.0, 0.0), Color::black(), Color::black(),
        Color::black(), 1.0, 1.0, false,
    ).unwrap();

    assert!(attributes.flags().is_empty());
}

#[test]
fn non_positive_index_of_refraction_rejected() {
    let result = Attributes::new(
        Color::black(), Color::black(), Color::black(), Color::black(),
        1.0, 0.0, false,
    );

    assert!(matches!(result,
        Err(SceneError::NonPositiveIndexOfRefraction(_))));
}

#[test]
fn matte_material() {
    let attributes = Attributes::matte(Color::white(), Color::rgb(0.5, 0.5, 0.5));

    assert_eq!(attributes.flags(), AttrFlags::AMBIENT | AttrFlags::DIFFUSE);
    assert_eq!(attributes.index_of_refraction, VACUUM_RI);
}
