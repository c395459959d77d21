use std::ops::{ Add, AddAssign, Mul };

use crate::feq;

/// A color.
///
/// Represented conventionally with red-green-blue (RGB) values. Scene colors
/// usually lie in 0.0 to 1.0 inclusive, but sums of light contributions may
/// leave that range; colors are only clamped when packed into an image.
///
/// # Examples
///
/// Filter white light through a tinted surface:
///
/// ```
/// # use ray4d::color::Color;
/// let light = Color::white();
/// let tint = Color::rgb(0.2, 0.5, 1.0);
/// assert_eq!(light * tint, Color::rgb(0.2, 0.5, 1.0));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialOrd)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Partial equality on two colors.
///
/// Similar to the `PartialEq` implementation on `Vector4D`, `Color`s are
/// compared component-wise, accounting for possible floating point error in
/// comparisons.
impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r) &&
            feq(self.g, other.g) &&
            feq(self.b, other.b)
    }
}

impl From<[f64; 3]> for Color {
    fn from(c: [f64; 3]) -> Color {
        Color { r: c[0], g: c[1], b: c[2] }
    }
}

impl Color {
    /// Creates a color with red, green and blue values.
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    /// The color black.
    pub fn black() -> Color {
        Color {
            r: 0.0,
            g: 0.0,
            b: 0.0
        }
    }

    /// The color white.
    pub fn white() -> Color {
        Color {
            r: 1.0,
            g: 1.0,
            b: 1.0
        }
    }

    /// Sum of the three components.
    ///
    /// Used as a cheap measure of whether a color contributes anything.
    pub fn sum(&self) -> f64 {
        self.r + self.g + self.b
    }

    /// Computes the Hadamard product of two colors.
    ///
    /// The hadamard product multiplies each component of the two colors, and
    /// yields a new color containing those products.
    pub fn hadamard(c1: &Color, c2: &Color) -> Color {
        let r = c1.r * c2.r;
        let g = c1.g * c2.g;
        let b = c1.b * c2.b;

        Color { r, g, b }
    }

    /// Scales each component into an integer channel of `0..=max`.
    ///
    /// Components are clamped to the displayable range first, then rounded.
    ///
    /// ```
    /// # use ray4d::color::Color;
    /// let c = Color::rgb(1.5, 0.5, -0.25);
    /// assert_eq!(c.quantize(255), [255, 128, 0]);
    /// assert_eq!(c.quantize(15), [15, 8, 0]);
    /// ```
    pub fn quantize(&self, max: u8) -> [u8; 3] {
        let scale = |c: f64| (c.clamp(0.0, 1.0) * f64::from(max)).round() as u8;
        [scale(self.r), scale(self.g), scale(self.b)]
    }

    /// Inverse of `quantize`, up to rounding.
    pub fn from_channels(channels: [u8; 3], max: u8) -> Color {
        let max = f64::from(max);
        Color {
            r: f64::from(channels[0]) / max,
            g: f64::from(channels[1]) / max,
            b: f64::from(channels[2]) / max,
        }
    }
}

/// Adds two colors together.
///
/// Components are added together individually.
impl Add<Color> for Color {
    type Output = Color;

    fn add(self, other: Color) -> Self::Output {
        Color {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
        }
    }
}

impl AddAssign<Color> for Color {
    fn add_assign(&mut self, other: Color) {
        *self = *self + other;
    }
}

/// Multiplies a color by a scalar.
///
/// Each component is multiplied by the scalar.
impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, other: f64) -> Self::Output {
        Color {
            r: self.r * other,
            g: self.g * other,
            b: self.b * other,
        }
    }
}

/// Multiplies a color by a color.
///
/// For colors `c1` and `c2`, `c1 * c2` is shorthand for
/// `Color::hadamard(&c1, &c2)`.
impl Mul<Color> for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Self::Output {
        Color::hadamard(&self, &other)
    }
}

#[test]
fn add_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);
    let c3 = Color { r: 1.6, g: 0.7, b: 1.0 };

    assert_eq!(c1 + c2, c3);
}

#[test]
fn accumulate_colors() {
    let mut c = Color::black();
    c += Color::rgb(0.25, 0.5, 0.0);
    c += Color::rgb(0.25, 0.0, 2.0);

    assert_eq!(c, Color::rgb(0.5, 0.5, 2.0));
}

#[test]
fn multiply_colors() {
    let c1 = Color::rgb(0.2, 0.3, 0.4);
    let c2 = Color { r: 0.4, g: 0.6, b: 0.8 };

    assert_eq!(c1 * 2.0, c2);
}

#[test]
fn hadamard_colors() {
    let c1 = Color::rgb(1.0, 0.2, 0.4);
    let c2 = Color::rgb(0.9, 1.0, 0.1);

    assert_eq!(c1 * c2, Color::rgb(0.9, 0.2, 0.04));
}

#[test]
fn sum_of_components() {
    assert!(feq(Color::rgb(0.1, 0.2, 0.3).sum(), 0.6));
    assert_eq!(Color::black().sum(), 0.0);
}

#[test]
fn quantize_and_back() {
    let c = Color::rgb(0.0, 1.0, 0.2);
    let channels = c.quantize(255);

    assert_eq!(channels, [0, 255, 51]);
    assert_eq!(Color::from_channels(channels, 255), c);
}
