use std::io;
use std::io::{ BufReader, BufWriter, Read, Write };
use std::fs::File;
use std::path::Path;
use std::convert::TryFrom;

use byteorder::{ BigEndian, ReadBytesExt, WriteBytesExt };

use crate::color::Color;
use crate::consts::{ IMAGE_MAGIC, IMAGE_VERSION };
use crate::error::{ ImageError, SceneError };

/// An inclusive box of pixel coordinates within the image cube.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub start: [usize; 3],
    pub end: [usize; 3],
}

impl Region {
    /// The whole image cube for a given resolution.
    pub fn full(resolution: [usize; 3]) -> Region {
        Region {
            start: [0; 3],
            end: [
                resolution[0].saturating_sub(1),
                resolution[1].saturating_sub(1),
                resolution[2].saturating_sub(1),
            ],
        }
    }

    /// Checks that the region is non-empty and fits inside `resolution`.
    pub fn validate(&self, resolution: [usize; 3]) -> Result<(), SceneError> {
        let fits = (0..3).all(|i| {
            self.start[i] <= self.end[i] && self.end[i] < resolution[i]
        });

        if fits {
            Ok(())
        } else {
            Err(SceneError::InvalidRegion {
                start: self.start,
                end: self.end,
                resolution,
            })
        }
    }

    /// Number of pixels along each axis.
    pub fn dims(&self) -> [usize; 3] {
        [
            self.end[0] + 1 - self.start[0],
            self.end[1] + 1 - self.start[1],
            self.end[2] + 1 - self.start[2],
        ]
    }

    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        let p = [x, y, z];
        (0..3).all(|i| p[i] >= self.start[i] && p[i] <= self.end[i])
    }
}

/// Color depth of a stored image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BitsPerPixel {
    /// Four bits per channel; two pixels share three bytes.
    Twelve,
    Twentyfour,
}

impl BitsPerPixel {
    pub fn bits(&self) -> u8 {
        match self {
            BitsPerPixel::Twelve => 12,
            BitsPerPixel::Twentyfour => 24,
        }
    }

    /// Largest channel value.
    pub fn channel_max(&self) -> u8 {
        match self {
            BitsPerPixel::Twelve => 0x0f,
            BitsPerPixel::Twentyfour => 0xff,
        }
    }

    /// Bytes in one scanline of `width` pixels, padding included.
    pub fn scanline_len(&self, width: usize) -> usize {
        match self {
            BitsPerPixel::Twelve => (3 * width + 1) / 2,
            BitsPerPixel::Twentyfour => 3 * width,
        }
    }
}

impl TryFrom<u8> for BitsPerPixel {
    type Error = ImageError;

    fn try_from(bits: u8) -> Result<BitsPerPixel, ImageError> {
        match bits {
            12 => Ok(BitsPerPixel::Twelve),
            24 => Ok(BitsPerPixel::Twentyfour),
            _ => Err(ImageError::UnsupportedBitsPerPixel(bits)),
        }
    }
}

/// The fixed-size header at the start of every image file.
///
/// All multi-byte fields are big-endian. `first` and `last` are the
/// inclusive corners of the stored region.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub bits_per_pixel: BitsPerPixel,
    pub aspect: [u16; 3],
    pub first: [u16; 3],
    pub last: [u16; 3],
}

impl ImageHeader {
    /// Size of the encoded header in bytes.
    pub const LEN: usize = 24;

    pub fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u32::<BigEndian>(IMAGE_MAGIC)?;
        out.write_u8(IMAGE_VERSION)?;
        out.write_u8(self.bits_per_pixel.bits())?;

        for field in [self.aspect, self.first, self.last].iter() {
            for &value in field.iter() {
                out.write_u16::<BigEndian>(value)?;
            }
        }

        Ok(())
    }

    pub fn read<R: Read>(input: &mut R) -> Result<ImageHeader, ImageError> {
        let magic = input.read_u32::<BigEndian>()?;
        if magic != IMAGE_MAGIC {
            return Err(ImageError::BadMagic(magic));
        }

        let version = input.read_u8()?;
        if version != IMAGE_VERSION {
            return Err(ImageError::UnsupportedVersion(version));
        }

        let bits_per_pixel = BitsPerPixel::try_from(input.read_u8()?)?;

        let mut fields = [[0u16; 3]; 3];
        for field in fields.iter_mut() {
            for value in field.iter_mut() {
                *value = input.read_u16::<BigEndian>()?;
            }
        }
        let [aspect, first, last] = fields;

        if (0..3).any(|i| first[i] > last[i]) {
            return Err(ImageError::EmptyRegion { first, last });
        }

        Ok(ImageHeader { bits_per_pixel, aspect, first, last })
    }

    /// The region of the image cube covered by the file.
    pub fn region(&self) -> Region {
        let widen = |c: [u16; 3]| [c[0] as usize, c[1] as usize, c[2] as usize];
        Region { start: widen(self.first), end: widen(self.last) }
    }
}

/// A canvas for drawing pixels.
///
/// Holds the traced color of every pixel in a region of the image cube,
/// stored x fastest, then y, then z. Colors are kept unclamped until the
/// canvas is written out.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    region: Region,
    pixels: Vec<Color>,
}

impl Canvas {
    /// Creates a black canvas covering `region`.
    pub fn new(region: Region) -> Canvas {
        let [w, h, d] = region.dims();
        Canvas {
            region,
            pixels: vec![Color::black(); w * h * d],
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if !self.region.contains(x, y, z) {
            return None;
        }

        let [w, h, _] = self.region.dims();
        let [sx, sy, sz] = self.region.start;
        Some(((z - sz) * h + (y - sy)) * w + (x - sx))
    }

    /// Writes a color to a pixel of the image cube.
    ///
    /// Pixels outside the canvas region are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ray4d::color::Color;
    /// # use ray4d::canvas::{ Canvas, Region };
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// let mut canvas = Canvas::new(Region::full([8, 8, 2]));
    /// canvas.write_pixel(4, 2, 1, &purple);
    /// assert_eq!(canvas.read_pixel(4, 2, 1).unwrap(), purple);
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, z: usize, pixel: &Color) {
        if let Some(i) = self.index(x, y, z) {
            self.pixels[i] = *pixel;
        }
    }

    /// Reads a pixel, or `None` if it lies outside the canvas region.
    pub fn read_pixel(&self, x: usize, y: usize, z: usize) -> Option<Color> {
        self.index(x, y, z).map(|i| self.pixels[i])
    }

    /// Encodes the canvas as a header followed by one scanline per row.
    ///
    /// Rows are written for each slice along Z, and within a slice for each
    /// row along Y. Channels are clamped to `[0, 1]` and quantized.
    pub fn write_to<W: Write>(&self, out: &mut W, bits: BitsPerPixel,
        aspect: [u16; 3]) -> io::Result<()> {
        let narrow = |c: [usize; 3]| -> io::Result<[u16; 3]> {
            let mut coords = [0u16; 3];
            for (dst, &src) in coords.iter_mut().zip(c.iter()) {
                *dst = u16::try_from(src).map_err(|_| io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "pixel coordinate does not fit the image header",
                ))?;
            }
            Ok(coords)
        };

        let header = ImageHeader {
            bits_per_pixel: bits,
            aspect,
            first: narrow(self.region.start)?,
            last: narrow(self.region.end)?,
        };
        header.write(out)?;

        let width = self.region.dims()[0];
        let max = bits.channel_max();
        let mut line = Vec::with_capacity(bits.scanline_len(width));

        for row in self.pixels.chunks(width) {
            line.clear();
            match bits {
                BitsPerPixel::Twentyfour => {
                    for pixel in row.iter() {
                        line.extend_from_slice(&pixel.quantize(max));
                    }
                },
                BitsPerPixel::Twelve => {
                    let mut nibbles = row.iter().flat_map(|p| {
                        let q = p.quantize(max);
                        vec![q[0], q[1], q[2]]
                    });

                    // High nibble first; an odd count is padded with zero.
                    while let Some(high) = nibbles.next() {
                        let low = nibbles.next().unwrap_or(0);
                        line.push(high << 4 | low);
                    }
                },
            }
            out.write_all(&line)?;
        }

        Ok(())
    }

    /// Saves the canvas to an image file.
    pub fn save(&self, path: &Path, bits: BitsPerPixel, aspect: [u16; 3])
        -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out, bits, aspect)?;
        out.flush()
    }

    /// Decodes an image written by `write_to`.
    ///
    /// Colors come back quantized to the stored bit depth. The pixel buffer
    /// grows with the scanlines actually read, so a header claiming more
    /// data than the input holds fails with an I/O error.
    pub fn read_from<R: Read>(input: &mut R)
        -> Result<(ImageHeader, Canvas), ImageError> {
        let header = ImageHeader::read(input)?;
        let bits = header.bits_per_pixel;
        let max = bits.channel_max();

        let region = header.region();
        let [w, h, d] = region.dims();
        let rows = h.checked_mul(d)
            .filter(|rows| rows.checked_mul(w).is_some())
            .ok_or(ImageError::TooLarge { first: header.first, last: header.last })?;

        let mut pixels = Vec::new();
        let mut line = vec![0u8; bits.scanline_len(w)];

        for _ in 0..rows {
            input.read_exact(&mut line)?;

            match bits {
                BitsPerPixel::Twentyfour => {
                    for rgb in line.chunks(3) {
                        pixels.push(Color::from_channels([rgb[0], rgb[1], rgb[2]], max));
                    }
                },
                BitsPerPixel::Twelve => {
                    let nibbles: Vec<u8> = line.iter()
                        .flat_map(|&b| vec![b >> 4, b & 0x0f])
                        .collect();
                    for rgb in nibbles.chunks(3).take(w) {
                        pixels.push(Color::from_channels([rgb[0], rgb[1], rgb[2]], max));
                    }
                },
            }
        }

        Ok((header, Canvas { region, pixels }))
    }

    /// Loads an image file.
    pub fn load(path: &Path) -> Result<(ImageHeader, Canvas), ImageError> {
        let mut input = BufReader::new(File::open(path)?);
        Canvas::read_from(&mut input)
    }
}

/* Tests */

#[test]
fn full_region() {
    let r = Region::full([4, 3, 2]);

    assert_eq!(r.start, [0, 0, 0]);
    assert_eq!(r.end, [3, 2, 1]);
    assert_eq!(r.dims(), [4, 3, 2]);
    assert!(r.validate([4, 3, 2]).is_ok());
}

#[test]
fn region_validation() {
    let res = [4, 4, 4];

    assert!(Region { start: [1, 1, 1], end: [1, 2, 3] }.validate(res).is_ok());
    assert!(Region { start: [0, 0, 0], end: [4, 0, 0] }.validate(res).is_err());
    assert!(Region { start: [2, 0, 0], end: [1, 0, 0] }.validate(res).is_err());
}

#[test]
fn pixels_outside_region() {
    let mut c = Canvas::new(Region { start: [2, 2, 2], end: [3, 3, 3] });
    c.write_pixel(0, 0, 0, &Color::white());

    assert_eq!(c.read_pixel(0, 0, 0), None);
    assert_eq!(c.read_pixel(2, 2, 2), Some(Color::black()));
    assert_eq!(c.read_pixel(3, 3, 4), None);
}

#[test]
fn header_layout() {
    let mut c = Canvas::new(Region::full([2, 1, 1]));
    c.write_pixel(0, 0, 0, &Color::rgb(1.0, 0.0, 2.0));
    c.write_pixel(1, 0, 0, &Color::rgb(0.2, -1.0, 0.5));

    let mut bytes = Vec::new();
    c.write_to(&mut bytes, BitsPerPixel::Twentyfour, [1, 2, 3]).unwrap();

    assert_eq!(bytes, vec![
        0x52, 0x61, 0x79, 0x34,             // magic
        2, 24,                              // version, bits per pixel
        0, 1, 0, 2, 0, 3,                   // aspect
        0, 0, 0, 0, 0, 0,                   // first
        0, 1, 0, 0, 0, 0,                   // last
        255, 0, 255, 51, 0, 128,            // scanline
    ]);
}

#[test]
fn twelve_bit_scanline_padding() {
    let mut c = Canvas::new(Region::full([3, 2, 1]));
    for y in 0..2 {
        c.write_pixel(0, y, 0, &Color::white());
        c.write_pixel(2, y, 0, &Color::rgb(1.0, 0.0, 0.5));
    }

    let mut bytes = Vec::new();
    c.write_to(&mut bytes, BitsPerPixel::Twelve, [1, 1, 1]).unwrap();

    // Nine nibbles per row round up to five bytes.
    let row = [0xff, 0xf0, 0x00, 0xf0, 0x80];
    assert_eq!(bytes.len(), ImageHeader::LEN + 2 * row.len());
    assert_eq!(&bytes[ImageHeader::LEN..ImageHeader::LEN + 5], &row);
    assert_eq!(&bytes[ImageHeader::LEN + 5..], &row);
}

#[test]
fn round_trip() {
    let region = Region { start: [1, 2, 0], end: [3, 3, 1] };
    let mut c = Canvas::new(region);
    for z in 0..2 {
        for y in 2..4 {
            for x in 1..4 {
                let channels = [x as u8 * 40, y as u8 * 50, z as u8 * 100];
                c.write_pixel(x, y, z, &Color::from_channels(channels, 255));
            }
        }
    }

    let mut bytes = Vec::new();
    c.write_to(&mut bytes, BitsPerPixel::Twentyfour, [2, 1, 1]).unwrap();
    let (header, decoded) = Canvas::read_from(&mut bytes.as_slice()).unwrap();

    assert_eq!(header.aspect, [2, 1, 1]);
    assert_eq!(header.region(), region);
    assert_eq!(decoded, c);
}

#[test]
fn round_trip_twelve_bit() {
    let mut c = Canvas::new(Region::full([3, 1, 1]));
    c.write_pixel(0, 0, 0, &Color::from_channels([1, 2, 3], 15));
    c.write_pixel(1, 0, 0, &Color::from_channels([15, 0, 7], 15));
    c.write_pixel(2, 0, 0, &Color::from_channels([4, 9, 12], 15));

    let mut bytes = Vec::new();
    c.write_to(&mut bytes, BitsPerPixel::Twelve, [1, 1, 1]).unwrap();
    let (_, decoded) = Canvas::read_from(&mut bytes.as_slice()).unwrap();

    assert_eq!(decoded, c);
}

#[test]
fn reject_malformed_headers() {
    let mut good = Vec::new();
    ImageHeader {
        bits_per_pixel: BitsPerPixel::Twelve,
        aspect: [1, 1, 1],
        first: [0, 0, 0],
        last: [0, 0, 0],
    }.write(&mut good).unwrap();

    let mut bad_magic = good.clone();
    bad_magic[0] = 0;
    assert!(matches!(ImageHeader::read(&mut bad_magic.as_slice()),
        Err(ImageError::BadMagic(_))));

    let mut bad_version = good.clone();
    bad_version[4] = 1;
    assert!(matches!(ImageHeader::read(&mut bad_version.as_slice()),
        Err(ImageError::UnsupportedVersion(1))));

    let mut bad_bits = good.clone();
    bad_bits[5] = 16;
    assert!(matches!(ImageHeader::read(&mut bad_bits.as_slice()),
        Err(ImageError::UnsupportedBitsPerPixel(16))));

    let mut empty = good.clone();
    empty[13] = 5;
    assert!(matches!(ImageHeader::read(&mut empty.as_slice()),
        Err(ImageError::EmptyRegion { .. })));

    assert!(matches!(ImageHeader::read(&mut &good[..10]),
        Err(ImageError::Io(_))));
}

#[test]
fn oversized_header_without_data() {
    let mut bytes = Vec::new();
    ImageHeader {
        bits_per_pixel: BitsPerPixel::Twentyfour,
        aspect: [1, 1, 1],
        first: [0, 0, 0],
        last: [65535, 65535, 65535],
    }.write(&mut bytes).unwrap();

    assert!(matches!(Canvas::read_from(&mut bytes.as_slice()),
        Err(ImageError::Io(_))));
}

#[test]
fn truncated_scanlines() {
    let mut c = Canvas::new(Region::full([2, 2, 1]));
    c.write_pixel(1, 1, 0, &Color::white());

    let mut bytes = Vec::new();
    c.write_to(&mut bytes, BitsPerPixel::Twentyfour, [1, 1, 1]).unwrap();
    bytes.truncate(bytes.len() - 1);

    assert!(matches!(Canvas::read_from(&mut bytes.as_slice()),
        Err(ImageError::Io(_))));
}
