//! Pixel arithmetic on 32-bit DIB pixels.
//!
//! A DIB pixel is a `u32` laid out as `0xAARRGGBB` (bytes B, G, R, A in memory).

use image::{Rgba, RgbaImage};

/// A GDI `COLORREF`: `0x00BBGGRR`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorRef(pub u32);

impl ColorRef {
    pub const WHITE: ColorRef = ColorRef(0x00FF_FFFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        ColorRef(r as u32 | (g as u32) << 8 | (b as u32) << 16)
    }

    pub const fn r(self) -> u32 {
        self.0 & 255
    }

    pub const fn g(self) -> u32 {
        (self.0 >> 8) & 255
    }

    pub const fn b(self) -> u32 {
        (self.0 >> 16) & 255
    }
}

#[inline]
fn split(pixel: u32) -> (u32, u32, u32, u32) {
    (pixel >> 24, (pixel >> 16) & 255, (pixel >> 8) & 255, pixel & 255)
}

#[inline]
fn join(a: u32, r: u32, g: u32, b: u32) -> u32 {
    (a << 24) | (r << 16) | (g << 8) | b
}

/// Scales every color channel by alpha and by the matching channel of `tint`.
///
/// With `ColorRef::WHITE` this is a plain alpha premultiplication.
pub fn premultiply(pixels: &mut [u32], tint: ColorRef) {
    let (mr, mg, mb) = (tint.r(), tint.g(), tint.b());
    for pixel in pixels {
        let (a, r, g, b) = split(*pixel);
        *pixel = join(
            a,
            r * a * mr / (255 * 255),
            g * a * mg / (255 * 255),
            b * a * mb / (255 * 255),
        );
    }
}

/// Replaces the color of each pixel by a gray level, keeping alpha.
///
/// The low byte is weighted 77 and byte 2 is weighted 28.
pub fn grayscale(pixels: &mut [u32]) {
    for pixel in pixels {
        let (a, r, g, b) = split(*pixel);
        let l = (77 * b + 151 * g + 28 * r) / 256;
        *pixel = join(a, l, l, l);
    }
}

/// Converts DIB pixels to an RGBA image. Bottom-up DIBs store the last row first.
pub fn rgba_from_dib(
    width: u32,
    height: u32,
    pixels: &[u32],
    bottom_up: bool,
) -> Option<RgbaImage> {
    let w = width as usize;
    if pixels.len() != w.checked_mul(height as usize)? {
        return None;
    }
    let mut image = RgbaImage::new(width, height);
    for (y, row) in pixels.chunks_exact(w.max(1)).enumerate() {
        let y = if bottom_up { height as usize - 1 - y } else { y };
        for (x, &pixel) in row.iter().enumerate() {
            let (a, r, g, b) = split(pixel);
            image.put_pixel(x as u32, y as u32, Rgba([r as u8, g as u8, b as u8, a as u8]));
        }
    }
    Some(image)
}

/// Converts an RGBA image to top-down DIB pixels.
pub fn dib_from_rgba(image: &RgbaImage) -> Vec<u32> {
    image
        .pixels()
        .map(|Rgba([r, g, b, a])| join(u32::from(*a), u32::from(*r), u32::from(*g), u32::from(*b)))
        .collect()
}

/// Serializes DIB pixels to the in-memory byte order (B, G, R, A).
pub fn dib_bytes(pixels: &[u32]) -> Vec<u8> {
    pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
}
