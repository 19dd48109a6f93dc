//! Decoding image files into 32-bit BGRA pixels, with optional rescaling.

use std::path::Path;

use image::imageops::FilterType;

use crate::{
    bitmap::{self, ColorRef},
    error::Result,
    utils::image_utils::read_image_file,
};

/// Requested output size. A zero width leaves the image unscaled; a zero height keeps the
/// aspect ratio.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        ImageSize { width, height }
    }

    pub fn width(width: u32) -> Self {
        ImageSize { width, height: 0 }
    }

    /// Target dimensions for a `src_width` x `src_height` source, or `None` to keep it as is.
    pub fn resolve(self, src_width: u32, src_height: u32) -> Option<Scaling> {
        if self.width == 0 || src_width == 0 {
            return None;
        }
        if self.height != 0 {
            return Some(Scaling {
                width: self.width,
                height: self.height,
                filter: ScaleFilter::Cubic,
            });
        }
        let height = u64::from(self.width) * u64::from(src_height) / u64::from(src_width);
        Some(Scaling {
            width: self.width,
            height: u32::try_from(height).unwrap_or(u32::MAX).max(1),
            filter: ScaleFilter::Fant,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleFilter {
    /// Bicubic, for explicit sizes.
    Cubic,
    /// Area averaging, for aspect-preserving downscales.
    Fant,
}

impl ScaleFilter {
    pub(crate) fn filter_type(self) -> FilterType {
        match self {
            ScaleFilter::Cubic => FilterType::CatmullRom,
            ScaleFilter::Fant => FilterType::Triangle,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scaling {
    pub width: u32,
    pub height: u32,
    pub filter: ScaleFilter,
}

/// Top-down 32-bit pixels in DIB order (`0xAARRGGBB`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BgraImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
    pub premultiplied: bool,
}

impl BgraImage {
    /// Raw bytes as they would sit in a DIB section.
    pub fn to_bytes(&self) -> Vec<u8> {
        bitmap::dib_bytes(&self.pixels)
    }
}

/// Loads an image file into BGRA pixels, rescaled to `size` and optionally premultiplied.
pub fn load_image(path: &Path, size: Option<ImageSize>, premultiply: bool) -> Result<BgraImage> {
    let mut image = read_image_file(path)?.to_rgba8();

    if let Some(scaling) = size.and_then(|s| s.resolve(image.width(), image.height())) {
        log::trace!(
            "scaling {path:?} from {}x{} to {}x{} ({:?})",
            image.width(),
            image.height(),
            scaling.width,
            scaling.height,
            scaling.filter
        );
        image = image::imageops::resize(
            &image,
            scaling.width,
            scaling.height,
            scaling.filter.filter_type(),
        );
    }

    let mut pixels = bitmap::dib_from_rgba(&image);
    if premultiply {
        bitmap::premultiply(&mut pixels, ColorRef::WHITE);
    }
    Ok(BgraImage {
        width: image.width(),
        height: image.height(),
        pixels,
        premultiplied: premultiply,
    })
}
