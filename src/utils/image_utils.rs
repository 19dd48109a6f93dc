use std::{
    fs::File,
    io::{Cursor, Read},
    path::Path,
};

use base64::{Engine, engine::general_purpose};
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::Result;

fn read_image_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Decodes an image file, guessing the format from its contents.
pub fn read_image_file(path: &Path) -> Result<DynamicImage> {
    let buffer = read_image_bytes(path)?;
    Ok(image::load_from_memory(&buffer)?)
}

/// PNG-encodes an image and returns it as base64.
pub fn image_to_base64(image: &RgbaImage) -> Result<String> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(general_purpose::STANDARD.encode(&png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn base64_is_png() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4]));
        let encoded = image_to_base64(&img).unwrap();
        let png = general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }
}
