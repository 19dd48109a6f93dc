use image::{Rgba, RgbaImage};
use shell_resources::{ImageSize, load_image};

fn write_png(dir: &tempfile::TempDir, name: &str, image: &RgbaImage) -> std::path::PathBuf {
    let path = dir.path().join(name);
    image.save(&path).unwrap();
    path
}

#[test]
fn loads_straight_and_premultiplied() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_png(&dir, "red.png", &RgbaImage::from_pixel(4, 2, Rgba([255, 0, 0, 128])));

    let straight = load_image(&path, None, false)?;
    assert_eq!((straight.width, straight.height), (4, 2));
    assert!(straight.pixels.iter().all(|&p| p == 0x80FF_0000));
    assert_eq!(&straight.to_bytes()[..4], &[0x00, 0x00, 0xFF, 0x80]);

    let premultiplied = load_image(&path, None, true)?;
    assert!(premultiplied.premultiplied);
    assert!(premultiplied.pixels.iter().all(|&p| p == 0x8080_0000));
    Ok(())
}

#[test]
fn rescales() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_png(&dir, "wide.png", &RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 255])));

    let half = load_image(&path, Some(ImageSize::width(4)), false)?;
    assert_eq!((half.width, half.height), (4, 2));
    // a flat image stays flat under any filter
    assert!(half.pixels.iter().all(|&p| p == 0xFF0A_141E));

    let exact = load_image(&path, Some(ImageSize::new(3, 5)), false)?;
    assert_eq!((exact.width, exact.height), (3, 5));

    let unscaled = load_image(&path, Some(ImageSize::new(0, 5)), false)?;
    assert_eq!((unscaled.width, unscaled.height), (8, 4));
    Ok(())
}

#[test]
fn missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_image(&dir.path().join("none.png"), None, false).is_err());
}
