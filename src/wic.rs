use std::{path::Path, ptr};

use windows::{
    Win32::{
        Foundation::GENERIC_READ,
        Graphics::{
            Gdi::{HBITMAP, HPALETTE},
            Imaging::{
                CLSID_WICImagingFactory, GUID_WICPixelFormat32bppBGRA,
                GUID_WICPixelFormat32bppPBGRA, IWICBitmapSource, IWICImagingFactory,
                WICBitmapDitherTypeNone, WICBitmapInterpolationModeCubic,
                WICBitmapInterpolationModeFant, WICBitmapPaletteTypeMedianCut, WICBitmapUseAlpha,
                WICDecodeMetadataCacheOnLoad,
            },
        },
        System::Com::{CLSCTX_INPROC_SERVER, CoCreateInstance},
        UI::WindowsAndMessaging::{IMAGE_BITMAP, LR_CREATEDIBSECTION, LR_LOADFROMFILE, LoadImageW},
    },
    core::{HSTRING, Interface},
};

use crate::{
    error::Result,
    gdi::{AutoBitmap, DibSection},
    image_file::{ImageSize, ScaleFilter},
};

fn load_bmp(path: &Path) -> Option<AutoBitmap> {
    let handle = unsafe {
        LoadImageW(
            None,
            &HSTRING::from(path),
            IMAGE_BITMAP,
            0,
            0,
            LR_CREATEDIBSECTION | LR_LOADFROMFILE,
        )
    };
    match handle {
        Ok(handle) if !handle.is_invalid() => Some(AutoBitmap(HBITMAP(handle.0))),
        _ => {
            log::debug!("LoadImageW could not read {path:?}, decoding with WIC");
            None
        }
    }
}

/// Loads an image file into a 32-bpp DIB section, optionally rescaled and premultiplied.
///
/// `.bmp` files requested without a size come back as loaded when they are already 32-bpp;
/// everything else is decoded, scaled and converted by WIC. COM must be initialized on the
/// calling thread.
pub fn load_image_bitmap(
    path: &Path,
    size: Option<ImageSize>,
    premultiply: bool,
) -> Result<DibSection> {
    let is_bmp = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bmp"));
    let mut bmp = if is_bmp { load_bmp(path) } else { None };

    if size.is_none() {
        if let Some(loaded) = bmp.take() {
            match unsafe { DibSection::from_handle(loaded.0) } {
                Ok(dib) => {
                    std::mem::forget(loaded);
                    return Ok(dib);
                }
                Err(e) => {
                    log::trace!("{path:?} needs conversion: {e}");
                    bmp = Some(loaded);
                }
            }
        }
    }

    let factory: IWICImagingFactory =
        unsafe { CoCreateInstance(&CLSID_WICImagingFactory, None, CLSCTX_INPROC_SERVER) }?;

    let mut source: IWICBitmapSource = match bmp {
        Some(loaded) => unsafe {
            factory.CreateBitmapFromHBITMAP(loaded.0, HPALETTE::default(), WICBitmapUseAlpha)
        }?
        .cast()?,
        None => {
            let decoder = unsafe {
                factory.CreateDecoderFromFilename(
                    &HSTRING::from(path),
                    None,
                    GENERIC_READ,
                    WICDecodeMetadataCacheOnLoad,
                )
            }?;
            unsafe { decoder.GetFrame(0) }?.cast()?
        }
    };

    if let Some(size) = size {
        let (mut width, mut height) = (0, 0);
        unsafe { source.GetSize(&mut width, &mut height) }?;
        if let Some(scaling) = size.resolve(width, height) {
            let mode = match scaling.filter {
                ScaleFilter::Cubic => WICBitmapInterpolationModeCubic,
                ScaleFilter::Fant => WICBitmapInterpolationModeFant,
            };
            let scaler = unsafe { factory.CreateBitmapScaler() }?;
            unsafe { scaler.Initialize(&source, scaling.width, scaling.height, mode) }?;
            source = scaler.cast()?;
        }
    }

    let format = if premultiply {
        &GUID_WICPixelFormat32bppPBGRA
    } else {
        &GUID_WICPixelFormat32bppBGRA
    };
    let converter = unsafe { factory.CreateFormatConverter() }?;
    unsafe {
        converter.Initialize(
            &source,
            format,
            WICBitmapDitherTypeNone,
            None,
            0.0,
            WICBitmapPaletteTypeMedianCut,
        )
    }?;

    let (mut width, mut height) = (0, 0);
    unsafe { converter.GetSize(&mut width, &mut height) }?;

    let mut dib = DibSection::new(width, height, false)?;
    unsafe { converter.CopyPixels(ptr::null(), width * 4, dib.bytes_mut()) }?;
    Ok(dib)
}
