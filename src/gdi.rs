use std::{
    ffi::c_void,
    mem::{self, MaybeUninit},
    ptr, slice,
};

use image::RgbaImage;
use windows::Win32::{
    Foundation::RECT,
    Graphics::Gdi::{
        BI_RGB, BITMAP, BITMAPINFO, BITMAPINFOHEADER, BLACK_BRUSH, CreateCompatibleDC,
        CreateDIBSection, DIB_RGB_COLORS, DIBSECTION, DeleteDC, DeleteObject, FillRect, GetDC,
        GetDIBits, GetObjectW, GetStockObject, HBITMAP, HBRUSH, HDC, HGDIOBJ, ReleaseDC,
        SelectObject,
    },
    UI::WindowsAndMessaging::{
        CreateIconIndirect, DI_NORMAL, DestroyIcon, DrawIconEx, GetIconInfo, HICON, ICONINFO,
    },
};

use crate::{
    bitmap::{self, ColorRef},
    error::{Error, Result},
    utils::image_utils::image_to_base64,
};

struct ScopedDc(HDC);

impl Drop for ScopedDc {
    fn drop(&mut self) {
        if !self.0.0.is_null() {
            unsafe {
                ReleaseDC(None, self.0);
            }
        }
    }
}

struct MemoryDc(HDC);

impl Drop for MemoryDc {
    fn drop(&mut self) {
        if !self.0.0.is_null() {
            let _ = unsafe { DeleteDC(self.0) };
        }
    }
}

pub(crate) struct AutoBitmap(pub(crate) HBITMAP);

impl Drop for AutoBitmap {
    fn drop(&mut self) {
        if !self.0.0.is_null() {
            unsafe {
                let _ = DeleteObject(HGDIOBJ::from(self.0));
            }
        }
    }
}

/// An owned `HICON`, destroyed on drop.
#[derive(Debug)]
pub struct Icon(HICON);

impl Icon {
    /// # Safety
    /// `handle` must be a valid icon that nothing else destroys.
    pub unsafe fn from_raw(handle: HICON) -> Option<Self> {
        (!handle.0.is_null()).then_some(Icon(handle))
    }

    pub fn handle(&self) -> HICON {
        self.0
    }

    /// Gives up ownership; the caller must `DestroyIcon` the handle.
    pub fn into_raw(self) -> HICON {
        let handle = self.0;
        mem::forget(self);
        handle
    }

    /// Renders the icon into a square bitmap and destroys it.
    pub fn into_bitmap(self, size: i32) -> Result<DibSection> {
        bitmap_from_icon(&self, size)
    }

    pub fn to_image(&self) -> Result<RgbaImage> {
        icon_to_image(self)
    }

    /// PNG of the icon, base64-encoded.
    pub fn to_base64(&self) -> Result<String> {
        image_to_base64(&self.to_image()?)
    }
}

impl Drop for Icon {
    fn drop(&mut self) {
        if !self.0.0.is_null() {
            unsafe {
                let _ = DestroyIcon(self.0);
            }
        }
    }
}

/// A 32-bpp DIB section with directly addressable pixels, deleted on drop.
#[derive(Debug)]
pub struct DibSection {
    handle: HBITMAP,
    bits: *mut u32,
    width: u32,
    height: u32,
    bottom_up: bool,
}

impl DibSection {
    /// A zeroed DIB. A positive `height` in the header means bottom-up rows.
    pub fn new(width: u32, height: u32, bottom_up: bool) -> Result<Self> {
        let w = i32::try_from(width).map_err(|_| Error::InvalidData("bitmap too wide".into()))?;
        let h = i32::try_from(height).map_err(|_| Error::InvalidData("bitmap too tall".into()))?;

        let info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: w,
                biHeight: if bottom_up { h } else { -h },
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let dc = MemoryDc(unsafe { CreateCompatibleDC(None) });
        let mut bits: *mut c_void = ptr::null_mut();
        let handle =
            unsafe { CreateDIBSection(Some(dc.0), &info, DIB_RGB_COLORS, &mut bits, None, 0) }?;
        if bits.is_null() {
            let _guard = AutoBitmap(handle);
            return Err(Error::last_win32("CreateDIBSection"));
        }

        Ok(DibSection {
            handle,
            bits: bits.cast(),
            width,
            height,
            bottom_up,
        })
    }

    /// Takes ownership of an existing 32-bpp DIB section.
    ///
    /// # Safety
    /// `handle` must be a bitmap that nothing else deletes or accesses while this value lives.
    pub unsafe fn from_handle(handle: HBITMAP) -> Result<Self> {
        let size = mem::size_of::<DIBSECTION>() as i32;
        let mut section = MaybeUninit::<DIBSECTION>::zeroed();
        let result = unsafe {
            GetObjectW(
                HGDIOBJ::from(handle),
                size,
                Some(section.as_mut_ptr().cast()),
            )
        };
        if result != size {
            return Err(Error::InvalidData("not a DIB section".into()));
        }
        let section = unsafe { section.assume_init() };
        if section.dsBm.bmBits.is_null() || section.dsBm.bmBitsPixel != 32 {
            return Err(Error::InvalidData(format!(
                "{}-bpp bitmaps are not supported",
                section.dsBm.bmBitsPixel
            )));
        }
        Ok(DibSection {
            handle,
            bits: section.dsBm.bmBits.cast(),
            width: section.dsBm.bmWidth.unsigned_abs(),
            height: section.dsBm.bmHeight.unsigned_abs(),
            bottom_up: section.dsBmih.biHeight > 0,
        })
    }

    pub fn handle(&self) -> HBITMAP {
        self.handle
    }

    /// Gives up ownership; the caller must `DeleteObject` the bitmap.
    pub fn into_raw(self) -> HBITMAP {
        let handle = self.handle;
        mem::forget(self);
        handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_bottom_up(&self) -> bool {
        self.bottom_up
    }

    pub fn pixels(&self) -> &[u32] {
        unsafe { slice::from_raw_parts(self.bits, self.width as usize * self.height as usize) }
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        unsafe { slice::from_raw_parts_mut(self.bits, self.width as usize * self.height as usize) }
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let len = self.width as usize * self.height as usize * 4;
        unsafe { slice::from_raw_parts_mut(self.bits.cast(), len) }
    }

    pub fn to_image(&self) -> Result<RgbaImage> {
        bitmap::rgba_from_dib(self.width, self.height, self.pixels(), self.bottom_up)
            .ok_or_else(|| Error::InvalidData("DIB pixel count mismatch".into()))
    }
}

impl Drop for DibSection {
    fn drop(&mut self) {
        unsafe {
            let _ = DeleteObject(HGDIOBJ::from(self.handle));
        }
    }
}

/// Draws `icon` over black into a new bottom-up `size` x `size` DIB section.
pub fn bitmap_from_icon(icon: &Icon, size: i32) -> Result<DibSection> {
    let side = u32::try_from(size).map_err(|_| Error::InvalidData(format!("icon size {size}")))?;
    let dib = DibSection::new(side, side, true)?;

    let dc = MemoryDc(unsafe { CreateCompatibleDC(None) });
    if dc.0.0.is_null() {
        return Err(Error::last_win32("CreateCompatibleDC"));
    }
    let rect = RECT {
        left: 0,
        top: 0,
        right: size,
        bottom: size,
    };
    unsafe {
        let previous = SelectObject(dc.0, HGDIOBJ::from(dib.handle));
        FillRect(dc.0, &rect, HBRUSH(GetStockObject(BLACK_BRUSH).0));
        let drawn = DrawIconEx(dc.0, 0, 0, icon.0, size, size, 0, None, DI_NORMAL);
        SelectObject(dc.0, previous);
        drawn?;
    }
    Ok(dib)
}

/// Premultiplies a DIB section by its alpha channel and `tint`.
pub fn premultiply_bitmap(dib: &mut DibSection, tint: ColorRef) {
    bitmap::premultiply(dib.pixels_mut(), tint);
}

/// [`premultiply_bitmap`] for a DIB section owned elsewhere.
///
/// # Safety
/// `handle` must be a 32-bpp DIB section that nobody else accesses during the call.
pub unsafe fn premultiply_hbitmap(handle: HBITMAP, tint: ColorRef) -> Result<()> {
    let mut dib = unsafe { DibSection::from_handle(handle) }?;
    premultiply_bitmap(&mut dib, tint);
    let _ = dib.into_raw();
    Ok(())
}

unsafe fn bitmap_info(handle: HBITMAP) -> Result<BITMAP> {
    let size = mem::size_of::<BITMAP>() as i32;
    let mut info = MaybeUninit::<BITMAP>::uninit();
    let result = unsafe {
        GetObjectW(
            HGDIOBJ::from(handle),
            size,
            Some(info.as_mut_ptr().cast()),
        )
    };
    if result != size {
        return Err(Error::last_win32("GetObjectW"));
    }
    Ok(unsafe { info.assume_init() })
}

/// Grayscale copy of `icon` at `size`, sharing its mask.
pub fn create_disabled_icon(icon: &Icon, size: i32) -> Result<Icon> {
    let mut info = ICONINFO::default();
    unsafe { GetIconInfo(icon.0, &mut info) }?;
    let _mask = AutoBitmap(info.hbmMask);
    let _color = AutoBitmap(info.hbmColor);

    let mut dib = bitmap_from_icon(icon, size)?;
    bitmap::grayscale(dib.pixels_mut());

    info.hbmColor = dib.handle;
    let disabled = unsafe { CreateIconIndirect(&info) }?;
    unsafe { Icon::from_raw(disabled) }.ok_or_else(|| Error::last_win32("CreateIconIndirect"))
}

/// Reads the color plane of an icon as an RGBA image.
pub fn icon_to_image(icon: &Icon) -> Result<RgbaImage> {
    let mut info = ICONINFO::default();
    unsafe { GetIconInfo(icon.0, &mut info) }?;
    let _mask = AutoBitmap(info.hbmMask);
    let _color = AutoBitmap(info.hbmColor);
    if info.hbmColor.0.is_null() {
        return Err(Error::InvalidData("monochrome icons have no color plane".into()));
    }

    let bitmap = unsafe { bitmap_info(info.hbmColor) }?;
    let width = bitmap.bmWidth.unsigned_abs();
    let height = bitmap.bmHeight.unsigned_abs();
    let len = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| Error::InvalidData("buffer size overflow".into()))?;
    let mut buf = vec![0u32; len];

    let dc = ScopedDc(unsafe { GetDC(None) });
    if dc.0.0.is_null() {
        return Err(Error::last_win32("GetDC"));
    }

    let mut bitmap_info = BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: bitmap.bmWidth,
            biHeight: -bitmap.bmHeight,
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let lines = unsafe {
        GetDIBits(
            dc.0,
            info.hbmColor,
            0,
            height,
            Some(buf.as_mut_ptr().cast()),
            &mut bitmap_info,
            DIB_RGB_COLORS,
        )
    };
    if lines == 0 {
        return Err(Error::last_win32("GetDIBits"));
    } else if lines as u32 != height {
        return Err(Error::InvalidData(format!(
            "GetDIBits returned {lines} lines, expected {height}"
        )));
    }

    bitmap::rgba_from_dib(width, height, &buf, false)
        .ok_or_else(|| Error::InvalidData("icon pixel count mismatch".into()))
}
