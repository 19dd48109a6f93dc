//! Shell namespace parsing.

/// Display name the shell uses for the desktop root.
pub const DESKTOP_ALIAS: &str = "::{Desktop}";

/// `SFGAO_FOLDER`.
pub const ATTRIBUTE_FOLDER: u32 = 0x2000_0000;

pub fn is_desktop_alias(name: &str) -> bool {
    name.eq_ignore_ascii_case(DESKTOP_ALIAS)
}

/// Attributes reported for the desktop root: only "folder", and only if asked for.
pub fn desktop_attributes(requested: u32) -> u32 {
    requested & ATTRIBUTE_FOLDER
}

#[cfg(windows)]
pub use os::{Pidl, parse_display_name};

#[cfg(windows)]
mod os {
    use std::{cell::RefCell, ptr};

    use windows::{
        Win32::{
            Foundation::HWND,
            UI::Shell::{
                Common::{ITEMIDLIST, SHITEMID},
                ILClone, ILFree, IShellFolder, SHGetDesktopFolder,
            },
        },
        core::HSTRING,
    };

    use super::{desktop_attributes, is_desktop_alias};
    use crate::error::{Error, Result};

    /// An owned absolute item id list, freed on drop.
    #[derive(Debug)]
    pub struct Pidl(*mut ITEMIDLIST);

    impl Pidl {
        /// # Safety
        /// `raw` must be an absolute PIDL allocated by the shell that nothing else frees.
        pub unsafe fn from_raw(raw: *mut ITEMIDLIST) -> Option<Self> {
            (!raw.is_null()).then_some(Pidl(raw))
        }

        pub fn as_ptr(&self) -> *const ITEMIDLIST {
            self.0
        }

        /// The empty list naming the desktop itself.
        pub fn desktop() -> Result<Self> {
            let root = ITEMIDLIST {
                mkid: SHITEMID { cb: 0, abID: [0] },
            };
            let raw = unsafe { ILClone(&root) };
            unsafe { Pidl::from_raw(raw) }.ok_or_else(|| Error::Win32 {
                function: "ILClone",
                code: 0x8007_000E,
            })
        }

        pub fn is_desktop(&self) -> bool {
            unsafe { (*self.0).mkid.cb == 0 }
        }
    }

    impl Drop for Pidl {
        fn drop(&mut self) {
            unsafe { ILFree(Some(self.0.cast_const())) };
        }
    }

    thread_local! {
        static DESKTOP: RefCell<Option<IShellFolder>> = const { RefCell::new(None) };
    }

    fn desktop_folder() -> Result<IShellFolder> {
        DESKTOP.with(|desktop| {
            let mut desktop = desktop.borrow_mut();
            if let Some(folder) = desktop.as_ref() {
                return Ok(folder.clone());
            }
            let folder = unsafe { SHGetDesktopFolder() }?;
            *desktop = Some(folder.clone());
            Ok(folder)
        })
    }

    /// Parses a display name relative to the desktop, returning the PIDL and the requested
    /// attributes that apply to it. COM must be initialized on the calling thread.
    pub fn parse_display_name(name: &str, attributes: u32) -> Result<(Pidl, u32)> {
        if is_desktop_alias(name) {
            return Ok((Pidl::desktop()?, desktop_attributes(attributes)));
        }

        let desktop = desktop_folder()?;
        let mut raw: *mut ITEMIDLIST = ptr::null_mut();
        let mut attributes = attributes;
        unsafe {
            desktop.ParseDisplayName(
                HWND::default(),
                None,
                &HSTRING::from(name),
                None,
                &mut raw,
                &mut attributes,
            )
        }?;
        let pidl = unsafe { Pidl::from_raw(raw) }
            .ok_or_else(|| Error::NotFound(format!("no shell item for {name:?}")))?;
        log::trace!("parsed {name:?}, attributes {attributes:#010x}");
        Ok((pidl, attributes))
    }
}
