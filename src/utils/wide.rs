use std::{ffi::OsStr, os::windows::ffi::OsStrExt, path::Path};

use windows::core::PCWSTR;

/// NUL-terminated UTF-16 copy of a path.
pub fn to_wide(path: &Path) -> Vec<u16> {
    OsStr::new(path).encode_wide().chain(Some(0)).collect()
}

pub fn str_to_wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(Some(0)).collect()
}

pub const fn make_int_resource(id: u16) -> PCWSTR {
    PCWSTR(id as usize as *const u16)
}
