use thiserror::Error;

/// Every error this crate can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// A Win32 or COM call failed. `code` is the raw `GetLastError()` value or HRESULT.
    #[error("{function} failed (error {code:#010x})")]
    Win32 { function: &'static str, code: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("translation resources are already loaded")]
    AlreadyInitialized,

    #[error("settings file is malformed: {0}")]
    Settings(#[from] serde_json::Error),
}

impl Error {
    /// Captures `GetLastError()` for a failed Win32 call.
    #[cfg(windows)]
    pub(crate) fn last_win32(function: &'static str) -> Self {
        let e = windows::core::Error::from_win32();
        Self::Win32 {
            function,
            code: e.code().0 as u32,
        }
    }
}

// HRESULT is i32; reinterpret the bits so Win32 errors show up as 0x8007xxxx.
#[cfg(windows)]
impl From<windows::core::Error> for Error {
    fn from(e: windows::core::Error) -> Self {
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
