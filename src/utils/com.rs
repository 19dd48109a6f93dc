use windows::{
    Win32::System::Com::{COINIT, CoInitializeEx, CoUninitialize},
    core::HRESULT,
};

/// Keeps COM initialized on the current thread for as long as it lives.
pub struct ComInit {
    hr: HRESULT,
}

impl ComInit {
    pub fn new(coinit: COINIT) -> Self {
        let hr = unsafe { CoInitializeEx(None, coinit) };
        if hr.is_err() {
            log::debug!("CoInitializeEx failed: {hr:?}");
        }
        Self { hr }
    }
}

impl Drop for ComInit {
    fn drop(&mut self) {
        if self.hr.is_ok() {
            unsafe { CoUninitialize() };
        }
    }
}
