//! Module and OS version numbers.

/// Offset of `VS_FIXEDFILEINFO` inside a `VS_VERSION_INFO` resource. The header in front of it
/// (length, value length, type, `"VS_VERSION_INFO\0"`, padding) has a fixed size.
const FIXED_FILE_INFO_OFFSET: usize = 40;
const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Packs the product version of a version resource as `0xMMmmBBBB`
/// (major and minor truncated to a byte, build as a word).
pub fn product_version(resource: &[u8]) -> Option<u32> {
    let base = FIXED_FILE_INFO_OFFSET;
    if read_u32(resource, base)? != FIXED_FILE_INFO_SIGNATURE {
        return None;
    }
    // dwSignature, dwStrucVersion, dwFileVersionMS/LS, dwProductVersionMS/LS
    let ms = read_u32(resource, base + 16)?;
    let ls = read_u32(resource, base + 20)?;
    Some((((ms >> 16) & 255) << 24) | ((ms & 255) << 16) | (ls >> 16))
}

/// Turns a `GetVersion()` value into `0x0600`, `0x0601`, ...
pub fn pack_windows_version(raw: u32) -> u16 {
    let major = raw & 0xff;
    let minor = (raw >> 8) & 0xff;
    ((major << 8) | minor) as u16
}

#[cfg(windows)]
mod os {
    use std::sync::OnceLock;

    use windows::Win32::{
        Foundation::HMODULE, System::SystemInformation::GetVersion,
        UI::WindowsAndMessaging::RT_VERSION,
    };

    use crate::{module_resources::ModuleResources, utils::wide::make_int_resource};

    const VS_VERSION_INFO: u16 = 1;

    /// Product version of a loaded module, 0 when it has no version resource.
    pub fn module_version(module: HMODULE) -> u32 {
        let resources = unsafe { ModuleResources::new(module) };
        resources
            .raw(make_int_resource(VS_VERSION_INFO), RT_VERSION)
            .and_then(|data| super::product_version(&data))
            .unwrap_or(0)
    }

    pub fn windows_version() -> u16 {
        static VERSION: OnceLock<u16> = OnceLock::new();
        *VERSION.get_or_init(|| super::pack_windows_version(unsafe { GetVersion() }))
    }
}

#[cfg(windows)]
pub use os::{module_version, windows_version};

#[cfg(test)]
mod tests {
    use super::*;

    fn version_resource(product_ms: u32, product_ls: u32) -> Vec<u8> {
        let mut data = vec![0u8; FIXED_FILE_INFO_OFFSET];
        for value in [
            FIXED_FILE_INFO_SIGNATURE,
            0x0001_0000,
            0x0004_0003,
            0x0002_0001,
            product_ms,
            product_ls,
        ] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data
    }

    #[test]
    fn packs_product_version() {
        let data = version_resource(0x0003_0006, 0x0002_0000);
        assert_eq!(product_version(&data), Some(0x0306_0002));

        // major and minor keep their low byte only
        let data = version_resource(0x0104_0205, 0x1234_5678);
        assert_eq!(product_version(&data), Some(0x0405_1234));
    }

    #[test]
    fn rejects_bad_resources() {
        let mut data = version_resource(1, 1);
        data[FIXED_FILE_INFO_OFFSET] = 0;
        assert_eq!(product_version(&data), None);
        assert_eq!(product_version(&data[..50]), None);
        assert_eq!(product_version(&[]), None);
    }

    #[test]
    fn packs_windows_version() {
        // Windows 7 reports major 6, minor 1 in the low word
        assert_eq!(pack_windows_version(0x1DB1_0106), 0x0601);
        assert_eq!(pack_windows_version(0x0000_0006), 0x0600);
        assert_eq!(pack_windows_version(0x23F0_0206), 0x0602);
    }
}
