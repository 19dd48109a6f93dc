use std::{ffi::c_void, slice};

use windows::{
    Win32::{
        Foundation::{
            ERROR_RESOURCE_DATA_NOT_FOUND, ERROR_RESOURCE_TYPE_NOT_FOUND, HMODULE, TRUE,
        },
        System::LibraryLoader::{
            EnumResourceNamesW, FindResourceW, LoadResource, LockResource, SizeofResource,
        },
        UI::WindowsAndMessaging::RT_DIALOG,
    },
    core::{BOOL, PCWSTR},
};

use crate::{
    error::Result,
    resources::{ResourceSource, parse_string_block, string_block_id},
    utils::wide::make_int_resource,
};

const RT_STRING: PCWSTR = make_int_resource(6);

/// Resources of a loaded module (an EXE, a DLL or a resource-only language DLL).
#[derive(Clone, Copy, Debug)]
pub struct ModuleResources(HMODULE);

// Module handles are process-wide; the resource APIs are safe to call from any thread.
unsafe impl Send for ModuleResources {}
unsafe impl Sync for ModuleResources {}

impl ModuleResources {
    /// # Safety
    /// `module` must stay loaded for as long as this value is used.
    pub unsafe fn new(module: HMODULE) -> Self {
        Self(module)
    }

    pub fn handle(&self) -> HMODULE {
        self.0
    }

    /// Copies the bytes of a resource out of the module.
    pub fn raw(&self, name: PCWSTR, kind: PCWSTR) -> Option<Vec<u8>> {
        unsafe {
            let info = FindResourceW(Some(self.0), name, kind);
            if info.is_invalid() {
                return None;
            }
            let global = LoadResource(Some(self.0), info).ok()?;
            let data = LockResource(global);
            if data.is_null() {
                return None;
            }
            let size = SizeofResource(Some(self.0), info) as usize;
            Some(slice::from_raw_parts(data as *const u8, size).to_vec())
        }
    }

    fn string_block(&self, block_id: u32) -> Option<Vec<u8>> {
        let id = u16::try_from(block_id).ok()?;
        self.raw(make_int_resource(id), RT_STRING)
    }

    /// Numbers of the module's `RT_STRING` blocks. A module without a string table, or without
    /// any resources, has none.
    fn string_block_ids(&self) -> Result<Vec<u32>> {
        unsafe extern "system" fn collect(
            _module: HMODULE,
            _kind: PCWSTR,
            name: PCWSTR,
            param: isize,
        ) -> BOOL {
            let ids = unsafe { &mut *(param as *mut Vec<u32>) };
            // string blocks are always numbered
            let raw = name.0 as usize;
            if raw >> 16 == 0 {
                ids.push(raw as u32);
            }
            TRUE
        }

        let mut ids: Vec<u32> = Vec::new();
        let listed = unsafe {
            EnumResourceNamesW(
                Some(self.0),
                RT_STRING,
                Some(collect),
                &mut ids as *mut Vec<u32> as *mut c_void as isize,
            )
        }
        .ok();
        match listed {
            Ok(()) => Ok(ids),
            Err(e)
                if e.code() == ERROR_RESOURCE_TYPE_NOT_FOUND.to_hresult()
                    || e.code() == ERROR_RESOURCE_DATA_NOT_FOUND.to_hresult() =>
            {
                log::debug!("module has no string table");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl ResourceSource for ModuleResources {
    fn strings(&self) -> Result<Vec<(u32, String)>> {
        let mut strings = Vec::new();
        for block_id in self.string_block_ids()? {
            match self.string_block(block_id) {
                Some(data) => strings.extend(parse_string_block(block_id, &data)?),
                None => log::warn!("string block {block_id} listed but not loadable"),
            }
        }
        Ok(strings)
    }

    fn string(&self, id: u32) -> Option<String> {
        let block_id = string_block_id(id);
        let data = self.string_block(block_id)?;
        parse_string_block(block_id, &data)
            .ok()?
            .into_iter()
            .find_map(|(i, s)| (i == id).then_some(s))
    }

    fn dialog(&self, id: u32) -> Option<Vec<u8>> {
        let id = u16::try_from(id).ok()?;
        self.raw(make_int_resource(id), RT_DIALOG)
    }
}

#[cfg(test)]
mod tests {
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;

    use super::*;

    fn this_executable() -> ModuleResources {
        let module = unsafe { GetModuleHandleW(PCWSTR::null()) }.unwrap();
        unsafe { ModuleResources::new(module) }
    }

    #[test]
    fn module_without_string_table() {
        // test binaries carry no RT_STRING resources
        let resources = this_executable();
        assert!(resources.strings().unwrap().is_empty());
        assert_eq!(resources.string(1), None);
        assert_eq!(resources.dialog(1), None);
    }

    #[test]
    fn translations_from_bare_module() {
        let main = crate::MemoryResources::new()
            .with_string(1, "Open")
            .with_dialog(5, b"main-5");
        let t = crate::Translations::load(main, Some(&this_executable()), &[5]).unwrap();
        assert_eq!(t.string(1), "Open");
        assert_eq!(t.dialog(5), Some(&b"main-5"[..]));
    }
}
