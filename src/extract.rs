use std::{
    ffi::c_void,
    mem::{self, MaybeUninit},
    path::Path,
    ptr,
    sync::OnceLock,
};

use windows::{
    Win32::{
        Foundation::{FreeLibrary, HMODULE, HWND, S_OK},
        Storage::FileSystem::FILE_FLAGS_AND_ATTRIBUTES,
        System::{
            Environment::ExpandEnvironmentStringsW,
            LibraryLoader::{
                GetModuleHandleW, GetProcAddress, LOAD_LIBRARY_AS_DATAFILE,
                LOAD_LIBRARY_AS_IMAGE_RESOURCE, LoadLibraryExW,
            },
        },
        UI::{
            Shell::{
                Common::ITEMIDLIST, ExtractIconExA, ExtractIconExW, IExtractIconA, IExtractIconW,
                IShellFolder, SHBindToParent, SHFILEINFOW, SHGFI_ICON, SHGetFileInfoW,
            },
            WindowsAndMessaging::{
                GetSystemMetrics, HICON, IMAGE_ICON, LR_DEFAULTCOLOR, LR_LOADFROMFILE, LoadImageW,
                SM_CXICON, SM_CXSMICON,
            },
        },
    },
    core::{HSTRING, Interface, PCSTR, PCWSTR, PSTR, PWSTR, s, w},
};

use crate::{
    error::{Error, Result},
    gdi::Icon,
    icon::{ExtractOutcome, ExtractSize, IconLocation, ResourceName, normalize_icon_index},
    shell::Pidl,
    utils::wide::{make_int_resource, str_to_wide, to_wide},
};

const MAX_PATH: usize = 260;
const GIL_NOTFILENAME: u32 = 0x0008;
const LOCATION_BUFFER: usize = 1024;

/// Modules loaded as data files while resolving icon locations. They stay loaded until this is
/// dropped, since icons loaded from them may still be in use.
#[derive(Debug, Default)]
pub struct LoadedModules {
    own: Option<HMODULE>,
    loaded: Vec<HMODULE>,
}

impl LoadedModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Module that `",name"` locations refer to. Defaults to the executable.
    pub fn with_resource_module(mut self, module: HMODULE) -> Self {
        self.own = Some(module);
        self
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    fn resource_module(&self) -> Result<HMODULE> {
        match self.own {
            Some(module) => Ok(module),
            None => Ok(unsafe { GetModuleHandleW(PCWSTR::null()) }?),
        }
    }

    fn module_for(&mut self, path: &Path) -> Result<HMODULE> {
        if let Some(name) = path.file_name() {
            if let Ok(module) = unsafe { GetModuleHandleW(&HSTRING::from(name)) } {
                return Ok(module);
            }
        }
        let module = unsafe {
            LoadLibraryExW(
                &HSTRING::from(path),
                None,
                LOAD_LIBRARY_AS_DATAFILE | LOAD_LIBRARY_AS_IMAGE_RESOURCE,
            )
        }?;
        log::trace!("loaded {path:?} as a resource module");
        self.loaded.push(module);
        Ok(module)
    }
}

impl Drop for LoadedModules {
    fn drop(&mut self) {
        for module in self.loaded.drain(..) {
            let _ = unsafe { FreeLibrary(module) };
        }
    }
}

fn expand_environment(text: &str) -> String {
    let source = HSTRING::from(text);
    let mut buf = vec![0u16; LOCATION_BUFFER];
    let len = unsafe { ExpandEnvironmentStringsW(&source, Some(&mut buf)) } as usize;
    if len == 0 || len > buf.len() {
        log::debug!("could not expand {text:?}");
        return text.to_owned();
    }
    String::from_utf16_lossy(&buf[..len - 1])
}

fn icon_from_handle(handle: *mut c_void, what: &str) -> Result<Icon> {
    unsafe { Icon::from_raw(HICON(handle)) }
        .ok_or_else(|| Error::NotFound(format!("no icon for {what}")))
}

/// Loads an icon from `"file.ico"` or `"module.dll, number"`. Environment variables in the text
/// are expanded first.
pub fn load_icon(size: i32, location: &str, modules: &mut LoadedModules) -> Result<Icon> {
    let text = expand_environment(location);
    match IconLocation::parse(&text) {
        IconLocation::File(path) => {
            let handle = unsafe {
                LoadImageW(
                    None,
                    &HSTRING::from(path.as_path()),
                    IMAGE_ICON,
                    size,
                    size,
                    LR_DEFAULTCOLOR | LR_LOADFROMFILE,
                )
            }?;
            icon_from_handle(handle.0, &text)
        }
        IconLocation::Resource { module, name } => {
            let module = match module {
                Some(path) => modules.module_for(&path)?,
                None => modules.resource_module()?,
            };
            let named;
            let resource = match &name {
                ResourceName::Id(id) => make_int_resource(*id),
                ResourceName::Name(name) => {
                    named = HSTRING::from(name.as_str());
                    PCWSTR(named.as_ptr())
                }
            };
            let handle = unsafe {
                LoadImageW(
                    Some(module.into()),
                    resource,
                    IMAGE_ICON,
                    size,
                    size,
                    LR_DEFAULTCOLOR,
                )
            }?;
            icon_from_handle(handle.0, &text)
        }
    }
}

/// Asks the shell item's parent folder for the item's icon at `size`.
///
/// Tries `IExtractIconW` first and `IExtractIconA` for folders that only implement the ANSI
/// interface. COM must be initialized on the calling thread.
pub fn load_icon_for_pidl(size: i32, pidl: &Pidl) -> Result<Icon> {
    let mut child: *mut ITEMIDLIST = ptr::null_mut();
    let folder: IShellFolder =
        unsafe { SHBindToParent(pidl.as_ptr(), Some(&mut child as *mut _)) }?;
    let children = [child.cast_const()];

    let small = unsafe { GetSystemMetrics(SM_CXSMICON) } as u32;
    let large = unsafe { GetSystemMetrics(SM_CXICON) } as u32;
    let request = ExtractSize::negotiate(size.max(0) as u32, small, large);

    match unsafe { folder.GetUIObjectOf::<IExtractIconW>(HWND::default(), &children, None) } {
        Ok(extract) => extract_wide(&extract, request),
        Err(e) => {
            log::debug!("IExtractIconW unavailable ({e}), trying IExtractIconA");
            let extract = unsafe {
                folder.GetUIObjectOf::<IExtractIconA>(HWND::default(), &children, None)
            }?;
            extract_ansi(&extract, request)
        }
    }
}

/// Picks the wanted icon out of an `Extract` call and destroys the other one.
///
/// Both out-pointers are always passed: some handlers crash on a null one.
fn split_extracted(request: ExtractSize, large: HICON, small: HICON) -> Option<Icon> {
    let (wanted, other) = if request.large { (large, small) } else { (small, large) };
    drop(unsafe { Icon::from_raw(other) });
    unsafe { Icon::from_raw(wanted) }
}

fn extract_wide(extract: &IExtractIconW, request: ExtractSize) -> Result<Icon> {
    let vtable = extract.vtable();
    let mut location = [0u16; MAX_PATH];
    let mut index = 0i32;
    let mut flags = 0u32;
    let hr = unsafe {
        (vtable.GetIconLocation)(
            extract.as_raw(),
            0,
            PWSTR(location.as_mut_ptr()),
            location.len() as u32,
            &mut index,
            &mut flags,
        )
    };
    if hr != S_OK {
        return Err(Error::NotFound(format!("no icon location ({hr:?})")));
    }

    if flags & GIL_NOTFILENAME != 0 {
        let mut large = HICON::default();
        let mut small = HICON::default();
        let hr = unsafe {
            (vtable.Extract)(
                extract.as_raw(),
                PCWSTR(location.as_ptr()),
                index as u32,
                &mut large,
                &mut small,
                request.packed,
            )
        };
        match ExtractOutcome::from_status(hr.0) {
            ExtractOutcome::Extracted => {
                return split_extracted(request, large, small)
                    .ok_or_else(|| Error::NotFound("Extract returned no icon".into()));
            }
            ExtractOutcome::UseLocation => drop(split_extracted(request, large, small)),
            ExtractOutcome::Failed => {
                return Err(Error::Win32 {
                    function: "IExtractIconW::Extract",
                    code: hr.0 as u32,
                });
            }
        }
    }

    let mut icon = HICON::default();
    let (large, small) = if request.large {
        (Some(&mut icon as *mut HICON), None)
    } else {
        (None, Some(&mut icon as *mut HICON))
    };
    let count = unsafe {
        ExtractIconExW(PCWSTR(location.as_ptr()), normalize_icon_index(index), large, small, 1)
    };
    if count != 1 {
        return Err(Error::NotFound("ExtractIconExW found no icon".into()));
    }
    icon_from_handle(icon.0, "extracted location")
}

fn extract_ansi(extract: &IExtractIconA, request: ExtractSize) -> Result<Icon> {
    let vtable = extract.vtable();
    let mut location = [0u8; MAX_PATH];
    let mut index = 0i32;
    let mut flags = 0u32;
    let hr = unsafe {
        (vtable.GetIconLocation)(
            extract.as_raw(),
            0,
            PSTR(location.as_mut_ptr()),
            location.len() as u32,
            &mut index,
            &mut flags,
        )
    };
    if hr != S_OK {
        return Err(Error::NotFound(format!("no icon location ({hr:?})")));
    }

    if flags & GIL_NOTFILENAME != 0 {
        let mut large = HICON::default();
        let mut small = HICON::default();
        let hr = unsafe {
            (vtable.Extract)(
                extract.as_raw(),
                PCSTR(location.as_ptr()),
                index as u32,
                &mut large,
                &mut small,
                request.packed,
            )
        };
        match ExtractOutcome::from_status(hr.0) {
            ExtractOutcome::Extracted => {
                return split_extracted(request, large, small)
                    .ok_or_else(|| Error::NotFound("Extract returned no icon".into()));
            }
            ExtractOutcome::UseLocation => drop(split_extracted(request, large, small)),
            ExtractOutcome::Failed => {
                return Err(Error::Win32 {
                    function: "IExtractIconA::Extract",
                    code: hr.0 as u32,
                });
            }
        }
    }

    let mut icon = HICON::default();
    let (large, small) = if request.large {
        (Some(&mut icon as *mut HICON), None)
    } else {
        (None, Some(&mut icon as *mut HICON))
    };
    let count = unsafe {
        ExtractIconExA(PCSTR(location.as_ptr()), normalize_icon_index(index), large, small, 1)
    };
    if count != 1 {
        return Err(Error::NotFound("ExtractIconExA found no icon".into()));
    }
    icon_from_handle(icon.0, "extracted location")
}

type ShExtractIconsW = unsafe extern "system" fn(
    file: PCWSTR,
    index: i32,
    cx: i32,
    cy: i32,
    icons: *mut HICON,
    ids: *mut u32,
    count: u32,
    flags: u32,
) -> u32;

fn sh_extract_icons() -> Option<ShExtractIconsW> {
    static FUNCTION: OnceLock<Option<ShExtractIconsW>> = OnceLock::new();
    *FUNCTION.get_or_init(|| unsafe {
        let shell32 = GetModuleHandleW(w!("shell32.dll")).ok()?;
        let function = GetProcAddress(shell32, s!("SHExtractIconsW"))?;
        Some(mem::transmute::<unsafe extern "system" fn() -> isize, ShExtractIconsW>(function))
    })
}

/// Extracts icon `index` of a file at `size` with `SHExtractIconsW`, or with `ExtractIconExW`
/// at the system size when shell32 does not export it.
pub fn sh_extract_icon(path: &Path, index: i32, size: i32) -> Result<Icon> {
    sh_extract_icon_wide(&to_wide(path), index, size)
}

/// [`sh_extract_icon`] for a path given as a narrow string.
pub fn sh_extract_icon_str(path: &str, index: i32, size: i32) -> Result<Icon> {
    sh_extract_icon_wide(&str_to_wide(path), index, size)
}

fn sh_extract_icon_wide(path: &[u16], index: i32, size: i32) -> Result<Icon> {
    let path = PCWSTR(path.as_ptr());
    let mut icon = HICON::default();
    match sh_extract_icons() {
        Some(extract) => {
            let mut id = 0u32;
            let count = unsafe {
                extract(path, index, size, size, &mut icon, &mut id, 1, LR_DEFAULTCOLOR.0)
            };
            if count == 0 {
                return Err(Error::NotFound(format!("no icon at index {index}")));
            }
        }
        None => {
            log::debug!("SHExtractIconsW not exported, using ExtractIconExW");
            if unsafe { ExtractIconExW(path, index, Some(&mut icon as *mut HICON), None, 1) } != 1 {
                return Err(Error::NotFound(format!("no icon at index {index}")));
            }
        }
    }
    icon_from_handle(icon.0, "extracted file")
}

/// The icon the shell shows for a file.
pub fn icon_for_path(path: &Path) -> Result<Icon> {
    let wide = to_wide(path);
    let mut info = MaybeUninit::<SHFILEINFOW>::zeroed();
    let result = unsafe {
        SHGetFileInfoW(
            PCWSTR(wide.as_ptr()),
            FILE_FLAGS_AND_ATTRIBUTES(0),
            Some(info.as_mut_ptr()),
            mem::size_of::<SHFILEINFOW>() as u32,
            SHGFI_ICON,
        )
    };
    if result == 0 {
        return Err(Error::last_win32("SHGetFileInfoW"));
    }
    let info = unsafe { info.assume_init() };
    icon_from_handle(info.hIcon.0, &path.display().to_string())
}
