mod utils {
    pub mod image_utils;

    #[cfg(windows)]
    pub mod com;
    #[cfg(windows)]
    pub mod wide;
}

pub mod bitmap;
pub mod error;
pub mod icon;
pub mod image_file;
pub mod paths;
pub mod resources;
pub mod settings;
pub mod shell;
pub mod version;

#[cfg(windows)]
mod extract;
#[cfg(windows)]
mod gdi;
#[cfg(windows)]
mod module_resources;
#[cfg(windows)]
mod wic;

pub use bitmap::ColorRef;
pub use error::{Error, Result};
pub use icon::{IconLocation, ResourceName};
pub use image_file::{BgraImage, ImageSize, load_image};
pub use paths::{separate_arguments, separate_arguments_fs, unexpand_env_strings};
pub use resources::{
    MemoryResources, ResourceSource, Translations, load_dialog_ex, load_string_ex,
    load_translation_resources,
};
pub use settings::Ie9Settings;
pub use utils::image_utils::image_to_base64;

#[cfg(windows)]
pub use extract::{
    LoadedModules, icon_for_path, load_icon, load_icon_for_pidl, sh_extract_icon,
    sh_extract_icon_str,
};
#[cfg(windows)]
pub use gdi::{
    DibSection, Icon, bitmap_from_icon, create_disabled_icon, icon_to_image, premultiply_bitmap,
    premultiply_hbitmap,
};
#[cfg(windows)]
pub use module_resources::ModuleResources;
#[cfg(windows)]
pub use utils::com::ComInit;
#[cfg(windows)]
pub use wic::load_image_bitmap;

#[cfg(windows)]
use std::path::Path;

#[cfg(windows)]
use image::RgbaImage;

#[cfg(windows)]
pub fn get_icon_by_path<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
    icon_for_path(path.as_ref())?.to_image()
}

#[cfg(windows)]
pub fn get_icon_base64_by_path<P: AsRef<Path>>(path: P) -> Result<String> {
    icon_for_path(path.as_ref())?.to_base64()
}

/// Icon for an `"file.ico"` or `"module.dll, number"` location, rendered at `size`.
#[cfg(windows)]
pub fn get_icon_by_location(location: &str, size: i32) -> Result<RgbaImage> {
    let mut modules = LoadedModules::new();
    load_icon(size, location, &mut modules)?.to_image()
}
