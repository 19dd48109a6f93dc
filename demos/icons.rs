#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use shell_resources::{
        ColorRef, ComInit, LoadedModules, create_disabled_icon, load_icon, load_icon_for_pidl,
        load_image_bitmap, premultiply_bitmap, sh_extract_icon, shell::parse_display_name,
    };
    use windows::Win32::System::Com::COINIT_APARTMENTTHREADED;

    env_logger::init();
    let _com = ComInit::new(COINIT_APARTMENTTHREADED);
    let _ = std::fs::create_dir("output");

    let mut modules = LoadedModules::new();
    let folder = load_icon(32, "%SystemRoot%\\System32\\shell32.dll, 4", &mut modules)?;
    folder.to_image()?.save("output/folder.png")?;

    let disabled = create_disabled_icon(&folder, 32)?;
    disabled.to_image()?.save("output/folder-disabled.png")?;

    let mut bitmap = folder.into_bitmap(32)?;
    premultiply_bitmap(&mut bitmap, ColorRef::rgb(255, 128, 128));
    bitmap.to_image()?.save("output/folder-tinted.png")?;

    let (pidl, _) = parse_display_name("::{Desktop}", 0)?;
    load_icon_for_pidl(48, &pidl)?
        .to_image()?
        .save("output/desktop.png")?;

    let notepad = sh_extract_icon("C:\\Windows\\System32\\notepad.exe".as_ref(), 0, 64)?;
    println!("notepad: {}", notepad.to_base64()?);

    let wallpaper = load_image_bitmap(
        "C:\\Windows\\Web\\Wallpaper\\Windows\\img0.jpg".as_ref(),
        Some(shell_resources::ImageSize::width(320)),
        true,
    )?;
    println!("wallpaper: {}x{}", wallpaper.width(), wallpaper.height());
    Ok(())
}

#[cfg(not(windows))]
fn main() {
    eprintln!("icon extraction needs the Windows shell");
}
