use shell_resources::{
    MemoryResources, load_dialog_ex, load_string_ex, load_translation_resources,
    separate_arguments_fs, unexpand_env_strings,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let main = MemoryResources::new()
        .with_string(1, "Settings")
        .with_string(2, "Cancel")
        .with_dialog(100, b"\x01\x00\xff\xff");
    let german = MemoryResources::new().with_string(1, "Einstellungen");
    load_translation_resources(main, Some(&german), &[100, 0])?;

    println!("1 = {}", load_string_ex(1));
    println!("2 = {}", load_string_ex(2));
    println!("dialog 100: {:?}", load_dialog_ex(100));

    for command in std::env::args().skip(1) {
        let (program, args) = separate_arguments_fs(&command);
        println!("{} | {:?}", unexpand_env_strings(&program), args);
    }
    Ok(())
}
