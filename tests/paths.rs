use std::fs;

use shell_resources::paths::{COMMON_ENV_VARS, EnvCompressor, get_token};
use shell_resources::separate_arguments_fs;

#[test]
fn program_with_spaces_on_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let app_dir = dir.path().join("My App");
    fs::create_dir(&app_dir)?;
    let app = app_dir.join("app.exe");
    fs::write(&app, b"")?;

    let app = app.to_str().ok_or_else(|| anyhow::anyhow!("non-UTF-8 temp path"))?;
    let command = format!("{app} --open  readme.txt");
    let (program, args) = separate_arguments_fs(&command);
    assert_eq!(program, app);
    assert_eq!(args, Some("--open  readme.txt"));

    let (program, args) = separate_arguments_fs(app);
    assert_eq!(program, app);
    assert_eq!(args, None);
    Ok(())
}

#[test]
fn longest_existing_prefix_wins() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let short = dir.path().join("tool");
    let long_dir = dir.path().join("tool box");
    fs::write(&short, b"")?;
    fs::create_dir(&long_dir)?;
    fs::write(long_dir.join("run"), b"")?;

    let root = dir.path().display();
    let command = format!("{root}/tool box/run -v");
    let (program, args) = separate_arguments_fs(&command);
    assert_eq!(program, format!("{root}/tool box/run"));
    assert_eq!(args, Some("-v"));

    // only the short name exists for this one
    let command = format!("{root}/tool box/missing -v");
    let (program, args) = separate_arguments_fs(&command);
    assert_eq!(program, format!("{root}/tool"));
    assert_eq!(args, Some("box/missing -v"));
    Ok(())
}

#[test]
fn quoted_program_is_not_looked_up() {
    let (program, args) = separate_arguments_fs(r#""/no/such dir/app" "quoted arg""#);
    assert_eq!(program, "/no/such dir/app");
    assert_eq!(args, Some(r#""quoted arg""#));
    assert_eq!(get_token(r#""quoted arg""#, " "), ("quoted arg", ""));
}

#[test]
fn compress_shortcut_targets() {
    let c = EnvCompressor::with_names(&COMMON_ENV_VARS, |name| match name {
        "USERPROFILE" => Some(r"C:\Users\Ana".into()),
        "ALLUSERSPROFILE" => Some(r"C:\ProgramData".into()),
        "SystemRoot" => Some(r"C:\WINDOWS".into()),
        "SystemDrive" => Some("C:".into()),
        _ => None,
    });
    let targets = [
        (r"C:\Users\Ana\AppData\Roaming\x.lnk", r"%USERPROFILE%\AppData\Roaming\x.lnk"),
        (r"C:\ProgramData\Microsoft\Windows", r"%ALLUSERSPROFILE%\Microsoft\Windows"),
        (r"c:\windows\system32\cmd.exe", r"%SystemRoot%\system32\cmd.exe"),
        (r"C:\Program Files", r"%SystemDrive%\Program Files"),
        (r"\\server\share\file", r"\\server\share\file"),
    ];
    for (path, expected) in targets {
        assert_eq!(c.compress(path), expected, "{path}");
    }
}
