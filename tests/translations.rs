use shell_resources::resources::encode_string_block;
use shell_resources::{
    Error, MemoryResources, load_dialog_ex, load_string_ex, load_translation_resources,
};

const IDS_OPEN: u32 = 3001;
const IDS_CLOSE: u32 = 3002;
const IDS_ABOUT: u32 = 3003;
const IDD_SETTINGS: u32 = 200;
const IDD_ABOUT: u32 = 201;

#[test]
fn process_wide_translation() -> anyhow::Result<()> {
    // before initialization nothing is found
    assert_eq!(load_string_ex(IDS_OPEN), "");
    assert_eq!(load_dialog_ex(IDD_SETTINGS), None);

    let main = MemoryResources::new()
        .with_string(IDS_OPEN, "Open")
        .with_string(IDS_CLOSE, "Close")
        .with_string(IDS_ABOUT, "About")
        .with_dialog(IDD_SETTINGS, b"settings-en")
        .with_dialog(IDD_ABOUT, b"about-en");

    let block = encode_string_block(188, &[(IDS_OPEN, "Ouvrir"), (IDS_CLOSE, "Fermer")]);
    let french = MemoryResources::new()
        .with_string_block(188, &block)?
        .with_dialog(IDD_ABOUT, b"about-fr");

    load_translation_resources(main, Some(&french), &[IDD_SETTINGS, IDD_ABOUT, 0])?;

    assert_eq!(load_string_ex(IDS_OPEN), "Ouvrir");
    assert_eq!(load_string_ex(IDS_CLOSE), "Fermer");
    assert_eq!(load_string_ex(IDS_ABOUT), "About");
    assert_eq!(load_dialog_ex(IDD_SETTINGS), Some(&b"settings-en"[..]));
    assert_eq!(load_dialog_ex(IDD_ABOUT), Some(&b"about-fr"[..]));

    let again = load_translation_resources(MemoryResources::new(), None::<&MemoryResources>, &[]);
    assert!(matches!(again, Err(Error::AlreadyInitialized)));
    assert_eq!(load_string_ex(IDS_OPEN), "Ouvrir");
    Ok(())
}
