//! Localized strings and dialog templates.
//!
//! Strings come from a language module with fallback to the main module. Dialog templates are
//! copied out once at startup, from the language module when it has them and from the main module
//! otherwise.

use std::{collections::HashMap, sync::OnceLock};

use crate::error::{Error, Result};

/// Number of strings packed into one `RT_STRING` resource block.
pub const STRINGS_PER_BLOCK: u32 = 16;

/// A module that can hand out string and dialog resources.
pub trait ResourceSource {
    /// Every string the module carries.
    fn strings(&self) -> Result<Vec<(u32, String)>>;

    fn string(&self, id: u32) -> Option<String>;

    /// Raw `DLGTEMPLATE` bytes.
    fn dialog(&self, id: u32) -> Option<Vec<u8>>;
}

/// Resources held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryResources {
    strings: HashMap<u32, String>,
    dialogs: HashMap<u32, Vec<u8>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_string(mut self, id: u32, text: &str) -> Self {
        self.strings.insert(id, text.to_owned());
        self
    }

    pub fn with_dialog(mut self, id: u32, template: &[u8]) -> Self {
        self.dialogs.insert(id, template.to_vec());
        self
    }

    /// Adds every string of an encoded `RT_STRING` block.
    pub fn with_string_block(mut self, block_id: u32, data: &[u8]) -> Result<Self> {
        self.strings.extend(parse_string_block(block_id, data)?);
        Ok(self)
    }
}

impl ResourceSource for MemoryResources {
    fn strings(&self) -> Result<Vec<(u32, String)>> {
        let mut all: Vec<_> = self.strings.iter().map(|(id, s)| (*id, s.clone())).collect();
        all.sort_by_key(|(id, _)| *id);
        Ok(all)
    }

    fn string(&self, id: u32) -> Option<String> {
        self.strings.get(&id).cloned()
    }

    fn dialog(&self, id: u32) -> Option<Vec<u8>> {
        self.dialogs.get(&id).cloned()
    }
}

/// Decodes an `RT_STRING` block: 16 UTF-16LE strings, each prefixed by its length in code units.
///
/// Block `n` holds the ids `(n - 1) * 16` through `(n - 1) * 16 + 15`. Empty slots are skipped.
pub fn parse_string_block(block_id: u32, data: &[u8]) -> Result<Vec<(u32, String)>> {
    if block_id == 0 {
        return Err(Error::InvalidData("string block ids start at 1".into()));
    }
    let first_id = (block_id - 1) * STRINGS_PER_BLOCK;

    let mut strings = Vec::new();
    let mut pos = 0;
    for i in 0..STRINGS_PER_BLOCK {
        let len_bytes = data.get(pos..pos + 2).ok_or_else(|| {
            Error::InvalidData(format!("string block {block_id} truncated at entry {i}"))
        })?;
        let len = usize::from(u16::from_le_bytes([len_bytes[0], len_bytes[1]]));
        pos += 2;
        if len == 0 {
            continue;
        }

        let text = data.get(pos..pos + len * 2).ok_or_else(|| {
            Error::InvalidData(format!("string {} overruns its block", first_id + i))
        })?;
        pos += len * 2;

        let units: Vec<u16> = text
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        strings.push((first_id + i, String::from_utf16_lossy(&units)));
    }
    Ok(strings)
}

/// Encodes strings into an `RT_STRING` block. Ids outside the block are ignored.
pub fn encode_string_block(block_id: u32, strings: &[(u32, &str)]) -> Vec<u8> {
    let first_id = block_id.saturating_sub(1) * STRINGS_PER_BLOCK;
    let mut data = Vec::new();
    for i in 0..STRINGS_PER_BLOCK {
        let units: Vec<u16> = strings
            .iter()
            .find(|(id, _)| *id == first_id + i)
            .map(|(_, s)| s.encode_utf16().take(usize::from(u16::MAX)).collect())
            .unwrap_or_default();
        data.extend_from_slice(&(units.len() as u16).to_le_bytes());
        for unit in units {
            data.extend_from_slice(&unit.to_le_bytes());
        }
    }
    data
}

/// The block that holds string `id`.
pub fn string_block_id(id: u32) -> u32 {
    id / STRINGS_PER_BLOCK + 1
}

type SharedSource = Box<dyn ResourceSource + Send + Sync>;

/// Loaded translation: the language strings, cached dialog templates and the main module to
/// fall back on.
pub struct Translations {
    main: SharedSource,
    strings: HashMap<u32, String>,
    dialogs: HashMap<u32, Vec<u8>>,
}

impl Translations {
    /// Loads all strings of `language` and the templates of `dialog_ids`.
    ///
    /// `dialog_ids` ends at its first zero, if any. A language module whose strings cannot be
    /// listed still contributes its dialogs.
    pub fn load<M, L>(main: M, language: Option<&L>, dialog_ids: &[u32]) -> Result<Self>
    where
        M: ResourceSource + Send + Sync + 'static,
        L: ResourceSource + ?Sized,
    {
        let strings = match language.map(|lang| lang.strings()) {
            Some(Ok(strings)) => strings.into_iter().collect(),
            Some(Err(e)) => {
                log::warn!("language strings unavailable, using main module: {e}");
                HashMap::new()
            }
            None => HashMap::new(),
        };

        let mut dialogs = HashMap::new();
        for &id in dialog_ids.iter().take_while(|&&id| id != 0) {
            let template = match language.and_then(|lang| lang.dialog(id)) {
                Some(template) => Some(template),
                None => {
                    if language.is_some() {
                        log::debug!("dialog {id} not translated, using main module");
                    }
                    main.dialog(id)
                }
            };
            match template {
                Some(template) => {
                    dialogs.insert(id, template);
                }
                None => log::warn!("dialog {id} not found in any module"),
            }
        }

        Ok(Self {
            main: Box::new(main),
            strings,
            dialogs,
        })
    }

    /// The localized string, the main module's string, or an empty string.
    pub fn string(&self, id: u32) -> String {
        match self.strings.get(&id) {
            Some(s) if !s.is_empty() => s.clone(),
            _ => self.main.string(id).unwrap_or_default(),
        }
    }

    /// The cached dialog template. Empty templates count as missing.
    pub fn dialog(&self, id: u32) -> Option<&[u8]> {
        self.dialogs
            .get(&id)
            .filter(|t| !t.is_empty())
            .map(Vec::as_slice)
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }
}

static TRANSLATIONS: OnceLock<Translations> = OnceLock::new();

/// Installs the process-wide translation. Can only happen once.
pub fn load_translation_resources<M, L>(
    main: M,
    language: Option<&L>,
    dialog_ids: &[u32],
) -> Result<()>
where
    M: ResourceSource + Send + Sync + 'static,
    L: ResourceSource + ?Sized,
{
    let translations = Translations::load(main, language, dialog_ids)?;
    log::debug!(
        "loaded {} translated strings and {} dialogs",
        translations.strings.len(),
        translations.dialogs.len()
    );
    TRANSLATIONS
        .set(translations)
        .map_err(|_| Error::AlreadyInitialized)
}

/// Localized string from the process-wide translation. Empty before initialization.
pub fn load_string_ex(id: u32) -> String {
    TRANSLATIONS.get().map(|t| t.string(id)).unwrap_or_default()
}

/// Localized dialog template from the process-wide translation.
pub fn load_dialog_ex(id: u32) -> Option<&'static [u8]> {
    TRANSLATIONS.get()?.dialog(id)
}
