//! Feature flags of the IE toolbar component, persisted as JSON.

use std::{
    fs,
    io::{self, ErrorKind},
    path::Path,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;

/// Bit set of IE toolbar features. The bit values are shared with the host component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ie9Settings(u32);

impl Ie9Settings {
    pub const CAPTION: Self = Self(1);
    pub const PROGRESS: Self = Self(2);
    pub const ZONE: Self = Self(4);
    pub const PROTECTED: Self = Self(8);

    const ALL: u32 = 1 | 2 | 4 | 8;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(Self::ALL)
    }

    /// Unknown bits are dropped.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: Self, enabled: bool) {
        if enabled {
            self.insert(other)
        } else {
            self.remove(other)
        }
    }

    /// Reads settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no settings at {path:?}, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(&self)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, text).map_err(|e| {
            io::Error::new(e.kind(), format!("failed to write settings {path:?}: {e}")).into()
        })
    }
}

impl Default for Ie9Settings {
    fn default() -> Self {
        Self::all()
    }
}

// On-disk shape. Missing fields keep the feature enabled.
#[derive(Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default = "enabled")]
    caption: bool,
    #[serde(default = "enabled")]
    progress: bool,
    #[serde(default = "enabled")]
    zone: bool,
    #[serde(default = "enabled")]
    protected: bool,
}

fn enabled() -> bool {
    true
}

impl Serialize for Ie9Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        SettingsFile {
            caption: self.contains(Self::CAPTION),
            progress: self.contains(Self::PROGRESS),
            zone: self.contains(Self::ZONE),
            protected: self.contains(Self::PROTECTED),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ie9Settings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let file = SettingsFile::deserialize(deserializer)?;
        let mut settings = Self::empty();
        settings.set(Self::CAPTION, file.caption);
        settings.set(Self::PROGRESS, file.progress);
        settings.set(Self::ZONE, file.zone);
        settings.set(Self::PROTECTED, file.protected);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_values_match_host() {
        assert_eq!(Ie9Settings::CAPTION.bits(), 1);
        assert_eq!(Ie9Settings::PROGRESS.bits(), 2);
        assert_eq!(Ie9Settings::ZONE.bits(), 4);
        assert_eq!(Ie9Settings::PROTECTED.bits(), 8);
        assert_eq!(Ie9Settings::from_bits_truncate(0xff).bits(), 0x0f);
    }

    #[test]
    fn missing_fields_stay_enabled() {
        let s: Ie9Settings = serde_json::from_str(r#"{ "zone": false, "extra": 3 }"#).unwrap();
        assert!(s.contains(Ie9Settings::CAPTION));
        assert!(s.contains(Ie9Settings::PROGRESS));
        assert!(!s.contains(Ie9Settings::ZONE));
        assert!(s.contains(Ie9Settings::PROTECTED));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ie9").join("settings.json");

        let mut s = Ie9Settings::default();
        s.remove(Ie9Settings::PROGRESS);
        s.save(&path).unwrap();

        assert_eq!(Ie9Settings::load(&path).unwrap(), s);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let s = Ie9Settings::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(s, Ie9Settings::all());
    }
}
