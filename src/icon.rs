//! Icon locations, extraction size negotiation and `Extract` status handling.

use std::path::PathBuf;

/// A resource inside a module, by numeric id or by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceName {
    Id(u16),
    Name(String),
}

/// Where an icon comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IconLocation {
    /// An `.ico` file on disk.
    File(PathBuf),
    /// An icon resource. A `None` module means this library's own resources.
    Resource {
        module: Option<PathBuf>,
        name: ResourceName,
    },
}

impl IconLocation {
    /// Parses `"path\to\file.ico"` or `"module.dll, number"`.
    ///
    /// The text is split at its last comma. A number greater than zero after the comma selects a
    /// resource id; anything else is taken verbatim as a resource name.
    pub fn parse(text: &str) -> Self {
        let Some((module, res)) = text.rsplit_once(',') else {
            return IconLocation::File(PathBuf::from(text));
        };

        let name = match parse_leading_int(res) {
            n if n > 0 => match u16::try_from(n) {
                Ok(id) => ResourceName::Id(id),
                Err(_) => ResourceName::Name(res.to_owned()),
            },
            _ => ResourceName::Name(res.to_owned()),
        };
        let module = (!module.is_empty()).then(|| PathBuf::from(module));
        IconLocation::Resource { module, name }
    }
}

/// Integer prefix of `text` the way C's `atol` reads it: leading whitespace, an optional sign,
/// then digits. Anything unparsable is 0.
pub fn parse_leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    if negative { -value } else { value }
}

/// How to ask `IExtractIcon::Extract` for an icon of a given size.
///
/// `Extract` always produces a large and a small icon; the requested size rides in the matching
/// half of the packed size and the other half gets the system metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractSize {
    /// The wanted icon is the "large" one.
    pub large: bool,
    /// `MAKELONG(large size, small size)`.
    pub packed: u32,
}

impl ExtractSize {
    pub fn negotiate(icon_size: u32, small_metric: u32, large_metric: u32) -> Self {
        let large = icon_size > small_metric;
        let packed = if large {
            make_long(icon_size, small_metric)
        } else {
            make_long(large_metric, icon_size)
        };
        ExtractSize { large, packed }
    }
}

fn make_long(low: u32, high: u32) -> u32 {
    (low & 0xffff) | ((high & 0xffff) << 16)
}

/// What the status of an `IExtractIcon::Extract` call says about the handles it filled in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// Icons were produced.
    Extracted,
    /// `S_FALSE`: the caller extracts from the location itself. Returned handles are still owned.
    UseLocation,
    /// A failure code. The out-handles are undefined and must not be destroyed.
    Failed,
}

impl ExtractOutcome {
    pub fn from_status(hr: i32) -> Self {
        match hr {
            1 => ExtractOutcome::UseLocation,
            hr if hr < 0 => ExtractOutcome::Failed,
            _ => ExtractOutcome::Extracted,
        }
    }
}

/// Shell icon indices use -1 for "the first icon".
pub fn normalize_icon_index(index: i32) -> i32 {
    if index == -1 { 0 } else { index }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path() {
        assert_eq!(
            IconLocation::parse(r"C:\Icons\folder.ico"),
            IconLocation::File(PathBuf::from(r"C:\Icons\folder.ico"))
        );
    }

    #[test]
    fn module_with_index() {
        assert_eq!(
            IconLocation::parse("shell32.dll, 4"),
            IconLocation::Resource {
                module: Some(PathBuf::from("shell32.dll")),
                name: ResourceName::Id(4),
            }
        );
    }

    #[test]
    fn last_comma_wins() {
        assert_eq!(
            IconLocation::parse(r"C:\a,b\lib.dll,12"),
            IconLocation::Resource {
                module: Some(PathBuf::from(r"C:\a,b\lib.dll")),
                name: ResourceName::Id(12),
            }
        );
    }

    #[test]
    fn own_module_and_named_resource() {
        assert_eq!(
            IconLocation::parse(",APPICON"),
            IconLocation::Resource {
                module: None,
                name: ResourceName::Name("APPICON".into()),
            }
        );
        // zero and negative numbers are not ids
        assert_eq!(
            IconLocation::parse("lib.dll,-3"),
            IconLocation::Resource {
                module: Some(PathBuf::from("lib.dll")),
                name: ResourceName::Name("-3".into()),
            }
        );
    }

    #[test]
    fn atol_prefix() {
        assert_eq!(parse_leading_int("  42abc"), 42);
        assert_eq!(parse_leading_int("-7"), -7);
        assert_eq!(parse_leading_int("+5"), 5);
        assert_eq!(parse_leading_int("x1"), 0);
        assert_eq!(parse_leading_int(""), 0);
    }

    #[test]
    fn extract_size() {
        // small metric 16, large metric 32
        let s = ExtractSize::negotiate(48, 16, 32);
        assert!(s.large);
        assert_eq!(s.packed, 48 | (16 << 16));

        let s = ExtractSize::negotiate(16, 16, 32);
        assert!(!s.large);
        assert_eq!(s.packed, 32 | (16 << 16));
    }

    #[test]
    fn extract_status() {
        assert_eq!(ExtractOutcome::from_status(0), ExtractOutcome::Extracted);
        assert_eq!(ExtractOutcome::from_status(1), ExtractOutcome::UseLocation);
        // E_FAIL and E_PENDING leave the handles untouched
        assert_eq!(ExtractOutcome::from_status(0x8000_4005_u32 as i32), ExtractOutcome::Failed);
        assert_eq!(ExtractOutcome::from_status(0x8000_000A_u32 as i32), ExtractOutcome::Failed);
    }

    #[test]
    fn index_normalization() {
        assert_eq!(normalize_icon_index(-1), 0);
        assert_eq!(normalize_icon_index(-5), -5);
        assert_eq!(normalize_icon_index(3), 3);
    }
}
