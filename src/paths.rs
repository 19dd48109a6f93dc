//! Command-line splitting and environment-variable compression of paths.

use std::{path::Path, sync::OnceLock};

/// Longest path the shell accepts, terminator included.
pub const MAX_PATH: usize = 260;

/// Variables tried by [`unexpand_env_strings`], most specific first.
pub const COMMON_ENV_VARS: [&str; 4] =
    ["USERPROFILE", "ALLUSERSPROFILE", "SystemRoot", "SystemDrive"];

fn cap_path(text: &str) -> String {
    text.chars().take(MAX_PATH - 1).collect()
}

fn non_empty(text: &str) -> Option<&str> {
    (!text.is_empty()).then_some(text)
}

/// Splits the first token off `text`.
///
/// Leading separators are skipped. A token starting with `"` runs to the closing quote,
/// otherwise it ends at the next separator. The remainder starts after any separators that
/// follow the token.
pub fn get_token<'a>(text: &'a str, separators: &str) -> (&'a str, &'a str) {
    let is_sep = |c: char| separators.contains(c);
    let text = text.trim_start_matches(is_sep);

    let (token, rest) = if let Some(quoted) = text.strip_prefix('"') {
        match quoted.find('"') {
            Some(end) => (&quoted[..end], &quoted[end + 1..]),
            None => (quoted, ""),
        }
    } else {
        match text.find(is_sep) {
            Some(end) => (&text[..end], &text[end..]),
            None => (text, ""),
        }
    };
    (token, rest.trim_start_matches(is_sep))
}

/// Splits a command line into the program and its arguments.
///
/// Unquoted programs may contain spaces: every prefix of the command that ends before a space (or
/// at the end) is checked with `exists`, and the longest one naming an existing file is the
/// program. Without any match the program ends at the first space.
pub fn separate_arguments<F>(command: &str, exists: F) -> (String, Option<&str>)
where
    F: Fn(&Path) -> bool,
{
    if command.starts_with('"') {
        let (program, args) = get_token(command, " ");
        return (cap_path(program), non_empty(args));
    }

    let command = command.trim_start_matches(' ');
    let Some(first_space) = command.find(' ') else {
        return (cap_path(command), None);
    };

    let mut program = cap_path(&command[..first_space]);
    let mut args = Some(&command[first_space..]);

    let candidate_ends = command
        .char_indices()
        .skip(1)
        .filter_map(|(i, c)| (c == ' ').then_some(i))
        .chain(std::iter::once(command.len()));

    for end in candidate_ends {
        let candidate = &command[..end];
        if candidate.chars().count() >= MAX_PATH {
            break;
        }
        let path = candidate.strip_suffix('\\').unwrap_or(candidate);
        if exists(Path::new(path)) {
            log::trace!("program candidate {candidate:?} exists");
            program = candidate.to_owned();
            args = (end < command.len()).then(|| &command[end + 1..]);
        }
    }

    (program, args.map(|a| a.trim_start_matches(' ')).and_then(non_empty))
}

/// [`separate_arguments`] against the file system.
pub fn separate_arguments_fs(command: &str) -> (String, Option<&str>) {
    separate_arguments(command, |p| p.exists())
}

/// Replaces a leading well-known directory in a path by its `%VARIABLE%`.
#[derive(Clone, Debug, Default)]
pub struct EnvCompressor {
    vars: Vec<(String, String)>,
}

impl EnvCompressor {
    /// Captures [`COMMON_ENV_VARS`] from the process environment.
    pub fn from_env() -> Self {
        Self::with_names(&COMMON_ENV_VARS, |name| std::env::var(name).ok())
    }

    /// Captures the given variables, in priority order. Unset and empty values are skipped, as
    /// are values that do not fit a `MAX_PATH` buffer.
    pub fn with_names<F>(names: &[&str], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = names
            .iter()
            .filter_map(|&name| {
                let value = lookup(name)?;
                if value.is_empty() || value.chars().count() >= MAX_PATH {
                    log::trace!("not compressing %{name}%");
                    return None;
                }
                Some((name.to_owned(), value))
            })
            .collect();
        EnvCompressor { vars }
    }

    pub fn compress(&self, src: &str) -> String {
        for (name, value) in &self.vars {
            if let Some(rest) = strip_prefix_ignore_case(src, value) {
                return format!("%{name}%{rest}");
            }
        }
        src.to_owned()
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();
    for p in prefix.chars() {
        let (_, c) = chars.next()?;
        if !c.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }
    let rest = chars.next().map_or(text.len(), |(i, _)| i);
    Some(&text[rest..])
}

/// Compresses `src` with the process environment captured on first use.
pub fn unexpand_env_strings(src: &str) -> String {
    static COMPRESSOR: OnceLock<EnvCompressor> = OnceLock::new();
    COMPRESSOR.get_or_init(EnvCompressor::from_env).compress(src)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing<'a>(files: &'a [&'a str]) -> impl Fn(&Path) -> bool + 'a {
        move |p| files.iter().any(|f| Path::new(f) == p)
    }

    #[test]
    fn tokens() {
        assert_eq!(get_token(r#""C:\My App\a.exe" -x  y"#, " "), (r"C:\My App\a.exe", "-x  y"));
        assert_eq!(get_token("  one two", " "), ("one", "two"));
        assert_eq!(get_token("one", " "), ("one", ""));
        assert_eq!(get_token(r#""open"#, " "), ("open", ""));
    }

    #[test]
    fn quoted_program() {
        let (program, args) = separate_arguments(r#""C:\Program Files\x.exe" /a /b"#, |_| false);
        assert_eq!(program, r"C:\Program Files\x.exe");
        assert_eq!(args, Some("/a /b"));

        let (program, args) = separate_arguments(r#""C:\x.exe""#, |_| false);
        assert_eq!(program, r"C:\x.exe");
        assert_eq!(args, None);
    }

    #[test]
    fn no_spaces() {
        assert_eq!(separate_arguments("   notepad.exe", |_| true), ("notepad.exe".into(), None));
    }

    #[test]
    fn first_space_without_matches() {
        let (program, args) = separate_arguments("notepad.exe   file.txt", |_| false);
        assert_eq!(program, "notepad.exe");
        assert_eq!(args, Some("file.txt"));
    }

    #[test]
    fn unquoted_path_with_spaces() {
        let files = [r"C:\Program Files\App\app.exe"];
        let (program, args) =
            separate_arguments(r"C:\Program Files\App\app.exe --flag value", existing(&files));
        assert_eq!(program, r"C:\Program Files\App\app.exe");
        assert_eq!(args, Some("--flag value"));
    }

    #[test]
    fn whole_command_is_a_file() {
        let files = [r"C:\My Files\doc.txt"];
        let (program, args) = separate_arguments(r"C:\My Files\doc.txt", existing(&files));
        assert_eq!(program, r"C:\My Files\doc.txt");
        assert_eq!(args, None);
    }

    #[test]
    fn trailing_backslash_is_checked_without_it() {
        let files = [r"C:\My Folder"];
        let (program, args) = separate_arguments(r"C:\My Folder\ arg", existing(&files));
        assert_eq!(program, r"C:\My Folder\");
        assert_eq!(args, Some("arg"));
    }

    #[test]
    fn overlong_candidates_stop_the_scan() {
        let long = "a".repeat(300);
        let command = format!("prog {long} tail");
        let (program, args) = separate_arguments(&command, |_| true);
        assert_eq!(program, "prog");
        assert_eq!(args, Some(format!("{long} tail").as_str()));

        let (program, _) = separate_arguments(&format!("{long} x"), |_| false);
        assert_eq!(program.chars().count(), MAX_PATH - 1);
    }

    fn compressor() -> EnvCompressor {
        EnvCompressor::with_names(&COMMON_ENV_VARS, |name| match name {
            "USERPROFILE" => Some(r"C:\Users\Sam".into()),
            "ALLUSERSPROFILE" => Some(r"C:\ProgramData".into()),
            "SystemRoot" => Some(r"C:\Windows".into()),
            "SystemDrive" => Some("C:".into()),
            _ => None,
        })
    }

    #[test]
    fn compresses_known_prefixes() {
        let c = compressor();
        assert_eq!(c.compress(r"c:\users\sam\Desktop\a.lnk"), r"%USERPROFILE%\Desktop\a.lnk");
        assert_eq!(c.compress(r"C:\Windows\notepad.exe"), r"%SystemRoot%\notepad.exe");
        assert_eq!(c.compress(r"C:\Tools\x.exe"), r"%SystemDrive%\Tools\x.exe");
        assert_eq!(c.compress(r"D:\data"), r"D:\data");
    }

    #[test]
    fn unset_variables_never_match() {
        let c = EnvCompressor::with_names(&COMMON_ENV_VARS, |name| {
            (name == "SystemRoot").then(|| r"C:\Windows".to_owned())
        });
        assert_eq!(c.compress(r"C:\Users\x"), r"C:\Users\x");
        assert_eq!(c.compress(r"C:\WINDOWS"), "%SystemRoot%");

        let empty = EnvCompressor::with_names(&["USERPROFILE"], |_| Some(String::new()));
        assert_eq!(empty.compress("abc"), "abc");
    }

    #[test]
    fn values_must_fit_max_path() {
        let fits = format!(r"C:\{}", "d".repeat(MAX_PATH - 4));
        let too_long = format!(r"C:\{}", "d".repeat(MAX_PATH - 3));
        assert_eq!(fits.chars().count(), MAX_PATH - 1);

        let c = EnvCompressor::with_names(&["FITS"], |_| Some(fits.clone()));
        assert_eq!(c.compress(&format!(r"{fits}\x")), r"%FITS%\x");

        let c = EnvCompressor::with_names(&["LONG", "SystemDrive"], |name| match name {
            "LONG" => Some(too_long.clone()),
            _ => Some("C:".into()),
        });
        let expected = format!(r"%SystemDrive%{}\x", &too_long[2..]);
        assert_eq!(c.compress(&format!(r"{too_long}\x")), expected);
    }
}
