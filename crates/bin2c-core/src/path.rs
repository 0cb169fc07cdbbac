//! Path and symbol name derivation.
//!
//! All derivations share one bounded, single-pass scan over the path that
//! remembers the position after the last directory delimiter and the position
//! of the last `.` following it. The scan never looks at more than
//! [`MAX_PATH_LEN`]` - 1` bytes, so an oversized path is rejected instead of
//! being silently truncated.
//!
//! Lengths are measured in bytes. The delimiter and `.` are ASCII, so every
//! returned slice starts and ends on a character boundary. On Unix, OS paths
//! are scanned as raw bytes and need not be valid UTF-8.

use crate::error::{Error, Result};
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Ceiling on path length, counting one slot for a terminator
pub const MAX_PATH_LEN: usize = u16::MAX as usize;

/// Directory delimiter recognized when splitting off the file name
#[cfg(windows)]
pub const PATH_DELIMITER: u8 = b'\\';

/// Directory delimiter recognized when splitting off the file name
#[cfg(not(windows))]
pub const PATH_DELIMITER: u8 = b'/';

/// Extension reserved by [`OutputStem`]; both output kinds use two characters
const EXTENSION_PLACEHOLDER: &str = ". ";

/// Positions found by a single pass over a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PathScan {
    /// Bytes visited before hitting the end or the bound
    scanned: usize,
    /// Offset of the first byte after the last delimiter
    name_start: usize,
    /// Offset of the last `.` after `name_start`
    extension: Option<usize>,
}

impl PathScan {
    fn new(path: &[u8]) -> Self {
        let mut scan = Self {
            scanned: 0,
            name_start: 0,
            extension: None,
        };

        for (i, &byte) in path.iter().take(MAX_PATH_LEN - 1).enumerate() {
            if byte == b'.' {
                scan.extension = Some(i);
            } else if byte == PATH_DELIMITER {
                // A dot before the delimiter belongs to a directory name
                scan.extension = None;
                scan.name_start = i + 1;
            }
            scan.scanned = i + 1;
        }

        scan
    }
}

/// Length of `input` without its extension, checked against the ceiling
/// with `reserved` more bytes appended
fn stem_len(input: &[u8], reserved: usize) -> Result<usize> {
    let scan = PathScan::new(input);
    if scan.scanned != input.len() {
        return Err(Error::PathTooLong {
            len: input.len(),
            max: MAX_PATH_LEN,
        });
    }

    let stem = scan.extension.unwrap_or(input.len());
    if stem + reserved + 1 > MAX_PATH_LEN {
        return Err(Error::PathTooLong {
            len: stem + reserved,
            max: MAX_PATH_LEN,
        });
    }
    Ok(stem)
}

#[cfg(unix)]
fn os_bytes(input: &OsStr) -> Result<&[u8]> {
    use std::os::unix::ffi::OsStrExt;
    Ok(input.as_bytes())
}

#[cfg(not(unix))]
fn os_bytes(input: &OsStr) -> Result<&[u8]> {
    input
        .to_str()
        .map(str::as_bytes)
        .ok_or_else(|| Error::NonUnicodePath { path: input.into() })
}

/// First `len` bytes of a path that [`os_bytes`] accepted
#[cfg(unix)]
fn os_prefix(input: &OsStr, len: usize) -> &OsStr {
    use std::os::unix::ffi::OsStrExt;
    OsStr::from_bytes(&input.as_bytes()[..len])
}

/// First `len` bytes of a path that [`os_bytes`] accepted
#[cfg(not(unix))]
fn os_prefix(input: &OsStr, len: usize) -> &OsStr {
    input.to_str().map_or(input, |s| OsStr::new(&s[..len]))
}

/// Returns the file name portion of `path`.
///
/// This is everything after the last [`PATH_DELIMITER`], or the whole path
/// when there is none. The scan is bounded by [`MAX_PATH_LEN`]; a delimiter
/// beyond the bound is not seen.
pub fn find_filename(path: &str) -> &str {
    let scan = PathScan::new(path.as_bytes());
    &path[scan.name_start..]
}

/// Returns the file name of `path` without its extension.
///
/// Only a `.` after the last delimiter counts as an extension separator, so
/// `dir.d/file` keeps its full name. A leading `.` (as in `.bin`) yields an
/// empty name, which is passed through.
pub fn symbol_name(path: &str) -> &str {
    let scan = PathScan::new(path.as_bytes());
    let end = scan.extension.unwrap_or(path.len());
    &path[scan.name_start..end]
}

/// Like [`symbol_name`] for an OS path; invalid UTF-8 becomes `U+FFFD`
pub fn symbol_name_lossy(path: &OsStr) -> Cow<'_, str> {
    match os_bytes(path) {
        Ok(bytes) => {
            let scan = PathScan::new(bytes);
            let end = scan.extension.unwrap_or(bytes.len());
            String::from_utf8_lossy(&bytes[scan.name_start..end])
        }
        Err(_) => Cow::Owned(symbol_name(&path.to_string_lossy()).to_owned()),
    }
}

/// Removes the extension from `path` and returns the remaining file name.
///
/// The string is truncated at the last `.` following the last delimiter; its
/// capacity is left alone. Without such a `.` the path is not modified.
pub fn strip_extension_in_place(path: &mut String) -> &str {
    let scan = PathScan::new(path.as_bytes());
    if let Some(dot) = scan.extension {
        path.truncate(dot);
    }
    &path[scan.name_start..]
}

/// Builds a new path from `input` with its extension replaced by `replacement`.
///
/// Paths without an extension get `replacement` appended. Fails with
/// [`Error::PathTooLong`] when `input` does not fit [`MAX_PATH_LEN`], or when
/// the result (plus terminator) would not.
pub fn derive_output_path(input: &str, replacement: &str) -> Result<String> {
    let stem = &input[..stem_len(input.as_bytes(), replacement.len())?];

    let mut output = String::with_capacity(stem.len() + replacement.len());
    output.push_str(stem);
    output.push_str(replacement);
    Ok(output)
}

/// Kind of file written by the emitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Header file holding the static definition or the extern declaration
    Header,
    /// Source file holding the global definition
    Source,
}

impl OutputKind {
    /// Extension (with leading `.`) used for this kind of file
    pub fn extension(&self) -> &'static str {
        match self {
            OutputKind::Header => ".h",
            OutputKind::Source => ".c",
        }
    }
}

/// Input path with the extension removed, ready to receive `.h` or `.c`.
///
/// Construction reserves room for a two character extension, so
/// [`OutputStem::path`] cannot exceed the length ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputStem {
    stem: OsString,
}

impl OutputStem {
    /// Derives the output stem for an input file path
    pub fn from_input(input: &str) -> Result<Self> {
        Self::from_os_input(OsStr::new(input))
    }

    /// Derives the output stem for an OS path, keeping its bytes intact
    pub fn from_os_input(input: &OsStr) -> Result<Self> {
        let len = stem_len(os_bytes(input)?, EXTENSION_PLACEHOLDER.len())?;
        Ok(Self {
            stem: os_prefix(input, len).to_os_string(),
        })
    }

    /// Returns the stem without any extension
    pub fn as_os_str(&self) -> &OsStr {
        &self.stem
    }

    /// Returns the path of the output file of the given kind
    pub fn path(&self, kind: OutputKind) -> PathBuf {
        let mut path = OsString::with_capacity(self.stem.len() + EXTENSION_PLACEHOLDER.len());
        path.push(&self.stem);
        path.push(kind.extension());
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sep(path: &str) -> String {
        path.replace('/', std::str::from_utf8(&[PATH_DELIMITER]).unwrap())
    }

    #[test]
    fn test_find_filename() {
        assert_eq!(find_filename(&sep("a/b/c.bin")), "c.bin");
        assert_eq!(find_filename("c.bin"), "c.bin");
        assert_eq!(find_filename(&sep("a/b/")), "");
        assert_eq!(find_filename(""), "");
    }

    #[test]
    fn test_symbol_name() {
        assert_eq!(symbol_name(&sep("a/b/c.bin")), "c");
        assert_eq!(symbol_name("c.bin"), "c");
        assert_eq!(symbol_name("c"), "c");
        assert_eq!(symbol_name("archive.tar.gz"), "archive.tar");
        assert_eq!(symbol_name(&sep("dir.d/file")), "file");
        assert_eq!(symbol_name(&sep("dir/.bin")), "");
    }

    #[test]
    fn test_no_delimiter_matches_stripped_directories() {
        assert_eq!(symbol_name("c.bin"), symbol_name(&sep("x/y/c.bin")));
        assert_eq!(find_filename("c.bin"), find_filename(&sep("x/y/c.bin")));
    }

    #[test]
    fn test_strip_extension_in_place() {
        let mut path = sep("a/b/c.bin");
        let capacity = path.capacity();
        assert_eq!(strip_extension_in_place(&mut path), "c");
        assert_eq!(path, sep("a/b/c"));
        assert_eq!(path.capacity(), capacity);

        let mut path = sep("dir.d/file");
        assert_eq!(strip_extension_in_place(&mut path), "file");
        assert_eq!(path, sep("dir.d/file"));
    }

    #[test]
    fn test_derive_output_path() {
        assert_eq!(derive_output_path(&sep("a/b/c.bin"), ".h").unwrap(), sep("a/b/c.h"));
        assert_eq!(derive_output_path("c", ".h").unwrap(), "c.h");
        assert_eq!(derive_output_path(&sep("a.d/c"), ".c").unwrap(), sep("a.d/c.c"));
        assert_eq!(derive_output_path("x.tar.gz", ".h").unwrap(), "x.tar.h");
    }

    #[test]
    fn test_derive_output_path_boundary() {
        // 65534 bytes plus terminator fills the bound exactly
        let fits = format!("{}.bin", "a".repeat(MAX_PATH_LEN - 1 - 4));
        assert_eq!(fits.len() + 1, MAX_PATH_LEN);
        let derived = derive_output_path(&fits, ".h").unwrap();
        assert_eq!(derived.len(), MAX_PATH_LEN - 1 - 4 + 2);

        let too_long = format!("a{}", fits);
        assert!(matches!(
            derive_output_path(&too_long, ".h"),
            Err(Error::PathTooLong { len, max: MAX_PATH_LEN }) if len == MAX_PATH_LEN
        ));
    }

    #[test]
    fn test_derive_output_path_result_too_long() {
        // Input fits, but appending an extension pushes the result past the bound
        let input = "a".repeat(MAX_PATH_LEN - 2);
        assert!(derive_output_path(&input, "").is_ok());
        assert!(matches!(
            derive_output_path(&input, ".h"),
            Err(Error::PathTooLong { .. })
        ));
    }

    #[test]
    fn test_find_filename_is_bounded() {
        // A delimiter past the bound is never seen
        let path = format!("{}/tail", "a".repeat(MAX_PATH_LEN));
        assert_eq!(find_filename(&path), path);
    }

    #[test]
    fn test_output_stem() {
        let stem = OutputStem::from_input(&sep("assets/logo.png")).unwrap();
        assert_eq!(stem.as_os_str(), OsStr::new(&sep("assets/logo")));
        assert_eq!(stem.path(OutputKind::Header), PathBuf::from(sep("assets/logo.h")));
        assert_eq!(stem.path(OutputKind::Source), PathBuf::from(sep("assets/logo.c")));

        let stem = OutputStem::from_input("blob").unwrap();
        assert_eq!(stem.path(OutputKind::Header), PathBuf::from("blob.h"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths() {
        use std::os::unix::ffi::OsStrExt;

        let input = OsStr::from_bytes(b"dir/caf\xE9.bin");
        let stem = OutputStem::from_os_input(input).unwrap();
        assert_eq!(stem.as_os_str().as_bytes(), b"dir/caf\xE9");
        assert_eq!(
            stem.path(OutputKind::Source).as_os_str().as_bytes(),
            b"dir/caf\xE9.c"
        );
        assert_eq!(symbol_name_lossy(input), "caf\u{FFFD}");
    }

    #[test]
    fn test_symbol_name_lossy_matches_symbol_name() {
        let path = sep("a/b/c.bin");
        assert_eq!(symbol_name_lossy(OsStr::new(&path)), symbol_name(&path));
    }

    #[test]
    fn test_output_stem_boundary() {
        let fits = format!("{}.bin", "a".repeat(MAX_PATH_LEN - 1 - 4));
        assert!(OutputStem::from_input(&fits).is_ok());
        assert!(matches!(
            OutputStem::from_input(&format!("a{}", fits)),
            Err(Error::PathTooLong { .. })
        ));
    }
}
