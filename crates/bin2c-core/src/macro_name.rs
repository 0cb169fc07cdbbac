//! Upper-cased identifiers for include guards and size macros.

use crate::error::{Error, Result};
use crate::path::MAX_PATH_LEN;

/// Ceiling on macro identifier length, counting one slot for a terminator
pub const MAX_MACRO_LEN: usize = MAX_PATH_LEN;

/// Concatenates `prefix`, `core` and `suffix` into one upper-cased identifier.
///
/// ASCII letters are upper-cased; every other character, including digits,
/// underscores and non-ASCII text, passes through unchanged. The result is
/// not checked for being a legal C identifier.
///
/// ```
/// use bin2c_core::build_macro_name;
///
/// assert_eq!(build_macro_name(Some("s_"), "data", Some("_len")).unwrap(), "S_DATA_LEN");
/// assert_eq!(build_macro_name(None, "data", None).unwrap(), "DATA");
/// ```
pub fn build_macro_name(prefix: Option<&str>, core: &str, suffix: Option<&str>) -> Result<String> {
    let fragments = [prefix.unwrap_or_default(), core, suffix.unwrap_or_default()];

    let len: usize = fragments.iter().map(|fragment| fragment.len()).sum();
    if len + 1 > MAX_MACRO_LEN {
        return Err(Error::NameTooLong {
            len,
            max: MAX_MACRO_LEN,
        });
    }

    let mut name = String::with_capacity(len);
    for fragment in fragments {
        name.extend(fragment.chars().map(|c| c.to_ascii_uppercase()));
    }
    Ok(name)
}
