//! Re-exports from either `regex` or `regex_lite`, depending on features.
//!
//! With `lite`, `\w` only matches ASCII word characters.

#[cfg(feature = "lite")]
pub(crate) use regex_lite::Regex;
#[cfg(all(feature = "regex", not(feature = "lite")))]
pub(crate) use regex::Regex;

#[cfg(not(any(feature = "regex", feature = "lite")))]
compile_error!("cordex requires the \"regex\" or \"lite\" feature to be enabled");
