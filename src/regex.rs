//! Regex backend selection.
//!
//! The `regex` feature (default) uses the full `regex` crate; the `lite`
//! feature swaps in `regex-lite` for smaller binaries and faster compiles.
//! When both are enabled, `regex` wins.

#[cfg(feature = "regex")]
pub(crate) use regex::Regex;

#[cfg(all(feature = "lite", not(feature = "regex")))]
pub(crate) use regex_lite::Regex;

#[cfg(not(any(feature = "regex", feature = "lite")))]
compile_error!("either the `regex` or the `lite` feature must be enabled");
