//! Pattern rules: the matching and canonicalization primitive behind every
//! identifier type.
//!
//! A [`PatternRule`] couples a regular expression with a canonicalization
//! step and a versioned flag. Matching is always against the entire
//! candidate value; a rule never matches a substring. Canonicalization is
//! only defined on a successful match, which the API encodes by returning
//! `Option` from [`PatternRule::canonicalize`].

use compact_str::CompactString;

use crate::error::TypeError;
use crate::regex::Regex;

/// How a matched value is normalized into its canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Canonicalizer {
    /// Keep the matched text unchanged.
    #[default]
    Noop,

    /// Uppercase the matched text.
    Uppercase,

    /// Expand a replacement template over the match's capture groups.
    ///
    /// Uses `$1` / `${1}` expansion syntax; a group that did not participate
    /// in the match expands to the empty string.
    Replace(CompactString),
}

/// One pattern rule: a full-anchored regular expression, a canonicalization
/// step, and a versioned flag.
///
/// # Examples
///
/// ```
/// use litid::{Canonicalizer, PatternRule};
///
/// let rule = PatternRule::new(r"(\d+)", false, Canonicalizer::Replace("PMC$1".into()))?;
/// assert!(rule.is_match("84786"));
/// assert_eq!(rule.canonicalize("84786").as_deref(), Some("PMC84786"));
/// assert_eq!(rule.canonicalize("PMC84786"), None);
/// # Ok::<(), litid::TypeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Original pattern text, without the anchoring wrapper.
    pattern: CompactString,
    re: Regex,
    versioned: bool,
    canonicalizer: Canonicalizer,
}

impl PatternRule {
    /// Compiles a rule from its pattern text.
    ///
    /// The pattern is wrapped in a non-capturing group and anchored on both
    /// ends, so capture group numbers are preserved and `is_match` holds only
    /// when the whole value matches.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::BadPattern`] if the pattern does not compile.
    pub fn new(
        pattern: &str,
        versioned: bool,
        canonicalizer: Canonicalizer,
    ) -> Result<Self, TypeError> {
        let re = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| TypeError::BadPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern: CompactString::new(pattern),
            re,
            versioned,
            canonicalizer,
        })
    }

    /// The pattern source text this rule was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether values matched by this rule denote a specific version.
    #[must_use]
    pub fn is_versioned(&self) -> bool {
        self.versioned
    }

    /// Reports whether `value` matches this rule in full.
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.re.is_match(value)
    }

    /// Canonicalizes `value`, or `None` if it does not match.
    #[must_use]
    pub fn canonicalize(&self, value: &str) -> Option<CompactString> {
        let caps = self.re.captures(value)?;
        Some(match &self.canonicalizer {
            Canonicalizer::Noop => CompactString::new(value),
            Canonicalizer::Uppercase => value.to_uppercase().into(),
            Canonicalizer::Replace(template) => {
                let mut out = String::new();
                caps.expand(template, &mut out);
                out.into()
            }
        })
    }
}
