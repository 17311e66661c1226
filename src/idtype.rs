//! Identifier types: named, ordered bundles of pattern rules.
//!
//! An [`IdType`] turns a raw, unprefixed value into a canonical
//! [`Identifier`] by trying its rules strictly in declaration order and
//! taking the first successful canonicalization. It does not search for a
//! "best" match, so rule order is part of a type's definition: the
//! non-versioned numeric rule of `pmid` must precede the versioned one for
//! `"123"` to come out non-versioned.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use compact_str::CompactString;

use crate::error::TypeError;
use crate::identifier::Identifier;
use crate::pattern::PatternRule;
use crate::regex::Regex;

static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());

/// A named identifier type: an ordered list of [`PatternRule`]s.
///
/// Two types are equal iff their names are equal. Name comparison is
/// case-sensitive here; case-insensitive lookup is the job of
/// [`IdDb`](crate::IdDb).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use litid::{Canonicalizer, IdType, PatternRule};
///
/// let pmcid = Arc::new(IdType::new(
///     "pmcid",
///     vec![PatternRule::new(r"[Pp][Mm][Cc]\d+", false, Canonicalizer::Uppercase)?],
/// )?);
/// let id = IdType::make_id(&pmcid, "pmc3098").unwrap();
/// assert_eq!(id.curie(), "pmcid:PMC3098");
/// # Ok::<(), litid::TypeError>(())
/// ```
#[derive(Debug)]
pub struct IdType {
    name: CompactString,
    rules: Vec<PatternRule>,
}

impl IdType {
    /// Creates a type from its name and rules.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::BadName`] unless the name matches
    /// `[a-z][a-z0-9_]*`.
    pub fn new(name: &str, rules: Vec<PatternRule>) -> Result<Self, TypeError> {
        if !NAME_REGEX.is_match(name) {
            return Err(TypeError::BadName {
                name: name.to_string(),
            });
        }
        Ok(Self {
            name: CompactString::new(name),
            rules,
        })
    }

    /// The type's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type's rules, in the order they are tried.
    #[must_use]
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// True if any rule matches the whole of `value`.
    #[must_use]
    pub fn is_valid(&self, value: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_match(value))
    }

    /// Parses an unprefixed `value` against this type's rules; the first
    /// matching rule supplies the canonical form and versioned flag.
    ///
    /// The receiver is passed explicitly because the returned [`Identifier`]
    /// keeps a handle to its type.
    #[must_use]
    pub fn make_id(this: &Arc<Self>, value: &str) -> Option<Identifier> {
        this.rules.iter().find_map(|rule| {
            rule.canonicalize(value)
                .map(|canonical| Identifier::new(Arc::clone(this), canonical, rule.is_versioned()))
        })
    }
}

impl PartialEq for IdType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for IdType {}

impl Hash for IdType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
