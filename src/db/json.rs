//! Loading an identifier database from its JSON definition.
//!
//! The expected document shape:
//!
//! ```json
//! {
//!   "name": "literature-ids",
//!   "idTypes": [
//!     {
//!       "name": "pmcid",
//!       "parsers": [
//!         { "pattern": "(\\d+)", "canonicalize": "REPLACEMENT",
//!           "replacement": "PMC$1", "isVersioned": false },
//!         { "pattern": "[Pp][Mm][Cc]\\d+", "canonicalize": "UPPERCASE",
//!           "isVersioned": false }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `canonicalize` defaults to `"NOOP"` and `isVersioned` to `false` when
//! omitted; `replacement` is required exactly when `canonicalize` is
//! `"REPLACEMENT"`. Unknown keys anywhere in the document are rejected.

use serde::Deserialize;

use crate::db::IdDb;
use crate::error::{DbError, TypeError};
use crate::idtype::IdType;
use crate::pattern::{Canonicalizer, PatternRule};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDb {
    name: String,
    #[serde(rename = "idTypes")]
    id_types: Vec<RawType>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawType {
    name: String,
    parsers: Vec<RawParser>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParser {
    pattern: String,
    #[serde(default)]
    canonicalize: RawCanonicalize,
    #[serde(default)]
    replacement: Option<String>,
    #[serde(rename = "isVersioned", default)]
    is_versioned: bool,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
enum RawCanonicalize {
    #[default]
    #[serde(rename = "NOOP")]
    Noop,
    #[serde(rename = "UPPERCASE")]
    Uppercase,
    #[serde(rename = "REPLACEMENT")]
    Replacement,
}

impl TryFrom<RawParser> for PatternRule {
    type Error = TypeError;

    fn try_from(raw: RawParser) -> Result<Self, TypeError> {
        let canonicalizer = match raw.canonicalize {
            RawCanonicalize::Noop => Canonicalizer::Noop,
            RawCanonicalize::Uppercase => Canonicalizer::Uppercase,
            RawCanonicalize::Replacement => match raw.replacement {
                Some(template) => Canonicalizer::Replace(template.into()),
                None => {
                    return Err(TypeError::MissingReplacement {
                        pattern: raw.pattern,
                    });
                }
            },
        };
        PatternRule::new(&raw.pattern, raw.is_versioned, canonicalizer)
    }
}

impl TryFrom<RawType> for IdType {
    type Error = TypeError;

    fn try_from(raw: RawType) -> Result<Self, TypeError> {
        let rules = raw
            .parsers
            .into_iter()
            .map(PatternRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        IdType::new(&raw.name, rules)
    }
}

impl IdDb {
    /// Loads a database from a JSON definition string.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Json`] when the document does not deserialize,
    /// [`DbError::Type`] when a type or parser definition is invalid, and
    /// [`DbError::DuplicateType`] when two types share a name.
    pub fn from_json(json: &str) -> Result<Self, DbError> {
        let raw: RawDb = serde_json::from_str(json)?;
        let types = raw
            .id_types
            .into_iter()
            .map(IdType::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(&raw.name, types)
    }
}
