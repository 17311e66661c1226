//! The identifier database: an ordered, named collection of identifier
//! types, and the sole constructor surface for [`Identifier`] values.
//!
//! Insertion order is significant. For an ambiguous value that several types
//! could parse, the first-registered matching type wins, which is why the
//! default [literature database](IdDb::literature) checks `pmcid` before the
//! far more permissive `mid`.
//!
//! User input is messy: a value may carry a `type:` prefix, the caller may
//! supply an independent type hint, and the two may disagree. The database
//! splits each value into prefix and body ([`IdDb::id_parts`]) and
//! reconciles hint against prefix with a hint-wins policy. Reconciliation
//! problems are recorded on the [`IdParts`], not raised; only a body that no
//! candidate type can parse produces no identifier.
//!
//! # Examples
//!
//! ```
//! use litid::IdDb;
//!
//! let db = IdDb::literature();
//!
//! // bare values are inferred in registration order
//! assert_eq!(db.id("84786").unwrap().curie(), "pmid:84786");
//!
//! // prefixes and hints pin the type
//! assert_eq!(db.id("pmcid:84786").unwrap().curie(), "pmcid:PMC84786");
//! assert_eq!(
//!     db.make_id(Some("aiid"), "84786").unwrap().curie(),
//!     "aiid:84786"
//! );
//! ```

mod json;

use std::collections::HashMap;
use std::slice;
use std::sync::Arc;

use compact_str::CompactString;

use crate::error::DbError;
use crate::identifier::Identifier;
use crate::idtype::IdType;
use crate::pattern::{Canonicalizer, PatternRule};

/// Non-fatal problems found while reconciling a type hint against a value
/// prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseProblem {
    /// The supplied hint named no registered type.
    UnknownHint,

    /// The value's prefix named no registered type.
    UnknownPrefix,

    /// Hint and prefix both resolved, to different types; the hint wins.
    HintPrefixMismatch,
}

/// One user-supplied value, split and reconciled but not yet parsed.
///
/// The fields record everything found on the way: the hint and prefix as
/// given, whichever of them resolved to a registered type, and any problems.
/// Problems are never fatal by themselves — parsing proceeds with whichever
/// type survived reconciliation — but a hint that resolves to nothing leaves
/// no candidate type at all, so the parse comes up empty.
#[derive(Debug, Clone)]
pub struct IdParts {
    /// The type hint as supplied, if any.
    pub hint: Option<CompactString>,

    /// The registered type the hint resolved to.
    pub hint_type: Option<Arc<IdType>>,

    /// The prefix text, when the value carried one.
    pub prefix: Option<CompactString>,

    /// The registered type the prefix resolved to.
    pub prefix_type: Option<Arc<IdType>>,

    /// The value with any prefix stripped.
    pub body: CompactString,

    /// Problems encountered while reconciling.
    pub problems: Vec<ParseProblem>,
}

impl IdParts {
    /// True if reconciliation recorded any problem.
    #[must_use]
    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }
}

/// An ordered, named collection of identifier types.
///
/// Databases are built once and shared read-only, typically behind an
/// [`Arc`]. There is no process-wide instance; callers construct their own,
/// usually with [`IdDb::literature`], and pass it to whatever needs it.
#[derive(Debug, Clone)]
pub struct IdDb {
    name: CompactString,
    types: Vec<Arc<IdType>>,
    /// Lowercased name → position in `types`.
    index: HashMap<CompactString, usize>,
}

impl IdDb {
    /// Creates a database from a name and an ordered list of types.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::DuplicateType`] if two types share a name.
    pub fn new(name: &str, types: Vec<IdType>) -> Result<Self, DbError> {
        let types: Vec<Arc<IdType>> = types.into_iter().map(Arc::new).collect();
        let mut index = HashMap::with_capacity(types.len());
        for (pos, ty) in types.iter().enumerate() {
            let key = CompactString::new(ty.name());
            if index.insert(key, pos).is_some() {
                return Err(DbError::DuplicateType {
                    name: ty.name().to_string(),
                });
            }
        }
        Ok(Self {
            name: CompactString::new(name),
            types,
            index,
        })
    }

    /// The database of literature identifiers: `pmid`, `pmcid`, `mid`,
    /// `doi`, and `aiid`, in that precedence order.
    ///
    /// `pmid` outranks `pmcid` and `aiid` for a bare number, and `pmcid`
    /// outranks `mid` for values like `PMC12345`, which `mid`'s
    /// letters-then-digits pattern would also accept.
    #[must_use]
    pub fn literature() -> Self {
        use Canonicalizer::{Noop, Replace, Uppercase};

        let rule = |pattern: &str, versioned: bool, canon: Canonicalizer| {
            PatternRule::new(pattern, versioned, canon).expect("literature rule compiles")
        };

        let types = vec![
            IdType::new(
                "pmid",
                vec![
                    rule(r"\d+", false, Noop),
                    rule(r"\d+(\.\d+)?", true, Noop),
                ],
            ),
            IdType::new(
                "pmcid",
                vec![
                    rule(r"(\d+)", false, Replace("PMC$1".into())),
                    rule(r"(\d+(\.\d+)?)", true, Replace("PMC$1".into())),
                    rule(r"[Pp][Mm][Cc]\d+", false, Uppercase),
                    rule(r"[Pp][Mm][Cc]\d+(\.\d+)?", true, Uppercase),
                ],
            ),
            IdType::new("mid", vec![rule(r"[A-Za-z]+\d+", true, Uppercase)]),
            IdType::new("doi", vec![rule(r"10\.\d+\/.*", false, Noop)]),
            IdType::new("aiid", vec![rule(r"\d+", true, Noop)]),
        ]
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("literature type names are valid");

        Self::new("literature-ids", types).expect("literature type names are distinct")
    }

    /// The database's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registered types, in precedence order.
    #[must_use]
    pub fn types(&self) -> &[Arc<IdType>] {
        &self.types
    }

    /// Looks up a type by name, case-insensitively. Returns `None` for an
    /// unregistered name.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&Arc<IdType>> {
        let key = name.to_lowercase();
        self.index.get(key.as_str()).map(|&pos| &self.types[pos])
    }

    /// Like [`get_type`](Self::get_type), but an unregistered name is an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::UnknownType`] for an unregistered name.
    pub fn lookup_type(&self, name: &str) -> Result<&Arc<IdType>, DbError> {
        self.get_type(name).ok_or_else(|| DbError::UnknownType {
            name: name.to_string(),
        })
    }

    /// The first registered type for which `value` is valid, if any.
    ///
    /// `value` is taken as-is, with no prefix handling.
    #[must_use]
    pub fn find_type(&self, value: &str) -> Option<&Arc<IdType>> {
        self.types.iter().find(|ty| ty.is_valid(value))
    }

    /// Every registered type for which `value` is valid, in precedence
    /// order. Supports intentionally ambiguous values: a bare number is
    /// valid as `pmid`, `pmcid`, and `aiid` at once.
    pub fn find_types<'a>(&'a self, value: &'a str) -> impl Iterator<Item = &'a Arc<IdType>> {
        self.types.iter().filter(move |ty| ty.is_valid(value))
    }

    /// Splits `value` into prefix and body on the first `:` and reconciles
    /// `hint` against the prefix.
    #[must_use]
    pub fn id_parts(&self, hint: Option<&str>, value: &str) -> IdParts {
        let mut problems = Vec::new();

        let hint_type = match hint {
            Some(name) => {
                let ty = self.get_type(name).cloned();
                if ty.is_none() {
                    problems.push(ParseProblem::UnknownHint);
                }
                ty
            }
            None => None,
        };

        let (prefix, body) = match value.split_once(':') {
            Some((prefix, body)) => (Some(prefix), body),
            None => (None, value),
        };

        let mut prefix_type = None;
        if let Some(prefix) = prefix {
            match self.get_type(prefix) {
                Some(ty) => prefix_type = Some(Arc::clone(ty)),
                None => problems.push(ParseProblem::UnknownPrefix),
            }
        }

        if let Some(hint_ty) = &hint_type
            && let Some(prefix_ty) = &prefix_type
            && hint_ty != prefix_ty
        {
            problems.push(ParseProblem::HintPrefixMismatch);
        }

        IdParts {
            hint: hint.map(CompactString::new),
            hint_type,
            prefix: prefix.map(CompactString::new),
            prefix_type,
            body: CompactString::new(body),
            problems,
        }
    }

    /// The types to try for one parse. A supplied hint is authoritative
    /// even when it resolves to nothing; otherwise a resolved prefix pins
    /// the type; otherwise every registered type is a candidate.
    fn candidate_types<'a>(&'a self, parts: &'a IdParts) -> &'a [Arc<IdType>] {
        if parts.hint.is_some() {
            match &parts.hint_type {
                Some(ty) => slice::from_ref(ty),
                None => &[],
            }
        } else if let Some(ty) = &parts.prefix_type {
            slice::from_ref(ty)
        } else {
            &self.types
        }
    }

    /// Builds an identifier from already-reconciled parts.
    #[must_use]
    pub fn make_id_from_parts(&self, parts: &IdParts) -> Option<Identifier> {
        self.candidate_types(parts)
            .iter()
            .find_map(|ty| IdType::make_id(ty, &parts.body))
    }

    /// Builds an identifier from a raw value and an optional type hint.
    ///
    /// Returns `None` when no candidate type parses the body — including
    /// the case of a hint that names no registered type, which leaves
    /// nothing to try.
    #[must_use]
    pub fn make_id(&self, hint: Option<&str>, value: &str) -> Option<Identifier> {
        self.make_id_from_parts(&self.id_parts(hint, value))
    }

    /// Builds an identifier from a raw value with no hint.
    #[must_use]
    pub fn id(&self, value: &str) -> Option<Identifier> {
        self.make_id(None, value)
    }

    /// True if `value` (prefix included, if any) parses as some identifier,
    /// under the same hint rules as [`make_id`](Self::make_id).
    #[must_use]
    pub fn is_valid(&self, hint: Option<&str>, value: &str) -> bool {
        let parts = self.id_parts(hint, value);
        self.candidate_types(&parts)
            .iter()
            .any(|ty| ty.is_valid(&parts.body))
    }

    /// Converts a list of values to identifiers in one go, all under the
    /// same optional hint.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Unparsable`] on the first value that does not
    /// parse.
    pub fn id_list<'a, I>(&self, hint: Option<&str>, values: I) -> Result<Vec<Identifier>, DbError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        values
            .into_iter()
            .map(|value| {
                self.make_id(hint, value).ok_or_else(|| DbError::Unparsable {
                    value: value.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_literature_registration_order() {
        let db = IdDb::literature();
        assert_eq!(db.name(), "literature-ids");
        let names: Vec<&str> = db.types().iter().map(|ty| ty.name()).collect();
        assert_eq!(names, vec!["pmid", "pmcid", "mid", "doi", "aiid"]);
    }

    #[test]
    fn test_get_type_is_case_insensitive() {
        let db = IdDb::literature();
        assert_eq!(db.get_type("pmcid").unwrap().name(), "pmcid");
        assert_eq!(db.get_type("PMCID").unwrap().name(), "pmcid");
        assert_eq!(db.get_type("PmCiD").unwrap().name(), "pmcid");
        assert!(db.get_type("purple").is_none());
    }

    #[test]
    fn test_lookup_type_errors_on_unknown() {
        let db = IdDb::literature();
        assert!(db.lookup_type("MID").is_ok());
        let err = db.lookup_type("blech").unwrap_err();
        assert!(matches!(err, DbError::UnknownType { name } if name == "blech"));
    }

    #[test]
    fn test_find_type_prefers_first_registered() {
        let db = IdDb::literature();
        assert_eq!(db.find_type("76389932").unwrap().name(), "pmid");

        let all: Vec<&str> = db.find_types("76389932").map(|ty| ty.name()).collect();
        assert_eq!(all, vec!["pmid", "pmcid", "aiid"]);

        assert_eq!(db.find_type("NIHMS12345").unwrap().name(), "mid");
        assert!(db.find_type("squirrel").is_none());
    }

    #[rstest]
    // bare values: inference in registration order
    #[case(None, "84786", Some("pmid:84786"))]
    #[case(None, "84786.1", Some("pmid:84786.1"))]
    #[case(None, "PMC84786", Some("pmcid:PMC84786"))]
    #[case(None, "pmc84786.1", Some("pmcid:PMC84786.1"))]
    #[case(None, "NIHMS12345", Some("mid:NIHMS12345"))]
    #[case(None, "nihms12345", Some("mid:NIHMS12345"))]
    #[case(None, "10.1093/cercor/bhs015", Some("doi:10.1093/cercor/bhs015"))]
    #[case(None, "squirrel", None)]
    // prefixed values: the prefix pins the type, case-insensitively
    #[case(None, "pmcid:84786", Some("pmcid:PMC84786"))]
    #[case(None, "PMCID:pmc84786", Some("pmcid:PMC84786"))]
    #[case(None, "mid:NIHMS77876", Some("mid:NIHMS77876"))]
    #[case(None, "doi:10.1093/cercor/bhs015", Some("doi:10.1093/cercor/bhs015"))]
    #[case(None, "pmcid:NIHMS77876", None)]
    // unknown prefix, no hint: inference runs on the body
    #[case(None, "shwartz:77898", Some("pmid:77898"))]
    #[case(None, "shwartz:nothing", None)]
    // hints pin the type
    #[case(Some("pmcid"), "84786", Some("pmcid:PMC84786"))]
    #[case(Some("PMCID"), "84786", Some("pmcid:PMC84786"))]
    #[case(Some("aiid"), "84786", Some("aiid:84786"))]
    #[case(Some("mid"), "84786", None)]
    // hint wins over the prefix
    #[case(Some("pmcid"), "pmid:84786", Some("pmcid:PMC84786"))]
    #[case(Some("pmid"), "pmcid:PMC84786", None)]
    // a hint that resolves to nothing leaves nothing to try
    #[case(Some("blech"), "77898", None)]
    #[case(Some("blech"), "pmid:77898", None)]
    fn test_make_id(
        #[case] hint: Option<&str>,
        #[case] value: &str,
        #[case] expected: Option<&str>,
    ) {
        let db = IdDb::literature();
        let id = db.make_id(hint, value);
        assert_eq!(id.map(|id| id.curie()), expected.map(String::from));
    }

    #[test]
    fn test_versioned_flags_from_literature_rules() {
        let db = IdDb::literature();
        assert!(!db.id("84786").unwrap().is_versioned());
        assert!(db.id("84786.1").unwrap().is_versioned());
        assert!(!db.id("PMC84786").unwrap().is_versioned());
        assert!(db.id("PMC84786.2").unwrap().is_versioned());
        assert!(db.id("NIHMS12345").unwrap().is_versioned());
        assert!(!db.id("10.1093/cercor/bhs015").unwrap().is_versioned());
        assert!(db.make_id(Some("aiid"), "84786").unwrap().is_versioned());
    }

    #[test]
    fn test_id_parts_problems() {
        let db = IdDb::literature();

        let parts = db.id_parts(None, "pmcid:84786");
        assert!(!parts.has_problems());
        assert_eq!(parts.prefix.as_deref(), Some("pmcid"));
        assert_eq!(parts.body.as_str(), "84786");

        let parts = db.id_parts(None, "shwartz:77898");
        assert_eq!(parts.problems, vec![ParseProblem::UnknownPrefix]);
        assert!(parts.prefix_type.is_none());

        let parts = db.id_parts(Some("blech"), "77898");
        assert_eq!(parts.problems, vec![ParseProblem::UnknownHint]);

        let parts = db.id_parts(Some("pmcid"), "pmid:84786");
        assert_eq!(parts.problems, vec![ParseProblem::HintPrefixMismatch]);

        let parts = db.id_parts(Some("blech"), "shwartz:77898");
        assert_eq!(
            parts.problems,
            vec![ParseProblem::UnknownHint, ParseProblem::UnknownPrefix]
        );
    }

    #[test]
    fn test_prefix_splits_on_first_colon_only() {
        let db = IdDb::literature();
        // everything after the first colon is body, even if it contains more
        let parts = db.id_parts(None, "doi:10.1000/xyz:123");
        assert_eq!(parts.body.as_str(), "10.1000/xyz:123");
        assert_eq!(db.id("doi:10.1000/xyz:123").unwrap().type_name(), "doi");
    }

    #[test]
    fn test_is_valid() {
        let db = IdDb::literature();
        assert!(db.is_valid(None, "84786"));
        assert!(db.is_valid(None, "pmcid:84786"));
        assert!(db.is_valid(Some("pmcid"), "PmC84786"));
        assert!(db.is_valid(None, "shwartz:77898"));
        assert!(!db.is_valid(None, "shwartz:nothing"));
        assert!(!db.is_valid(Some("mid"), "84786"));
        assert!(!db.is_valid(None, "squirrel"));
    }

    #[test]
    fn test_id_list() {
        let db = IdDb::literature();
        let ids = db
            .id_list(None, ["84786", "pmcid:84786", "NIHMS12345"])
            .unwrap();
        let curies: Vec<String> = ids.iter().map(Identifier::curie).collect();
        assert_eq!(curies, vec!["pmid:84786", "pmcid:PMC84786", "mid:NIHMS12345"]);

        let versions = db.id_list(Some("pmcid"), ["84786.1", "84786.2"]).unwrap();
        assert!(versions.iter().all(|id| id.is_versioned()));

        let err = db.id_list(None, ["84786", "squirrel"]).unwrap_err();
        assert!(matches!(err, DbError::Unparsable { value } if value == "squirrel"));
    }

    #[test]
    fn test_duplicate_type_names_are_rejected() {
        let types = vec![
            IdType::new("pmid", vec![]).unwrap(),
            IdType::new("pmid", vec![]).unwrap(),
        ];
        let err = IdDb::new("dupes", types).unwrap_err();
        assert!(matches!(err, DbError::DuplicateType { name } if name == "pmid"));
    }

    #[test]
    fn test_curie_round_trip() {
        let db = IdDb::literature();
        for value in ["84786", "PMC84786.1", "nihms12345", "10.1093/cercor/bhs015"] {
            let id = db.id(value).unwrap();
            let again = db
                .make_id(Some(id.type_name()), &id.curie())
                .unwrap();
            assert_eq!(again, id);
        }
    }
}
