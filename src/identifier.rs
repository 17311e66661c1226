//! Canonical identifiers and their curie rendering.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use compact_str::CompactString;

use crate::idtype::IdType;
use crate::{Sameness, Scope};

/// An immutable, canonical `(type, value, versioned)` triple.
///
/// Identifiers are only constructed by the parsing machinery
/// ([`IdType::make_id`] and the [`IdDb`](crate::IdDb) surface), so the value
/// is always in canonical form for its type — `pmcid:pmc3098` can never
/// exist, only `pmcid:PMC3098`.
///
/// Equality compares type and value. The versioned flag follows from those
/// two and is never checked independently.
#[derive(Debug, Clone)]
pub struct Identifier {
    id_type: Arc<IdType>,
    value: CompactString,
    versioned: bool,
}

impl Identifier {
    pub(crate) fn new(id_type: Arc<IdType>, value: CompactString, versioned: bool) -> Self {
        Self {
            id_type,
            value,
            versioned,
        }
    }

    /// The identifier's type.
    #[must_use]
    pub fn id_type(&self) -> &Arc<IdType> {
        &self.id_type
    }

    /// Name of the identifier's type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.id_type.name()
    }

    /// The canonical value, without any type prefix.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this identifier names one specific version of its article.
    #[must_use]
    pub fn is_versioned(&self) -> bool {
        self.versioned
    }

    /// Renders the `type:value` curie form, e.g. `pmcid:PMC3539452.1`.
    #[must_use]
    pub fn curie(&self) -> String {
        format!("{}:{}", self.id_type.name(), self.value)
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.id_type == other.id_type && self.value == other.value
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id_type.hash(state);
        self.value.hash(state);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id_type.name(), self.value)
    }
}

impl Sameness for Identifier {
    /// A single identifier exposes only itself, at every scope.
    fn scope_ids(&self, _scope: Scope) -> Vec<Identifier> {
        vec![self.clone()]
    }

    fn same(&self, scope: Scope, other: &dyn Sameness) -> bool {
        match scope {
            Scope::Equal => other.equals_id(self),
            scope => other.exposes(scope, self),
        }
    }

    fn equals_id(&self, other: &Identifier) -> bool {
        self == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Canonicalizer, PatternRule};
    use pretty_assertions::assert_eq;

    fn pmcid() -> Arc<IdType> {
        Arc::new(
            IdType::new(
                "pmcid",
                vec![
                    PatternRule::new(r"[Pp][Mm][Cc]\d+", false, Canonicalizer::Uppercase).unwrap(),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_display_is_curie() {
        let id = IdType::make_id(&pmcid(), "pmc77876").unwrap();
        assert_eq!(id.to_string(), "pmcid:PMC77876");
        assert_eq!(id.to_string(), id.curie());
    }

    #[test]
    fn test_equality_crosses_type_instances() {
        // separately constructed type objects with the same name compare equal
        let a = IdType::make_id(&pmcid(), "PMC77876").unwrap();
        let b = IdType::make_id(&pmcid(), "pMC77876").unwrap();
        let c = IdType::make_id(&pmcid(), "PMC77877").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_accessors() {
        let ty = pmcid();
        let id = IdType::make_id(&ty, "pmc3098").unwrap();
        assert_eq!(id.type_name(), "pmcid");
        assert_eq!(id.value(), "PMC3098");
        assert!(!id.is_versioned());
        assert_eq!(id.id_type().as_ref(), ty.as_ref());
    }

    #[test]
    fn test_sameness_between_identifiers() {
        let a = IdType::make_id(&pmcid(), "PMC77876").unwrap();
        let b = IdType::make_id(&pmcid(), "pmc77876").unwrap();
        let c = IdType::make_id(&pmcid(), "PMC77877").unwrap();

        for scope in [Scope::Equal, Scope::Resource, Scope::Expression, Scope::Work] {
            assert!(a.same(scope, &b), "{scope:?}");
            assert!(!a.same(scope, &c), "{scope:?}");
        }
        assert!(a.same_resource(&b));
        assert!(a.exposes(Scope::Work, &b));
    }
}
