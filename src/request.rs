//! The lifecycle of one requested identifier.
//!
//! A [`RequestId`] starts from whatever string a caller handed in — maybe
//! prefixed, maybe oddly cased, maybe not an identifier at all — and
//! carries it through resolution. Its [`state`](RequestId::state)
//! distinguishes four outcomes:
//!
//! * [`NotWellFormed`](RequestState::NotWellFormed) — the value did not
//!   parse as any identifier type, so there is nothing to look up.
//! * [`Unknown`](RequestState::Unknown) — the value parsed, but nobody has
//!   asked the id-converter service about it yet.
//! * [`Invalid`](RequestState::Invalid) — the service was asked and did
//!   not know the identifier.
//! * [`Good`](RequestState::Good) — the service answered, and the cluster
//!   of equivalent identifiers is bound to the request.
//!
//! Resolution happens at most once; [`resolve`](RequestId::resolve) is an
//! error on any request that is already past `Unknown`.

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;

use crate::db::IdDb;
use crate::error::ResolveError;
use crate::identifier::Identifier;
use crate::idtype::IdType;
use crate::set::IdSet;
use crate::{Sameness, Scope};

/// Where a request stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// The requested value did not parse as any identifier type.
    NotWellFormed,
    /// Parsed, but not yet submitted to the id-converter service.
    Unknown,
    /// The service did not recognize the identifier.
    Invalid,
    /// Resolved; the cluster of equivalent identifiers is bound.
    Good,
}

/// One requested identifier, from raw input through resolution.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use litid::{IdDb, RequestId, RequestState};
///
/// let db = Arc::new(IdDb::literature());
/// let request = RequestId::new(Arc::clone(&db), None, "pMC1234");
/// assert_eq!(request.state(), RequestState::Unknown);
/// assert_eq!(request.query_id().unwrap().curie(), "pmcid:PMC1234");
/// ```
#[derive(Debug, Clone)]
pub struct RequestId {
    db: Arc<IdDb>,
    requested_type: Option<CompactString>,
    requested_value: CompactString,
    query_id: Option<Identifier>,
    resolved: bool,
    set: Option<IdSet>,
}

impl RequestId {
    /// Parses `value` against `db`, under the optional type hint.
    #[must_use]
    pub fn new(db: Arc<IdDb>, requested_type: Option<&str>, value: &str) -> Self {
        let query_id = db.make_id(requested_type, value);
        Self {
            // a value that does not parse can never resolve; it is born final
            resolved: query_id.is_none(),
            query_id,
            db,
            requested_type: requested_type.map(CompactString::new),
            requested_value: CompactString::new(value),
            set: None,
        }
    }

    #[must_use]
    pub fn db(&self) -> &Arc<IdDb> {
        &self.db
    }

    /// The type hint the request was made with, if any.
    #[must_use]
    pub fn requested_type(&self) -> Option<&str> {
        self.requested_type.as_deref()
    }

    /// The value the request was made with, verbatim.
    #[must_use]
    pub fn requested_value(&self) -> &str {
        &self.requested_value
    }

    /// The canonical identifier the requested value parsed to, if it did.
    #[must_use]
    pub fn query_id(&self) -> Option<&Identifier> {
        self.query_id.as_ref()
    }

    /// The type of the query identifier.
    #[must_use]
    pub fn query_type(&self) -> Option<&Arc<IdType>> {
        self.query_id.as_ref().map(Identifier::id_type)
    }

    /// The canonical value of the query identifier.
    #[must_use]
    pub fn query_value(&self) -> Option<&str> {
        self.query_id.as_ref().map(Identifier::value)
    }

    /// The curie rendering of the query identifier.
    #[must_use]
    pub fn curie(&self) -> Option<String> {
        self.query_id.as_ref().map(Identifier::curie)
    }

    /// The cluster the id-converter service answered with, once bound.
    #[must_use]
    pub fn set(&self) -> Option<&IdSet> {
        self.set.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> RequestState {
        if self.query_id.is_none() {
            RequestState::NotWellFormed
        } else if !self.resolved {
            RequestState::Unknown
        } else if self.set.is_none() {
            RequestState::Invalid
        } else {
            RequestState::Good
        }
    }

    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.query_id.is_some()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    #[must_use]
    pub fn is_good(&self) -> bool {
        self.state() == RequestState::Good
    }

    /// True if the query identifier names one concrete version.
    #[must_use]
    pub fn is_versioned(&self) -> bool {
        self.query_id.as_ref().is_some_and(Identifier::is_versioned)
    }

    /// True if the query identifier itself is of the given type.
    #[must_use]
    pub fn has_type(&self, ty: &IdType) -> bool {
        self.query_id
            .as_ref()
            .is_some_and(|id| id.id_type().as_ref() == ty)
    }

    /// The identifier of the given type known for this request: the query
    /// identifier itself, or one found in the bound cluster at expression
    /// scope.
    #[must_use]
    pub fn id(&self, ty: &IdType) -> Option<Identifier> {
        if let Some(query) = &self.query_id
            && query.id_type().as_ref() == ty
        {
            return Some(query.clone());
        }
        self.set
            .as_ref()
            .and_then(|set| set.scope_id(Scope::Expression, ty))
    }

    /// The first identifier found for any of `types`, tried in order.
    pub fn first_id<'a, I>(&self, types: I) -> Option<Identifier>
    where
        I: IntoIterator<Item = &'a IdType>,
    {
        types.into_iter().find_map(|ty| self.id(ty))
    }

    /// Finishes the request: binds the cluster the id-converter service
    /// answered with, or `None` if the service did not know the
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::AlreadyResolved`] if the request is past
    /// [`RequestState::Unknown`], and [`ResolveError::ForeignSet`] if the
    /// offered cluster does not contain the query identifier. A failed
    /// attempt leaves the request untouched.
    pub fn resolve(&mut self, set: Option<IdSet>) -> Result<(), ResolveError> {
        if self.resolved {
            return Err(ResolveError::AlreadyResolved {
                query: self.requested_value.to_string(),
            });
        }
        if let (Some(query), Some(set)) = (&self.query_id, &set)
            && !set.same(Scope::Resource, query)
        {
            return Err(ResolveError::ForeignSet {
                query: query.curie(),
                set: set.to_string(),
            });
        }
        self.set = set;
        self.resolved = true;
        Ok(())
    }

    /// Debugging view of the whole request, state and cluster included.
    #[must_use]
    pub fn dump(&self) -> String {
        format!(
            "{{ state: {:?}\nrequested: {{ type: {}, value: {} }}, main: {}, equivalent: {} }}",
            self.state(),
            self.requested_type.as_deref().unwrap_or("none"),
            self.requested_value,
            self.query_id
                .as_ref()
                .map_or_else(|| "none".to_string(), Identifier::curie),
            self.set
                .as_ref()
                .map_or_else(|| "none".to_string(), IdSet::to_string),
        )
    }
}

impl PartialEq for RequestId {
    /// Everything but the database handle takes part: the hint, the raw
    /// value, the parsed identifier, and the resolution outcome.
    fn eq(&self, other: &Self) -> bool {
        self.requested_type == other.requested_type
            && self.requested_value == other.requested_value
            && self.query_id == other.query_id
            && self.resolved == other.resolved
            && self.set == other.set
    }
}

impl Eq for RequestId {}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ query type: {}, value: {} => id: {} }}",
            self.requested_type.as_deref().unwrap_or("none"),
            self.requested_value,
            self.query_id
                .as_ref()
                .map_or_else(|| "none".to_string(), Identifier::curie),
        )
    }
}

impl Sameness for RequestId {
    /// The query identifier, then whatever the bound cluster exposes.
    fn scope_ids(&self, scope: Scope) -> Vec<Identifier> {
        let mut out: Vec<Identifier> = self.query_id.iter().cloned().collect();
        if let Some(set) = &self.set {
            out.extend(set.scope_ids(scope));
        }
        out
    }

    fn same(&self, scope: Scope, other: &dyn Sameness) -> bool {
        match scope {
            Scope::Equal => other.equals_request(self),
            scope => self
                .scope_ids(scope)
                .iter()
                .any(|id| other.exposes(scope, id)),
        }
    }

    fn equals_request(&self, other: &RequestId) -> bool {
        self == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set::ClusterBuilder;
    use pretty_assertions::assert_eq;

    fn lit() -> Arc<IdDb> {
        Arc::new(IdDb::literature())
    }

    /// { pmid:22368089, pmcid:PMC3539452 } with current version
    /// { pmcid:PMC3539452.1, aiid:3539452 }.
    fn resolved_cluster(db: &Arc<IdDb>) -> IdSet {
        let mut builder = ClusterBuilder::new(Arc::clone(db));
        builder
            .add_work_id(db.id("pmid:22368089").unwrap())
            .unwrap();
        builder
            .add_work_id(db.id("pmcid:PMC3539452").unwrap())
            .unwrap();
        let version = builder.new_version();
        builder
            .add_version_id(version, db.id("pmcid:PMC3539452.1").unwrap())
            .unwrap();
        builder
            .add_version_id(version, db.make_id(Some("aiid"), "3539452").unwrap())
            .unwrap();
        builder.mark_current(version).unwrap();
        builder.finish()
    }

    #[test]
    fn test_unparsable_values_are_born_final() {
        let db = lit();
        for (hint, value) in [
            (None, "shwartz:nothing"),
            (Some("blech"), "77898"),
            (None, ""),
        ] {
            let mut request = RequestId::new(Arc::clone(&db), hint, value);
            assert_eq!(request.state(), RequestState::NotWellFormed, "{value:?}");
            assert!(!request.is_well_formed());
            assert!(request.is_resolved());
            assert!(!request.is_good());
            assert!(request.query_id().is_none());
            assert!(matches!(
                request.resolve(None),
                Err(ResolveError::AlreadyResolved { .. })
            ));
        }
    }

    #[test]
    fn test_fresh_request_is_unknown() {
        let db = lit();
        let request = RequestId::new(Arc::clone(&db), None, "pMC1234");
        assert_eq!(request.state(), RequestState::Unknown);
        assert!(request.is_well_formed());
        assert!(!request.is_resolved());
        assert!(!request.is_good());

        let pmcid = db.get_type("pmcid").unwrap();
        let pmid = db.get_type("pmid").unwrap();
        assert!(request.has_type(pmcid));
        assert!(!request.has_type(pmid));
        assert_eq!(request.id(pmcid).unwrap().curie(), "pmcid:PMC1234");
        assert_eq!(request.id(pmid), None);
        assert!(!request.is_versioned());
        assert_eq!(request.requested_value(), "pMC1234");
        assert_eq!(request.requested_type(), None);
        assert_eq!(request.query_type().unwrap().name(), "pmcid");
        assert_eq!(request.query_value(), Some("PMC1234"));
        assert_eq!(request.curie(), Some("pmcid:PMC1234".to_string()));
    }

    #[test]
    fn test_display() {
        let db = lit();
        assert_eq!(
            RequestId::new(Arc::clone(&db), None, "pMC1234").to_string(),
            "{ query type: none, value: pMC1234 => id: pmcid:PMC1234 }"
        );
        assert_eq!(
            RequestId::new(Arc::clone(&db), Some("blech"), "77898").to_string(),
            "{ query type: blech, value: 77898 => id: none }"
        );
    }

    #[test]
    fn test_resolving_with_nothing_marks_invalid() {
        let db = lit();
        let mut request = RequestId::new(Arc::clone(&db), Some("pmid"), "999999999");
        request.resolve(None).unwrap();
        assert_eq!(request.state(), RequestState::Invalid);
        assert!(request.is_resolved());
        assert!(!request.is_good());
        assert!(request.set().is_none());
        // still answers for its own type
        let pmid = db.get_type("pmid").unwrap();
        assert_eq!(request.id(pmid).unwrap().curie(), "pmid:999999999");

        let err = request.resolve(None).unwrap_err();
        assert_eq!(
            err,
            ResolveError::AlreadyResolved {
                query: "999999999".into()
            }
        );
    }

    #[test]
    fn test_resolving_binds_the_cluster() {
        let db = lit();
        let mut request = RequestId::new(Arc::clone(&db), None, "22368089");
        request.resolve(Some(resolved_cluster(&db))).unwrap();
        assert_eq!(request.state(), RequestState::Good);
        assert!(request.is_good());
        assert!(request.set().is_some());

        let get = |name: &str| db.get_type(name).unwrap();
        assert_eq!(request.id(get("pmid")).unwrap().curie(), "pmid:22368089");
        assert_eq!(
            request.id(get("pmcid")).unwrap().curie(),
            "pmcid:PMC3539452"
        );
        // the aiid lives on the current version, reachable at expression scope
        assert_eq!(request.id(get("aiid")).unwrap().curie(), "aiid:3539452");
        assert_eq!(request.id(get("mid")), None);
        assert_eq!(
            request
                .first_id([get("mid").as_ref(), get("aiid").as_ref()])
                .unwrap()
                .curie(),
            "aiid:3539452"
        );
    }

    #[test]
    fn test_resolving_with_a_foreign_set_is_rejected() {
        let db = lit();
        let mut request = RequestId::new(Arc::clone(&db), None, "pmid:999");
        let err = request.resolve(Some(resolved_cluster(&db))).unwrap_err();
        assert_eq!(
            err,
            ResolveError::ForeignSet {
                query: "pmid:999".into(),
                set: "{ pmid:22368089, pmcid:PMC3539452 }".into(),
            }
        );
        // the failed attempt changed nothing
        assert_eq!(request.state(), RequestState::Unknown);
        request.resolve(None).unwrap();
        assert_eq!(request.state(), RequestState::Invalid);
    }

    #[test]
    fn test_equality_is_hint_sensitive() {
        let db = lit();
        let plain = RequestId::new(Arc::clone(&db), None, "1234");
        let hinted = RequestId::new(Arc::clone(&db), Some("pmid"), "1234");
        assert_eq!(plain.query_id(), hinted.query_id());
        assert_ne!(plain, hinted);
        assert_eq!(plain, RequestId::new(Arc::clone(&db), None, "1234"));

        let mut resolved = plain.clone();
        resolved.resolve(None).unwrap();
        assert_ne!(plain, resolved);
    }

    #[test]
    fn test_sameness_follows_resolution() {
        let db = lit();
        let mut request = RequestId::new(Arc::clone(&db), None, "22368089");
        let version_id = db.id("pmcid:PMC3539452.1").unwrap();

        // unresolved: only the query id is exposed
        assert!(request.same(Scope::Resource, &db.id("22368089").unwrap()));
        assert!(!request.same(Scope::Work, &version_id));

        let cluster = resolved_cluster(&db);
        request.resolve(Some(cluster.clone())).unwrap();
        assert!(request.same(Scope::Work, &version_id));
        assert!(request.same_resource(&cluster));
        assert!(request.same(Scope::Equal, &request.clone()));
        assert!(!request.same(Scope::Equal, &cluster));
    }

    #[test]
    fn test_dump() {
        let db = lit();
        let mut request = RequestId::new(Arc::clone(&db), None, "22368089");
        request.resolve(Some(resolved_cluster(&db))).unwrap();
        assert_eq!(
            request.dump(),
            "{ state: Good\nrequested: { type: none, value: 22368089 }, \
             main: pmid:22368089, equivalent: { pmid:22368089, pmcid:PMC3539452 } }"
        );
    }
}
