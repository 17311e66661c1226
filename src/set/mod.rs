//! Identifier sets: clusters of identifiers that denote one article.
//!
//! One upstream record becomes one *cluster*: a work-level set holding the
//! version-independent identifiers, plus any number of version-level sets,
//! one of which may be marked current. A set holds at most one identifier
//! per type, and every identifier in it agrees with the set's own
//! versioned-ness.
//!
//! Clusters are built with a [`ClusterBuilder`] and frozen on
//! [`finish`](ClusterBuilder::finish); after that nothing mutates. The
//! public face is the [`IdSet`] handle, a cheap clone of an `Arc` plus a
//! position. Parent/child navigation returns more handles into the same
//! shared cluster, so the work ↔ version back-references of the data model
//! never turn into ownership cycles.
//!
//! Equivalence between sets is scoped (see [`Scope`]): a set can be asked
//! whether it denotes the same exact resource, the same expression
//! (version), or the same work as another carrier. The streaming scopes
//! walk a defined portion of the cluster in a defined order; see
//! [`IdSet::scope_sets`].

mod builder;

pub use builder::ClusterBuilder;

use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::db::IdDb;
use crate::error::SetError;
use crate::identifier::Identifier;
use crate::idtype::IdType;
use crate::{Sameness, Scope};

/// The identifiers owned directly by one set: at most one per type.
#[derive(Debug, Default)]
pub(crate) struct SetCore {
    /// Insertion order; lookups and rendering go through the db's type
    /// order instead.
    pub(crate) ids: Vec<Identifier>,
}

impl SetCore {
    /// Adds one identifier under the owning set's versioned-ness.
    ///
    /// Re-adding an identical identifier is a no-op. A different identifier
    /// of an already-present type, or one whose versioned flag disagrees
    /// with `set_versioned`, is an error.
    pub(crate) fn add(&mut self, set_versioned: bool, id: Identifier) -> Result<(), SetError> {
        if id.is_versioned() != set_versioned {
            return Err(if id.is_versioned() {
                SetError::VersionedIntoWork { curie: id.curie() }
            } else {
                SetError::UnversionedIntoVersion { curie: id.curie() }
            });
        }
        if let Some(existing) = self.ids.iter().find(|own| own.id_type() == id.id_type()) {
            if *existing == id {
                return Ok(());
            }
            return Err(SetError::ConflictingId {
                existing: existing.curie(),
                incoming: id.curie(),
            });
        }
        self.ids.push(id);
        Ok(())
    }

    pub(crate) fn get(&self, ty: &IdType) -> Option<&Identifier> {
        self.ids.iter().find(|id| id.id_type().as_ref() == ty)
    }

    /// Renders the set's own identifiers in the db's type order.
    pub(crate) fn render(&self, db: &IdDb) -> String {
        let joined = db
            .types()
            .iter()
            .filter_map(|ty| self.get(ty))
            .map(Identifier::curie)
            .join(", ");
        format!("{{ {joined} }}")
    }
}

/// One record's whole graph: the work-level set, its version-level sets,
/// and the current pointer.
#[derive(Debug)]
pub(crate) struct IdCluster {
    pub(crate) db: Arc<IdDb>,
    pub(crate) work: SetCore,
    pub(crate) versions: Vec<SetCore>,
    pub(crate) current: Option<usize>,
}

impl IdCluster {
    fn core(&self, key: SetKey) -> &SetCore {
        match key {
            SetKey::Work => &self.work,
            SetKey::Version(index) => &self.versions[index],
        }
    }

    /// Child order for work-scope streams: the current version first, then
    /// the rest, most recently added first.
    fn kid_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.versions.len());
        order.extend(self.current);
        order.extend((0..self.versions.len()).rev().filter(|&i| self.current != Some(i)));
        order
    }
}

/// Position of one set within its cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetKey {
    Work,
    Version(usize),
}

/// A handle to one identifier set inside its shared, immutable cluster.
///
/// Handles are cheap to clone and compare by value: two sets are equal iff
/// they have the same versioned-ness and exactly the same identifiers.
/// Version children are not part of set equality.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use litid::{ClusterBuilder, IdDb, Sameness, Scope};
///
/// let db = Arc::new(IdDb::literature());
/// let mut builder = ClusterBuilder::new(Arc::clone(&db));
/// builder.add_work_id(db.id("pmid:22368089").unwrap())?;
/// builder.add_work_id(db.id("pmcid:PMC3539452").unwrap())?;
/// let work = builder.finish();
///
/// let pmid = db.id("22368089").unwrap();
/// assert!(work.same(Scope::Resource, &pmid));
/// # Ok::<(), litid::SetError>(())
/// ```
#[derive(Debug, Clone)]
pub struct IdSet {
    cluster: Arc<IdCluster>,
    key: SetKey,
}

impl IdSet {
    pub(crate) fn work_of(cluster: Arc<IdCluster>) -> Self {
        Self {
            cluster,
            key: SetKey::Work,
        }
    }

    fn handle(&self, key: SetKey) -> Self {
        Self {
            cluster: Arc::clone(&self.cluster),
            key,
        }
    }

    fn core(&self) -> &SetCore {
        self.cluster.core(self.key)
    }

    /// The database this set's identifiers were parsed against.
    #[must_use]
    pub fn db(&self) -> &Arc<IdDb> {
        &self.cluster.db
    }

    /// False for the work-level set, true for a version-level one.
    #[must_use]
    pub fn is_versioned(&self) -> bool {
        matches!(self.key, SetKey::Version(_))
    }

    /// This set's own identifiers, in the db's type order.
    pub fn ids(&self) -> impl Iterator<Item = &Identifier> {
        let core = self.core();
        self.cluster
            .db
            .types()
            .iter()
            .filter_map(move |ty| core.get(ty))
    }

    /// This set's own identifier of the given type, if any.
    #[must_use]
    pub fn id(&self, ty: &IdType) -> Option<&Identifier> {
        self.core().get(ty)
    }

    /// True if this set owns an identifier of the given type.
    #[must_use]
    pub fn has_type(&self, ty: &IdType) -> bool {
        self.core().get(ty).is_some()
    }

    /// Curies of this set's own identifiers, in the db's type order.
    #[must_use]
    pub fn curies(&self) -> Vec<String> {
        self.ids().map(Identifier::curie).collect()
    }

    /// The work-level parent of a version-level set.
    #[must_use]
    pub fn parent(&self) -> Option<IdSet> {
        match self.key {
            SetKey::Work => None,
            SetKey::Version(_) => Some(self.handle(SetKey::Work)),
        }
    }

    /// The version-level children of a work-level set, in insertion order.
    #[must_use]
    pub fn versions(&self) -> Vec<IdSet> {
        match self.key {
            SetKey::Work => (0..self.cluster.versions.len())
                .map(|index| self.handle(SetKey::Version(index)))
                .collect(),
            SetKey::Version(_) => Vec::new(),
        }
    }

    /// The cluster's current version, whether asked of the work-level set
    /// or of any version.
    #[must_use]
    pub fn current(&self) -> Option<IdSet> {
        self.cluster
            .current
            .map(|index| self.handle(SetKey::Version(index)))
    }

    /// True if this is the version currently marked current.
    #[must_use]
    pub fn is_current(&self) -> bool {
        match self.key {
            SetKey::Work => false,
            SetKey::Version(index) => self.cluster.current == Some(index),
        }
    }

    /// The set this one dereferences to at expression scope: the current
    /// version for the work-level set, the parent for the current version,
    /// nothing for a non-current version.
    #[must_use]
    pub fn complement(&self) -> Option<IdSet> {
        match self.key {
            SetKey::Work => self.current(),
            SetKey::Version(_) => self.is_current().then(|| self.handle(SetKey::Work)),
        }
    }

    /// The sets visible from this one at the given scope, in stream order.
    ///
    /// * `Resource` — just this set. (`Equal` is not a streaming scope and
    ///   yields the same.)
    /// * `Expression` — this set, then its [`complement`](Self::complement)
    ///   if it has one.
    /// * `Work` — the whole cluster. From the work-level set: itself, then
    ///   the current version, then the remaining versions most recently
    ///   added first. From a version: itself, the work-level set, then the
    ///   other versions in that same current-first order.
    #[must_use]
    pub fn scope_sets(&self, scope: Scope) -> Vec<IdSet> {
        match scope {
            Scope::Equal | Scope::Resource => vec![self.clone()],
            Scope::Expression => {
                let mut sets = vec![self.clone()];
                sets.extend(self.complement());
                sets
            }
            Scope::Work => match self.key {
                SetKey::Work => {
                    let mut sets = vec![self.clone()];
                    sets.extend(
                        self.cluster
                            .kid_order()
                            .into_iter()
                            .map(|index| self.handle(SetKey::Version(index))),
                    );
                    sets
                }
                SetKey::Version(own) => {
                    let mut sets = vec![self.clone(), self.handle(SetKey::Work)];
                    sets.extend(
                        self.cluster
                            .kid_order()
                            .into_iter()
                            .filter(|&index| index != own)
                            .map(|index| self.handle(SetKey::Version(index))),
                    );
                    sets
                }
            },
        }
    }

    /// The first identifier of the given type among the sets visible at
    /// `scope`, in stream order.
    #[must_use]
    pub fn scope_id(&self, scope: Scope, ty: &IdType) -> Option<Identifier> {
        self.scope_sets(scope)
            .iter()
            .find_map(|set| set.id(ty).cloned())
    }

    /// Multi-line-free debugging view: the work-level set with its versions,
    /// the current one starred.
    #[must_use]
    pub fn dump(&self) -> String {
        match self.key {
            SetKey::Version(_) => self.to_string(),
            SetKey::Work => {
                let kids = self
                    .versions()
                    .iter()
                    .map(|kid| {
                        let mark = if kid.is_current() { "*" } else { "" };
                        format!("{mark}{kid}")
                    })
                    .join(", ");
                format!(
                    "{{ {}, versions: [ {kids} ] }}",
                    self.ids().map(Identifier::curie).join(", ")
                )
            }
        }
    }
}

impl PartialEq for IdSet {
    fn eq(&self, other: &Self) -> bool {
        let (mine, theirs) = (&self.core().ids, &other.core().ids);
        self.is_versioned() == other.is_versioned()
            && mine.len() == theirs.len()
            && mine.iter().all(|id| theirs.contains(id))
    }
}

impl Eq for IdSet {}

impl fmt::Display for IdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.core().render(&self.cluster.db))
    }
}

impl Sameness for IdSet {
    fn scope_ids(&self, scope: Scope) -> Vec<Identifier> {
        let mut out = Vec::new();
        for set in self.scope_sets(scope) {
            out.extend(set.ids().cloned());
        }
        out
    }

    fn same(&self, scope: Scope, other: &dyn Sameness) -> bool {
        match scope {
            Scope::Equal => other.equals_set(self),
            scope => self
                .scope_ids(scope)
                .iter()
                .any(|id| other.exposes(scope, id)),
        }
    }

    fn equals_set(&self, other: &IdSet) -> bool {
        self == other
    }
}
