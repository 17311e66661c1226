//! Construction of identifier-set clusters.

use std::sync::Arc;

use crate::db::IdDb;
use crate::error::SetError;
use crate::identifier::Identifier;

use super::{IdCluster, IdSet, SetCore};

/// Assembles one cluster: a work-level set, any number of version-level
/// sets, and an optional current marker.
///
/// Construction is the only mutation phase a cluster ever has;
/// [`finish`](Self::finish) freezes it and hands back the work-level
/// [`IdSet`] handle.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use litid::{ClusterBuilder, IdDb};
///
/// let db = Arc::new(IdDb::literature());
/// let mut builder = ClusterBuilder::new(Arc::clone(&db));
/// builder.add_work_id(db.id("pmcid:PMC3539452").unwrap())?;
/// let version = builder.new_version();
/// builder.add_version_id(version, db.id("pmcid:PMC3539452.1").unwrap())?;
/// builder.mark_current(version)?;
///
/// let work = builder.finish();
/// assert_eq!(work.current().unwrap().curies(), vec!["pmcid:PMC3539452.1"]);
/// # Ok::<(), litid::SetError>(())
/// ```
#[derive(Debug)]
pub struct ClusterBuilder {
    db: Arc<IdDb>,
    work: SetCore,
    versions: Vec<SetCore>,
    current: Option<usize>,
}

impl ClusterBuilder {
    #[must_use]
    pub fn new(db: Arc<IdDb>) -> Self {
        Self {
            db,
            work: SetCore::default(),
            versions: Vec::new(),
            current: None,
        }
    }

    /// Adds a non-versioned identifier to the work-level set.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::VersionedIntoWork`] for a versioned identifier,
    /// and [`SetError::ConflictingId`] if the set already holds a different
    /// identifier of the same type. Re-adding an identical identifier is a
    /// no-op.
    pub fn add_work_id(&mut self, id: Identifier) -> Result<(), SetError> {
        self.work.add(false, id)
    }

    /// Adds every identifier in `ids` to the work-level set, stopping at
    /// the first failure.
    pub fn add_work_ids(
        &mut self,
        ids: impl IntoIterator<Item = Identifier>,
    ) -> Result<(), SetError> {
        ids.into_iter().try_for_each(|id| self.add_work_id(id))
    }

    /// Opens a new, empty version-level set and returns its index.
    pub fn new_version(&mut self) -> usize {
        self.versions.push(SetCore::default());
        self.versions.len() - 1
    }

    /// Adds a versioned identifier to the version-level set at `version`.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::UnversionedIntoVersion`] for a non-versioned
    /// identifier, and [`SetError::ConflictingId`] on a type collision.
    ///
    /// # Panics
    ///
    /// Panics if `version` was not returned by
    /// [`new_version`](Self::new_version) on this builder.
    pub fn add_version_id(&mut self, version: usize, id: Identifier) -> Result<(), SetError> {
        self.versions[version].add(true, id)
    }

    /// Adds every identifier in `ids` to the version-level set at
    /// `version`, stopping at the first failure.
    pub fn add_version_ids(
        &mut self,
        version: usize,
        ids: impl IntoIterator<Item = Identifier>,
    ) -> Result<(), SetError> {
        ids.into_iter()
            .try_for_each(|id| self.add_version_id(version, id))
    }

    /// Marks the version-level set at `version` as the cluster's current
    /// version.
    ///
    /// # Errors
    ///
    /// Returns [`SetError::DoubleCurrent`] if a different version is
    /// already marked. Re-marking the same version is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `version` was not returned by
    /// [`new_version`](Self::new_version) on this builder.
    pub fn mark_current(&mut self, version: usize) -> Result<(), SetError> {
        assert!(version < self.versions.len(), "no such version: {version}");
        match self.current {
            None => {
                self.current = Some(version);
                Ok(())
            }
            Some(existing) if existing == version => Ok(()),
            Some(existing) => Err(SetError::DoubleCurrent {
                existing: self.versions[existing].render(&self.db),
                candidate: self.versions[version].render(&self.db),
            }),
        }
    }

    /// True if no identifier has been added anywhere in the cluster yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.work.ids.is_empty() && self.versions.iter().all(|v| v.ids.is_empty())
    }

    /// Freezes the cluster and returns the work-level handle.
    #[must_use]
    pub fn finish(self) -> IdSet {
        IdSet::work_of(Arc::new(IdCluster {
            db: self.db,
            work: self.work,
            versions: self.versions,
            current: self.current,
        }))
    }
}
