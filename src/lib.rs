//! A library for parsing, canonicalizing, relating, and resolving literature identifiers.
//!
//! `litid` models the identifier space of the biomedical literature: PubMed
//! ids (`pmid`), PubMed Central ids (`pmcid`), manuscript ids (`mid`), DOIs
//! (`doi`), and article-instance ids (`aiid`). Every value is parsed against
//! per-type patterns and stored in canonical form, so `"pMC3539452"`,
//! `"PMC3539452"`, and `"pmcid:3539452"` all name the same identifier.
//!
//! Beyond single identifiers, the library models how identifiers relate:
//! an [`IdSet`] clusters the identifiers of one article, keeping its
//! version-independent ids apart from the ids of each concrete version, and
//! the [`Sameness`] trait answers whether two identifier carriers refer to
//! the same resource, the same expression, or the same work. The `resolver`
//! feature adds a batched client for an id-converter service that discovers
//! those relationships for you.
//!
//! # Features
//!
//! The library has optional features that can be enabled in your Cargo.toml:
//!
//! - `resolver` - Enable the batched id-converter client: request grouping,
//!   URL building, response ingestion, and an LRU cache (enabled by default)
//! - `regex` - Compile identifier patterns with the full `regex` engine
//!   (enabled by default)
//! - `lite` - Compile identifier patterns with `regex-lite` instead, trading
//!   matching speed for a smaller dependency tree
//!
//! To use only specific features, disable default features and enable just
//! what you need:
//!
//! ```toml
//! [dependencies]
//! litid = { version = "0.1", default-features = false, features = ["lite"] }
//! ```
//!
//! # Basic Usage
//!
//! ```rust
//! use litid::IdDb;
//!
//! let db = IdDb::literature();
//!
//! // values canonicalize as they parse
//! let id = db.id("pMC3539452").unwrap();
//! assert_eq!(id.curie(), "pmcid:PMC3539452");
//! assert!(!id.is_versioned());
//!
//! // a bare value is tried against every type in registration order
//! assert_eq!(db.id("499268").unwrap().type_name(), "pmid");
//! let pmcid = db.make_id(Some("pmcid"), "499268").unwrap();
//! assert_eq!(pmcid.curie(), "pmcid:PMC499268");
//! ```
//!
//! # Identifier Sets
//!
//! A cluster ties one article's work-level identifiers to the identifiers
//! of its versions; scoped comparison then works across the cluster:
//!
//! ```rust
//! use std::sync::Arc;
//! use litid::{ClusterBuilder, IdDb, Sameness, Scope};
//!
//! let db = Arc::new(IdDb::literature());
//! let mut builder = ClusterBuilder::new(Arc::clone(&db));
//! builder.add_work_id(db.id("pmid:22368089").unwrap())?;
//! builder.add_work_id(db.id("pmcid:PMC3539452").unwrap())?;
//! let version = builder.new_version();
//! builder.add_version_id(version, db.id("pmcid:PMC3539452.1").unwrap())?;
//! builder.mark_current(version)?;
//! let work = builder.finish();
//!
//! // the current version and its work carry the same expression
//! let current = work.current().unwrap();
//! assert!(work.same(Scope::Expression, &current));
//! assert!(current.same(Scope::Work, &db.id("22368089").unwrap()));
//! # Ok::<(), litid::SetError>(())
//! ```
//!
//! # Resolution
//!
//! The resolver turns raw values into [`RequestId`]s, batches the ones that
//! need the id-converter service into one call per type, and binds each
//! answered request to the [`IdSet`] built from its record:
//!
//! ```rust
//! use std::sync::Arc;
//! use litid::resolver::Url;
//! use litid::{ConverterClient, ConverterError, IdDb, IdResolver, RequestState, ResolverConfig};
//!
//! struct Canned;
//!
//! impl ConverterClient for Canned {
//!     fn fetch(&self, _url: &Url) -> Result<serde_json::Value, ConverterError> {
//!         Ok(serde_json::json!({
//!             "status": "ok",
//!             "records": [{
//!                 "status": "success",
//!                 "pmid": "22368089",
//!                 "pmcid": "PMC3539452"
//!             }]
//!         }))
//!     }
//! }
//!
//! let db = Arc::new(IdDb::literature());
//! let resolver = IdResolver::new(Arc::clone(&db), Canned, &ResolverConfig::default())?;
//! let requests = resolver.resolve_ids(None, "22368089")?;
//!
//! assert_eq!(requests[0].state(), RequestState::Good);
//! let pmcid = db.get_type("pmcid").unwrap();
//! assert_eq!(requests[0].id(pmcid).unwrap().curie(), "pmcid:PMC3539452");
//! # Ok::<(), litid::IdError>(())
//! ```
//!
//! # Error Handling
//!
//! Each layer has its own error enum (pattern compilation, database
//! lookups, set construction, request resolution, response ingestion), and
//! [`IdError`] wraps them all for callers that just want one type:
//!
//! ```rust
//! use litid::{DbError, IdDb};
//!
//! let db = IdDb::literature();
//! match db.lookup_type("issn") {
//!     Ok(ty) => println!("{ty}"),
//!     Err(DbError::UnknownType { name }) => println!("no such type: {name}"),
//!     Err(other) => println!("{other}"),
//! }
//! ```
//!
//! # Thread Safety
//!
//! Databases, identifiers, and frozen clusters are immutable and shared
//! through `Arc`, so they can be used from any number of threads. The
//! resolver's cache sits behind a mutex; one resolver can serve concurrent
//! callers.

pub mod db;
pub mod error;
pub mod request;
#[cfg(feature = "resolver")]
pub mod resolver;
pub mod set;

// Reexports
pub use db::{IdDb, IdParts, ParseProblem};
pub use error::{
    ConverterError, DbError, IdError, IngestError, ResolveError, ResolverError, SetError,
    TypeError,
};
pub use identifier::Identifier;
pub use idtype::IdType;
pub use pattern::{Canonicalizer, PatternRule};
pub use request::{RequestId, RequestState};
#[cfg(feature = "resolver")]
pub use resolver::{ConverterClient, IdResolver, ResolverConfig};
pub use set::{ClusterBuilder, IdSet};

mod identifier;
mod idtype;
mod pattern;
mod regex;

/// How closely two identifier carriers must agree to count as "the same".
///
/// The scopes are ordered from strictest to loosest; carriers that are the
/// same at one scope are the same at every looser one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Structurally the same carrier: the same kind with the same contents.
    Equal,
    /// The same exact resource: the carriers' own identifiers overlap.
    Resource,
    /// The same expression of a work. A work-level set and its current
    /// version count as one expression; a non-current version stands alone.
    Expression,
    /// The same work, across every version in the cluster.
    Work,
}

/// Scoped equivalence between identifier carriers.
///
/// Implemented by [`Identifier`], [`IdSet`], and [`RequestId`], and object
/// safe so the three kinds can be compared with each other. At the
/// streaming scopes ([`Resource`](Scope::Resource),
/// [`Expression`](Scope::Expression), [`Work`](Scope::Work)),
/// `a.same(scope, b)` holds iff some identifier `a` exposes at that scope
/// is one `b` exposes too; `same` is always symmetric. [`Scope::Equal`] is
/// the exception: structural equality between carriers of the same kind,
/// always false across kinds.
///
/// # Examples
///
/// ```
/// use litid::{IdDb, Sameness, Scope};
///
/// let db = IdDb::literature();
/// let id = db.id("pmid:22368089").unwrap();
/// assert!(id.same(Scope::Resource, &db.id("22368089").unwrap()));
/// assert!(!id.same(Scope::Resource, &db.id("22368090").unwrap()));
/// ```
pub trait Sameness {
    /// The identifiers this carrier exposes at `scope`, in stream order.
    fn scope_ids(&self, scope: Scope) -> Vec<Identifier>;

    /// True if this carrier and `other` coincide at `scope`.
    fn same(&self, scope: Scope, other: &dyn Sameness) -> bool;

    /// True if `id` is among the identifiers this carrier exposes at
    /// `scope`.
    fn exposes(&self, scope: Scope, id: &Identifier) -> bool {
        self.scope_ids(scope).contains(id)
    }

    /// [`Scope::Equal`] dispatch hook; only [`Identifier`] overrides it.
    fn equals_id(&self, _other: &Identifier) -> bool {
        false
    }

    /// [`Scope::Equal`] dispatch hook; only [`IdSet`] overrides it.
    fn equals_set(&self, _other: &IdSet) -> bool {
        false
    }

    /// [`Scope::Equal`] dispatch hook; only [`RequestId`] overrides it.
    fn equals_request(&self, _other: &RequestId) -> bool {
        false
    }

    /// Shorthand for [`same`](Self::same) at [`Scope::Resource`].
    fn same_resource(&self, other: &dyn Sameness) -> bool {
        self.same(Scope::Resource, other)
    }

    /// Shorthand for [`same`](Self::same) at [`Scope::Expression`].
    fn same_expression(&self, other: &dyn Sameness) -> bool {
        self.same(Scope::Expression, other)
    }

    /// Shorthand for [`same`](Self::same) at [`Scope::Work`].
    fn same_work(&self, other: &dyn Sameness) -> bool {
        self.same(Scope::Work, other)
    }
}
