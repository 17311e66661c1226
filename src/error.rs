//! Error types for identifier parsing, set construction, and resolution.
//!
//! Failures are grouped by the layer they originate in: [`TypeError`] for
//! defining identifier types and their pattern rules, [`DbError`] for building
//! and querying a type database, [`SetError`] for identifier-set invariants,
//! [`ResolveError`] for the request lifecycle, and [`IngestError`],
//! [`ConverterError`], and [`ResolverError`] for the resolution pipeline.
//! [`IdError`] wraps all of them for callers that funnel mixed operations
//! through a single `Result` type.
//!
//! Not every failure is fatal to the same extent. A [`SetError`] or
//! [`ResolveError`] fails only the single operation that raised it; an
//! [`IngestError`] causes one response record to be logged and skipped while
//! the rest of the batch completes; a [`ConverterError`] fails the whole
//! resolution call, because no partial response exists to recover from.

use thiserror::Error;

/// Top-level error type covering every operation in the crate.
#[derive(Error, Debug)]
pub enum IdError {
    /// Identifier-type or pattern-rule definition error.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Identifier-database construction or lookup error.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Identifier-set invariant violation.
    #[error(transparent)]
    Set(#[from] SetError),

    /// Request lifecycle violation.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A response record could not be ingested.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// The fetch collaborator failed.
    #[error(transparent)]
    Converter(#[from] ConverterError),

    /// A resolution call failed as a whole.
    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

/// Errors raised while defining identifier types and their pattern rules.
///
/// These are construction-time errors: a type or rule that raises one is
/// rejected outright and never enters a database.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    /// The type name does not satisfy the naming rule.
    #[error("invalid identifier type name {name:?}: must match [a-z][a-z0-9_]*")]
    BadName {
        /// The offending name.
        name: String,
    },

    /// The rule's regular expression failed to compile.
    #[error("invalid identifier pattern {pattern:?}: {reason}")]
    BadPattern {
        /// The pattern source text.
        pattern: String,
        /// The compiler's explanation.
        reason: String,
    },

    /// A replacement canonicalizer was requested without a template.
    #[error("pattern {pattern:?} uses a replacement canonicalizer but no replacement template was given")]
    MissingReplacement {
        /// The pattern source text.
        pattern: String,
    },
}

/// Errors raised while building or querying an identifier database.
#[derive(Error, Debug)]
pub enum DbError {
    /// Two types with the same name were registered.
    #[error("duplicate identifier type {name:?}")]
    DuplicateType {
        /// The repeated type name.
        name: String,
    },

    /// A lookup named a type the database does not define.
    #[error("unknown identifier type {name:?}")]
    UnknownType {
        /// The name that failed to resolve.
        name: String,
    },

    /// A value handed to a strict helper failed to parse.
    #[error("cannot make an identifier from {value:?}")]
    Unparsable {
        /// The rejected value.
        value: String,
    },

    /// A type definition inside the database was itself invalid.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// The JSON definition of the database could not be deserialized.
    #[error("malformed identifier database JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Violations of the identifier-set construction invariants.
///
/// A set holds at most one identifier per type, and every identifier in it
/// must agree with the set's own versioned-ness. These errors fail the single
/// `add` or `mark current` that raised them, never a whole batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SetError {
    /// A different identifier of an already-present type was added.
    #[error("set already holds {existing}; cannot add {incoming} of the same type")]
    ConflictingId {
        /// Curie of the identifier already in the set.
        existing: String,
        /// Curie of the rejected identifier.
        incoming: String,
    },

    /// A versioned identifier was added to a work-level set.
    #[error("versioned identifier {curie} cannot be added to a work-level set")]
    VersionedIntoWork {
        /// Curie of the rejected identifier.
        curie: String,
    },

    /// A non-versioned identifier was added to a version-level set.
    #[error("non-versioned identifier {curie} cannot be added to a version-level set")]
    UnversionedIntoVersion {
        /// Curie of the rejected identifier.
        curie: String,
    },

    /// A second, different version was marked current without clearing the
    /// first.
    #[error("cannot mark {candidate} current: {existing} already is")]
    DoubleCurrent {
        /// Rendering of the version already marked current.
        existing: String,
        /// Rendering of the version that was rejected.
        candidate: String,
    },
}

/// Errors from driving a request through resolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// `resolve` was called on a request that has already been resolved.
    ///
    /// Malformed requests count: they are born resolved, since there is
    /// nothing further to learn about them.
    #[error("request {query:?} has already been resolved")]
    AlreadyResolved {
        /// The original requested value.
        query: String,
    },

    /// The supplied set does not refer to the same resource as the query.
    #[error("set {set} does not refer to the same resource as {query}")]
    ForeignSet {
        /// Curie of the query identifier.
        query: String,
        /// Rendering of the rejected set.
        set: String,
    },
}

/// Reasons a response record is rejected during ingestion.
///
/// These never abort a resolution call; the offending record is logged and
/// skipped, and any remaining records still bind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    /// The record carries a non-`"success"` status.
    #[error("record reported status {status:?}")]
    RecordStatus {
        /// The reported status value.
        status: String,
    },

    /// A value under a registered type key failed to parse as that type.
    #[error("value {value:?} does not parse as {id_type}")]
    BadIdValue {
        /// Name of the type the key promised.
        id_type: String,
        /// The unparsable value.
        value: String,
    },

    /// The `current` field held something other than a boolean.
    #[error("cannot read {value:?} as a boolean \"current\" flag")]
    BadCurrent {
        /// The rendered field value.
        value: String,
    },

    /// A `current` field appeared on a work-level record.
    #[error("\"current\" flag is only meaningful on a version entry")]
    CurrentOnWork,

    /// A record or version entry was not a JSON object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject {
        /// Short description of what was found instead.
        found: String,
    },

    /// Building the record's identifier sets violated a set invariant.
    #[error(transparent)]
    Set(#[from] SetError),
}

/// Failures reported by the fetch collaborator.
///
/// The crate never performs transport itself; implementations of the client
/// trait construct these to describe what went wrong on their side.
#[derive(Error, Debug)]
pub enum ConverterError {
    /// The request could not be completed (network, HTTP status, timeout).
    #[error("id converter request failed: {reason}")]
    Transport {
        /// Human-readable description of the failure.
        reason: String,
    },

    /// The response body was not valid JSON.
    #[error("id converter returned malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that fail resolver construction or a whole resolution call.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The resolver configuration failed validation.
    #[error("invalid resolver configuration: {reason}")]
    Config {
        /// What the validation rejected.
        reason: String,
    },

    /// The configured converter base URL did not parse.
    #[error("invalid converter base URL {url:?}: {reason}")]
    BaseUrl {
        /// The rejected URL text.
        url: String,
        /// The parser's explanation.
        reason: String,
    },

    /// A request URL was assembled for an empty group.
    #[error("cannot build a converter URL for an empty {id_type} group")]
    EmptyGroup {
        /// Name of the group's type.
        id_type: String,
    },

    /// The wanted type or another database lookup failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The fetch collaborator failed; no partial response exists.
    #[error(transparent)]
    Converter(#[from] ConverterError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_error_display() {
        let err = TypeError::BadName {
            name: "Pmid".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid identifier type name \"Pmid\": must match [a-z][a-z0-9_]*"
        );

        let err = TypeError::MissingReplacement {
            pattern: r"(\d+)".to_string(),
        };
        assert!(err.to_string().contains("no replacement template"));
    }

    #[test]
    fn test_set_error_display() {
        let err = SetError::ConflictingId {
            existing: "pmcid:PMC654321".to_string(),
            incoming: "pmcid:PMC87656".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "set already holds pmcid:PMC654321; cannot add pmcid:PMC87656 of the same type"
        );
    }

    #[test]
    fn test_resolve_error_display() {
        let err = ResolveError::AlreadyResolved {
            query: "74236".to_string(),
        };
        assert_eq!(err.to_string(), "request \"74236\" has already been resolved");
    }

    #[test]
    fn test_ingest_error_display() {
        let err = IngestError::RecordStatus {
            status: "error".to_string(),
        };
        assert_eq!(err.to_string(), "record reported status \"error\"");

        let err = IngestError::BadIdValue {
            id_type: "pmcid".to_string(),
            value: "Q177".to_string(),
        };
        assert_eq!(err.to_string(), "value \"Q177\" does not parse as pmcid");
    }

    #[test]
    fn test_ingest_error_wraps_set_error() {
        let err: IngestError = SetError::VersionedIntoWork {
            curie: "pmcid:PMC1234.5".to_string(),
        }
        .into();
        assert!(
            err.to_string()
                .contains("cannot be added to a work-level set")
        );
    }

    #[test]
    fn test_id_error_is_transparent() {
        let inner = DbError::UnknownType {
            name: "blech".to_string(),
        };
        let outer: IdError = inner.into();
        assert_eq!(outer.to_string(), "unknown identifier type \"blech\"");
    }

    #[test]
    fn test_resolver_error_display() {
        let err = ResolverError::EmptyGroup {
            id_type: "pmcid".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot build a converter URL for an empty pmcid group"
        );

        let err = ResolverError::Config {
            reason: "cache size must be positive".to_string(),
        };
        assert!(err.to_string().starts_with("invalid resolver configuration"));
    }
}
