//! Batched resolution of identifiers against the id-converter service.
//!
//! [`IdResolver`] takes a comma-delimited list of requested values, parses
//! each into a [`RequestId`], and answers what it can without leaving the
//! process: malformed values, values already of the wanted type, and cache
//! hits. The rest go out to the converter service — which accepts one
//! identifier type per call — grouped by their query type, and every
//! record in a response is read into an identifier cluster and bound to
//! the requests it answers.
//!
//! The service transport is abstracted behind [`ConverterClient`], so the
//! whole pipeline runs against canned responses in tests.

mod config;
mod ingest;

pub use config::ResolverConfig;
pub use ingest::read_record;
pub use url::Url;

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use itertools::Itertools;
use lru::LruCache;
use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

use crate::db::IdDb;
use crate::error::{ConverterError, ResolverError};
use crate::identifier::Identifier;
use crate::idtype::IdType;
use crate::request::RequestId;
use crate::set::IdSet;

/// Transport to the id-converter service.
///
/// The resolver hands over a fully-built URL and wants the parsed JSON
/// response back. Everything HTTP — client choice, timeouts, retries —
/// stays with the implementation.
pub trait ConverterClient {
    /// Fetches one converter response and parses it as JSON.
    ///
    /// # Errors
    ///
    /// [`ConverterError::Transport`] for request failures,
    /// [`ConverterError::Json`] for unparsable payloads. Either one aborts
    /// the whole [`resolve_ids`](IdResolver::resolve_ids) call.
    fn fetch(&self, url: &Url) -> Result<Value, ConverterError>;
}

impl<C: ConverterClient + ?Sized> ConverterClient for &C {
    fn fetch(&self, url: &Url) -> Result<Value, ConverterError> {
        (**self).fetch(url)
    }
}

/// One cached converter answer: the set a curie belongs to.
struct CacheEntry {
    set: IdSet,
    stored: Instant,
}

/// Resolves raw identifier values through the id-converter service.
///
/// See the [crate docs](crate#resolution) for a worked example with a
/// canned client.
pub struct IdResolver<C> {
    db: Arc<IdDb>,
    client: C,
    wants_type: Arc<IdType>,
    base: Url,
    params: String,
    cache: Option<Mutex<LruCache<String, CacheEntry>>>,
    cache_ttl: Duration,
}

impl<C: ConverterClient> IdResolver<C> {
    /// Builds a resolver over `db` with the given transport.
    ///
    /// # Errors
    ///
    /// Fails if the configured wanted type is not in `db`, the converter
    /// base URL does not parse, or the cache is enabled with size zero.
    pub fn new(db: Arc<IdDb>, client: C, config: &ResolverConfig) -> Result<Self, ResolverError> {
        config
            .validate()
            .map_err(|reason| ResolverError::Config { reason })?;
        let wants_type = Arc::clone(db.lookup_type(&config.wants_type)?);
        let base = Url::parse(&config.converter_base).map_err(|err| ResolverError::BaseUrl {
            url: config.converter_base.clone(),
            reason: err.to_string(),
        })?;
        let cache = config
            .cache_enabled
            .then(|| NonZeroUsize::new(config.cache_size))
            .flatten()
            .map(|size| Mutex::new(LruCache::new(size)));
        Ok(Self {
            db,
            client,
            wants_type,
            base,
            params: config.converter_params.clone(),
            cache,
            cache_ttl: Duration::from_secs(config.cache_ttl),
        })
    }

    #[must_use]
    pub fn db(&self) -> &Arc<IdDb> {
        &self.db
    }

    /// The type every request should end up carrying.
    #[must_use]
    pub fn wants_type(&self) -> &Arc<IdType> {
        &self.wants_type
    }

    /// Splits a comma-delimited list into requests, all under the same
    /// optional type hint. Every segment becomes one request, parsed or
    /// not.
    #[must_use]
    pub fn parse_request_ids(
        &self,
        requested_type: Option<&str>,
        values: &str,
    ) -> Vec<RequestId> {
        values
            .split(',')
            .map(|value| RequestId::new(Arc::clone(&self.db), requested_type, value))
            .collect()
    }

    /// Resolves a comma-delimited list of requested values.
    ///
    /// Every segment of `values` comes back as one [`RequestId`], in input
    /// order. Requests that are malformed, already carry the wanted type,
    /// or hit the cache never reach the service; the rest go out in one
    /// converter call per query type. A request that a successful response
    /// fails to mention ends up
    /// [`Invalid`](crate::RequestState::Invalid) — the service did not
    /// know it.
    ///
    /// # Errors
    ///
    /// Fails on transport and malformed-JSON errors from the client. A
    /// response whose own status is not `"ok"` is logged and skipped, and
    /// its group's requests stay
    /// [`Unknown`](crate::RequestState::Unknown).
    pub fn resolve_ids(
        &self,
        requested_type: Option<&str>,
        values: &str,
    ) -> Result<Vec<RequestId>, ResolverError> {
        let mut rids = self.parse_request_ids(requested_type, values);
        trace!(requests = rids.len(), "parsed request list");
        self.check_cache(&mut rids);

        for (from_type, members) in self.groups_to_resolve(&rids) {
            let url = self.converter_url(&from_type, &members, &rids)?;
            trace!(from_type = from_type.name(), %url, "querying the id converter");
            let response = self.client.fetch(&url)?;
            trace!(%response, "converter response");
            self.ingest_response(&url, &from_type, &members, &mut rids, &response);
        }
        Ok(rids)
    }

    /// Groups the requests that still need the service by their query
    /// type, in first-encounter order.
    fn groups_to_resolve(&self, rids: &[RequestId]) -> Vec<(Arc<IdType>, Vec<usize>)> {
        let mut groups: Vec<(Arc<IdType>, Vec<usize>)> = Vec::new();
        for (index, rid) in rids.iter().enumerate() {
            if rid.is_resolved() || rid.has_type(&self.wants_type) {
                continue;
            }
            let Some(query) = rid.query_id() else {
                continue;
            };
            let from_type = query.id_type();
            match groups.iter_mut().find(|(ty, _)| ty == from_type) {
                Some((_, members)) => members.push(index),
                None => groups.push((Arc::clone(from_type), vec![index])),
            }
        }
        groups
    }

    /// The converter URL for one group: the configured parameters plus
    /// `idtype` and the comma-joined canonical values.
    fn converter_url(
        &self,
        from_type: &IdType,
        members: &[usize],
        rids: &[RequestId],
    ) -> Result<Url, ResolverError> {
        let joined = members
            .iter()
            .filter_map(|&index| rids[index].query_id())
            .map(Identifier::value)
            .join(",");
        if joined.is_empty() {
            return Err(ResolverError::EmptyGroup {
                id_type: from_type.name().to_string(),
            });
        }
        let mut url = self.base.clone();
        url.set_query(Some(&format!(
            "{}&idtype={}&ids={joined}",
            self.params,
            from_type.name()
        )));
        Ok(url)
    }

    fn ingest_response(
        &self,
        url: &Url,
        from_type: &IdType,
        members: &[usize],
        rids: &mut [RequestId],
        response: &Value,
    ) {
        let Some(status) = response.get("status").and_then(Value::as_str) else {
            error!(%url, "converter response carries no status field");
            return;
        };
        if status != "ok" {
            info!(%url, status, "error response from the id converter");
            if let Some(message) = response.get("message").and_then(Value::as_str) {
                info!(message, "id converter said");
            }
            return;
        }
        let Some(records) = response.get("records").and_then(Value::as_array) else {
            error!(%url, "converter response carries no records array");
            return;
        };

        for record in records {
            match read_record(&self.db, record) {
                Ok(set) => {
                    self.register(&set);
                    Self::bind(from_type, members, rids, &set);
                }
                Err(err) => warn!(%err, "skipping converter record"),
            }
        }

        // a successful response that never mentioned a request means the
        // service does not know that identifier
        for &index in members {
            let rid = &mut rids[index];
            if !rid.is_resolved() {
                rid.resolve(None).ok();
            }
        }
    }

    /// Matches the cluster against the group's pending requests. Every set
    /// in the cluster answers for its own identifier of the group's type,
    /// so a versioned query binds the version set itself.
    fn bind(from_type: &IdType, members: &[usize], rids: &mut [RequestId], work: &IdSet) {
        let mut sets = vec![work.clone()];
        sets.extend(work.versions());
        for set in &sets {
            let Some(own) = set.id(from_type) else {
                continue;
            };
            for &index in members {
                let rid = &mut rids[index];
                if rid.is_resolved() || rid.query_id() != Some(own) {
                    continue;
                }
                rid.resolve(Some(set.clone())).ok();
            }
        }
    }

    /// Answers unresolved requests from the cache. An expired entry is
    /// dropped on sight.
    fn check_cache(&self, rids: &mut [RequestId]) {
        let Some(cache) = &self.cache else { return };
        let Ok(mut cache) = cache.lock() else { return };
        for rid in rids.iter_mut() {
            if rid.is_resolved() {
                continue;
            }
            let Some(curie) = rid.query_id().map(Identifier::curie) else {
                continue;
            };
            let hit = match cache.get(&curie) {
                Some(entry) if entry.stored.elapsed() <= self.cache_ttl => {
                    Some(entry.set.clone())
                }
                Some(_) => {
                    cache.pop(&curie);
                    None
                }
                None => None,
            };
            if let Some(set) = hit
                && rid.resolve(Some(set)).is_ok()
            {
                debug!(%curie, "request answered from the cache");
            }
        }
    }

    /// Remembers every curie of a freshly read cluster, each pointing at
    /// the set that owns it.
    fn register(&self, work: &IdSet) {
        let Some(cache) = &self.cache else { return };
        let Ok(mut cache) = cache.lock() else { return };
        let mut sets = vec![work.clone()];
        sets.extend(work.versions());
        let now = Instant::now();
        for set in sets {
            for id in set.ids() {
                cache.put(
                    id.curie(),
                    CacheEntry {
                        set: set.clone(),
                        stored: now,
                    },
                );
            }
        }
    }
}
