//! Resolver configuration.
//!
//! This module defines the settings the resolver consumes: the wanted
//! identifier type, the converter endpoint, and the cache knobs.

/// Configuration for an [`IdResolver`](crate::IdResolver).
///
/// The defaults point at the public PMC id-converter service and ask it
/// for `aiid`s, with the cache disabled. [`IdResolver::new`]
/// (crate::IdResolver::new) validates the settings against the registry
/// up front, so a bad configuration fails construction rather than the
/// first resolution call.
///
/// # Examples
///
/// ```
/// use litid::ResolverConfig;
///
/// let mut config = ResolverConfig::new();
/// config.set_wants_type("pmcid");
/// config.set_cache_enabled(true).set_cache_ttl(3600);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Whether resolved sets are remembered between calls
    pub(crate) cache_enabled: bool,
    /// Seconds before a cached entry counts as a miss
    pub(crate) cache_ttl: u64,
    /// Maximum number of cached curies
    pub(crate) cache_size: usize,
    /// Name of the identifier type every request should end up carrying
    pub(crate) wants_type: String,
    /// Base URL of the id-converter service
    pub(crate) converter_base: String,
    /// Fixed query parameters sent with every converter call
    pub(crate) converter_params: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverConfig {
    /// Creates a configuration with the default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache_enabled: false,
            cache_ttl: 86_400,
            cache_size: 50_000,
            wants_type: "aiid".to_string(),
            converter_base: "https://www.ncbi.nlm.nih.gov/pmc/utils/idconv/v1.0/".to_string(),
            converter_params: "showaiid=yes&format=json".to_string(),
        }
    }

    /// Sets whether resolved sets are cached between calls
    pub fn set_cache_enabled(&mut self, enabled: bool) -> &mut Self {
        self.cache_enabled = enabled;
        self
    }

    /// Sets the cache time-to-live, in seconds
    pub fn set_cache_ttl(&mut self, seconds: u64) -> &mut Self {
        self.cache_ttl = seconds;
        self
    }

    /// Sets the maximum number of cached curies
    pub fn set_cache_size(&mut self, entries: usize) -> &mut Self {
        self.cache_size = entries;
        self
    }

    /// Sets the name of the wanted identifier type
    pub fn set_wants_type(&mut self, name: &str) -> &mut Self {
        self.wants_type = name.to_string();
        self
    }

    /// Sets the base URL of the id-converter service
    pub fn set_converter_base(&mut self, url: &str) -> &mut Self {
        self.converter_base = url.to_string();
        self
    }

    /// Sets the fixed query parameters sent with every converter call
    pub fn set_converter_params(&mut self, params: &str) -> &mut Self {
        self.converter_params = params.to_string();
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.wants_type.is_empty() {
            return Err("No wanted identifier type configured".to_string());
        }
        if self.converter_base.is_empty() {
            return Err("No converter base URL configured".to_string());
        }
        if self.cache_enabled && self.cache_size == 0 {
            return Err("Cache is enabled with a zero entry limit".to_string());
        }
        Ok(())
    }
}
