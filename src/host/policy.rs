//! Which pages the overlay may be injected into.

use crate::config::HostConfig;

/// URL policy for pages where injection is impossible (internal browser
/// pages, extension pages, the extension store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionPolicy {
    prefixes: Vec<String>,
    origins: Vec<String>,
}

impl RestrictionPolicy {
    pub fn new(prefixes: Vec<String>, origins: Vec<String>) -> Self {
        Self { prefixes, origins }
    }

    pub fn from_config(config: &HostConfig) -> Self {
        Self::new(
            config.restricted_prefixes.clone(),
            config.restricted_origins.clone(),
        )
    }

    /// Whether `url` is off limits.  A page whose URL is unknown (absent or
    /// empty) is treated as restricted.
    pub fn is_restricted(&self, url: Option<&str>) -> bool {
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            return true;
        };
        self.prefixes.iter().any(|p| url.starts_with(p.as_str()))
            || self.origins.iter().any(|o| url.starts_with(o.as_str()))
    }
}

impl Default for RestrictionPolicy {
    fn default() -> Self {
        Self::from_config(&HostConfig::default())
    }
}
