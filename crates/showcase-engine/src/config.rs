use std::env;

use anyhow::{anyhow, Result};
use showcase_contracts::api::DEFAULT_API_BASE;
use showcase_contracts::workflow::OverlapPolicy;

pub const API_BASE_ENV: &str = "SHOWCASE_API_BASE";
pub const BACKEND_ENV: &str = "SHOWCASE_BACKEND";
pub const OVERLAP_ENV: &str = "SHOWCASE_OVERLAP";

const DEFAULT_BACKEND: &str = "http";

/// Where the gallery lives and how overlapping workflow calls are resolved.
///
/// Resolution order is flag, then environment, then default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryConfig {
    pub api_base: String,
    pub backend: String,
    pub overlap: OverlapPolicy,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            backend: DEFAULT_BACKEND.to_string(),
            overlap: OverlapPolicy::default(),
        }
    }
}

impl GalleryConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();
        if let Some(api_base) = non_empty(API_BASE_ENV) {
            config.api_base = api_base.trim_end_matches('/').to_string();
        }
        if let Some(backend) = non_empty(BACKEND_ENV) {
            config.backend = backend.to_ascii_lowercase();
        }
        if let Some(overlap) = non_empty(OVERLAP_ENV) {
            config.overlap = overlap
                .parse()
                .map_err(|err: String| anyhow!("{OVERLAP_ENV}: {err}"))?;
        }
        Ok(config)
    }

    pub fn with_overrides(
        mut self,
        api_base: Option<String>,
        backend: Option<String>,
        overlap: Option<OverlapPolicy>,
    ) -> Self {
        if let Some(api_base) = api_base.filter(|value| !value.trim().is_empty()) {
            self.api_base = api_base.trim().trim_end_matches('/').to_string();
        }
        if let Some(backend) = backend.filter(|value| !value.trim().is_empty()) {
            self.backend = backend.trim().to_ascii_lowercase();
        }
        if let Some(overlap) = overlap {
            self.overlap = overlap;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use showcase_contracts::api::DEFAULT_API_BASE;
    use showcase_contracts::workflow::OverlapPolicy;

    use super::{GalleryConfig, API_BASE_ENV, BACKEND_ENV, OVERLAP_ENV};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<String, String>>();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() -> anyhow::Result<()> {
        let config = GalleryConfig::from_lookup(lookup(&[]))?;
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.backend, "http");
        assert_eq!(config.overlap, OverlapPolicy::LatestRequest);
        Ok(())
    }

    #[test]
    fn environment_overrides_defaults() -> anyhow::Result<()> {
        let config = GalleryConfig::from_lookup(lookup(&[
            (API_BASE_ENV, "http://localhost:8080/api/v1/"),
            (BACKEND_ENV, " DryRun "),
            (OVERLAP_ENV, "last-response"),
        ]))?;
        assert_eq!(config.api_base, "http://localhost:8080/api/v1");
        assert_eq!(config.backend, "dryrun");
        assert_eq!(config.overlap, OverlapPolicy::LastResponse);
        Ok(())
    }

    #[test]
    fn blank_environment_values_are_ignored() -> anyhow::Result<()> {
        let config = GalleryConfig::from_lookup(lookup(&[(API_BASE_ENV, "   ")]))?;
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        Ok(())
    }

    #[test]
    fn invalid_overlap_is_reported_with_variable_name() {
        let err = GalleryConfig::from_lookup(lookup(&[(OVERLAP_ENV, "first")]))
            .err()
            .map(|err| err.to_string())
            .unwrap_or_default();
        assert!(err.starts_with("SHOWCASE_OVERLAP: Unknown overlap policy 'first'"));
    }

    #[test]
    fn flags_override_environment() -> anyhow::Result<()> {
        let config = GalleryConfig::from_lookup(lookup(&[(BACKEND_ENV, "dryrun")]))?
            .with_overrides(
                Some("http://gallery.test/".to_string()),
                Some("http".to_string()),
                Some(OverlapPolicy::LastResponse),
            );
        assert_eq!(config.api_base, "http://gallery.test");
        assert_eq!(config.backend, "http");
        assert_eq!(config.overlap, OverlapPolicy::LastResponse);
        Ok(())
    }
}
