use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Eviction policy selectable per cache.
///
/// `NONE` means the cache never evicts for capacity pressure: once `max_size`
/// is reached, inserts of new keys are rejected rather than displacing an
/// existing entry (existing keys may still be overwritten).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionPolicy {
    #[serde(rename = "lru")]
    Lru,
    #[serde(rename = "lfu")]
    Lfu,
    #[serde(rename = "fifo")]
    Fifo,
    #[serde(rename = "random")]
    Random,
    #[serde(rename = "none")]
    None,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        EvictionPolicy::Lru
    }
}

impl From<&str> for EvictionPolicy {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "lfu" => EvictionPolicy::Lfu,
            "fifo" => EvictionPolicy::Fifo,
            "random" => EvictionPolicy::Random,
            "none" => EvictionPolicy::None,
            _ => EvictionPolicy::Lru,
        }
    }
}

/// Configuration for a single named cache.
///
/// Deserializable so an external wiring layer can load it from file or
/// environment; this crate never performs that I/O itself. Unrecognized
/// fields are ignored and every field defaults, so partially-specified
/// configuration documents are legal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfiguration {
    pub name: String,
    pub max_size: u64,
    pub default_ttl: Option<Duration>,
    pub max_idle: Option<Duration>,
    pub expire_after_write: Option<Duration>,
    pub expire_after_access: Option<Duration>,
    pub refresh_after_write: Option<Duration>,
    pub record_stats: bool,
    pub allow_null_values: bool,
    pub eviction_policy: EvictionPolicy,
    pub concurrency_level: u16,
    pub weak_keys: bool,
    pub weak_values: bool,
    pub soft_values: bool,
}

impl Default for CacheConfiguration {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_size: 10_000,
            default_ttl: None,
            max_idle: None,
            expire_after_write: None,
            expire_after_access: None,
            refresh_after_write: None,
            record_stats: true,
            allow_null_values: false,
            eviction_policy: EvictionPolicy::default(),
            concurrency_level: 16,
            weak_keys: false,
            weak_values: false,
            soft_values: false,
        }
    }
}

impl CacheConfiguration {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), crate::error::CacheError> {
        if self.max_size == 0 {
            return Err(crate::error::CacheError::InvalidConfig(
                "max_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective TTL for a newly inserted entry, honoring `default_ttl` when
    /// no per-call override is supplied. Per-entry TTL, when supplied, is
    /// always authoritative over this default.
    pub fn effective_ttl(&self, per_call_ttl: Option<Duration>) -> Option<Duration> {
        per_call_ttl.or(self.default_ttl)
    }

    /// Merges `specific` over `global`, field by field: a field explicitly set
    /// on `specific` wins, otherwise the global value is inherited. This
    /// inheritance only applies when `specific.name == "default"`; a caller
    /// that named its cache explicitly gets its configuration honored as-is.
    pub fn merge(specific: &CacheConfiguration, global: &CacheConfiguration) -> CacheConfiguration {
        if specific.name != "default" {
            return specific.clone();
        }
        let default = CacheConfiguration::default();
        CacheConfiguration {
            name: specific.name.clone(),
            max_size: if specific.max_size != default.max_size {
                specific.max_size
            } else {
                global.max_size
            },
            default_ttl: specific.default_ttl.or(global.default_ttl),
            max_idle: specific.max_idle.or(global.max_idle),
            expire_after_write: specific.expire_after_write.or(global.expire_after_write),
            expire_after_access: specific.expire_after_access.or(global.expire_after_access),
            refresh_after_write: specific.refresh_after_write.or(global.refresh_after_write),
            record_stats: if specific.record_stats != default.record_stats {
                specific.record_stats
            } else {
                global.record_stats
            },
            allow_null_values: if specific.allow_null_values != default.allow_null_values {
                specific.allow_null_values
            } else {
                global.allow_null_values
            },
            eviction_policy: if specific.eviction_policy != default.eviction_policy {
                specific.eviction_policy
            } else {
                global.eviction_policy
            },
            concurrency_level: if specific.concurrency_level != default.concurrency_level {
                specific.concurrency_level
            } else {
                global.concurrency_level
            },
            weak_keys: if specific.weak_keys != default.weak_keys {
                specific.weak_keys
            } else {
                global.weak_keys
            },
            weak_values: if specific.weak_values != default.weak_values {
                specific.weak_values
            } else {
                global.weak_values
            },
            soft_values: if specific.soft_values != default.soft_values {
                specific.soft_values
            } else {
                global.soft_values
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_max_size() {
        let cfg = CacheConfiguration {
            max_size: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn merge_inherits_unset_fields_for_default_name() {
        let global = CacheConfiguration {
            max_size: 500,
            default_ttl: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let specific = CacheConfiguration::default();
        let merged = CacheConfiguration::merge(&specific, &global);
        assert_eq!(merged.max_size, 500);
        assert_eq!(merged.default_ttl, Some(Duration::from_secs(60)));
    }

    #[test]
    fn merge_inherits_global_boolean_opt_out() {
        let global = CacheConfiguration {
            record_stats: false,
            ..Default::default()
        };
        let specific = CacheConfiguration::default();
        let merged = CacheConfiguration::merge(&specific, &global);
        assert!(!merged.record_stats);
    }

    #[test]
    fn merge_honors_explicit_name_verbatim() {
        let global = CacheConfiguration {
            max_size: 500,
            ..Default::default()
        };
        let specific = CacheConfiguration::named("users");
        let merged = CacheConfiguration::merge(&specific, &global);
        assert_eq!(merged.max_size, specific.max_size);
    }

    #[test]
    fn effective_ttl_prefers_per_call_value() {
        let cfg = CacheConfiguration {
            default_ttl: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        assert_eq!(
            cfg.effective_ttl(Some(Duration::from_secs(5))),
            Some(Duration::from_secs(5))
        );
        assert_eq!(cfg.effective_ttl(None), Some(Duration::from_secs(30)));
    }
}
