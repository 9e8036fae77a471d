//! Named pattern instances, scoped to the registry that holds them.

use crate::call::ResilientCall;
use crate::config::{ConfigError, PolicyConfig};
use bulwark_bulkhead::{Bulkhead, BulkheadStats};
use bulwark_ratelimiter::{RateLimiter, RateLimiterStats};
use bulwark_timeout::{AdaptiveTimeout, TimeoutStats};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Stats of every instance in a [`Registry`], keyed by name.
///
/// Serializes to a nested map suitable for a health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegistrySnapshot {
    /// Bulkhead stats by name.
    pub bulkheads: BTreeMap<String, BulkheadStats>,
    /// Rate limiter stats by name.
    pub rate_limiters: BTreeMap<String, RateLimiterStats>,
    /// Adaptive timeout stats by name.
    pub adaptive_timeouts: BTreeMap<String, TimeoutStats>,
}

/// Holds at most one bulkhead, one rate limiter and one adaptive timeout per
/// resource name.
///
/// There is no global registry; create one per process (or per tenant) and
/// share it. Lookups hand back clones of the stored handles, which share
/// state with the stored instance.
///
/// # Example
///
/// ```rust
/// use bulwark::{PolicyConfig, Priority, Registry};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let policy: PolicyConfig = serde_json::from_str(r#"{
///     "name": "orders-db",
///     "bulkhead": { "max_concurrent_calls": 4 },
///     "rate_limiter": { "algorithm": "leaky_bucket", "capacity": 20, "leak_rate": 10.0 }
/// }"#)?;
///
/// let registry = Registry::new();
/// let call = registry.register_policy(&policy)?;
/// let rows = call
///     .call(Priority::Normal, || async { Ok::<_, std::io::Error>(3) })
///     .await?;
/// assert_eq!(rows, 3);
///
/// let snapshot = registry.snapshot();
/// assert_eq!(snapshot.bulkheads["orders-db"].max_concurrent_calls, 4);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Registry {
    bulkheads: RwLock<HashMap<String, Bulkhead>>,
    rate_limiters: RwLock<HashMap<String, RateLimiter>>,
    timeouts: RwLock<HashMap<String, AdaptiveTimeout>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a list of policies, failing on the first
    /// invalid one.
    pub fn from_policies<'a, I>(policies: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = &'a PolicyConfig>,
    {
        let registry = Self::new();
        for policy in policies {
            registry.register_policy(policy)?;
        }
        Ok(registry)
    }

    /// The bulkhead named `name`.
    pub fn bulkhead(&self, name: &str) -> Option<Bulkhead> {
        read(&self.bulkheads).get(name).cloned()
    }

    /// The rate limiter named `name`.
    pub fn rate_limiter(&self, name: &str) -> Option<RateLimiter> {
        read(&self.rate_limiters).get(name).cloned()
    }

    /// The adaptive timeout named `name`.
    pub fn adaptive_timeout(&self, name: &str) -> Option<AdaptiveTimeout> {
        read(&self.timeouts).get(name).cloned()
    }

    /// Stores `bulkhead` under its own name, returning any instance it
    /// replaced.
    pub fn insert_bulkhead(&self, bulkhead: Bulkhead) -> Option<Bulkhead> {
        let name = bulkhead.name().to_string();
        write(&self.bulkheads).insert(name, bulkhead)
    }

    /// Stores `limiter` under its own name, returning any instance it
    /// replaced.
    pub fn insert_rate_limiter(&self, limiter: RateLimiter) -> Option<RateLimiter> {
        let name = limiter.name().to_string();
        write(&self.rate_limiters).insert(name, limiter)
    }

    /// Stores `timeout` under its own name, returning any instance it
    /// replaced.
    pub fn insert_adaptive_timeout(&self, timeout: AdaptiveTimeout) -> Option<AdaptiveTimeout> {
        let name = timeout.name().to_string();
        write(&self.timeouts).insert(name, timeout)
    }

    /// Removes every instance named `name`. Returns `true` if any existed.
    pub fn remove(&self, name: &str) -> bool {
        let bulkhead = write(&self.bulkheads).remove(name).is_some();
        let limiter = write(&self.rate_limiters).remove(name).is_some();
        let timeout = write(&self.timeouts).remove(name).is_some();
        bulkhead || limiter || timeout
    }

    /// Validates `policy`, builds its patterns and stores them under the
    /// policy's name.
    ///
    /// Sections present in the policy replace existing instances of the same
    /// name, which resets their state. Sections absent from it leave existing
    /// instances untouched.
    pub fn register_policy(&self, policy: &PolicyConfig) -> Result<ResilientCall, ConfigError> {
        policy.validate()?;
        let name = policy.name.as_str();

        if let Some(settings) = &policy.bulkhead {
            self.insert_bulkhead(settings.build(name));
        }
        if let Some(limiter) = policy.build_rate_limiter() {
            self.insert_rate_limiter(limiter);
        }
        if let Some(settings) = &policy.timeout {
            self.insert_adaptive_timeout(settings.build(name));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            policy = %name,
            bulkhead = policy.bulkhead.is_some(),
            rate_limiter = policy.rate_limiter.is_some(),
            timeout = policy.timeout.is_some(),
            "policy registered"
        );

        Ok(self.compose(name))
    }

    /// A [`ResilientCall`] over every instance named `name`, or `None` if
    /// there is none.
    pub fn policy(&self, name: &str) -> Option<ResilientCall> {
        let call = self.compose(name);
        let empty = call.rate_limiter().is_none()
            && call.bulkhead().is_none()
            && call.adaptive_timeout().is_none();
        (!empty).then_some(call)
    }

    fn compose(&self, name: &str) -> ResilientCall {
        let mut call = ResilientCall::new(name);
        if let Some(limiter) = self.rate_limiter(name) {
            call = call.with_rate_limiter(limiter);
        }
        if let Some(bulkhead) = self.bulkhead(name) {
            call = call.with_bulkhead(bulkhead);
        }
        if let Some(timeout) = self.adaptive_timeout(name) {
            call = call.with_adaptive_timeout(timeout);
        }
        call
    }

    /// Every name with at least one instance, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        names.extend(read(&self.bulkheads).keys().cloned());
        names.extend(read(&self.rate_limiters).keys().cloned());
        names.extend(read(&self.timeouts).keys().cloned());
        names.into_iter().collect()
    }

    /// Stats of every instance.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            bulkheads: read(&self.bulkheads)
                .iter()
                .map(|(name, b)| (name.clone(), b.stats()))
                .collect(),
            rate_limiters: read(&self.rate_limiters)
                .iter()
                .map(|(name, l)| (name.clone(), l.stats()))
                .collect(),
            adaptive_timeouts: read(&self.timeouts)
                .iter()
                .map(|(name, t)| (name.clone(), t.stats()))
                .collect(),
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("bulkheads", &read(&self.bulkheads).len())
            .field("rate_limiters", &read(&self.rate_limiters).len())
            .field("adaptive_timeouts", &read(&self.timeouts).len())
            .finish()
    }
}
