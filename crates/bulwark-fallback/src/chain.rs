use crate::error::{FallbackError, LevelFailure};
use crate::events::FallbackEvent;
use crate::FallbackLevel;
use bulwark_core::events::EventListeners;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};

#[cfg(feature = "metrics")]
static METRICS_INIT: std::sync::Once = std::sync::Once::new();

/// A handler bound to one level.
pub type HandlerFn<Req, Res, E> =
    Arc<dyn Fn(Req) -> BoxFuture<'static, Result<Res, E>> + Send + Sync>;

/// A result together with the level that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOutcome<T> {
    /// The value returned by the serving level.
    pub value: T,
    /// The level that produced it.
    pub level: FallbackLevel,
    /// `true` unless `level` is [`FallbackLevel::Primary`].
    pub degraded: bool,
}

pub(crate) fn boxed<Req, Res, E, F, Fut>(handler: F) -> HandlerFn<Req, Res, E>
where
    Req: 'static,
    Res: 'static,
    E: 'static,
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, E>> + Send + 'static,
{
    Arc::new(move |req: Req| -> BoxFuture<'static, Result<Res, E>> { Box::pin(handler(req)) })
}

struct Shared<Req, Res, E> {
    name: String,
    handlers: RwLock<BTreeMap<FallbackLevel, HandlerFn<Req, Res, E>>>,
    event_listeners: EventListeners<FallbackEvent>,
}

/// Tries bound levels in fixed order until one succeeds.
///
/// At most one handler is invoked per level per call, one at a time, and
/// unbound levels are skipped without counting as attempts. Each failure is
/// logged at `warn` with the level name and the chain moves on; if every
/// bound level fails the call ends with [`FallbackError::Exhausted`].
///
/// Cloning is cheap; clones share the registered handlers.
///
/// # Example
///
/// ```rust
/// use bulwark_fallback::{FallbackChain, FallbackLevel};
///
/// # async fn example() {
/// let chain: FallbackChain<u64, String, String> = FallbackChain::new("user-profile");
/// chain.register_handler(FallbackLevel::Primary, |id: u64| async move {
///     Err(format!("primary unavailable for {}", id))
/// });
/// chain.register_handler(FallbackLevel::LocalCache, |id: u64| async move {
///     Ok(format!("cached profile {}", id))
/// });
///
/// let outcome = chain.execute(7).await.unwrap();
/// assert_eq!(outcome.level, FallbackLevel::LocalCache);
/// assert!(outcome.degraded);
/// # }
/// ```
pub struct FallbackChain<Req, Res, E> {
    shared: Arc<Shared<Req, Res, E>>,
}

impl<Req, Res, E> Clone for FallbackChain<Req, Res, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<Req, Res, E> FallbackChain<Req, Res, E> {
    /// Creates an empty chain.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_parts(name.into(), BTreeMap::new(), EventListeners::new())
    }

    /// Creates a new builder.
    pub fn builder() -> crate::FallbackChainBuilder<Req, Res, E> {
        crate::FallbackChainBuilder::new()
    }

    pub(crate) fn from_parts(
        name: String,
        handlers: BTreeMap<FallbackLevel, HandlerFn<Req, Res, E>>,
        event_listeners: EventListeners<FallbackEvent>,
    ) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "fallback_served_total",
                "Total number of calls served, by level"
            );
            describe_counter!(
                "fallback_level_failures_total",
                "Total number of failed handler invocations, by level"
            );
            describe_counter!(
                "fallback_exhausted_total",
                "Total number of calls where every bound level failed"
            );
        });

        Self {
            shared: Arc::new(Shared {
                name,
                handlers: RwLock::new(handlers),
                event_listeners,
            }),
        }
    }

    /// Name of the chain.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Binds `handler` to `level`, replacing any previous handler there.
    pub fn register_handler<F, Fut>(&self, level: FallbackLevel, handler: F)
    where
        Req: 'static,
        Res: 'static,
        E: 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        self.register_boxed(level, boxed(handler));
    }

    /// Binds an already boxed handler to `level`.
    pub fn register_boxed(&self, level: FallbackLevel, handler: HandlerFn<Req, Res, E>) {
        let replaced = self
            .shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(level, handler)
            .is_some();

        #[cfg(feature = "tracing")]
        tracing::debug!(fallback = %self.shared.name, %level, replaced, "handler registered");
        #[cfg(not(feature = "tracing"))]
        let _ = replaced;
    }

    /// Unbinds `level`. Returns `true` if a handler was bound.
    pub fn remove_handler(&self, level: FallbackLevel) -> bool {
        self.shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&level)
            .is_some()
    }

    /// Levels with a bound handler, in chain order.
    pub fn levels(&self) -> Vec<FallbackLevel> {
        self.shared
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    fn snapshot(&self, start: FallbackLevel) -> Vec<(FallbackLevel, HandlerFn<Req, Res, E>)> {
        self.shared
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .range(start..)
            .map(|(level, handler)| (*level, Arc::clone(handler)))
            .collect()
    }

    /// Runs the chain for `request`.
    ///
    /// Each bound handler receives its own clone of the request.
    pub async fn execute(&self, request: Req) -> Result<FallbackOutcome<Res>, FallbackError<E>>
    where
        Req: Clone,
    {
        self.execute_from(FallbackLevel::Primary, request).await
    }

    /// Runs the chain for `request`, skipping every level before `start`.
    ///
    /// Used when the caller already made the primary attempt itself.
    pub async fn execute_from(
        &self,
        start: FallbackLevel,
        request: Req,
    ) -> Result<FallbackOutcome<Res>, FallbackError<E>>
    where
        Req: Clone,
    {
        let name = &self.shared.name;
        let listeners = &self.shared.event_listeners;
        let mut failures = Vec::new();

        for (level, handler) in self.snapshot(start) {
            match handler(request.clone()).await {
                Ok(value) => {
                    let degraded = level.is_degraded();

                    #[cfg(feature = "tracing")]
                    {
                        if degraded {
                            tracing::info!(
                                fallback = %name,
                                %level,
                                attempts = failures.len() + 1,
                                "served degraded result"
                            );
                        }
                    }

                    #[cfg(feature = "metrics")]
                    counter!("fallback_served_total", "fallback" => name.clone(), "level" => level.as_str())
                        .increment(1);

                    listeners.emit(&FallbackEvent::Served {
                        pattern_name: name.clone(),
                        timestamp: Instant::now(),
                        level,
                        degraded,
                    });

                    return Ok(FallbackOutcome {
                        value,
                        level,
                        degraded,
                    });
                }
                Err(error) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(fallback = %name, %level, "fallback level failed, trying next");

                    #[cfg(feature = "metrics")]
                    counter!("fallback_level_failures_total", "fallback" => name.clone(), "level" => level.as_str())
                        .increment(1);

                    listeners.emit(&FallbackEvent::LevelFailed {
                        pattern_name: name.clone(),
                        timestamp: Instant::now(),
                        level,
                    });

                    failures.push(LevelFailure { level, error });
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(fallback = %name, attempts = failures.len(), "all fallback levels exhausted");

        #[cfg(feature = "metrics")]
        counter!("fallback_exhausted_total", "fallback" => name.clone()).increment(1);

        listeners.emit(&FallbackEvent::Exhausted {
            pattern_name: name.clone(),
            timestamp: Instant::now(),
            attempts: failures.len(),
        });

        Err(FallbackError::Exhausted {
            name: name.clone(),
            failures,
        })
    }
}

impl<Req, Res, E> fmt::Debug for FallbackChain<Req, Res, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackChain")
            .field("name", &self.shared.name)
            .field("levels", &self.levels())
            .finish()
    }
}
