//! Builder for fallback chains.

use crate::chain::{boxed, FallbackChain, HandlerFn};
use crate::events::FallbackEvent;
use crate::FallbackLevel;
use bulwark_core::events::{EventListeners, FnListener};
use std::collections::BTreeMap;
use std::future::Future;

/// Builder for [`FallbackChain`].
pub struct FallbackChainBuilder<Req, Res, E> {
    name: String,
    handlers: BTreeMap<FallbackLevel, HandlerFn<Req, Res, E>>,
    event_listeners: EventListeners<FallbackEvent>,
}

impl<Req, Res, E> FallbackChainBuilder<Req, Res, E> {
    /// Creates a new builder with no handlers.
    pub fn new() -> Self {
        Self {
            name: String::from("fallback"),
            handlers: BTreeMap::new(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the chain's name.
    ///
    /// Default: "fallback"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Binds a handler to `level`. A later call for the same level replaces
    /// it.
    pub fn handler<F, Fut>(mut self, level: FallbackLevel, handler: F) -> Self
    where
        Req: 'static,
        Res: 'static,
        E: 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        self.handlers.insert(level, boxed(handler));
        self
    }

    /// Binds a constant value to `level`; it always succeeds.
    ///
    /// ```rust
    /// use bulwark_fallback::{FallbackChain, FallbackLevel};
    ///
    /// let chain = FallbackChain::<(), Vec<String>, std::io::Error>::builder()
    ///     .name("recommendations")
    ///     .value(FallbackLevel::Default, Vec::new())
    ///     .build();
    /// assert_eq!(chain.levels(), vec![FallbackLevel::Default]);
    /// ```
    pub fn value(self, level: FallbackLevel, value: Res) -> Self
    where
        Req: 'static,
        Res: Clone + Send + Sync + 'static,
        E: Send + 'static,
    {
        self.handler(level, move |_req: Req| {
            let value = value.clone();
            async move { Ok(value) }
        })
    }

    /// Registers a callback when a level's handler fails.
    ///
    /// # Callback Signature
    /// `Fn(FallbackLevel)` - called with the failed level.
    pub fn on_level_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(FallbackLevel) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::LevelFailed { level, .. } = event {
                f(*level);
            }
        }));
        self
    }

    /// Registers a callback when a level serves the result.
    ///
    /// # Callback Signature
    /// `Fn(FallbackLevel, bool)` - called with the serving level and whether
    /// the result is degraded.
    pub fn on_served<F>(mut self, f: F) -> Self
    where
        F: Fn(FallbackLevel, bool) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::Served {
                level, degraded, ..
            } = event
            {
                f(*level, *degraded);
            }
        }));
        self
    }

    /// Registers a callback when every bound level failed.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - called with the number of levels attempted.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Builds the chain.
    pub fn build(self) -> FallbackChain<Req, Res, E> {
        FallbackChain::from_parts(self.name, self.handlers, self.event_listeners)
    }
}

impl<Req, Res, E> Default for FallbackChainBuilder<Req, Res, E> {
    fn default() -> Self {
        Self::new()
    }
}
