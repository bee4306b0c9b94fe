//! Host services the engine runs on
//!
//! The engine itself is single threaded. Anything that may suspend (tile
//! image fetch and decode) is handed to an [`AsyncSpawner`], and anything
//! that depends on time reads a [`Clock`], so both can be swapped for
//! deterministic versions in tests.

use crate::layers::tile::image::ImageDecoder;
use instant::Instant;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future; completion is observed through whatever channel the
    /// future itself reports to.
    fn spawn_boxed(&self, future: BoxFuture);
}

/// Convenience wrapper for spawning without boxing at the call site
pub fn spawn<F>(spawner: &dyn AsyncSpawner, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    spawner.spawn_boxed(Box::pin(future));
}

/// Runs every future to completion on the calling thread.
///
/// Suitable for in-memory tile sources and for tests, where "asynchronous"
/// completions should be available on the next `process_loaded_images`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineSpawner;

impl AsyncSpawner for InlineSpawner {
    fn spawn_boxed(&self, future: BoxFuture) {
        futures::executor::block_on(future);
    }
}

#[cfg(feature = "tokio-runtime")]
pub use tokio_impl::TokioSpawner;

#[cfg(feature = "tokio-runtime")]
mod tokio_impl {
    use super::{AsyncSpawner, BoxFuture};
    use ::tokio::runtime::Handle;

    /// Tokio-based async spawner
    #[derive(Debug, Clone)]
    pub struct TokioSpawner {
        handle: Handle,
    }

    impl TokioSpawner {
        pub fn new(handle: Handle) -> Self {
            Self { handle }
        }

        /// Spawner for the runtime the caller is running in, if any.
        pub fn current() -> Option<Self> {
            Handle::try_current().ok().map(Self::new)
        }
    }

    impl AsyncSpawner for TokioSpawner {
        fn spawn_boxed(&self, future: BoxFuture) {
            self.handle.spawn(future);
        }
    }
}

/// Source of "now" for animations, debouncing and opacity fades.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset_nanos: AtomicU64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_nanos: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }
}

/// Everything the engine needs from its host, shared by all layers of a map.
#[derive(Clone)]
pub struct MapServices {
    pub decoder: Arc<dyn ImageDecoder>,
    pub spawner: Arc<dyn AsyncSpawner>,
    pub clock: Arc<dyn Clock>,
}

impl MapServices {
    pub fn new(
        decoder: Arc<dyn ImageDecoder>,
        spawner: Arc<dyn AsyncSpawner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            decoder,
            spawner,
            clock,
        }
    }

    /// Inline spawner and system clock around the given decoder.
    pub fn with_decoder(decoder: Arc<dyn ImageDecoder>) -> Self {
        Self::new(decoder, Arc::new(InlineSpawner), Arc::new(SystemClock))
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }
}

impl std::fmt::Debug for MapServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapServices").finish_non_exhaustive()
    }
}
