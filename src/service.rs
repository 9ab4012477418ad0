//! Ship image service
//!
//! Owns the cache, the quota governor, the paced queue and the fallback
//! resolver for one process. Resolution order for a ship:
//!
//! 1. cache hit → cached image
//! 2. no backend (no API key) → fallback
//! 3. governor suspended → fallback
//! 4. queued API call → generated image, or fallback on any failure
//!
//! A quota error suspends the governor inside the queued task, so items
//! behind it in the queue are answered by the queue gate without a call.
//!
//! Every outcome except a cache hit is written back to the cache.
//! [`ShipImageService::generate_ship_image`] never fails.

use crate::backend::{GeminiBackend, ImageBackend};
use crate::cache::{ImageCache, SweepHandle};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigManager};
use crate::error::{BackendError, ErrorClass};
use crate::fallback::FallbackResolver;
use crate::image::{FallbackReason, ImageRef, ShipImage};
use crate::prompt::build_request_with_ratio;
use crate::queue::PacedQueue;
use crate::quota::{FileFlagStore, MemoryFlagStore, QuotaFlagStore, QuotaGovernor, QuotaState};
use crate::ship::ShipConfiguration;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

type Outcome = Result<ImageRef, BackendError>;

/// Counters since the service was built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub cache_hits: u64,
    /// Calls that actually reached the backend
    pub dispatched: u64,
    pub generated: u64,
    pub fallbacks: u64,
}

#[derive(Debug, Default)]
struct Counters {
    cache_hits: AtomicU64,
    dispatched: AtomicU64,
    generated: AtomicU64,
    fallbacks: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ServiceStats {
        ServiceStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            generated: self.generated.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }
}

enum BackendChoice {
    FromConfig,
    Custom(Arc<dyn ImageBackend>),
    Disabled,
}

/// Builder for [`ShipImageService`]
pub struct ServiceBuilder {
    config: Config,
    backend: BackendChoice,
    clock: Option<Arc<dyn Clock>>,
    flag_store: Option<Arc<dyn QuotaFlagStore>>,
    sweep: bool,
}

impl ServiceBuilder {
    /// Use this backend instead of the one derived from the API config
    pub fn backend(mut self, backend: Arc<dyn ImageBackend>) -> Self {
        self.backend = BackendChoice::Custom(backend);
        self
    }

    /// Behave as if no API key were configured
    pub fn without_backend(mut self) -> Self {
        self.backend = BackendChoice::Disabled;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn flag_store(mut self, store: Arc<dyn QuotaFlagStore>) -> Self {
        self.flag_store = Some(store);
        self
    }

    /// Run the periodic cache sweep (on by default when the config enables it)
    pub fn sweep(mut self, enabled: bool) -> Self {
        self.sweep = enabled;
        self
    }

    /// Wire everything together. Must be called inside a Tokio runtime.
    pub async fn build(self) -> ShipImageService {
        let Self {
            config,
            backend,
            clock,
            flag_store,
            sweep,
        } = self;

        let clock = clock.unwrap_or_else(|| Arc::new(SystemClock));
        let backend = match backend {
            BackendChoice::FromConfig => GeminiBackend::from_config(&config.api)
                .map(|backend| Arc::new(backend) as Arc<dyn ImageBackend>),
            BackendChoice::Custom(backend) => Some(backend),
            BackendChoice::Disabled => None,
        };
        if backend.is_none() {
            warn!(
                "No API key in ${}; every ship will get a placeholder image",
                config.api.key_env
            );
        }

        let store = flag_store.unwrap_or_else(|| {
            if config.quota.persist {
                Arc::new(FileFlagStore::new(ConfigManager::quota_flag_path()))
            } else {
                Arc::new(MemoryFlagStore::new())
            }
        });

        let governor =
            Arc::new(QuotaGovernor::restore(config.quota.cooldown(), clock.clone(), store).await);
        let cache = Arc::new(ImageCache::new(config.cache.ttl(), clock));
        let sweeper = match config.cache.sweep_interval() {
            Some(period) if sweep => Some(SweepHandle::spawn(cache.clone(), period)),
            _ => None,
        };

        // suspended requests are answered in line without using a paced slot
        let queue = PacedQueue::with_gate(config.queue.min_interval(), {
            let governor = governor.clone();
            move || (!governor.state().is_available()).then_some(Err(BackendError::Suspended))
        });

        debug!(
            "Service ready: min interval {:?}, cache ttl {}s",
            config.queue.min_interval(),
            config.cache.ttl_secs
        );

        ShipImageService {
            cache,
            governor,
            queue,
            backend,
            fallback: FallbackResolver::new(&config.fallback),
            aspect_ratio: config.api.aspect_ratio.clone(),
            counters: Arc::new(Counters::default()),
            sweeper,
        }
    }
}

/// Resolves ship configurations to images
pub struct ShipImageService {
    cache: Arc<ImageCache>,
    governor: Arc<QuotaGovernor>,
    queue: PacedQueue<Outcome>,
    backend: Option<Arc<dyn ImageBackend>>,
    fallback: FallbackResolver,
    aspect_ratio: String,
    counters: Arc<Counters>,
    sweeper: Option<SweepHandle>,
}

impl ShipImageService {
    pub fn builder(config: Config) -> ServiceBuilder {
        ServiceBuilder {
            config,
            backend: BackendChoice::FromConfig,
            clock: None,
            flag_store: None,
            sweep: true,
        }
    }

    /// Build with defaults derived from `config`
    pub async fn from_config(config: Config) -> Self {
        Self::builder(config).build().await
    }

    /// Resolve `ship` to an image. Always returns one, possibly a placeholder.
    pub async fn generate_ship_image(&self, ship: &ShipConfiguration) -> ShipImage {
        let key = ship.fingerprint();

        if let Some(image) = self.cache.get(&key) {
            Counters::bump(&self.counters.cache_hits);
            debug!("Cache hit for {} ({})", ship.name, key.short());
            return image;
        }

        let image = self.resolve(ship).await;
        self.cache.put(key, image.clone());
        image
    }

    async fn resolve(&self, ship: &ShipConfiguration) -> ShipImage {
        let Some(backend) = self.backend.clone() else {
            return self.fall_back(ship, FallbackReason::MissingCredentials);
        };

        if let QuotaState::Suspended { until } = self.governor.check().await {
            debug!("Skipping API call, suspended until {}", until);
            return self.fall_back(ship, FallbackReason::QuotaSuspended);
        }

        let request = build_request_with_ratio(ship, &self.aspect_ratio);
        let governor = self.governor.clone();
        let counters = self.counters.clone();

        let submitted = self
            .queue
            .submit(async move {
                // a quota error may have arrived while this request waited
                if !governor.check().await.is_available() {
                    return Err(BackendError::Suspended);
                }
                Counters::bump(&counters.dispatched);
                let outcome = backend.generate(&request).await;
                if let Err(ref e) = outcome {
                    if e.is_quota() {
                        // recorded before the worker takes the next item
                        governor.suspend(&e.to_string()).await;
                    }
                }
                outcome
            })
            .await;

        match submitted {
            Ok(Ok(image)) => {
                Counters::bump(&self.counters.generated);
                info!("Generated image for {}", ship.name);
                ShipImage::generated(image)
            }
            Ok(Err(e)) => self.handle_failure(ship, e),
            Err(e) => {
                error!("Request queue failed: {}", e);
                self.fall_back(ship, FallbackReason::RequestFailed)
            }
        }
    }

    fn handle_failure(&self, ship: &ShipConfiguration, err: BackendError) -> ShipImage {
        let reason = match err.class() {
            ErrorClass::Quota if err.is_quota() => FallbackReason::QuotaExceeded,
            ErrorClass::Quota => FallbackReason::QuotaSuspended,
            ErrorClass::Configuration => FallbackReason::MissingCredentials,
            ErrorClass::Empty => {
                warn!("No image returned for {}", ship.name);
                FallbackReason::NoImage
            }
            ErrorClass::Transient => {
                warn!("Image request for {} failed: {}", ship.name, err);
                FallbackReason::RequestFailed
            }
        };
        self.fall_back(ship, reason)
    }

    fn fall_back(&self, ship: &ShipConfiguration, reason: FallbackReason) -> ShipImage {
        Counters::bump(&self.counters.fallbacks);
        debug!("Using placeholder for {} ({})", ship.name, reason);
        self.fallback.resolve(ship, reason)
    }

    pub fn stats(&self) -> ServiceStats {
        self.counters.snapshot()
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn governor(&self) -> &QuotaGovernor {
        &self.governor
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Requests waiting in or running on the queue
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Image cache cleared");
    }

    /// Stop the sweeper and drain the queue
    pub async fn shutdown(self) {
        if let Some(sweeper) = self.sweeper {
            sweeper.shutdown().await;
        }
        self.queue.shutdown().await;
        debug!("Service stopped");
    }
}
