//! Service behaviour through the public library API

use async_trait::async_trait;
use shipgen::backend::ImageBackend;
use shipgen::config::Config;
use shipgen::error::BackendError;
use shipgen::prompt::GenerationRequest;
use shipgen::quota::{FileFlagStore, QuotaFlagStore};
use shipgen::{Faction, FallbackReason, ImageOrigin, ImageRef, Purpose, ShipConfiguration, ShipImageService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Records every prompt; answers with a quota error once `fail_after`
/// calls have succeeded
struct RecordingBackend {
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    fail_after: usize,
}

impl RecordingBackend {
    fn new(fail_after: usize) -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_after,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ImageRef, BackendError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if n >= self.fail_after {
            return Err(BackendError::Quota {
                status: 429,
                message: "RESOURCE_EXHAUSTED".to_string(),
            });
        }
        Ok(ImageRef::Inline {
            mime_type: "image/png".to_string(),
            data: format!("SU1HJ{}", n),
        })
    }
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.queue.min_interval_ms = 5;
    config
}

fn ship(name: &str, faction: Faction) -> ShipConfiguration {
    ShipConfiguration {
        name: name.to_string(),
        faction,
        purpose: Purpose::Military,
        size_index: 1,
        origin: String::new(),
        turret_count: 2,
        random: false,
    }
    .normalized()
}

async fn service(
    backend: Arc<RecordingBackend>,
    store: Arc<FileFlagStore>,
) -> ShipImageService {
    ShipImageService::builder(fast_config())
        .backend(backend)
        .flag_store(store)
        .sweep(false)
        .build()
        .await
}

#[tokio::test]
async fn prompts_reach_the_backend() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileFlagStore::new(temp.path().join("quota.json")));
    let backend = RecordingBackend::new(usize::MAX);
    let service = service(backend.clone(), store).await;

    let image = service
        .generate_ship_image(&ship("HIVE", Faction::Horde))
        .await;
    assert_eq!(image.origin, ImageOrigin::Generated);

    let prompts = backend.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("organic weapon pods"));
    service.shutdown().await;
}

#[tokio::test]
async fn quota_error_survives_a_restart() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileFlagStore::new(temp.path().join("quota.json")));

    let backend = RecordingBackend::new(1);
    let first = service(backend.clone(), store.clone()).await;
    let ok = first
        .generate_ship_image(&ship("ONE", Faction::Empire))
        .await;
    let exhausted = first
        .generate_ship_image(&ship("TWO", Faction::Empire))
        .await;
    assert_eq!(ok.origin, ImageOrigin::Generated);
    assert_eq!(
        exhausted.origin,
        ImageOrigin::Fallback(FallbackReason::QuotaExceeded)
    );
    first.shutdown().await;

    assert!(store.load().await.unwrap().is_some());

    // a fresh service picks the flag up and never calls out
    let backend = RecordingBackend::new(usize::MAX);
    let second = service(backend.clone(), store.clone()).await;
    let image = second
        .generate_ship_image(&ship("THREE", Faction::FreeFleet))
        .await;
    assert_eq!(
        image.origin,
        ImageOrigin::Fallback(FallbackReason::QuotaSuspended)
    );
    assert_eq!(backend.calls(), 0);

    second.governor().reset().await;
    assert!(store.load().await.unwrap().is_none());
    second.shutdown().await;
}

#[tokio::test]
async fn cache_is_per_service() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(FileFlagStore::new(temp.path().join("quota.json")));
    let backend = RecordingBackend::new(usize::MAX);

    let a = service(backend.clone(), store.clone()).await;
    let b = service(backend.clone(), store).await;
    let target = ship("TWIN", Faction::Caverna);

    a.generate_ship_image(&target).await;
    a.generate_ship_image(&target).await;
    b.generate_ship_image(&target).await;

    assert_eq!(backend.calls(), 2);
    assert_eq!(a.stats().cache_hits, 1);
    assert_eq!(b.stats().cache_hits, 0);

    a.shutdown().await;
    b.shutdown().await;
}
