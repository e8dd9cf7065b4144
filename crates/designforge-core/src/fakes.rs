//! In-memory fakes for the generation seams (testing only)
//!
//! Provides `StubGenerator` and `MemoryImageStore`, which satisfy the
//! [`ImageGenerator`] and [`ImageStore`] contracts without network or disk.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{DesignParameters, FailureKind, ImageReference, ProviderError, ProviderKind};
use crate::generation::store::{self, check_file_name, sha256_hex};
use crate::generation::{GeneratedImage, ImageGenerator, ImageStore};

/// Bytes returned by a succeeding stub: the PNG signature.
pub const STUB_IMAGE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n";

type Policy = dyn Fn(&DesignParameters) -> Result<GeneratedImage, ProviderError> + Send + Sync;

// ---------------------------------------------------------------------------
// StubGenerator
// ---------------------------------------------------------------------------

/// Scripted image generator.
///
/// The policy decides per call whether to succeed; an optional delay makes
/// calls overlap so concurrency limits can be observed via `peak_in_flight`.
pub struct StubGenerator {
    provider: ProviderKind,
    policy: Arc<Policy>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StubGenerator {
    /// Always returns a tiny PNG.
    pub fn succeeding(provider: ProviderKind) -> Self {
        Self::with_policy(provider, move |params| Ok(stub_image(provider, params)))
    }

    /// Always fails with `kind`.
    pub fn failing(provider: ProviderKind, kind: FailureKind) -> Self {
        Self::with_policy(provider, move |_| {
            Err(ProviderError::from_kind(kind, provider, "stubbed failure"))
        })
    }

    pub fn with_policy<F>(provider: ProviderKind, policy: F) -> Self
    where
        F: Fn(&DesignParameters) -> Result<GeneratedImage, ProviderError> + Send + Sync + 'static,
    {
        Self {
            provider,
            policy: Arc::new(policy),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// A successful provider response for `params`.
pub fn stub_image(provider: ProviderKind, params: &DesignParameters) -> GeneratedImage {
    let mut metadata = BTreeMap::new();
    metadata.insert(
        "camera_angle".to_string(),
        serde_json::Value::String(params.camera_angle().as_str().to_string()),
    );
    GeneratedImage {
        bytes: STUB_IMAGE_BYTES.to_vec(),
        source_url: Some(format!("https://stub.invalid/{provider}/image.png")),
        metadata,
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageGenerator for StubGenerator {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    async fn generate(&self, params: &DesignParameters) -> Result<GeneratedImage, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.policy)(params)
    }
}

// ---------------------------------------------------------------------------
// MemoryImageStore
// ---------------------------------------------------------------------------

/// In-memory image store backed by a `HashMap<file name, bytes>`.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    images: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_name: &str) -> Option<Vec<u8>> {
        self.images.lock().unwrap().get(file_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.images.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageStore for MemoryImageStore {
    fn put(&self, file_name: &str, data: &[u8]) -> store::Result<ImageReference> {
        check_file_name(file_name)?;
        self.images
            .lock()
            .unwrap()
            .insert(file_name.to_string(), data.to_vec());
        Ok(ImageReference {
            path: PathBuf::from("memory").join(file_name),
            url: format!("/api/images/{file_name}"),
            sha256: sha256_hex(data),
            size_bytes: data.len() as u64,
        })
    }

    fn contains(&self, file_name: &str) -> bool {
        self.images.lock().unwrap().contains_key(file_name)
    }
}
